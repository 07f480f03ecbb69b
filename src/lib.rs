pub mod advisory;
pub mod app;
pub mod config;
pub mod debounce;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod reminders;
pub mod state;
pub mod stats;
pub mod storage;

pub use app::router;
pub use config::Config;
pub use ledger::TaskLedger;
pub use reminders::ReminderScheduler;
pub use state::{AppState, SaveTier};
pub use storage::{FileStore, MemoryStore, Store};

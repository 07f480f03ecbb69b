use crate::advisory::AdvisoryClient;
use crate::debounce::Debouncer;
use crate::errors::AppError;
use crate::ledger::TaskLedger;
use crate::models::MotivationalMessage;
use crate::reminders::ReminderScheduler;
use crate::storage::{Store, persist_reminders, persist_task_data};
use std::{sync::Arc, time::Duration};
use tokio::sync::{Mutex, watch};
use tracing::error;

/// How a ledger mutation reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTier {
    /// Write now. A debounced save already pending stays armed.
    Immediate,
    /// Restart the trailing-edge timer; the ledger is read when it fires.
    Debounced,
}

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Mutex<TaskLedger>>,
    pub reminders: Arc<Mutex<ReminderScheduler>>,
    pub store: Arc<dyn Store>,
    pub advisory: Arc<AdvisoryClient>,
    pub motivation: watch::Receiver<Option<MotivationalMessage>>,
    saves: Arc<Debouncer>,
    /// Held from snapshot to `set`, so stores see writes in ledger order.
    writes: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        ledger: TaskLedger,
        reminders: ReminderScheduler,
        advisory: AdvisoryClient,
        save_debounce: Duration,
        motivation: watch::Receiver<Option<MotivationalMessage>>,
    ) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            reminders: Arc::new(Mutex::new(reminders)),
            store,
            advisory: Arc::new(advisory),
            motivation,
            saves: Arc::new(Debouncer::new(save_debounce)),
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub async fn save_tasks(&self, tier: SaveTier) -> Result<(), AppError> {
        match tier {
            SaveTier::Immediate => self.write_tasks().await,
            SaveTier::Debounced => {
                let state = self.clone();
                self.saves
                    .schedule(async move {
                        if let Err(err) = state.write_tasks().await {
                            error!("debounced save failed: {err}");
                        }
                    })
                    .await;
                Ok(())
            }
        }
    }

    pub async fn save_reminders(&self) -> Result<(), AppError> {
        let _write = self.writes.lock().await;
        let reminders = self.reminders.lock().await.reminders().to_vec();
        persist_reminders(self.store.as_ref(), &reminders).await
    }

    pub async fn save_pending(&self) -> bool {
        self.saves.is_pending().await
    }

    /// Cancels armed reminders and writes out any debounced save still
    /// waiting on its timer.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.reminders.lock().await.cleanup();
        if self.saves.cancel().await {
            self.write_tasks().await?;
        }
        Ok(())
    }

    async fn write_tasks(&self) -> Result<(), AppError> {
        let _write = self.writes.lock().await;
        let snapshot = self.ledger.lock().await.snapshot();
        persist_task_data(self.store.as_ref(), &snapshot).await
    }
}

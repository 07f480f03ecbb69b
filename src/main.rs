use std::{net::SocketAddr, sync::Arc};
use task_tracker::{
    AppState, Config, FileStore, ReminderScheduler, Store, TaskLedger,
    advisory::{AdvisoryClient, spawn_motivation_cycle},
    router,
    storage::{load_reminders, load_task_data},
};
use tokio::sync::{broadcast::error::RecvError, watch};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let store = FileStore::open(&config.data_dir).await?;
    info!(data_dir = %store.dir().display(), "using data directory");
    let store: Arc<dyn Store> = Arc::new(store);

    let ledger = TaskLedger::from_data(load_task_data(store.as_ref()).await);
    let mut reminders = ReminderScheduler::new(load_reminders(store.as_ref()).await);
    reminders.initialize();
    let mut fired = reminders.subscribe();

    let advisory = AdvisoryClient::new(config.advisory_endpoint.clone(), config.advisory_timeout)?;
    let (motivation_tx, motivation_rx) = watch::channel(None);

    let state = AppState::new(
        store,
        ledger,
        reminders,
        advisory,
        config.save_debounce,
        motivation_rx,
    );

    let motivation = spawn_motivation_cycle(
        Arc::clone(&state.advisory),
        config.motivation_interval,
        motivation_tx,
    );
    let notifications = tokio::spawn(async move {
        loop {
            match fired.recv().await {
                Ok(event) => info!(
                    task = event.reminder.task_title.as_deref().unwrap_or("(untitled)"),
                    message = %event.reminder.message,
                    "task reminder"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "reminder notifications dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    motivation.abort();
    notifications.abort();
    state.shutdown().await?;
    info!("shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}

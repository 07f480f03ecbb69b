use std::future::Future;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::{sync::Mutex, task::JoinHandle, time::sleep};

#[derive(Debug)]
struct PendingJob {
    handle: JoinHandle<()>,
    started: Arc<AtomicBool>,
}

impl PendingJob {
    /// Aborts the job if it is still waiting out its delay. A job that has
    /// started is left to finish.
    fn abort_if_waiting(&self) -> bool {
        if self.started.load(Ordering::SeqCst) || self.handle.is_finished() {
            return false;
        }
        self.handle.abort();
        true
    }
}

/// Trailing-edge coalescer: each `schedule` call cancels the pending job and
/// starts the delay over, so only the last job in a burst runs. Jobs are
/// only ever cancelled during their delay, never halfway through.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<PendingJob>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub async fn schedule<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            flag.store(true, Ordering::SeqCst);
            job.await;
        });

        if let Some(previous) = self.pending.lock().await.replace(PendingJob { handle, started }) {
            previous.abort_if_waiting();
        }
    }

    /// Drops the pending job, returning whether one had not yet run. A job
    /// already running is awaited instead.
    pub async fn cancel(&self) -> bool {
        let Some(job) = self.pending.lock().await.take() else {
            return false;
        };
        if job.abort_if_waiting() {
            return true;
        }
        let _ = job.handle.await;
        false
    }

    pub async fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .await
            .as_ref()
            .is_some_and(|job| !job.handle.is_finished())
    }
}

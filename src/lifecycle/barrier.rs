//! Completion barrier for background execution units.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// Tracks the background units the coordinator must outlive.
///
/// Today that is only the HTTP serving task. Sampling loops are owned by
/// their registrars and are not tracked here.
#[derive(Debug, Clone, Default)]
pub struct CompletionBarrier {
    tracker: TaskTracker,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self {
            tracker: TaskTracker::new(),
        }
    }

    /// Spawn a unit that the barrier waits for.
    pub fn spawn<F>(&self, unit: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(unit)
    }

    /// Wait until every spawned unit has finished.
    ///
    /// The barrier is closed to new units on the first call.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Number of units still running.
    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_wait_blocks_until_units_finish() {
        let barrier = CompletionBarrier::new();
        let (tx, rx) = oneshot::channel::<()>();
        barrier.spawn(async move {
            let _ = rx.await;
        });
        assert_eq!(barrier.outstanding(), 1);

        let pending = tokio::time::timeout(Duration::from_millis(50), barrier.wait()).await;
        assert!(pending.is_err(), "barrier released with a unit still running");

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), barrier.wait())
            .await
            .expect("barrier never released");
        assert_eq!(barrier.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_empty_barrier_releases_immediately() {
        let barrier = CompletionBarrier::new();
        tokio::time::timeout(Duration::from_millis(50), barrier.wait())
            .await
            .expect("empty barrier should not block");
    }
}

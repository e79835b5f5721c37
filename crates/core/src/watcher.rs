//! Auto-exit watcher for batchform
//!
//! Once the batch drains with every job done, the process exits on its own
//! after a short grace period. The grace period exists so a user watching
//! the run can abort the exit; any failure in the batch suppresses it
//! entirely so the outcome stays on screen.

use crate::scheduler::BatchSummary;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Cancellation token checked after the grace period.
pub type CancelFlag = Arc<AtomicBool>;

/// Creates a new, unset cancellation flag.
pub fn new_cancel_flag() -> CancelFlag {
    Arc::new(AtomicBool::new(false))
}

/// Watches a finished batch and triggers the delayed exit.
pub struct CompletionWatcher {
    delay: Duration,
    cancel: CancelFlag,
}

impl CompletionWatcher {
    /// Create a watcher with the given grace period and cancel flag.
    pub fn new(delay: Duration, cancel: CancelFlag) -> Self {
        Self { delay, cancel }
    }

    /// Run the watcher against a finished batch.
    ///
    /// Calls `exit` and returns true when every job succeeded, the grace
    /// period elapsed, and nobody cancelled. Returns false otherwise.
    pub async fn run<F>(self, summary: BatchSummary, exit: F) -> bool
    where
        F: FnOnce() + Send,
    {
        if !summary.all_done() {
            info!(
                failed = summary.failed,
                total = summary.total,
                "auto-exit suppressed, batch finished with failures"
            );
            return false;
        }

        info!(
            delay_secs = self.delay.as_secs_f32(),
            "batch complete, exiting shortly"
        );
        tokio::time::sleep(self.delay).await;

        if self.cancel.load(Ordering::SeqCst) {
            info!("auto-exit cancelled");
            return false;
        }

        exit();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn clean_summary(total: usize) -> BatchSummary {
        BatchSummary {
            total,
            done: total,
            failed: 0,
        }
    }

    #[tokio::test]
    async fn test_exit_fires_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_inner = fired.clone();

        let watcher = CompletionWatcher::new(Duration::from_millis(50), new_cancel_flag());
        let start = Instant::now();
        let exited = watcher
            .run(clean_summary(3), move || {
                fired_inner.store(true, Ordering::SeqCst)
            })
            .await;

        assert!(exited);
        assert!(fired.load(Ordering::SeqCst));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_exit_cancelled_during_grace_period() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_inner = fired.clone();

        let cancel = new_cancel_flag();
        let cancel_inner = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel_inner.store(true, Ordering::SeqCst);
        });

        let watcher = CompletionWatcher::new(Duration::from_millis(100), cancel);
        let exited = watcher
            .run(clean_summary(1), move || {
                fired_inner.store(true, Ordering::SeqCst)
            })
            .await;

        assert!(!exited);
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_exit_suppressed_when_batch_has_failures() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_inner = fired.clone();

        let summary = BatchSummary {
            total: 3,
            done: 2,
            failed: 1,
        };

        let watcher = CompletionWatcher::new(Duration::from_millis(100), new_cancel_flag());
        let start = Instant::now();
        let exited = watcher
            .run(summary, move || fired_inner.store(true, Ordering::SeqCst))
            .await;

        assert!(!exited);
        assert!(!fired.load(Ordering::SeqCst));
        // Suppression is immediate, there is no grace period to sit out
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_empty_batch_counts_as_done() {
        let watcher = CompletionWatcher::new(Duration::ZERO, new_cancel_flag());
        let exited = watcher.run(clean_summary(0), || {}).await;

        assert!(exited);
    }

    #[tokio::test]
    async fn test_cancel_set_before_run_wins() {
        let cancel = new_cancel_flag();
        cancel.store(true, Ordering::SeqCst);

        let watcher = CompletionWatcher::new(Duration::from_millis(10), cancel);
        let exited = watcher.run(clean_summary(2), || {}).await;

        assert!(!exited);
    }
}

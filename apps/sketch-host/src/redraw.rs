//! Debounced, coalescing redraw requests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

/// Collapses bursts of redraw requests into a single pass.
///
/// The first request arms one timer; requests made while it is armed are
/// absorbed. The pending flag is cleared before the pass runs, so a request
/// made during or after the pass arms a new timer. Outside a tokio runtime
/// the pass runs immediately.
#[derive(Debug, Clone)]
pub struct RedrawScheduler {
    delay: Duration,
    pending: Arc<AtomicBool>,
    passes: Arc<AtomicU64>,
}

impl RedrawScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(AtomicBool::new(false)),
            passes: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Number of passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Acquire)
    }

    /// Request a pass. Returns `false` when the request was absorbed by an
    /// already armed timer.
    pub fn request<F>(&self, draw: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.pending.swap(true, Ordering::AcqRel) {
            log::trace!("Redraw already pending");
            return false;
        }

        match Handle::try_current() {
            Ok(handle) => {
                let pending = Arc::clone(&self.pending);
                let passes = Arc::clone(&self.passes);
                let delay = self.delay;
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    run_pass(&pending, &passes, draw);
                });
            }
            Err(_) => run_pass(&self.pending, &self.passes, draw),
        }
        true
    }
}

fn run_pass<F: FnOnce()>(pending: &AtomicBool, passes: &AtomicU64, draw: F) {
    pending.store(false, Ordering::Release);
    draw();
    passes.fetch_add(1, Ordering::AcqRel);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_runtime_draws_immediately() {
        let scheduler = RedrawScheduler::new(Duration::from_millis(50));
        let drawn = Arc::new(AtomicU64::new(0));
        for _ in 0..3 {
            let drawn = Arc::clone(&drawn);
            assert!(scheduler.request(move || {
                drawn.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(drawn.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.passes(), 3);
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_in_window_coalesce() {
        let scheduler = RedrawScheduler::new(Duration::from_millis(50));
        assert!(scheduler.request(|| {}));
        assert!(!scheduler.request(|| {}));
        assert!(!scheduler.request(|| {}));
        assert!(scheduler.is_pending());
        assert_eq!(scheduler.passes(), 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(scheduler.passes(), 1);
        assert!(!scheduler.is_pending());

        assert!(scheduler.request(|| {}));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(scheduler.passes(), 2);
    }
}

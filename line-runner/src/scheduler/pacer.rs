//! Run pacing
//!
//! Every suspension point of a run goes through a [`Pacer`], which races the
//! awaited future against the run's cancellation token and its deadline.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::RunError;

#[derive(Debug, Clone)]
pub struct Pacer {
    cancel: CancellationToken,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl Pacer {
    /// Creates a pacer whose deadline starts counting now
    pub fn new(cancel: CancellationToken, timeout: Option<Duration>) -> Self {
        Self {
            cancel,
            timeout,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    /// Sleeps for `duration` unless the run is cancelled or out of time
    pub async fn sleep(&self, duration: Duration) -> Result<(), RunError> {
        self.guard(tokio::time::sleep(duration)).await
    }

    /// Awaits `fut` unless the run is cancelled or out of time
    ///
    /// Cancellation wins over the deadline, and both win over a future that
    /// becomes ready at the same instant.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, RunError> {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RunError::Cancelled),
            _ = deadline => Err(RunError::TimedOut(self.timeout.unwrap_or_default())),
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_deadline() {
        let pacer = Pacer::new(CancellationToken::new(), None);
        assert!(pacer.sleep(Duration::from_secs(3600)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_sleep() {
        let pacer = Pacer::new(CancellationToken::new(), Some(Duration::from_secs(60)));
        let started = Instant::now();

        let err = pacer.sleep(Duration::from_secs(3600)).await.unwrap_err();

        assert!(matches!(err, RunError::TimedOut(t) if t == Duration::from_secs(60)));
        assert_eq!(started.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_guarded_future() {
        let cancel = CancellationToken::new();
        let pacer = Pacer::new(cancel.clone(), None);
        cancel.cancel();

        let result = pacer.guard(std::future::pending::<()>()).await;
        assert!(matches!(result, Err(RunError::Cancelled)));
    }

    #[tokio::test]
    async fn test_guard_returns_output() {
        let pacer = Pacer::new(CancellationToken::new(), Some(Duration::from_secs(5)));
        assert_eq!(pacer.guard(async { 7 }).await.unwrap(), 7);
    }
}

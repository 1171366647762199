//! Timeout enforcement.
//!
//! Every outbound attempt carries a deadline; this is the only bounded-duration
//! guarantee in the resilience stack (a whole retry sequence has none).

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// A single attempt exceeded its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation timed out after {0:?}")]
pub struct TimedOut(pub Duration);

/// Run `fut` with a deadline, mapping expiry into the caller's error type.
pub async fn with_timeout<T, E, F>(limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimedOut>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(TimedOut(limit).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Timeout(TimedOut),
    }

    impl From<TimedOut> for TestError {
        fn from(e: TimedOut) -> Self {
            TestError::Timeout(e)
        }
    }

    #[tokio::test]
    async fn test_fast_future_completes() {
        let result: Result<u32, TestError> =
            with_timeout(Duration::from_millis(200), async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_slow_future_times_out() {
        let limit = Duration::from_millis(20);
        let result: Result<u32, TestError> = with_timeout(limit, async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(7)
        })
        .await;
        assert_eq!(result, Err(TestError::Timeout(TimedOut(limit))));
    }
}

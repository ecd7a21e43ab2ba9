//! Retry policy
//!
//! Transport-independent "retrying submit": bounded attempts, each raced
//! against a timeout, retried immediately on failure.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::TransportError;

/// Attempt budget for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Bound on each attempt, measured from its submission
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Fixed policy for payment notifications: 3 retries, 5s per attempt.
    pub const PAYMENT: RetryPolicy = RetryPolicy {
        max_retries: 3,
        attempt_timeout: Duration::from_secs(5),
    };

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Longest time a caller can be blocked before giving up
    pub fn worst_case(&self) -> Duration {
        self.attempt_timeout * self.max_attempts()
    }
}

/// All attempts failed
#[derive(Debug, thiserror::Error)]
#[error("Gave up after {attempts} attempts: {last_error}")]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: TransportError,
}

/// Run `submit` until it succeeds or the policy is exhausted.
///
/// `submit` receives the 1-based attempt number. Returns the attempt that
/// succeeded.
pub async fn retry_submit<F, Fut>(policy: &RetryPolicy, mut submit: F) -> Result<u32, RetryExhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(), TransportError>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        let error = match tokio::time::timeout(policy.attempt_timeout, submit(attempt)).await {
            Ok(Ok(())) => return Ok(attempt),
            Ok(Err(e)) => e,
            Err(_) => TransportError::Timeout(policy.attempt_timeout),
        };

        if attempt >= max_attempts {
            return Err(RetryExhausted {
                attempts: attempt,
                last_error: error,
            });
        }

        warn!(
            attempt,
            max_attempts,
            error = %error,
            "Submission failed, retrying"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_payment_policy_constants() {
        let policy = RetryPolicy::PAYMENT;
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.attempt_timeout, Duration::from_secs(5));
        assert_eq!(policy.worst_case(), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let calls = AtomicU32::new(0);
        let result = retry_submit(&RetryPolicy::PAYMENT, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let result = retry_submit(&RetryPolicy::PAYMENT, |attempt| async move {
            if attempt < 3 {
                Err(TransportError::Submit("broker down".to_string()))
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_exhausts_budget() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 2,
            attempt_timeout: Duration::from_millis(10),
        };

        let err = retry_submit(&policy, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::Submit("nope".to_string())) }
        })
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(err.last_error, TransportError::Submit(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_attempt_times_out() {
        let err = retry_submit(&RetryPolicy::PAYMENT, |_| async {
            std::future::pending::<()>().await;
            Ok(())
        })
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 4);
        assert!(matches!(err.last_error, TransportError::Timeout(d) if d == Duration::from_secs(5)));
    }
}

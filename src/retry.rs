use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::{Error, Result};

/// Wait schedule between attempts.
#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    /// `base * 2^(attempt - 1)`: 1s, 2s, 4s, ... for a 1s base.
    Exponential { base: Duration },
    /// Uniformly random wait in `[min, max]`, independent of attempt number.
    RandomRange { min: Duration, max: Duration },
}

/// An explicit retry policy value: how many attempts, and how long to wait
/// between them. Which errors are worth another attempt is the caller's
/// business and passed to [`retry_call`] separately.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Wait before the attempt following `attempt` (1-based).
    fn delay(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Exponential { base } => base * 2u32.saturating_pow(attempt - 1),
            Backoff::RandomRange { min, max } => rand::thread_rng().gen_range(min..=max),
        }
    }
}

/// Runs `op` until it succeeds, `is_retryable` rejects the error, or the
/// attempt cap is reached. Returns the last error on exhaustion.
pub(crate) async fn retry_call<T, F, Fut>(
    policy: &RetryPolicy,
    is_retryable: impl Fn(&Error) -> bool,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(val) => return Ok(val),
            Err(err) if attempt < policy.max_attempts && is_retryable(&err) => {
                let wait = policy.delay(attempt);
                tracing::warn!("attempt {attempt} failed, retrying in {wait:?}: {err}");
                sleep(wait).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn retryable_err() -> Error {
        Error::HttpStatus {
            url: "http://example.invalid".to_owned(),
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    #[test]
    fn exponential_delay_doubles() {
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff: Backoff::Exponential {
                base: Duration::from_secs(1),
            },
        };
        assert_eq!(policy.delay(1), Duration::from_secs(1));
        assert_eq!(policy.delay(2), Duration::from_secs(2));
        assert_eq!(policy.delay(3), Duration::from_secs(4));
    }

    #[test]
    fn random_delay_stays_in_range() {
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff: Backoff::RandomRange {
                min: Duration::from_secs(1),
                max: Duration::from_secs(3),
            },
        };
        for attempt in 1..100 {
            let delay = policy.delay(attempt);
            assert!(delay >= Duration::from_secs(1) && delay <= Duration::from_secs(3));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_exactly_max_attempts_then_returns_last_error() {
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff: Backoff::Exponential {
                base: Duration::from_secs(1),
            },
        };
        let attempts = AtomicU32::new(0);
        let attempts_ref = &attempts;

        let res: Result<()> = retry_call(&policy, |_| true, move || async move {
            attempts_ref.fetch_add(1, Ordering::SeqCst);
            Err(retryable_err())
        })
        .await;

        assert!(res.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_fails_on_first_attempt() {
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff: Backoff::Exponential {
                base: Duration::from_secs(1),
            },
        };
        let attempts = AtomicU32::new(0);
        let attempts_ref = &attempts;

        let res: Result<()> = retry_call(&policy, |_| false, move || async move {
            attempts_ref.fetch_add(1, Ordering::SeqCst);
            Err(retryable_err())
        })
        .await;

        assert!(res.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_retrying_once_op_succeeds() {
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff: Backoff::Exponential {
                base: Duration::from_secs(1),
            },
        };
        let attempts = AtomicU32::new(0);
        let attempts_ref = &attempts;

        let res = retry_call(&policy, |_| true, move || async move {
            if attempts_ref.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(retryable_err())
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(res.ok(), Some(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}

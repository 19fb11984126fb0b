use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use actix_web::rt::time::sleep;

/// Exponential backoff for calls to external APIs.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Delay after the given 0-indexed attempt, capped at `max_backoff_ms`.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let backoff = self.initial_backoff_ms.saturating_mul(1 << attempt.min(16));
        backoff.min(self.max_backoff_ms)
    }
}

/// Run `op` until it succeeds or the attempts are used up; the last error is returned.
pub async fn with_backoff<T, E, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < attempts => {
                let delay = policy.backoff_ms(attempt);
                tracing::warn!(error = %e, attempt = attempt + 1, delay_ms = delay, "{what} failed, retrying");
                sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 4,
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_ms(0), 200);
        assert_eq!(policy.backoff_ms(1), 400);
        assert_eq!(policy.backoff_ms(2), 800);
        assert_eq!(policy.backoff_ms(10), 2_000);
    }

    #[actix_web::test]
    async fn gives_up_after_three_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), String> = with_backoff(&fast(), "upload", || {
            calls.set(calls.get() + 1);
            async { Err("boom".to_string()) }
        })
        .await;
        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(calls.get(), 3);
    }

    #[actix_web::test]
    async fn stops_on_first_success() {
        let calls = Cell::new(0);
        let result: Result<u32, String> = with_backoff(&fast(), "upload", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { if n < 2 { Err("flaky".to_string()) } else { Ok(n) } }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.get(), 2);
    }
}

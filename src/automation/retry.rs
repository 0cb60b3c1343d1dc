use std::thread;
use std::time::Duration;

use spdlog::{error, warn};

use crate::automation::{UiError, UiResult};

/// How many times to run a fallible UI action, how long to wait between
/// runs, and which errors are worth another run.
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub retryable: fn(&UiError) -> bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay,
            retryable: UiError::is_transient,
        }
    }

    /// 3 attempts, 1 second apart, transient errors only.
    pub fn clicks() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(1))
    }

    pub fn with_delay(mut self, delay: Duration) -> RetryPolicy {
        self.delay = delay;
        self
    }

    pub fn retry_if(mut self, retryable: fn(&UiError) -> bool) -> RetryPolicy {
        self.retryable = retryable;
        self
    }

    /// Runs `op` with the 1-based attempt number until it succeeds, fails
    /// with a non-retryable error, or attempts run out. The last error is
    /// returned.
    pub fn run<T, F>(&self, action: &str, mut op: F) -> UiResult<T>
        where F: FnMut(u32) -> UiResult<T> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let err = match op(attempt) {
                Ok(v) => return Ok(v),
                Err(e) => e,
            };

            if !(self.retryable)(&err) {
                error!("Unexpected error in {}: {}", action, err);
                return Err(err);
            }

            if attempt >= max_attempts {
                error!("All {} attempts failed for {}: {}", max_attempts, action, err);
                return Err(err);
            }

            warn!("Attempt {} failed for {}: {}. Retrying in {:.1} seconds...", attempt, action, err, self.delay.as_secs_f32());
            thread::sleep(self.delay);
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO)
    }

    #[test]
    fn test_succeeds_after_transient_errors() {
        let mut calls = 0;
        let res = quick(3).run("click", |attempt| {
            calls += 1;
            if attempt < 3 {
                Err(UiError::ClickIntercepted("overlay".to_string()))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(res, Ok(3));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_exhaustion_returns_last_error() {
        let mut calls = 0;
        let res: UiResult<()> = quick(3).run("click", |attempt| {
            calls += 1;
            Err(UiError::Timeout(format!("attempt {}", attempt)))
        });
        assert_eq!(res, Err(UiError::Timeout("attempt 3".to_string())));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_non_retryable_stops_immediately() {
        let mut calls = 0;
        let res: UiResult<()> = quick(3).run("click", |_| {
            calls += 1;
            Err(UiError::Session("gone".to_string()))
        });
        assert!(res.unwrap_err().is_fatal());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_custom_predicate() {
        let policy = quick(2).retry_if(|e| matches!(e, UiError::Unverified(_)));
        let mut calls = 0;
        let res: UiResult<()> = policy.run("publish", |_| {
            calls += 1;
            Err(UiError::Unverified("not yet".to_string()))
        });
        assert!(res.is_err());
        assert_eq!(calls, 2);

        let res: UiResult<()> = policy.run("publish", |_| Err(UiError::Timeout("t".to_string())));
        assert!(res.is_err());
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let res = quick(0).run("noop", |attempt| Ok(attempt));
        assert_eq!(res, Ok(1));
    }
}

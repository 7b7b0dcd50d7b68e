//! Caller-side retry for transient remote failures

use log::debug;
use std::time::Duration;

use crate::config::RetrySettings;
use crate::error::RemoteError;

/// Exponential backoff with jitter, applied to transient failures only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts; 1 means no retry
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(RetrySettings::default())
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            base_delay: Duration::from_millis(settings.base_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Run `op`, retrying while it fails with a retryable error
    pub fn run<T>(
        &self,
        mut op: impl FnMut() -> Result<T, RemoteError>,
    ) -> Result<T, RemoteError> {
        let attempts = self.max_attempts.max(1);
        let mut delay = self.base_delay;

        for attempt in 1..attempts {
            match op() {
                Err(e) if e.is_retryable() => {
                    debug!("Attempt {}/{} failed: {}", attempt, attempts, e);
                    std::thread::sleep(delay + jitter(self.base_delay));
                    delay *= 2;
                }
                result => return result,
            }
        }

        op()
    }
}

/// Random delay in `[0, ceiling)`
fn jitter(ceiling: Duration) -> Duration {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let ceiling_ms = ceiling.as_millis() as u64;
    if ceiling_ms == 0 {
        return Duration::ZERO;
    }
    let hasher = RandomState::new().build_hasher();
    Duration::from_millis(hasher.finish() % ceiling_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn transient() -> RemoteError {
        RemoteError::Transient {
            message: "503".into(),
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_default_makes_one_attempt() {
        let calls = Cell::new(0);
        let result: Result<(), _> = RetryPolicy::default().run(|| {
            calls.set(calls.get() + 1);
            Err(transient())
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_transient_retried_until_success() {
        let calls = Cell::new(0);
        let result = policy(3).run(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 { Err(transient()) } else { Ok("done") }
        });
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_attempts_bounded() {
        let calls = Cell::new(0);
        let result: Result<(), _> = policy(4).run(|| {
            calls.set(calls.get() + 1);
            Err(transient())
        });
        assert_eq!(result, Err(transient()));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_non_transient_not_retried() {
        for error in [
            RemoteError::Permanent { message: "401".into() },
            RemoteError::NotFound { resource: "m1".into() },
            RemoteError::Rejected { status: 400, message: "bad".into() },
        ] {
            let calls = Cell::new(0);
            let result: Result<(), _> = policy(5).run(|| {
                calls.set(calls.get() + 1);
                Err(error.clone())
            });
            assert_eq!(result, Err(error));
            assert_eq!(calls.get(), 1);
        }
    }

    #[test]
    fn test_zero_attempts_still_calls_once() {
        let calls = Cell::new(0);
        let _ = policy(0).run(|| {
            calls.set(calls.get() + 1);
            Ok::<_, RemoteError>(())
        });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_jitter_below_ceiling() {
        assert_eq!(jitter(Duration::ZERO), Duration::ZERO);
        for _ in 0..20 {
            assert!(jitter(Duration::from_millis(100)) < Duration::from_millis(100));
        }
    }
}

//! Bounded retry with exponential backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::generator::GeneratorError;

/// How many times a generator call is attempted and how long to wait in between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each further failure.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based): `base * 2^(attempt-1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.base_delay_ms.saturating_mul(1u64 << shift))
    }

    /// Run `op` until it succeeds, fails fatally or attempts run out.
    ///
    /// `op` receives the 1-based attempt number. The last error is returned
    /// when every attempt failed.
    pub fn run<T>(
        &self,
        what: &str,
        mut op: impl FnMut(u32) -> Result<T, GeneratorError>,
    ) -> Result<T, GeneratorError> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !e.is_retryable() || attempt >= attempts {
                        return Err(e);
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        what,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "generator attempt failed, retrying"
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_delays_double() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_for(1), Duration::from_secs(1));
        assert_eq!(p.delay_for(2), Duration::from_secs(2));
        assert_eq!(p.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn stops_after_max_attempts() {
        let mut calls = 0;
        let res: Result<(), _> = RetryPolicy::immediate(3).run("test", |_| {
            calls += 1;
            Err(GeneratorError::Parse("bad".into()))
        });
        assert!(matches!(res, Err(GeneratorError::Parse(_))));
        assert_eq!(calls, 3);
    }

    #[test]
    fn fatal_error_is_not_retried() {
        let mut calls = 0;
        let res: Result<(), _> = RetryPolicy::immediate(3).run("test", |_| {
            calls += 1;
            Err(GeneratorError::Auth("denied".into()))
        });
        assert!(matches!(res, Err(GeneratorError::Auth(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn succeeds_on_later_attempt() {
        let res = RetryPolicy::immediate(3).run("test", |attempt| {
            if attempt < 3 {
                Err(GeneratorError::Request("reset".into()))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(res.unwrap(), 3);
    }

    proptest! {
        #[test]
        fn delays_strictly_increase(base in 1u64..10_000, attempt in 1u32..10) {
            let p = RetryPolicy { max_attempts: 3, base_delay_ms: base };
            prop_assert!(p.delay_for(attempt + 1) > p.delay_for(attempt));
        }
    }
}

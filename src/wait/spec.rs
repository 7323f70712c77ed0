use crate::util::{LocateError, LocateResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative cancellation flag shared between a waiter and its controller.
///
/// Clones observe the same flag. The executor checks it only between
/// attempts, never while a predicate runs.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clears the flag so the token can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(5);

/// Poll configuration.
#[derive(Clone, Debug)]
pub struct WaitSpec {
    pub timeout: Duration,
    /// Sleep before the second attempt.
    pub interval: Duration,
    /// Multiplies the interval after each miss; at least 1.
    pub backoff_factor: f64,
    /// Upper bound for the grown interval.
    pub max_interval: Duration,
    pub cancel: CancelToken,
}

impl Default for WaitSpec {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            backoff_factor: 1.0,
            max_interval: DEFAULT_MAX_INTERVAL,
            cancel: CancelToken::new(),
        }
    }
}

impl WaitSpec {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            max_interval: interval.max(DEFAULT_MAX_INTERVAL),
            ..Self::default()
        }
    }

    /// Builds a spec from seconds, rejecting negative or non-finite values.
    pub fn from_secs(timeout: f64, interval: f64) -> LocateResult<Self> {
        Ok(Self::new(secs("timeout", timeout)?, secs("interval", interval)?))
    }

    pub fn with_backoff(mut self, backoff_factor: f64, max_interval: Duration) -> Self {
        self.backoff_factor = backoff_factor;
        self.max_interval = max_interval;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Checks the invariants a poll relies on.
    pub fn validate(&self) -> LocateResult<()> {
        if self.interval.is_zero() {
            return Err(LocateError::Configuration("wait interval must be positive".into()));
        }
        if self.timeout < self.interval {
            return Err(LocateError::Configuration(format!(
                "wait timeout {:?} is shorter than the interval {:?}",
                self.timeout, self.interval
            )));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(LocateError::Configuration(format!(
                "backoff factor {} must be finite and at least 1",
                self.backoff_factor
            )));
        }
        if self.max_interval < self.interval {
            return Err(LocateError::Configuration(format!(
                "max interval {:?} is shorter than the interval {:?}",
                self.max_interval, self.interval
            )));
        }
        Ok(())
    }

    /// Interval that follows `current` after a miss.
    pub(crate) fn next_interval(&self, current: Duration) -> Duration {
        if self.backoff_factor == 1.0 {
            return current.min(self.max_interval);
        }
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_factor)
            .map_or(self.max_interval, |next| next.min(self.max_interval))
    }
}

fn secs(what: &str, value: f64) -> LocateResult<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| LocateError::Configuration(format!("invalid {what} {value}")))
}

//! Poll-until-success execution with timeout, backoff and cancellation.
//!
//! A poll moves through [`WaitState`]: `Idle` until started, `Polling` while
//! attempts run, then exactly one terminal state. The attempt schedule depends
//! only on the [`WaitSpec`] and the clock, so a [`ManualClock`] reproduces it
//! exactly in tests. The loop runs on the calling thread and spawns nothing.

mod clock;
mod spec;

pub use clock::{Clock, ManualClock, SystemClock};
pub use spec::{CancelToken, WaitSpec, DEFAULT_INTERVAL, DEFAULT_MAX_INTERVAL, DEFAULT_TIMEOUT};

use crate::trace::{trace_debug, trace_event, trace_span, trace_warn};
use crate::util::LocateResult;
use std::time::Duration;

/// Lifecycle of one poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitState {
    Idle,
    Polling,
    Succeeded,
    TimedOut,
    Cancelled,
    /// The predicate raised a non-recoverable error; the error is returned to
    /// the caller instead of a report.
    Failed,
}

impl WaitState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, WaitState::Idle | WaitState::Polling)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WaitState::Idle => "idle",
            WaitState::Polling => "polling",
            WaitState::Succeeded => "succeeded",
            WaitState::TimedOut => "timed_out",
            WaitState::Cancelled => "cancelled",
            WaitState::Failed => "failed",
        }
    }
}

/// How a poll ended.
#[derive(Clone, Debug, PartialEq)]
pub struct WaitReport<T> {
    /// `Succeeded`, `TimedOut` or `Cancelled`.
    pub state: WaitState,
    /// The predicate's value when it succeeded.
    pub value: Option<T>,
    /// Start offset of every attempt.
    pub attempts: Vec<Duration>,
    pub elapsed: Duration,
}

impl<T> WaitReport<T> {
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    pub fn succeeded(&self) -> bool {
        self.state == WaitState::Succeeded
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

/// Runs predicates until they produce a value.
#[derive(Clone, Debug, Default)]
pub struct WaitExecutor<C = SystemClock> {
    clock: C,
}

impl WaitExecutor<SystemClock> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> WaitExecutor<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Polls `predicate` until it returns `Some`, the timeout passes, or the
    /// spec's token is cancelled.
    ///
    /// `Ok(None)` and recoverable errors count as "not yet". A non-recoverable
    /// error ends the poll at once and is returned. An invalid spec fails
    /// before the first attempt.
    pub fn run<T, F>(&self, spec: &WaitSpec, mut predicate: F) -> LocateResult<WaitReport<T>>
    where
        F: FnMut() -> LocateResult<Option<T>>,
    {
        spec.validate()?;
        let _span = trace_span!(
            "wait_poll",
            timeout_ms = spec.timeout.as_millis() as u64,
            interval_ms = spec.interval.as_millis() as u64
        )
        .entered();

        let start = self.clock.now();
        let mut interval = spec.interval;
        let mut attempts = Vec::new();
        let finish = |state: WaitState, value: Option<T>, attempts: Vec<Duration>| {
            let elapsed = self.clock.now().saturating_sub(start);
            trace_event!(
                "wait finished",
                state = state.as_str(),
                attempts = attempts.len(),
                elapsed_ms = elapsed.as_millis() as u64
            );
            WaitReport {
                state,
                value,
                attempts,
                elapsed,
            }
        };

        loop {
            if spec.cancel.is_cancelled() {
                return Ok(finish(WaitState::Cancelled, None, attempts));
            }

            attempts.push(self.clock.now().saturating_sub(start));
            match predicate() {
                Ok(Some(value)) => return Ok(finish(WaitState::Succeeded, Some(value), attempts)),
                Ok(None) => {}
                Err(err) if err.is_recoverable() => {
                    trace_debug!(
                        "attempt failed",
                        attempt = attempts.len(),
                        error = err.to_string().as_str()
                    );
                }
                Err(err) => {
                    trace_warn!(
                        "wait failed",
                        state = WaitState::Failed.as_str(),
                        attempt = attempts.len(),
                        error = err.to_string().as_str()
                    );
                    return Err(err);
                }
            }

            let elapsed = self.clock.now().saturating_sub(start);
            if elapsed >= spec.timeout {
                return Ok(finish(WaitState::TimedOut, None, attempts));
            }
            self.clock.sleep(interval.min(spec.timeout - elapsed));
            interval = spec.next_interval(interval);
        }
    }

    /// Runs `action` up to `max_retries + 1` times, sleeping `interval`
    /// between tries.
    ///
    /// Only recoverable errors are retried; the last error is returned when
    /// all tries fail. The closure receives the zero-based try index.
    pub fn retry<T, F>(
        &self,
        max_retries: u32,
        interval: Duration,
        mut action: F,
    ) -> LocateResult<T>
    where
        F: FnMut(u32) -> LocateResult<T>,
    {
        let mut attempt = 0;
        loop {
            match action(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_recoverable() && attempt < max_retries => {
                    trace_debug!(
                        "retrying",
                        attempt = attempt,
                        error = err.to_string().as_str()
                    );
                    attempt += 1;
                    self.clock.sleep(interval);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

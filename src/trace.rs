//! Conditional tracing macros (zero-cost when feature disabled).
//!
//! These macros emit `tracing` spans and events when the `tracing` feature is
//! enabled and compile to nothing otherwise. Field values are still evaluated
//! when disabled so call sites do not trigger unused-variable warnings.

/// Create an info-level span for a major operation.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Emit an info-level event.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($msg:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!($($key = $value),+, $msg)
    };
    ($msg:expr) => {
        tracing::info!($msg)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($msg:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($(&$value,)+);
    };
    ($msg:expr) => {};
}

/// Emit a debug-level event.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($msg:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug!($($key = $value),+, $msg)
    };
    ($msg:expr) => {
        tracing::debug!($msg)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($msg:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($(&$value,)+);
    };
    ($msg:expr) => {};
}

/// Emit a warn-level event.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($msg:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::warn!($($key = $value),+, $msg)
    };
    ($msg:expr) => {
        tracing::warn!($msg)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($msg:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($(&$value,)+);
    };
    ($msg:expr) => {};
}

pub(crate) use trace_debug;
pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_warn;

/// A no-op span guard used when tracing is disabled.
///
/// Lets `let _span = trace_span!(...).entered();` compile without conditional
/// code at call sites.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Returns self, mimicking `Span::entered()`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}

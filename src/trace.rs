//! Conditional tracing macros.
//!
//! With the `tracing` feature enabled these forward to the `tracing` crate;
//! without it they expand to nothing, so the per-frame hot path pays no cost.
//! Spans wrap whole stages (`postprocess`, `decode`, `suppress`), events carry
//! per-frame counts, and warnings flag data anomalies such as a class index
//! that does not fit the label table.

/// Create a debug-level span around one pipeline stage.
///
/// With the `tracing` feature this expands to `tracing::debug_span!`. Without
/// it the macro returns a `NoopSpan`, so call sites can always write
/// `let _span = trace_span!(...).entered();` and fields are never evaluated.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::debug_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Emit a debug-level event carrying per-frame counts.
///
/// With the `tracing` feature this calls `tracing::debug!` with the event name
/// and fields. Without it the field values are still evaluated and then
/// discarded, which keeps variables used only for tracing warning-free.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

/// Emit a warn-level event for a recoverable data anomaly.
///
/// Used where processing continues but the result may surprise the caller,
/// such as a class index outside the label table. Expands like
/// `trace_event!` but at `warn` level.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::warn!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_warn;

/// Stand-in span guard when tracing is compiled out.
///
/// Exists so `trace_span!(...).entered()` type-checks without conditional
/// compilation at each call site.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Returns itself, mirroring `Span::entered()`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}

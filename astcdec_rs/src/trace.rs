//! Diagnostic output for the block decoding pipeline.
//!
//! The decoder has no global logging state.
//! Callers that want to inspect how a block was interpreted pass a [Trace] to the
//! [Decoder](crate::Decoder) and receive a message for each decoding stage.
use core::fmt::Arguments;

/// A destination for per block diagnostic messages.
pub trait Trace: Send + Sync {
    fn trace(&self, args: Arguments<'_>);

    /// Returns `false` if messages are discarded.
    /// Decoding skips formatting diagnostics for disabled traces.
    fn enabled(&self) -> bool {
        true
    }
}

/// A [Trace] that discards all messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrace;

impl Trace for NoTrace {
    #[inline]
    fn trace(&self, _args: Arguments<'_>) {}

    fn enabled(&self) -> bool {
        false
    }
}

/// Format a message only if the trace is enabled.
macro_rules! block_trace {
    ($trace:expr, $($arg:tt)*) => {
        if $trace.enabled() {
            $trace.trace(format_args!($($arg)*));
        }
    };
}
pub(crate) use block_trace;

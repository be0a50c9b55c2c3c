use std::fmt::Arguments;

use astcdec_rs::Trace;

/// A [Trace] that forwards block diagnostics to the `tracing` crate at the `TRACE` level.
///
/// Messages are only formatted when a subscriber has enabled `TRACE` for this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTrace;

impl Trace for TracingTrace {
    fn trace(&self, args: Arguments<'_>) {
        tracing::trace!("{}", args);
    }

    fn enabled(&self) -> bool {
        tracing::enabled!(tracing::Level::TRACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_trace_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TracingTrace>();
    }

    #[test]
    fn disabled_without_subscriber() {
        assert!(!TracingTrace.enabled());
    }

    #[test]
    fn tracing_trace_as_trait_object() {
        let trace: &dyn Trace = &TracingTrace;
        trace.trace(format_args!("block mode {}", 66));
    }
}

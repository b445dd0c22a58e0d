//! Lightweight call-timing instrumentation.
//!
//! The original decorates functions with `@timed`, logging elapsed time at
//! DEBUG. Rust has no decorator syntax for free functions, so this module
//! exposes a `time_block!` macro that wraps an expression in a `tracing`
//! span and emits a `debug!` event with the elapsed duration — the same
//! observable behavior, expressed the way the language allows.

/// Runs `$body`, emitting a `tracing::debug!` with the elapsed time tagged
/// under `$label`. Returns the body's value.
#[macro_export]
macro_rules! time_block {
    ($label:expr, $body:expr) => {{
        let __start = std::time::Instant::now();
        let __result = $body;
        tracing::debug!(
            label = $label,
            elapsed_ms = __start.elapsed().as_secs_f64() * 1000.0,
            "timed block finished"
        );
        __result
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn time_block_returns_inner_value() {
        let value = time_block!("unit-test", { 1 + 1 });
        assert_eq!(value, 2);
    }
}

/// Base used for log-period transforms unless the caller overrides it.
pub const DEFAULT_LOG_BASE: f64 = 10.0;

/// Linear to log scale: `ln(value) / ln(base)`.
pub fn lin_to_log(value: f64, base: f64) -> f64 {
    value.ln() / base.ln()
}

/// Log to linear scale: `base^value`.
pub fn log_to_lin(value: f64, base: f64) -> f64 {
    base.powf(value)
}

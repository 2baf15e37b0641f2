//! Per-item diagnostics for skipped or malformed inputs.
//!
//! Batch runs never stop on a bad file; they report it here and move on.

/// Format an error message with a uniform prefix.
pub fn error_message(msg: impl Into<String>) -> String {
    format!("qoe-metrics: {}", msg.into())
}

/// Report a skipped or malformed item.
pub fn warn(msg: impl Into<String>) {
    log::warn!("{}", msg.into());
}

/// Report a per-file failure whose result is omitted from the output.
pub fn error(err: &impl std::fmt::Display) {
    log::error!("{}", error_message(err.to_string()));
}

/// Install the logger: `info` unless `RUST_LOG` says otherwise, on stdout.
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .format_timestamp(None)
        .init();
}

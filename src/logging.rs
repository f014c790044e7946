//! Logging setup for hosts that do not install their own logger.

/// Install an `env_logger` logger honoring `RUST_LOG`, defaulting to `info`.
///
/// Returns `false` if a logger was already installed.
pub fn init_logging() -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

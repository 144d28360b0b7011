//! Logging initialization and utilities

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info` and millisecond
/// timestamps. Override with RUST_LOG environment variable.
///
/// # Example
/// ```no_run
/// voxstream::core::logging::init();
/// log::info!("World streamer started");
/// ```
pub fn init() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    )
    .format_timestamp_millis()
    .init();
}

/// Like [`init`], but safe to call more than once (tests, benches).
pub fn try_init() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    )
    .is_test(true)
    .try_init();
}

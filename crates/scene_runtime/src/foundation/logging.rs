//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from the `RUST_LOG` environment variable
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with an explicit filter string (e.g. `"info"`
/// or `"scene_runtime=debug"`).
///
/// Returns `false` if a logger was already installed; the existing logger is
/// kept in that case.
pub fn init_with_level(filter: &str) -> bool {
    env_logger::Builder::new()
        .parse_filters(filter)
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

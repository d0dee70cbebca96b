//! Logging setup for processes embedding the storage backend.
//!
//! Backends emit `tracing` events (`debug` per operation, `info` on connect
//! and close, `warn` on misuse). This module installs a formatting
//! subscriber for binaries and tests that do not bring their own.

use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` wins, otherwise `default_level`.
///
/// Falls back to `info` when `default_level` is not a valid directive.
pub fn env_filter(default_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(default_level.unwrap_or("info"))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Install a global `fmt` subscriber.
///
/// Returns `false` if a global subscriber was already set, which makes it
/// safe to call from every test.
pub fn init_logging(default_level: Option<&str>) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Install a subscriber using the `[logging]` section of the configuration.
#[cfg(feature = "config")]
pub fn init_from_config(config: &crate::config::LoggingConfig) -> bool {
    init_logging(Some(&config.log_level))
}

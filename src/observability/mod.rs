//! Observability utilities for entity storage.
//!
//! Storage backends log through `tracing`; this module wires a subscriber.
//!
//! # Example
//!
//! ```no_run
//! use entity_storage::observability::init_logging;
//!
//! // RUST_LOG takes precedence over the level given here
//! init_logging(Some("debug"));
//! ```

/// Subscriber setup
pub mod logger;

// Re-export main functions for convenience
pub use logger::{env_filter, init_logging};

#[cfg(feature = "config")]
pub use logger::init_from_config;

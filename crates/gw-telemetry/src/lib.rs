//! Observability bootstrap for gangway embeddings.
//!
//! The library crates only emit through `tracing` macros and never
//! install a subscriber; binaries, demos, and test runs call into
//! [`logging`] to get one. Both human-readable and JSON output are
//! supported, filtered through `RUST_LOG` when set.

pub mod logging;

pub use logging::{init_logging, init_logging_json};

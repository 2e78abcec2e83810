//! Error types for the skilling server binary.
//!
//! [`ServerError`] wraps every failure mode during startup so `main` can
//! propagate with `?`.

use skilling_types::{ActivityFamily, TargetId};

/// Top-level error for the skilling server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: skilling_core::config::ConfigError,
    },

    /// Catalog loading failed.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: skilling_core::catalog::CatalogError,
    },

    /// Tick clock setup failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: skilling_core::clock::ClockError,
    },

    /// A configured bot could not start gathering.
    #[error("bot {family}/{target} failed to start: {source}")]
    Bot {
        /// Family the bot was configured for.
        family: ActivityFamily,
        /// Target the bot was configured for.
        target: TargetId,
        /// Why the engine rejected it.
        source: skilling_core::engine::StartError,
    },

    /// The logging filter directive is invalid.
    #[error("invalid log filter {directive:?}: {message}")]
    LogFilter {
        /// The rejected directive.
        directive: String,
        /// Parser message.
        message: String,
    },
}

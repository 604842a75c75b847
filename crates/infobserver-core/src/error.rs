//! Error types shared by the queue contract and configuration model.
//!
//! Other crates in the workspace define their own error enums at their own
//! boundaries (`infobserver_sources::SourceError`, `infobserver_store::StoreError`,
//! `infobserver_rules::RuleEngineError`) following the same `thiserror` shape.

use thiserror::Error;

/// Errors raised by a [`crate::queue::Queue`] implementation.
#[derive(Debug, Error)]
pub enum QueueError {
    /// A non-blocking `put` was attempted on a queue already at its configured
    /// maximum length.
    #[error("queue is full (max size {max_size})")]
    QueueFull { max_size: usize },

    /// A non-blocking `get` was attempted on a queue with no items available.
    #[error("queue is empty")]
    QueueEmpty,

    /// The external queue backend (broker) rejected or failed an operation.
    #[error("external queue backend error: {0}")]
    Backend(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("unknown source type: {0}")]
    UnknownSourceType(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised by an [`crate::index_cache::IndexCache`] implementation.
#[derive(Debug, Error)]
pub enum IndexCacheError {
    #[error("index cache query failed: {0}")]
    Query(String),

    #[error("index cache write failed: {0}")]
    Write(String),
}

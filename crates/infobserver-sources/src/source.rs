//! The source producer contract (spec §4.3): a spawn-a-loop-with-sleep shape,
//! each implementation owning its own polling cadence and realization logic.

use std::sync::Arc;

use async_trait::async_trait;
use infobserver_core::{Queue, RawEvent};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The upstream API rejected our credentials. Spec §4.3: this terminates
    /// the producer task outright, it is not retried.
    #[error("bad credentials for source {source}")]
    BadCredentials { source: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("response decode error: {0}")]
    Decode(String),

    #[error("unknown source registry tag: {0}")]
    UnknownTag(String),

    #[error("csv source requires a `path` entry in its configuration")]
    MissingPath,

    #[error("index cache error: {0}")]
    IndexCache(#[from] infobserver_core::error::IndexCacheError),
}

/// A long-running producer task (spec §4.3): query origin, dedup against the
/// index cache, realize content, enqueue, sleep, repeat. `run` returns only
/// when the producer cannot continue — a fatal auth failure, or (for a
/// single-pass source like CSV replay) after exhausting its input.
#[async_trait]
pub trait Source: Send + Sync {
    /// The registry tag this instance was built for, used only for logging.
    fn name(&self) -> &'static str;

    async fn run(&self, raw_queue: Arc<dyn Queue<RawEvent>>) -> Result<(), SourceError>;
}

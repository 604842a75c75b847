//! Spawns every built source as its own long-running task (spec §4.4).
//!
//! One `tokio::spawn` per loop, logged at spawn time, `JoinHandle`s kept so
//! the orchestrator can observe a producer dying.

use std::sync::Arc;

use infobserver_core::{Queue, RawEvent};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::source::{Source, SourceError};

/// Spawns one task per `source`, each running [`Source::run`] until it
/// terminates. A terminated producer (bad credentials, or a single-pass
/// source finishing its replay) does not bring down the rest of the
/// pipeline — its `JoinHandle`'s result is just logged.
pub fn schedule_sources(
    sources: Vec<Arc<dyn Source>>,
    raw_queue: Arc<dyn Queue<RawEvent>>,
) -> Vec<JoinHandle<()>> {
    sources
        .into_iter()
        .map(|source| {
            let raw_queue = raw_queue.clone();
            let name = source.name();
            info!("spawning source producer: {name}");
            tokio::spawn(async move {
                match source.run(raw_queue).await {
                    Ok(()) => info!("source producer {name} finished"),
                    Err(SourceError::BadCredentials { source }) => {
                        error!("source producer {source} terminated: bad credentials")
                    }
                    Err(err) => error!("source producer {name} terminated: {err}"),
                }
            })
        })
        .collect()
}

//! Event model, queue contract, config model, error taxonomy, and logging
//! bootstrap shared by every other crate in the workspace.

pub mod config;
pub mod error;
pub mod event;
pub mod index_cache;
pub mod logging;
pub mod queue;

pub use config::Config;
pub use event::{
    ChildFile, EventPayload, Match, MatchUnit, MatchedString, ProcessedEvent, RawEvent, SourceTag,
    BLACKLISTED_EXTENSIONS, BLACKLIST_RULE,
};
pub use index_cache::{InMemoryIndexCache, IndexCache};
pub use queue::{Queue, SimpleQueue};

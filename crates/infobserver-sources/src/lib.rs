//! Source producers and the registry/scheduler that wire them up (spec
//! §4.3, §4.4).

pub mod csv;
pub mod github;
pub mod gist;
pub mod pastebin;
pub mod registry;
pub mod scheduler;
pub mod source;

pub use registry::build_sources;
pub use scheduler::schedule_sources;
pub use source::{Source, SourceError};

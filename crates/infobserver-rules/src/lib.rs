//! Rule-matching engine wrapper and consumer state machine (spec §4.5).

pub mod engine;
pub mod matcher;

pub use engine::{resolve_rule_files, RuleEngine, RuleEngineError, RuleFileMap};
pub use matcher::{MatcherHandle, MatcherState, RuleMatchingConsumer};

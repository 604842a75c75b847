//! The rule-matching engine wrapper: a compile-once, match-many wrapper
//! around the `yara` crate. Treated by the rest of the workspace as a black
//! box producing structured matches (spec §1).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use infobserver_core::{Match, MatchedString};
use thiserror::Error;

/// Namespace -> rule file path. The namespace is the file path itself.
pub type RuleFileMap = HashMap<String, PathBuf>;

#[derive(Debug, Error)]
pub enum RuleEngineError {
    #[error("invalid rule file glob pattern {pattern}: {source}")]
    GlobPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("yara initialization error: {0}")]
    Init(#[from] yara::YaraError),

    #[error("yara compile/scan error: {0}")]
    Compile(#[from] yara::Error),
}

/// Resolves a list of rule file path patterns (each may contain `*` globs,
/// per spec §4.5 `add_rules`) into a namespace->path map. Mirrors
/// `YaraProcessor._get_file_sources`: a literal existing file is used as-is,
/// otherwise the pattern is glob-expanded.
pub fn resolve_rule_files(patterns: &[String]) -> Result<RuleFileMap, RuleEngineError> {
    let mut resolved = RuleFileMap::new();
    for pattern in patterns {
        let literal = Path::new(pattern);
        if literal.is_file() {
            resolved.insert(literal.to_string_lossy().into_owned(), literal.to_path_buf());
            continue;
        }
        let paths = glob::glob(pattern).map_err(|source| RuleEngineError::GlobPattern {
            pattern: pattern.clone(),
            source,
        })?;
        for entry in paths.flatten() {
            resolved.insert(entry.to_string_lossy().into_owned(), entry);
        }
    }
    Ok(resolved)
}

/// A compiled YARA ruleset ready to scan event content.
pub struct RuleEngine {
    rules: yara::Rules,
}

impl RuleEngine {
    /// Compiles `rule_files` (namespace -> path) with `ext_vars` bound as
    /// YARA external variables.
    pub fn compile(
        rule_files: &RuleFileMap,
        ext_vars: &HashMap<String, String>,
    ) -> Result<Self, RuleEngineError> {
        let mut compiler = yara::Compiler::new()?;
        for (namespace, path) in rule_files {
            compiler = compiler.add_rules_file_with_namespace(path, namespace)?;
        }
        for (name, value) in ext_vars {
            compiler = compiler.define_variable(name, value.as_str())?;
        }
        let rules = compiler.compile_rules()?;
        Ok(Self { rules })
    }

    /// Matches `data` against the compiled rules, returning every firing
    /// rule's name, tags, and decoded matched substrings (spec §3 Match).
    /// Matched string bytes are decoded as UTF-8 with lossy fallback rather
    /// than rejecting the whole match on invalid bytes.
    pub fn scan(&self, data: &[u8]) -> Result<Vec<Match>, RuleEngineError> {
        const SCAN_TIMEOUT_SECONDS: i32 = 15;
        let hits = self.rules.scan_mem(data, SCAN_TIMEOUT_SECONDS)?;

        Ok(hits
            .into_iter()
            .map(|rule| {
                let tags = rule.tags.iter().map(|tag| tag.to_string()).collect();
                let matched_strings = rule
                    .strings
                    .iter()
                    .flat_map(|string| string.matches.iter())
                    .map(|m| MatchedString::new(String::from_utf8_lossy(&m.data).into_owned()))
                    .collect();
                Match::new(rule.identifier.to_string(), tags, matched_strings)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn resolve_rule_files_includes_literal_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rule dummy {{ condition: true }}").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let resolved = resolve_rule_files(&[path.clone()]).unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved.contains_key(&path));
    }

    #[test]
    fn resolve_rule_files_expands_glob_for_missing_literal() {
        let dir = tempfile::tempdir().unwrap();
        let rule_path = dir.path().join("a.yar");
        std::fs::write(&rule_path, "rule a { condition: true }").unwrap();

        let pattern = dir.path().join("*.yar").to_string_lossy().into_owned();
        let resolved = resolve_rule_files(&[pattern]).unwrap();
        assert_eq!(resolved.len(), 1);
    }
}

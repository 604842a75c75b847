//! Configuration model.
//!
//! Loads the YAML document described in spec §6 into [`Config`]: nested
//! sub-structs per concern, a `validate()` pass, and `Default` impls for
//! every key that has a documented default. Loads from a file path rather
//! than environment variables.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

fn default_scrape_interval() -> u64 {
    60
}

fn default_yara_paths() -> Vec<String> {
    vec!["yara/*.yar".to_string()]
}

fn default_log_level() -> String {
    "DEBUG".to_string()
}

/// Top-level configuration document (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default = "default_scrape_interval")]
    pub global_scrape_interval: u64,

    #[serde(default = "default_yara_paths")]
    pub yara_rules_paths: Vec<String>,

    #[serde(default)]
    pub yara_external_vars: Option<HashMap<String, String>>,

    #[serde(default)]
    pub processing_queue_size: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub postgres: PostgresConfig,

    #[serde(default)]
    pub redis: Option<RedisConfig>,

    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
}

/// Connection pool kwargs for the relational store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    #[serde(default = "default_pg_host")]
    pub host: String,
    #[serde(default = "default_pg_port")]
    pub port: u16,
    #[serde(default = "default_pg_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_pg_dbname")]
    pub dbname: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_pg_host() -> String {
    "localhost".to_string()
}
fn default_pg_port() -> u16 {
    5432
}
fn default_pg_user() -> String {
    "postgres".to_string()
}
fn default_pg_dbname() -> String {
    "infobserver".to_string()
}
fn default_pool_size() -> u32 {
    10
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: default_pg_host(),
            port: default_pg_port(),
            user: default_pg_user(),
            password: String::new(),
            dbname: default_pg_dbname(),
            pool_size: default_pool_size(),
        }
    }
}

impl PostgresConfig {
    /// Build a libpq connection string for the diesel `ConnectionManager`.
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{user}:{password}@{host}:{port}/{dbname}",
            user = self.user,
            password = self.password,
            host = self.host,
            port = self.port,
            dbname = self.dbname,
        )
    }
}

/// `redis: {host, port}` — presence selects the external queue variant (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
}

impl RedisConfig {
    pub fn connection_url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

/// Per-source configuration entry. The map key in `sources` is the source's
/// registry tag (`gist`, `pastebin`, `github-public-events`, `csv`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourceConfig {
    #[serde(default)]
    pub scrape_interval: Option<u64>,
    #[serde(default)]
    pub oauth: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub dev_key: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl SourceConfig {
    /// Resolves the effective poll interval: per-source override, else the
    /// configured global default.
    pub fn effective_interval(&self, global: u64) -> u64 {
        self.scrape_interval.unwrap_or(global)
    }
}

impl Config {
    /// Loads configuration from `path`. A missing file is tolerated — the
    /// document is treated as empty and every field falls back to its
    /// default.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Config::default());
            }
            Err(err) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source: err,
                });
            }
        };

        serde_yaml::from_str(&contents).map_err(|err| ConfigError::Parse {
            path: path.display().to_string(),
            source: err,
        })
    }

    /// Validates cross-field invariants that serde's defaulting can't express.
    pub fn validate(&self) -> ConfigResult<()> {
        for (tag, _) in &self.sources {
            if !matches!(
                tag.as_str(),
                "gist" | "pastebin" | "github-public-events" | "csv"
            ) {
                return Err(ConfigError::UnknownSourceType(tag.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let config = Config::load("/nonexistent/path/to/config.yaml").unwrap();
        assert_eq!(config.global_scrape_interval, 60);
        assert_eq!(config.yara_rules_paths, vec!["yara/*.yar".to_string()]);
        assert_eq!(config.log_level, "DEBUG");
        assert_eq!(config.processing_queue_size, 0);
        assert!(config.redis.is_none());
    }

    #[test]
    fn parses_full_document() {
        let yaml = r#"
global_scrape_interval: 30
processing_queue_size: 100
log_level: INFO
postgres:
  host: db.internal
  port: 5432
  user: infobserver
  password: secret
  dbname: infobserver
redis:
  host: cache.internal
  port: 6379
sources:
  gist:
    oauth: "abc123"
    username: "bot"
  csv:
    path: "/tmp/replay.csv"
    scrape_interval: 5
"#;
        let dir = tempfile_path(yaml);
        let config = Config::load(&dir).unwrap();
        assert_eq!(config.global_scrape_interval, 30);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(
            config.sources["csv"].effective_interval(config.global_scrape_interval),
            5
        );
        assert_eq!(
            config.sources["gist"].effective_interval(config.global_scrape_interval),
            30
        );
        assert_eq!(config.redis.unwrap().connection_url(), "redis://cache.internal:6379");
        config.validate().unwrap();
    }

    #[test]
    fn rejects_unknown_source_type() {
        let mut config = Config::default();
        config.sources.insert("gitlab".to_string(), SourceConfig::default());
        assert!(config.validate().is_err());
    }

    fn tempfile_path(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "infobserver-config-test-{}.yaml",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }
}

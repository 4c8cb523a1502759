//! Configuration management for the ReviewForge pipeline
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values
//!
//! The review configuration is an explicit object handed to the merge
//! engine and reporting layers at construction time; nothing in the
//! workspace reads process-wide state.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main review configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReviewConfig {
    /// Review run metadata (versions and timeframe)
    #[serde(default)]
    pub review: ReviewMeta,

    /// Topics searched, each with its own query list
    #[serde(default)]
    pub topics: Vec<TopicConfig>,

    /// Merge and conflict-resolution configuration
    #[serde(default)]
    pub merge: MergeConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReviewMeta {
    /// Search strategy version recorded in every report
    #[serde(default = "default_search_version")]
    pub search_version: String,

    /// Screening prompt/criteria version recorded in every report
    #[serde(default = "default_screening_version")]
    pub screening_version: String,

    /// Start of the fixed publication window (inclusive, YYYY-MM-DD)
    #[serde(default = "default_start_date")]
    pub start_date: String,

    /// End of the fixed publication window (inclusive, YYYY-MM-DD)
    #[serde(default = "default_end_date")]
    pub end_date: String,
}

/// One review topic and the queries that feed it
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopicConfig {
    /// Short key used in directory and file names
    pub key: String,

    /// Human-readable topic name
    pub name: String,

    /// One-line topic description
    #[serde(default)]
    pub description: String,

    /// Search queries collected under this topic
    #[serde(default)]
    pub queries: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MergeConfig {
    /// Conflict resolution strategy: force_include, force_exclude,
    /// highest_confidence, most_recent, manual
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Resolve conflicts interactively, overriding `strategy` with the
    /// manual one
    #[serde(default)]
    pub interactive: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions
fn default_search_version() -> String { "v1.0".to_string() }
fn default_screening_version() -> String { "v1.0".to_string() }
fn default_start_date() -> String { "2022-01-01".to_string() }
fn default_end_date() -> String { "2025-01-01".to_string() }
fn default_strategy() -> String { "highest_confidence".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for ReviewMeta {
    fn default() -> Self {
        Self {
            search_version: default_search_version(),
            screening_version: default_screening_version(),
            start_date: default_start_date(),
            end_date: default_end_date(),
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            interactive: false,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ReviewConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__MERGE__STRATEGY=most_recent
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// The searched timeframe as a single display string
    pub fn timeframe(&self) -> String {
        format!("{} to {}", self.review.start_date, self.review.end_date)
    }

    /// Total number of queries across all topics
    pub fn query_count(&self) -> usize {
        self.topics.iter().map(|t| t.queries.len()).sum()
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            review: ReviewMeta::default(),
            topics: Vec::new(),
            merge: MergeConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReviewConfig::default();
        assert_eq!(config.merge.strategy, "highest_confidence");
        assert!(!config.merge.interactive);
        assert_eq!(config.timeframe(), "2022-01-01 to 2025-01-01");
    }

    #[test]
    fn test_query_count() {
        let mut config = ReviewConfig::default();
        config.topics.push(TopicConfig {
            key: "attack".into(),
            name: "Attack Techniques".into(),
            description: "Jailbreak and prompt injection".into(),
            queries: vec!["\"jailbreak\"".into(), "\"prompt injection\"".into()],
        });
        config.topics.push(TopicConfig {
            key: "defense".into(),
            name: "Defense Strategies".into(),
            description: String::new(),
            queries: vec!["\"guardrails\"".into()],
        });
        assert_eq!(config.query_count(), 3);
    }
}

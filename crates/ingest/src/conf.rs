//! Conf — ingest configuration model and loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Log type of every input line; when unset each line is classified
    pub log_type: Option<String>,
    /// Restrict classification to these log types (empty = all registered)
    pub candidate_log_types: Vec<String>,
    /// Input file; stdin when unset
    pub input_path: Option<String>,
    /// Number of parse workers
    pub workers: usize,
    /// Lines handed to the workers per round
    pub batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            log_type: None,
            candidate_log_types: Vec::new(),
            input_path: None,
            workers: 4,
            batch_size: 1024,
        }
    }
}

impl IngestConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, IngestError> {
        let config_path = std::env::var("INGEST_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/normalize/ingest.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::from_env()
        };

        // Environment variables override file config
        if let Ok(log_type) = std::env::var("INGEST_LOG_TYPE") {
            config.log_type = Some(log_type);
        }
        if let Ok(path) = std::env::var("INGEST_INPUT") {
            config.input_path = Some(path);
        }
        if let Some(workers) = env_parse("INGEST_WORKERS") {
            config.workers = workers;
        }
        if let Some(batch_size) = env_parse("INGEST_BATCH_SIZE") {
            config.batch_size = batch_size;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, IngestError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, IngestError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_type: std::env::var("INGEST_LOG_TYPE").ok(),
            candidate_log_types: std::env::var("INGEST_CANDIDATE_LOG_TYPES")
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            input_path: std::env::var("INGEST_INPUT").ok(),
            workers: env_parse("INGEST_WORKERS").unwrap_or(defaults.workers),
            batch_size: env_parse("INGEST_BATCH_SIZE").unwrap_or(defaults.batch_size),
        }
    }

    /// Sanity-check configuration values
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.workers == 0 {
            return Err(IngestError::Config("workers must be > 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(IngestError::Config("batch_size must be > 0".to_string()));
        }
        if self.log_type.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(IngestError::Config("log_type must not be blank".to_string()));
        }
        if let Some(path) = &self.input_path {
            if !Path::new(path).exists() {
                return Err(IngestError::Config(format!("input not found at: {}", path)));
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = IngestConfig::default();
        assert!(cfg.log_type.is_none());
        assert!(cfg.candidate_log_types.is_empty());
        assert!(cfg.input_path.is_none());
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.batch_size, 1024);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial_uses_defaults() {
        let cfg = IngestConfig::from_toml(
            r#"
            log_type = "Fluentd.Syslog5424"
            workers = 8
            "#,
        )
        .unwrap();
        assert_eq!(cfg.log_type.as_deref(), Some("Fluentd.Syslog5424"));
        assert_eq!(cfg.workers, 8);
        assert_eq!(cfg.batch_size, 1024);
    }

    #[test]
    fn test_from_toml_candidates() {
        let cfg = IngestConfig::from_toml(
            r#"candidate_log_types = ["AWS.CloudTrail", "Syslog.RFC5424"]"#,
        )
        .unwrap();
        assert_eq!(cfg.candidate_log_types.len(), 2);
    }

    #[test]
    fn test_from_toml_invalid() {
        assert!(matches!(
            IngestConfig::from_toml("workers = \"many\""),
            Err(IngestError::ConfigFile(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let cfg = IngestConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(IngestError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let cfg = IngestConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_log_type() {
        let cfg = IngestConfig {
            log_type: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_input() {
        let cfg = IngestConfig {
            input_path: Some("/nonexistent/input.log".to_string()),
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/input.log"));
    }
}

//! agrikg Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with sensible defaults for local use.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction engine configuration
    pub extraction: ExtractionConfig,

    /// Graph search configuration
    pub search: SearchConfig,

    /// Question answering configuration
    pub qa: QaConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Apply every environment variable that is set (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        // Extraction
        if let Ok(scheme) = std::env::var("AGRIKG_ID_SCHEME") {
            self.extraction.id_scheme = scheme.parse()?;
        }
        if let Ok(scope) = std::env::var("AGRIKG_RELATION_SCOPE") {
            self.extraction.relation_scope = scope.parse()?;
        }
        if let Ok(path) = std::env::var("AGRIKG_RULES_FILE") {
            self.extraction.rules_file = Some(PathBuf::from(path));
        }

        // Search
        if let Ok(limit) = std::env::var("AGRIKG_SEARCH_LIMIT") {
            self.search.default_limit = limit.parse().map_err(|_| ConfigError::InvalidValue {
                key: "AGRIKG_SEARCH_LIMIT".to_string(),
                value: limit,
            })?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            self.logging.json_format = matches!(json.to_lowercase().as_str(), "1" | "true");
        }

        Ok(self)
    }
}

/// Extraction engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How entity ids are assigned
    pub id_scheme: IdScheme,

    /// How structured extraction pairs crops with diseases
    pub relation_scope: RelationScope,

    /// Optional TOML file replacing the curated knowledge rules
    pub rules_file: Option<PathBuf>,
}

/// Entity id assignment scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdScheme {
    /// `<type>_<seq:03>`, sequence restarts with every extraction call.
    /// Ids from different batches can collide; the graph keeps the last write.
    #[default]
    PerBatch,
    /// `<type>_<uuid v5 of type+name>`, identical across batches
    Stable,
}

impl std::str::FromStr for IdScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_batch" | "per-batch" => Ok(Self::PerBatch),
            "stable" => Ok(Self::Stable),
            _ => Err(ConfigError::InvalidValue {
                key: "AGRIKG_ID_SCHEME".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Scope of the crop x disease cross-product in structured extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationScope {
    /// Pair crops and diseases found in the same record
    #[default]
    PerRecord,
    /// After each record, pair every crop and disease accumulated so far
    Cumulative,
}

impl std::str::FromStr for RelationScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_record" | "per-record" => Ok(Self::PerRecord),
            "cumulative" => Ok(Self::Cumulative),
            _ => Err(ConfigError::InvalidValue {
                key: "AGRIKG_RELATION_SCOPE".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Graph search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result limit when the caller gives none
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_limit: 5 }
    }
}

/// Question answering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// Hits considered by the fallback search handler
    pub fallback_search_limit: usize,

    /// Related entities attached to assisted answers
    pub related_limit: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            fallback_search_limit: 3,
            related_limit: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.extraction.id_scheme, IdScheme::PerBatch);
        assert_eq!(config.extraction.relation_scope, RelationScope::PerRecord);
        assert_eq!(config.search.default_limit, 5);
        assert_eq!(config.qa.fallback_search_limit, 3);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("stable".parse::<IdScheme>().unwrap(), IdScheme::Stable);
        assert_eq!(
            "per-batch".parse::<IdScheme>().unwrap(),
            IdScheme::PerBatch
        );
        assert_eq!(
            "Cumulative".parse::<RelationScope>().unwrap(),
            RelationScope::Cumulative
        );
        assert!("global".parse::<IdScheme>().is_err());
        assert!("none".parse::<RelationScope>().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [extraction]
            id_scheme = "stable"

            [logging]
            json_format = true
            "#,
        )
        .unwrap();

        assert_eq!(config.extraction.id_scheme, IdScheme::Stable);
        assert_eq!(config.extraction.relation_scope, RelationScope::PerRecord);
        assert!(config.logging.json_format);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.search.default_limit, 5);
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/nonexistent/agrikg.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }

    #[test]
    fn test_env_resets_file_value_to_default() {
        let file_config: AppConfig = toml::from_str(
            r#"
            [extraction]
            id_scheme = "stable"
            relation_scope = "cumulative"

            [logging]
            json_format = true
            "#,
        )
        .unwrap();

        std::env::set_var("AGRIKG_ID_SCHEME", "per_batch");
        std::env::set_var("AGRIKG_RELATION_SCOPE", "per_record");
        std::env::set_var("LOG_JSON", "false");
        let merged = file_config.with_env_override();
        std::env::remove_var("AGRIKG_ID_SCHEME");
        std::env::remove_var("AGRIKG_RELATION_SCOPE");
        std::env::remove_var("LOG_JSON");

        let merged = merged.unwrap();
        assert_eq!(merged.extraction.id_scheme, IdScheme::PerBatch);
        assert_eq!(merged.extraction.relation_scope, RelationScope::PerRecord);
        assert!(!merged.logging.json_format);
    }
}

//! Configuration types and loading

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Invoice tracking behaviour
    pub tracking: TrackingConfig,

    /// Where invoice documents are kept
    pub storage: StorageConfig,

    /// Log output
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackingConfig {
    /// What `initialize` does to an invoice that is already tracked
    pub reinit_policy: ReinitPolicy,
    /// How concurrent writers of the same invoice are resolved
    pub write_policy: WritePolicy,
    /// Validate amounts and milestone types before they reach the engine
    pub strict_amounts: bool,
}

/// Behaviour when initializing an already-tracked invoice
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReinitPolicy {
    /// Discard existing history and start over
    #[default]
    Reset,
    /// Keep existing tracking untouched
    Preserve,
}

/// Concurrency policy for whole-document writes
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// The last save overwrites whatever is stored
    #[default]
    LastWriterWins,
    /// Saves carrying a stale lock version are rejected
    Optimistic,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding one JSON document per invoice
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/invoices"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl FromStr for ReinitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(Self::Reset),
            "preserve" => Ok(Self::Preserve),
            other => Err(format!("expected reset or preserve, got {:?}", other)),
        }
    }
}

impl FromStr for WritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last_writer_wins" | "lww" => Ok(Self::LastWriterWins),
            "optimistic" => Ok(Self::Optimistic),
            other => Err(format!("expected last_writer_wins or optimistic, got {:?}", other)),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected pretty or json, got {:?}", other)),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let parse_bool = |v: String| v == "true" || v == "1" || v == "yes";

        // Tracking
        if let Some(v) = lookup("SHOPDESK_REINIT_POLICY") {
            config.tracking.reinit_policy = parse_enum("SHOPDESK_REINIT_POLICY", &v)?;
        }
        if let Some(v) = lookup("SHOPDESK_WRITE_POLICY") {
            config.tracking.write_policy = parse_enum("SHOPDESK_WRITE_POLICY", &v)?;
        }
        if let Some(v) = lookup("SHOPDESK_STRICT_AMOUNTS") {
            config.tracking.strict_amounts = parse_bool(v);
        }

        // Storage
        if let Some(dir) = lookup("SHOPDESK_DATA_DIR") {
            if dir.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "SHOPDESK_DATA_DIR".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            config.storage.data_dir = PathBuf::from(dir);
        }

        // Logging
        if let Some(filter) = lookup("SHOPDESK_LOG") {
            config.logging.filter = filter;
        }
        if let Some(v) = lookup("SHOPDESK_LOG_FORMAT") {
            config.logging.format = parse_enum("SHOPDESK_LOG_FORMAT", &v)?;
        }

        Ok(config)
    }
}

fn parse_enum<T: FromStr<Err = String>>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|message| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    })
}

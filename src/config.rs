//! Configuration management with validation and defaults
//!
//! Loaded from a TOML file when one is given, otherwise built from defaults
//! or one of the presets below.

use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Top-level service configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FairplayConfig {
    pub registry: RegistryConfig,
    pub api: ApiConfig,
    pub monitoring: MonitoringConfig,
}

/// Seed registry configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// JSON snapshot of the seed history; `None` keeps the registry in memory only
    pub state_path: Option<String>,
    /// Length of the generated default client seed
    pub client_seed_length: usize,
    /// Commit a server seed at startup if the history has no active one
    pub commit_on_start: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            state_path: None,
            client_seed_length: 16,
            commit_on_start: true,
        }
    }
}

/// HTTP API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Bearer token required by the reveal endpoint. Reveal is disabled when unset.
    pub operator_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
            operator_token: None,
        }
    }
}

/// Monitoring and logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enable_metrics: bool,
    pub log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            log_level: LogLevel::Info,
        }
    }
}

impl FairplayConfig {
    /// Local development: in-memory registry, verbose logging, open CORS
    pub fn development() -> Self {
        Self {
            api: ApiConfig {
                operator_token: Some("dev-operator-token".to_string()),
                ..Default::default()
            },
            monitoring: MonitoringConfig {
                log_level: LogLevel::Debug,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Production deployment with a persisted seed history
    pub fn production() -> Self {
        Self {
            registry: RegistryConfig {
                state_path: Some("./data/seed_registry.json".to_string()),
                ..Default::default()
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                request_timeout_secs: 10,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file; missing sections fall back to defaults
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigValidationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigValidationError::LoadFailed(format!("{}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| ConfigValidationError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.registry.client_seed_length == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "client_seed_length must be > 0".to_string(),
            ));
        }

        if self.api.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "api.port must be > 0".to_string(),
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        if let Some(token) = &self.api.operator_token {
            if token.trim().is_empty() {
                return Err(ConfigValidationError::InvalidValue(
                    "operator_token must not be blank".to_string(),
                ));
            }
        }

        if matches!(&self.registry.state_path, Some(p) if p.trim().is_empty()) {
            return Err(ConfigValidationError::LogicalInconsistency(
                "state_path is set but empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    InvalidValue(String),
    LogicalInconsistency(String),
    LoadFailed(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValidationError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
            ConfigValidationError::LogicalInconsistency(msg) => write!(f, "Configuration logical inconsistency: {}", msg),
            ConfigValidationError::LoadFailed(msg) => write!(f, "Failed to load configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

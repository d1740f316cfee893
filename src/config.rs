use crate::domain::severity::Threshold;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("errgate requires an api_key for the error tracker")]
    MissingApiKey,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Environment error: {0}")]
    EnvError(String),
}

fn default_endpoint() -> String {
    "http://errgate-collector:9610/v1/notices".to_string()
}

fn default_true() -> bool {
    true
}

fn default_stack_trace_limit() -> usize {
    20
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_connections() -> usize {
    10
}

fn default_user_agent() -> String {
    format!("errgate/{}", env!("CARGO_PKG_VERSION"))
}

/// Relay configuration. Immutable once validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// API key for the error tracker (required)
    pub api_key: String,

    /// Environment tag reported with every notification (e.g. "production")
    pub environment: Option<String>,

    /// Minimum severity that produces a notification; a level name or a
    /// numeric rank
    pub error_threshold: Threshold,

    /// When true, delivery failures propagate unhandled instead of being
    /// swallowed by a no-op completion callback
    pub allow_delivery_to_fail: bool,

    /// Install a process-wide panic hook that reports uncaught panics
    pub handle_exceptions: bool,

    /// Number of frames captured for synthetic stack traces
    pub stack_trace_limit: usize,

    /// Extra severity levels merged into the built-in scale
    pub custom_levels: HashMap<String, u32>,

    /// Error tracker endpoint URL
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Maximum pooled HTTP connections
    pub max_connections: usize,

    /// User agent reported to the tracker
    pub user_agent: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            environment: None,
            error_threshold: Threshold::default(),
            allow_delivery_to_fail: false,
            handle_exceptions: default_true(),
            stack_trace_limit: default_stack_trace_limit(),
            custom_levels: HashMap::new(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_connections: default_max_connections(),
            user_agent: default_user_agent(),
        }
    }
}

impl RelayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = RelayConfig::default();

        load_env_string("ERRGATE_API_KEY", &mut config.api_key);
        load_env_string_opt("ERRGATE_ENVIRONMENT", &mut config.environment);
        load_env_string("ERRGATE_ENDPOINT", &mut config.endpoint);
        load_env_var("ERRGATE_ALLOW_DELIVERY_TO_FAIL", &mut config.allow_delivery_to_fail)?;
        load_env_var("ERRGATE_HANDLE_EXCEPTIONS", &mut config.handle_exceptions)?;
        load_env_var("ERRGATE_STACK_TRACE_LIMIT", &mut config.stack_trace_limit)?;
        load_env_var("ERRGATE_TIMEOUT_SECS", &mut config.timeout_secs)?;
        load_env_var("ERRGATE_CONNECT_TIMEOUT_SECS", &mut config.connect_timeout_secs)?;
        load_env_var("ERRGATE_MAX_CONNECTIONS", &mut config.max_connections)?;

        // Threshold accepts a level name or a numeric rank
        if let Ok(threshold) = std::env::var("ERRGATE_ERROR_THRESHOLD") {
            config.error_threshold = match threshold.parse::<u32>() {
                Ok(rank) => Threshold::Rank(rank),
                Err(_) => Threshold::Name(threshold),
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: RelayConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        Url::parse(&self.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", self.endpoint, e))
        })?;

        if self.stack_trace_limit == 0 {
            return Err(ConfigError::InvalidConfig(
                "Stack trace limit must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Helper function to load and parse an environment variable.
/// Returns Ok(()) if the variable doesn't exist (keeps default).
fn load_env_var<T>(name: &str, target: &mut T) -> Result<(), ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(value) = std::env::var(name) {
        *target = value
            .parse()
            .map_err(|e| ConfigError::EnvError(format!("Invalid {name}: {e}")))?;
    }
    Ok(())
}

/// Helper function to load a string environment variable.
fn load_env_string(name: &str, target: &mut String) {
    if let Ok(value) = std::env::var(name) {
        *target = value;
    }
}

/// Helper function to load an optional string environment variable.
fn load_env_string_opt(name: &str, target: &mut Option<String>) {
    if let Ok(value) = std::env::var(name) {
        *target = Some(value);
    }
}

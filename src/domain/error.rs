use thiserror::Error;

/// Top-level error type for the relay stage.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

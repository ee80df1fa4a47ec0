//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration and precondition checks.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Misconfiguration. Never transient, so never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("managed node set is empty")]
    EmptyNodeSet,

    #[error("invalid duration for `{key}`: {value:?}")]
    InvalidDuration { key: &'static str, value: String },

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("failed to parse fleet config: {0}")]
    Parse(String),
}

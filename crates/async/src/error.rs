//! Error types
//!
//! The primitives themselves never fail: task failures belong to the caller's
//! error type and misuse is corrected rather than rejected. The only errors
//! owned by this crate come from configuration.

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A value could not be parsed
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A value is outside the accepted range
    #[error("{key} must be at least {min}, got {value}")]
    OutOfRange {
        key: String,
        value: usize,
        min: usize,
    },

    /// A required value is empty
    #[error("{0} must not be empty")]
    Empty(String),
}

impl ConfigError {
    pub(crate) fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

//! Error types.

use thiserror::Error;

/// Rejected controller configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `responsiveness` must lie in `[0, 1]`.
    #[error("responsiveness must be within [0, 1], got {0}")]
    ResponsivenessOutOfRange(f32),

    /// A parameter that must not be negative was negative.
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    /// A parameter was NaN or infinite.
    #[error("{field} must be finite")]
    NotFinite { field: &'static str },

    /// Chained position predictions need at least one frame per step.
    #[error("prediction_frames must be at least 1")]
    ZeroPredictionFrames,
}

/// Failure reported by a tick listener.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("tick listener failed: {0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

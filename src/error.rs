//! Error types for region construction, binning and aggregation.

use thiserror::Error;

/// Errors raised by regionheat.
///
/// Construction errors (`InvalidGeometry`) abort the offending region; query
/// operations never fail because nothing matched.
#[derive(Debug, Error)]
pub enum HeatmapError {
    /// Bad or missing id, unsupported geometry type, malformed ring or polyline.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Event weight was not a finite number.
    #[error("Invalid weight: {0}")]
    InvalidWeight(f64),

    /// A stat was requested by a name that was never registered.
    #[error("Unregistered stat: {0}")]
    UnregisteredStat(String),

    /// The API was called with arguments that violate its contract.
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HeatmapError>;

impl HeatmapError {
    pub(crate) fn geometry(msg: impl Into<String>) -> Self {
        HeatmapError::InvalidGeometry(msg.into())
    }

    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        HeatmapError::PreconditionViolation(msg.into())
    }
}

//! Error types for spline authoring and evaluation

use serde::{Deserialize, Serialize};

/// Errors raised by spline mutators and the persistence boundary.
///
/// Every failing mutator leaves the spline exactly as it was.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SplineError {
    /// Loop parameters that cannot describe a prototype interval
    #[error("Invalid loop parameters: {reason}")]
    InvalidLoopParams { reason: String },

    /// Value type the engine does not know how to interpolate
    #[error("Unsupported value type: {type_name}")]
    UnsupportedValueType { type_name: String },

    /// Knot that cannot be stored (non-finite time, negative width)
    #[error("Invalid knot: {reason}")]
    InvalidKnot { reason: String },

    /// Operation refused because its precondition does not hold
    #[error("Precondition failed: {reason}")]
    Precondition { reason: String },

    /// Data authored for one value type applied to an incompatible one
    #[error("Value type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Neighbor knots passed to a standalone tangent update are out of order
    #[error("Invalid neighbors: {reason}")]
    InvalidNeighbors { reason: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl SplineError {
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::Precondition {
            reason: reason.into(),
        }
    }

    pub fn invalid_loop_params(reason: impl Into<String>) -> Self {
        Self::InvalidLoopParams {
            reason: reason.into(),
        }
    }

    /// Refusals that a caller can fix by choosing a different time or knot.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Precondition { .. } | Self::InvalidNeighbors { .. } | Self::InvalidKnot { .. }
        )
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidLoopParams { .. }
            | Self::UnsupportedValueType { .. }
            | Self::InvalidKnot { .. } => "configuration",
            Self::Precondition { .. } | Self::InvalidNeighbors { .. } => "precondition",
            Self::TypeMismatch { .. } => "type",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for SplineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

/// Result type for spline operations
pub type Result<T> = std::result::Result<T, SplineError>;

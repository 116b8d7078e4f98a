//! Error types shared by the signal, device and chain modules.

/// Errors raised by chain construction, mutation and lookup.
///
/// Every variant is a caller error. Nothing here is transient, so nothing
/// is retried internally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    /// A field or selector has the wrong shape.
    #[error("invalid argument '{field}': {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// Sampling rate of a device response disagrees with the chain.
    #[error("sampling rate {actual} Hz does not agree with the measurement chain ({expected} Hz)")]
    ValueMismatch { expected: f64, actual: f64 },

    /// Channel counts cannot be broadcast against each other.
    #[error("cannot broadcast {lhs} channels against {rhs} channels")]
    ShapeMismatch { lhs: usize, rhs: usize },

    #[error("device '{0}' not found")]
    NotFound(String),

    #[error("device index {index} out of range for chain with {len} devices")]
    IndexOutOfRange { index: usize, len: usize },

    /// A calibration file could not be parsed.
    #[error("calibration data: {0}")]
    Calibration(String),
}

impl ChainError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ChainError::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;

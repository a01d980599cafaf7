//! Errors raised while constructing a dynamic stock model.
use thiserror::Error;

/// Result type for stock model construction
pub type DsmResult<T> = Result<T, DsmError>;

/// Reasons a dynamic stock model cannot be built.
///
/// Both variants are detected before any cohort matrix work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DsmError {
    /// A lifetime parameter, time axis or driving value is unusable
    #[error("Invalid parameter: {what}")]
    InvalidParameter {
        /// Description of the offending value
        what: String,
    },

    /// A series does not have the length required by the time axis
    #[error("Dimension mismatch for {what}: expected length {expected}, found {found}")]
    DimensionMismatch {
        /// Name of the mismatched series
        what: String,
        /// Required length
        expected: usize,
        /// Actual length
        found: usize,
    },
}

impl DsmError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidParameter { what: what.into() }
    }

    pub(crate) fn mismatch(what: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            found,
        }
    }
}

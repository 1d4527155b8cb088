//! Error types for measurement mitigation.

use qec_hal::HalError;
use qec_ir::IrError;
use thiserror::Error;

/// Errors that can occur while calibrating or correcting counts.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MitigationError {
    /// The calibration matrix cannot be inverted.
    ///
    /// Recoverable: callers report raw counts instead.
    #[error("Singular calibration matrix: {0}")]
    SingularCalibration(String),

    /// Counts do not match the calibration width.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Calibration data is incomplete or malformed.
    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    /// Building a calibration circuit failed.
    #[error("Circuit error: {0}")]
    Circuit(#[from] IrError),

    /// Running the calibration set failed.
    #[error("Backend error: {0}")]
    Backend(#[from] HalError),
}

impl MitigationError {
    /// Whether the caller can continue with uncorrected counts.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MitigationError::SingularCalibration(_))
    }
}

/// Result type for mitigation operations.
pub type MitigationResult<T> = Result<T, MitigationError>;

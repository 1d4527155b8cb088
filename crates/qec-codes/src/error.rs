//! Error types for code construction and experiments.

use qec_hal::HalError;
use qec_ir::IrError;
use qec_mitigation::MitigationError;
use thiserror::Error;

/// Errors that can occur while building or running a code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodeError {
    /// The circuit could not be built (out-of-range fault target, ...).
    #[error("Circuit error: {0}")]
    Circuit(#[from] IrError),

    /// The backend rejected or failed the job.
    #[error("Backend error: {0}")]
    Backend(#[from] HalError),

    /// Measurement mitigation failed in a way that cannot fall back.
    #[error("Mitigation error: {0}")]
    Mitigation(#[from] MitigationError),
}

/// Result type for code operations.
pub type CodeResult<T> = Result<T, CodeError>;

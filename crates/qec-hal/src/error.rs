//! Backend errors.

use thiserror::Error;

/// Failure talking to or running on a backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// The backend reported that it cannot take jobs.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The circuit failed backend validation.
    #[error("circuit rejected by backend: {0}")]
    InvalidCircuit(String),

    /// The circuit is wider than the backend.
    #[error("circuit uses {required} qubits, backend supports {available}")]
    CircuitTooLarge {
        /// Qubits in the circuit.
        required: usize,
        /// Qubits the backend offers.
        available: u32,
    },

    /// Shot count of zero or above the backend limit.
    #[error("invalid shot count: {0}")]
    InvalidShots(String),

    /// The job ended in `Failed`, or completed without a usable result.
    #[error("job failed: {0}")]
    JobFailed(String),

    /// The job ended in `Cancelled`.
    #[error("job cancelled")]
    JobCancelled,

    /// No job with this id on the backend.
    #[error("unknown job {0}")]
    JobNotFound(String),

    /// `wait` ran out of polls.
    #[error("timed out waiting for job {0}")]
    Timeout(String),

    /// Bad `BackendConfig` value.
    #[error("backend configuration: {0}")]
    Configuration(String),
}

/// Result type for backend operations.
pub type HalResult<T> = Result<T, HalError>;

//! Measurement-error mitigation.
//!
//! Readout on real devices is imperfect: a qubit left in `|1⟩` is sometimes
//! reported as `0` and vice versa. This crate estimates that response with a
//! calibration set and undoes it on measured counts.
//!
//! 1. [`calibration_circuits`] prepares each of the `2^k` basis states and
//!    measures it.
//! 2. [`CalibrationMatrix::from_counts`] turns the outcomes into a
//!    column-stochastic matrix `A`, `A[i][j] = P(observe i | prepared j)`.
//! 3. [`MeasurementFilter::apply`] solves `A x = b` for raw counts `b`, clips
//!    negative entries and renormalizes to the raw shot total.
//!
//! [`MitigationSession`] ties the three steps to a backend and caches one
//! matrix per register width.
//!
//! # Example
//!
//! ```
//! use qec_hal::Counts;
//! use qec_mitigation::{CalibrationMatrix, MeasurementFilter};
//!
//! let raw = Counts::from_pairs([("0", 100), ("1", 900)]);
//! let matrix = CalibrationMatrix::from_readout_error(1, 0.1).unwrap();
//! let filter = MeasurementFilter::new(matrix);
//! let mitigated = filter.apply(&raw).unwrap();
//! assert!((mitigated.get("1") - 1000.0).abs() < 1e-6);
//! ```

pub mod calibration;
pub mod error;
pub mod filter;
pub mod matrix;
pub mod session;
pub mod solve;

pub use calibration::{
    MAX_CALIBRATION_QUBITS, calibration_circuits, parse_state, register_dim, state_label,
};
pub use error::{MitigationError, MitigationResult};
pub use filter::{MeasurementFilter, MitigatedCounts};
pub use matrix::CalibrationMatrix;
pub use session::{DEFAULT_CALIBRATION_SHOTS, MitigationSession};
pub use solve::SolveMethod;

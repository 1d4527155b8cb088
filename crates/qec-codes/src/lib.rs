//! Quantum error-correction circuits.
//!
//! This crate builds the three textbook codes as [`qec_ir::Circuit`]s, injects
//! a chosen single-qubit fault between encoding and decoding, and runs the
//! result on any [`qec_hal::Backend`]:
//!
//! - [`CodeKind::BitFlip`]: 3 qubits, corrects one `X`
//! - [`CodeKind::PhaseFlip`]: 3 qubits, corrects one `Z`
//! - [`CodeKind::Shor`]: 9 qubits, corrects one `X`, `Z` or both
//!
//! [`Experiment`] wires a code to a backend and, for the Shor code by
//! default, to a [`qec_mitigation::MitigationSession`].
//!
//! # Example
//!
//! ```
//! use qec_codes::{CodeKind, CodeOptions, Fault, LogicalState};
//! use qec_ir::QubitId;
//!
//! let options = CodeOptions::new(LogicalState::One, Fault::bit_flip(QubitId(1)));
//! let circuit = CodeKind::BitFlip.build(&options).unwrap();
//! assert_eq!(circuit.num_qubits(), 3);
//! assert_eq!(circuit.measured_qubits(), vec![QubitId(0)]);
//! ```

pub mod codes;
pub mod error;
pub mod experiment;
pub mod injector;

pub use codes::{
    CodeKind, CodeOptions, LogicalState, bit_flip_code, phase_flip_code, shor_code,
};
pub use error::{CodeError, CodeResult};
pub use experiment::{DEFAULT_SHOTS, Experiment, ExperimentReport};
pub use injector::{Fault, FaultKind, inject};

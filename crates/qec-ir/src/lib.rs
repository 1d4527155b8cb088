//! Circuit model for quantum error-correction experiments.
//!
//! A [`Circuit`] is a fixed-size quantum register, a fixed-size classical
//! register and an ordered list of [`Instruction`]s. Every instruction is
//! validated against the register bounds when it is appended, so a circuit
//! that exists is always well-formed: nothing out of range ever reaches a
//! backend.
//!
//! # Example: the bit-flip code
//!
//! ```rust
//! use qec_ir::{Circuit, ClbitId, QubitId};
//!
//! let (q0, q1, q2) = (QubitId(0), QubitId(1), QubitId(2));
//! let mut circuit = Circuit::new("bit_flip", 3, 1).unwrap();
//!
//! circuit
//!     .cx(q0, q1).unwrap()
//!     .cx(q0, q2).unwrap()
//!     .x(q0).unwrap()
//!     .cx(q0, q1).unwrap()
//!     .cx(q0, q2).unwrap()
//!     .ccx(q2, q1, q0).unwrap()
//!     .measure(q0, ClbitId(0)).unwrap();
//!
//! assert_eq!(circuit.num_ops(), 7);
//! assert!(circuit.x(QubitId(3)).is_err());
//! ```
//!
//! # Supported operations
//!
//! | Operation | Qubits | Description |
//! |-----------|--------|-------------|
//! | `X` | 1 | Bit flip (NOT) |
//! | `Z` | 1 | Phase flip |
//! | `H` | 1 | Basis change (Hadamard) |
//! | `CX` | 2 | Controlled-NOT |
//! | `CCX` | 3 | Doubly-controlled NOT (Toffoli) |
//! | `barrier` | any | Synchronization marker |
//! | `measure` | 1 | Qubit → classical bit |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{ClbitId, QubitId};

//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors raised while building a circuit.
///
/// Every variant describes a malformed reference into one of the circuit's
/// registers. They are raised when the offending instruction is appended,
/// never at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit index outside the quantum register.
    #[error("Qubit {qubit} out of range for {num_qubits}-qubit register{}", format_gate_context(.gate_name))]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Size of the quantum register.
        num_qubits: u32,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Classical bit index outside the classical register.
    #[error("Classical bit {clbit} out of range for {num_clbits}-bit register{}", format_gate_context(.gate_name))]
    ClbitOutOfRange {
        /// The offending classical bit.
        clbit: ClbitId,
        /// Size of the classical register.
        num_clbits: u32,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Gate requires a different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// The same qubit appears twice in one operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Measurement lists a different number of qubits and classical bits.
    #[error("Measurement maps {qubits} qubits onto {clbits} classical bits")]
    MeasureArityMismatch {
        /// Number of qubits measured.
        qubits: usize,
        /// Number of classical bits written.
        clbits: usize,
    },

    /// Classical register larger than the quantum register.
    #[error("Classical register ({num_clbits} bits) larger than quantum register ({num_qubits} qubits)")]
    RegisterTooLarge {
        /// Requested qubit count.
        num_qubits: u32,
        /// Requested classical bit count.
        num_clbits: u32,
    },
}

impl IrError {
    /// Whether this error is an index-kind construction error.
    ///
    /// All current variants are; the method exists so callers can match on
    /// the category without enumerating variants of a non-exhaustive enum.
    pub fn is_index_error(&self) -> bool {
        matches!(
            self,
            IrError::QubitOutOfRange { .. }
                | IrError::ClbitOutOfRange { .. }
                | IrError::QubitCountMismatch { .. }
                | IrError::DuplicateQubit { .. }
                | IrError::MeasureArityMismatch { .. }
                | IrError::RegisterTooLarge { .. }
        )
    }
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

//! One step of a circuit: a gate, a measurement or a barrier, with operands.
//!
//! Operand indices are not checked here; [`Circuit::append`] validates them
//! against the circuit's registers.
//!
//! [`Circuit::append`]: crate::Circuit::append

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::qubit::{ClbitId, QubitId};

/// What an instruction does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionKind {
    /// Unitary gate.
    Gate(StandardGate),
    /// Computational-basis measurement, qubit `i` into clbit `i`.
    Measure,
    /// Scheduling fence; no effect on the state.
    Barrier,
}

/// An instruction and its operands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// What the instruction does.
    pub kind: InstructionKind,
    /// Qubit operands, controls first for controlled gates.
    pub qubits: Vec<QubitId>,
    /// Classical targets; non-empty only for measurements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clbits: Vec<ClbitId>,
}

impl Instruction {
    /// `gate` on `qubits`.
    pub fn gate(gate: StandardGate, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Gate(gate),
            qubits: qubits.into_iter().collect(),
            clbits: Vec::new(),
        }
    }

    /// Measure `qubit` into `clbit`.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    /// Pairwise measurement; both lists must have the same length.
    pub fn measure_many(
        qubits: impl IntoIterator<Item = QubitId>,
        clbits: impl IntoIterator<Item = ClbitId>,
    ) -> IrResult<Self> {
        let qubits: Vec<QubitId> = qubits.into_iter().collect();
        let clbits: Vec<ClbitId> = clbits.into_iter().collect();
        if qubits.len() != clbits.len() {
            return Err(IrError::MeasureArityMismatch {
                qubits: qubits.len(),
                clbits: clbits.len(),
            });
        }
        Ok(Self {
            kind: InstructionKind::Measure,
            qubits,
            clbits,
        })
    }

    /// Barrier across `qubits`.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Barrier,
            qubits: qubits.into_iter().collect(),
            clbits: Vec::new(),
        }
    }

    pub fn is_measure(&self) -> bool {
        self.kind == InstructionKind::Measure
    }

    pub fn is_barrier(&self) -> bool {
        self.kind == InstructionKind::Barrier
    }

    /// The gate, for gate instructions.
    pub fn as_gate(&self) -> Option<StandardGate> {
        match self.kind {
            InstructionKind::Gate(gate) => Some(gate),
            InstructionKind::Measure | InstructionKind::Barrier => None,
        }
    }

    /// Lower-case mnemonic used in listings and op counts.
    pub fn name(&self) -> &'static str {
        match self.kind {
            InstructionKind::Gate(gate) => gate.name(),
            InstructionKind::Measure => "measure",
            InstructionKind::Barrier => "barrier",
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), join(&self.qubits))?;
        if !self.clbits.is_empty() {
            write!(f, " -> {}", join(&self.clbits))?;
        }
        Ok(())
    }
}

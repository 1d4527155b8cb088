//! High-level circuit builder API.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// A quantum circuit.
///
/// Registers are sized once at construction. Instructions are kept in
/// program order and executed strictly in that order; there is no
/// reordering or scheduling at this level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Size of the quantum register.
    num_qubits: u32,
    /// Size of the classical register.
    num_clbits: u32,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create an empty circuit with `num_qubits` qubits and `num_clbits`
    /// classical bits.
    ///
    /// The classical register may not be larger than the quantum register.
    pub fn new(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> IrResult<Self> {
        if num_clbits > num_qubits {
            return Err(IrError::RegisterTooLarge {
                num_qubits,
                num_clbits,
            });
        }
        Ok(Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            instructions: vec![],
        })
    }

    /// Append an instruction after validating its operands.
    pub fn append(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.validate(&instruction)?;
        self.instructions.push(instruction);
        Ok(self)
    }

    fn validate(&self, instruction: &Instruction) -> IrResult<()> {
        let gate_name = match instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.name().to_string()),
            _ => None,
        };

        // Validate gate arity matches qubit count
        if let InstructionKind::Gate(gate) = instruction.kind {
            let expected = gate.num_qubits() as usize;
            let got = instruction.qubits.len();
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: expected as u32,
                    got: got as u32,
                });
            }
        }

        if instruction.is_measure() && instruction.qubits.len() != instruction.clbits.len() {
            return Err(IrError::MeasureArityMismatch {
                qubits: instruction.qubits.len(),
                clbits: instruction.clbits.len(),
            });
        }

        for &qubit in &instruction.qubits {
            if qubit.0 >= self.num_qubits {
                return Err(IrError::QubitOutOfRange {
                    qubit,
                    num_qubits: self.num_qubits,
                    gate_name: gate_name.clone(),
                });
            }
        }

        for &clbit in &instruction.clbits {
            if clbit.0 >= self.num_clbits {
                return Err(IrError::ClbitOutOfRange {
                    clbit,
                    num_clbits: self.num_clbits,
                    gate_name: gate_name.clone(),
                });
            }
        }

        // Check for duplicate qubits in the instruction
        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit { qubit, gate_name });
            }
        }

        Ok(())
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Pauli-X (bit flip).
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::gate(StandardGate::X, [qubit]))
    }

    /// Apply Pauli-Z (phase flip).
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::gate(StandardGate::Z, [qubit]))
    }

    /// Apply Hadamard (basis change).
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::gate(StandardGate::H, [qubit]))
    }

    // =========================================================================
    // Controlled gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::gate(StandardGate::CX, [control, target]))
    }

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::gate(StandardGate::CCX, [c1, c2, target]))
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.append(Instruction::measure(qubit, clbit))
    }

    /// Measure every qubit into the classical bit with the same index.
    ///
    /// Fails unless both registers have the same size.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        let qubits = (0..self.num_qubits).map(QubitId);
        let clbits = (0..self.num_qubits).map(ClbitId);
        self.append(Instruction::measure_many(qubits, clbits)?)
    }

    /// Apply a barrier to specified qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.append(Instruction::barrier(qubits))
    }

    /// Apply a barrier to all qubits.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        let qubits = (0..self.num_qubits).map(QubitId);
        self.append(Instruction::barrier(qubits))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.num_clbits as usize
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Consume the circuit and return its instruction sequence.
    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    /// Number of instructions, barriers included.
    pub fn num_ops(&self) -> usize {
        self.instructions.len()
    }

    /// Number of instructions per instruction name.
    pub fn count_ops(&self) -> FxHashMap<&'static str, usize> {
        let mut counts = FxHashMap::default();
        for inst in &self.instructions {
            *counts.entry(inst.name()).or_default() += 1;
        }
        counts
    }

    /// Every `(qubit, clbit)` pair written by a measurement, in program order.
    pub fn measurements(&self) -> Vec<(QubitId, ClbitId)> {
        self.instructions
            .iter()
            .filter(|inst| inst.is_measure())
            .flat_map(|inst| inst.qubits.iter().copied().zip(inst.clbits.iter().copied()))
            .collect()
    }

    /// Distinct measured qubits, in first-measured order.
    pub fn measured_qubits(&self) -> Vec<QubitId> {
        let mut seen = FxHashSet::default();
        self.measurements()
            .into_iter()
            .map(|(q, _)| q)
            .filter(|q| seen.insert(*q))
            .collect()
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "circuit {} ({} qubits, {} clbits)",
            self.name, self.num_qubits, self.num_clbits
        )?;
        for inst in &self.instructions {
            writeln!(f, "  {inst}")?;
        }
        Ok(())
    }
}

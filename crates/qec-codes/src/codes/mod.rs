//! Error-correcting code circuits.
//!
//! Every builder follows the same pipeline:
//!
//! ```text
//!   prepare logical ──→ encode ──→ inject fault ──→ decode ──→ measure q0
//! ```
//!
//! | Code | Qubits | Corrects | Default fault |
//! |------|--------|----------|---------------|
//! | bit-flip | 3 | one `X` | `X` on q0 |
//! | phase-flip | 3 | one `Z` | `Z` on q0 |
//! | Shor | 9 | one `X`, `Z` or both | `X+Z` on q0 |

mod bit_flip;
mod phase_flip;
mod repetition;
mod shor;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use qec_ir::{Circuit, IrResult, QubitId};

use crate::injector::{Fault, FaultKind};

pub use bit_flip::bit_flip_code;
pub use phase_flip::phase_flip_code;
pub use shor::shor_code;

/// Logical basis state encoded by a code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalState {
    /// `|0⟩_L`.
    #[default]
    Zero,
    /// `|1⟩_L`, prepared with `X` on qubit 0 before encoding.
    One,
}

impl LogicalState {
    /// Outcome an error-free decode reports on clbit 0.
    pub fn expected_outcome(self) -> &'static str {
        match self {
            LogicalState::Zero => "0",
            LogicalState::One => "1",
        }
    }
}

impl fmt::Display for LogicalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|{}⟩", self.expected_outcome())
    }
}

impl FromStr for LogicalState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "zero" => Ok(LogicalState::Zero),
            "1" | "one" => Ok(LogicalState::One),
            other => Err(format!("unknown logical state '{other}' (expected 0 or 1)")),
        }
    }
}

/// Inputs to a code builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeOptions {
    /// Logical state to encode.
    pub logical: LogicalState,
    /// Fault injected between encoding and decoding.
    pub fault: Fault,
}

impl CodeOptions {
    /// Create options.
    pub fn new(logical: LogicalState, fault: Fault) -> Self {
        Self { logical, fault }
    }

    /// Replace the logical state.
    pub fn with_logical(mut self, logical: LogicalState) -> Self {
        self.logical = logical;
        self
    }

    /// Replace the fault.
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = fault;
        self
    }
}

/// The supported codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeKind {
    /// Three-qubit repetition code against `X` errors.
    BitFlip,
    /// Three-qubit repetition code in the Hadamard basis against `Z` errors.
    PhaseFlip,
    /// Nine-qubit Shor code.
    Shor,
}

impl CodeKind {
    /// Every code.
    pub fn all() -> [CodeKind; 3] {
        [CodeKind::BitFlip, CodeKind::PhaseFlip, CodeKind::Shor]
    }

    /// Command-line name.
    pub fn name(self) -> &'static str {
        match self {
            CodeKind::BitFlip => "bit-flip",
            CodeKind::PhaseFlip => "phase-flip",
            CodeKind::Shor => "shor",
        }
    }

    /// One-line description.
    pub fn description(self) -> &'static str {
        match self {
            CodeKind::BitFlip => "3-qubit repetition code, corrects one bit flip",
            CodeKind::PhaseFlip => "3-qubit repetition code in the X basis, corrects one phase flip",
            CodeKind::Shor => "9-qubit concatenated code, corrects any single-qubit X, Z or XZ",
        }
    }

    /// Qubits in the circuit.
    pub fn num_qubits(self) -> u32 {
        match self {
            CodeKind::BitFlip | CodeKind::PhaseFlip => 3,
            CodeKind::Shor => 9,
        }
    }

    /// Fault injected when the caller does not choose one.
    pub fn default_fault(self) -> Fault {
        match self {
            CodeKind::BitFlip => Fault::bit_flip(QubitId(0)),
            CodeKind::PhaseFlip => Fault::phase_flip(QubitId(0)),
            CodeKind::Shor => Fault::both(QubitId(0)),
        }
    }

    /// Logical zero with the default fault.
    pub fn default_options(self) -> CodeOptions {
        CodeOptions::new(LogicalState::Zero, self.default_fault())
    }

    /// Fault kinds the code is guaranteed to correct on any single qubit.
    pub fn correctable_faults(self) -> &'static [FaultKind] {
        match self {
            CodeKind::BitFlip => &[FaultKind::None, FaultKind::BitFlip],
            CodeKind::PhaseFlip => &[FaultKind::None, FaultKind::PhaseFlip],
            CodeKind::Shor => &[
                FaultKind::None,
                FaultKind::BitFlip,
                FaultKind::PhaseFlip,
                FaultKind::Both,
            ],
        }
    }

    /// Whether results are readout-corrected unless the caller opts out.
    pub fn mitigated_by_default(self) -> bool {
        matches!(self, CodeKind::Shor)
    }

    /// Build the code's circuit.
    pub fn build(self, options: &CodeOptions) -> IrResult<Circuit> {
        match self {
            CodeKind::BitFlip => bit_flip_code(options),
            CodeKind::PhaseFlip => phase_flip_code(options),
            CodeKind::Shor => shor_code(options),
        }
    }
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bit-flip" | "bit_flip" | "bitflip" | "bit" => Ok(CodeKind::BitFlip),
            "phase-flip" | "phase_flip" | "phaseflip" | "phase" => Ok(CodeKind::PhaseFlip),
            "shor" | "shor9" => Ok(CodeKind::Shor),
            other => Err(format!(
                "unknown code '{other}' (expected bit-flip, phase-flip or shor)"
            )),
        }
    }
}

/// Prepare `|1⟩` on qubit 0 if requested.
fn prepare_logical(circuit: &mut Circuit, logical: LogicalState) -> IrResult<()> {
    if logical == LogicalState::One {
        circuit.x(QubitId(0))?;
    }
    Ok(())
}

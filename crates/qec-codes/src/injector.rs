//! Deterministic single-qubit fault injection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use qec_ir::{Circuit, IrError, IrResult, QubitId};

/// Which Pauli error to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// No error.
    #[default]
    None,
    /// `X` error.
    BitFlip,
    /// `Z` error.
    PhaseFlip,
    /// `X` followed by `Z`.
    Both,
}

impl FaultKind {
    /// Every fault kind.
    pub fn all() -> [FaultKind; 4] {
        [
            FaultKind::None,
            FaultKind::BitFlip,
            FaultKind::PhaseFlip,
            FaultKind::Both,
        ]
    }

    /// Short name as accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            FaultKind::None => "none",
            FaultKind::BitFlip => "bit",
            FaultKind::PhaseFlip => "phase",
            FaultKind::Both => "both",
        }
    }

    /// Whether an `X` is applied.
    pub fn flips_bit(self) -> bool {
        matches!(self, FaultKind::BitFlip | FaultKind::Both)
    }

    /// Whether a `Z` is applied.
    pub fn flips_phase(self) -> bool {
        matches!(self, FaultKind::PhaseFlip | FaultKind::Both)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FaultKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(FaultKind::None),
            "bit" | "bit-flip" | "bit_flip" | "x" => Ok(FaultKind::BitFlip),
            "phase" | "phase-flip" | "phase_flip" | "z" => Ok(FaultKind::PhaseFlip),
            "both" | "xz" => Ok(FaultKind::Both),
            other => Err(format!(
                "unknown fault '{other}' (expected none, bit, phase or both)"
            )),
        }
    }
}

/// A fault of a given kind on one qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fault {
    /// Error to apply.
    pub kind: FaultKind,
    /// Qubit it is applied to.
    pub target: QubitId,
}

impl Fault {
    /// Create a fault.
    pub fn new(kind: FaultKind, target: QubitId) -> Self {
        Self { kind, target }
    }

    /// No error at all.
    pub fn none() -> Self {
        Self::new(FaultKind::None, QubitId(0))
    }

    /// `X` on `target`.
    pub fn bit_flip(target: QubitId) -> Self {
        Self::new(FaultKind::BitFlip, target)
    }

    /// `Z` on `target`.
    pub fn phase_flip(target: QubitId) -> Self {
        Self::new(FaultKind::PhaseFlip, target)
    }

    /// `X` then `Z` on `target`.
    pub fn both(target: QubitId) -> Self {
        Self::new(FaultKind::Both, target)
    }

    /// Whether the fault applies any gate.
    pub fn is_none(&self) -> bool {
        self.kind == FaultKind::None
    }
}

impl Default for Fault {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FaultKind::None => write!(f, "no fault"),
            FaultKind::BitFlip => write!(f, "X on {}", self.target),
            FaultKind::PhaseFlip => write!(f, "Z on {}", self.target),
            FaultKind::Both => write!(f, "X+Z on {}", self.target),
        }
    }
}

/// Append `fault` to `circuit`.
///
/// A target outside the register is reported as
/// [`IrError::QubitOutOfRange`], even for [`FaultKind::None`].
pub fn inject(circuit: &mut Circuit, fault: Fault) -> IrResult<()> {
    if fault.target.index() >= circuit.num_qubits() {
        return Err(IrError::QubitOutOfRange {
            qubit: fault.target,
            num_qubits: u32::try_from(circuit.num_qubits()).unwrap_or(u32::MAX),
            gate_name: Some("fault".into()),
        });
    }
    if fault.kind.flips_bit() {
        circuit.x(fault.target)?;
    }
    if fault.kind.flips_phase() {
        circuit.z(fault.target)?;
    }
    Ok(())
}

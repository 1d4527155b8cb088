//! Quantum gate types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gates used by the repetition and Shor codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardGate {
    /// Pauli-X gate (bit flip, NOT).
    X,
    /// Pauli-Z gate (phase flip).
    Z,
    /// Hadamard gate (basis change exchanging X and Z errors).
    H,
    /// Controlled-X (CNOT) gate: `[control, target]`.
    CX,
    /// Toffoli gate (CCX): `[control1, control2, target]`.
    CCX,
}

impl StandardGate {
    /// Get the name of this gate (OpenQASM 3 naming).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::X => "x",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::CX => "cx",
            StandardGate::CCX => "ccx",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::X | StandardGate::Z | StandardGate::H => 1,
            StandardGate::CX => 2,
            StandardGate::CCX => 3,
        }
    }

    /// All gates, in declaration order.
    pub fn all() -> [StandardGate; 5] {
        [
            StandardGate::X,
            StandardGate::Z,
            StandardGate::H,
            StandardGate::CX,
            StandardGate::CCX,
        ]
    }
}

impl fmt::Display for StandardGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

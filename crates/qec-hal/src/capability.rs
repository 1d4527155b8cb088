//! Backend capability descriptions.

use qec_ir::{Circuit, StandardGate};
use serde::{Deserialize, Serialize};

/// Static description of what a backend can run.
///
/// Capabilities are cached at backend construction; reading them never
/// performs I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate names (OpenQASM 3 naming).
    pub gate_set: Vec<String>,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator (`true`) or real hardware (`false`).
    pub is_simulator: bool,
    /// Additional capability flags, e.g. `"statevector"`, `"readout_noise"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Create capabilities for a simulator supporting every gate in the IR.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            gate_set: StandardGate::all()
                .iter()
                .map(|g| g.name().to_string())
                .collect(),
            max_shots: 100_000,
            is_simulator: true,
            features: vec!["statevector".into()],
        }
    }

    /// Add a feature flag.
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    /// Check whether a gate is supported.
    pub fn supports_gate(&self, gate: StandardGate) -> bool {
        self.gate_set.iter().any(|g| g == gate.name())
    }

    /// Reasons `circuit` cannot run on this backend; empty if it can.
    pub fn check(&self, circuit: &Circuit) -> Vec<String> {
        let mut reasons = vec![];
        if circuit.num_qubits() > self.num_qubits as usize {
            reasons.push(format!(
                "circuit uses {} qubits, backend has {}",
                circuit.num_qubits(),
                self.num_qubits
            ));
        }
        let mut unsupported: Vec<&str> = circuit
            .instructions()
            .iter()
            .filter_map(|inst| inst.as_gate())
            .filter(|gate| !self.supports_gate(*gate))
            .map(|gate| gate.name())
            .collect();
        unsupported.sort_unstable();
        unsupported.dedup();
        for name in unsupported {
            reasons.push(format!("gate '{name}' is not supported"));
        }
        reasons
    }
}

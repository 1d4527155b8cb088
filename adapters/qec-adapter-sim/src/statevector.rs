//! Statevector simulation engine.

use num_complex::Complex64;
use rand::Rng;

use qec_ir::{Instruction, InstructionKind, StandardGate};

/// A statevector representing a quantum state.
///
/// Basis index bit `q` holds the value of qubit `q`.
#[derive(Debug, Clone)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Apply a unitary instruction.
    ///
    /// Barriers are no-ops. Measurements are handled by [`Statevector::measure`]
    /// and are ignored here.
    pub fn apply(&mut self, instruction: &Instruction) {
        match instruction.kind {
            InstructionKind::Gate(gate) => {
                let qubits: Vec<usize> = instruction.qubits.iter().map(|q| q.index()).collect();
                self.apply_gate(gate, &qubits);
            }
            InstructionKind::Measure | InstructionKind::Barrier => {}
        }
    }

    fn apply_gate(&mut self, gate: StandardGate, qubits: &[usize]) {
        match gate {
            StandardGate::X => self.apply_x(qubits[0]),
            StandardGate::Z => self.apply_z(qubits[0]),
            StandardGate::H => self.apply_h(qubits[0]),
            StandardGate::CX => self.apply_cx(qubits[0], qubits[1]),
            StandardGate::CCX => self.apply_ccx(qubits[0], qubits[1], qubits[2]),
        }
    }

    fn apply_x(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                self.amplitudes.swap(i, i | mask);
            }
        }
    }

    fn apply_z(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask != 0 {
                *amp = -*amp;
            }
        }
    }

    fn apply_h(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let sqrt2_inv = std::f64::consts::FRAC_1_SQRT_2;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = sqrt2_inv * (a + b);
                self.amplitudes[j] = sqrt2_inv * (a - b);
            }
        }
    }

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_ccx(&mut self, c1: usize, c2: usize, target: usize) {
        let c1_mask = 1 << c1;
        let c2_mask = 1 << c2;
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if (i & c1_mask != 0) && (i & c2_mask != 0) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    /// Probability that measuring `qubit` yields 1.
    pub fn probability_one(&self, qubit: usize) -> f64 {
        let mask = 1 << qubit;
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, amp)| amp.norm_sqr())
            .sum()
    }

    /// Measure `qubit` in the computational basis and collapse the state.
    pub fn measure<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) -> bool {
        let p_one = self.probability_one(qubit);
        let outcome = rng.r#gen::<f64>() < p_one;
        self.collapse(qubit, outcome, if outcome { p_one } else { 1.0 - p_one });
        outcome
    }

    fn collapse(&mut self, qubit: usize, outcome: bool, probability: f64) {
        let mask = 1 << qubit;
        let norm = probability.sqrt();
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) != outcome {
                *amp = Complex64::new(0.0, 0.0);
            } else if norm > 0.0 {
                *amp /= norm;
            }
        }
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qec_ir::QubitId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert_eq!(sv.num_qubits(), 2);
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(1.0, 0.0)));
        assert!(sv.amplitudes[1..].iter().all(|a| a.norm() < 1e-12));
    }

    #[test]
    fn test_hadamard() {
        let mut sv = Statevector::new(1);
        sv.apply_h(0);

        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(sqrt2_inv, 0.0)));
        assert!(approx_eq(sv.amplitudes[1], Complex64::new(sqrt2_inv, 0.0)));
        assert!((sv.probability_one(0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_z_after_h_flips_sign() {
        let mut sv = Statevector::new(1);
        sv.apply_h(0);
        sv.apply_z(0);
        sv.apply_h(0);

        assert!(approx_eq(sv.amplitudes[1], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_cx_and_ccx() {
        let mut sv = Statevector::new(3);
        sv.apply(&Instruction::gate(StandardGate::X, [QubitId(0)]));
        sv.apply(&Instruction::gate(StandardGate::CX, [QubitId(0), QubitId(1)]));
        sv.apply(&Instruction::gate(
            StandardGate::CCX,
            [QubitId(0), QubitId(1), QubitId(2)],
        ));

        assert!(approx_eq(sv.amplitudes[0b111], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_barrier_and_measure_are_not_unitary() {
        let mut sv = Statevector::new(1);
        sv.apply_h(0);
        let before = sv.clone();
        sv.apply(&Instruction::barrier([QubitId(0)]));
        sv.apply(&Instruction::measure(QubitId(0), qec_ir::ClbitId(0)));

        assert_eq!(before.amplitudes, sv.amplitudes);
    }

    #[test]
    fn test_measure_collapses_bell_pair() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut sv = Statevector::new(2);
            sv.apply_h(0);
            sv.apply_cx(0, 1);

            let first = sv.measure(0, &mut rng);
            let second = sv.measure(1, &mut rng);
            assert_eq!(first, second);
            assert!((sv.probability_one(1) - if second { 1.0 } else { 0.0 }).abs() < 1e-12);
        }
    }

    #[test]
    fn test_measure_deterministic_state() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sv = Statevector::new(1);
        sv.apply_x(0);

        for _ in 0..100 {
            assert!(sv.measure(0, &mut rng));
        }
    }
}

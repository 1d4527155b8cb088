//! Three-qubit phase-flip code.

use qec_ir::{Circuit, ClbitId, IrResult, QubitId};

use super::repetition::{hadamard_layer, majority_vote, repetition_encode};
use super::{CodeOptions, prepare_logical};
use crate::injector::inject;

const DATA: QubitId = QubitId(0);
const COPIES: [QubitId; 2] = [QubitId(1), QubitId(2)];
const BLOCK: [QubitId; 3] = [QubitId(0), QubitId(1), QubitId(2)];

/// Build the phase-flip code circuit.
///
/// Identical to the bit-flip code except that the encoded block is moved to
/// the Hadamard basis around the fault, where a `Z` acts as an `X`.
pub fn phase_flip_code(options: &CodeOptions) -> IrResult<Circuit> {
    let mut circuit = Circuit::new("phase_flip_code", 3, 1)?;
    prepare_logical(&mut circuit, options.logical)?;

    // Encoding
    repetition_encode(&mut circuit, DATA, COPIES)?;
    hadamard_layer(&mut circuit, &BLOCK)?;

    inject(&mut circuit, options.fault)?;

    // Decoding
    hadamard_layer(&mut circuit, &BLOCK)?;
    repetition_encode(&mut circuit, DATA, COPIES)?;
    majority_vote(&mut circuit, DATA, [COPIES[1], COPIES[0]])?;

    circuit.measure(DATA, ClbitId(0))?;
    Ok(circuit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::LogicalState;
    use crate::injector::Fault;

    #[test]
    fn test_gate_counts() {
        let circuit = phase_flip_code(&CodeOptions::new(
            LogicalState::Zero,
            Fault::phase_flip(QubitId(0)),
        ))
        .unwrap();
        let ops = circuit.count_ops();

        assert_eq!(ops.get("cx"), Some(&4));
        assert_eq!(ops.get("h"), Some(&6));
        assert_eq!(ops.get("z"), Some(&1));
        assert_eq!(ops.get("ccx"), Some(&1));
        assert_eq!(ops.get("measure"), Some(&1));
    }

    #[test]
    fn test_fault_sits_between_hadamard_layers() {
        let circuit = phase_flip_code(&CodeOptions::new(
            LogicalState::Zero,
            Fault::phase_flip(QubitId(1)),
        ))
        .unwrap();
        let names: Vec<&str> = circuit.instructions().iter().map(|i| i.name()).collect();

        assert_eq!(names[2..9], ["h", "h", "h", "z", "h", "h", "h"]);
    }

    #[test]
    fn test_without_fault() {
        let circuit =
            phase_flip_code(&CodeOptions::new(LogicalState::Zero, Fault::none())).unwrap();
        assert_eq!(circuit.count_ops().get("z"), None);
        assert_eq!(circuit.num_ops(), 12);
    }
}

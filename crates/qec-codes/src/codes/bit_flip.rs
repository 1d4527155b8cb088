//! Three-qubit bit-flip code.

use qec_ir::{Circuit, ClbitId, IrResult, QubitId};

use super::repetition::{majority_vote, repetition_encode};
use super::{CodeOptions, prepare_logical};
use crate::injector::inject;

const DATA: QubitId = QubitId(0);
const COPIES: [QubitId; 2] = [QubitId(1), QubitId(2)];

/// Build the bit-flip code circuit.
///
/// Qubit 0 carries the logical state and is copied onto qubits 1 and 2. After
/// the fault, the copy is undone so qubits 1 and 2 hold the syndrome, and a
/// Toffoli flips qubit 0 back when both report an error.
pub fn bit_flip_code(options: &CodeOptions) -> IrResult<Circuit> {
    let mut circuit = Circuit::new("bit_flip_code", 3, 1)?;
    prepare_logical(&mut circuit, options.logical)?;

    // Encoding
    repetition_encode(&mut circuit, DATA, COPIES)?;

    inject(&mut circuit, options.fault)?;

    // Decoding
    repetition_encode(&mut circuit, DATA, COPIES)?;
    majority_vote(&mut circuit, DATA, [COPIES[1], COPIES[0]])?;

    circuit.measure(DATA, ClbitId(0))?;
    Ok(circuit)
}

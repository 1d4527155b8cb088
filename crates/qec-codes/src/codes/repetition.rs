//! Three-qubit repetition building blocks shared by every code.

use qec_ir::{Circuit, IrResult, QubitId};

/// Copy `root` onto `copies` in the computational basis.
///
/// The gate sequence is its own inverse, so the same call is used for both
/// encoding and decoding.
pub(crate) fn repetition_encode(
    circuit: &mut Circuit,
    root: QubitId,
    copies: [QubitId; 2],
) -> IrResult<()> {
    circuit.cx(root, copies[0])?;
    circuit.cx(root, copies[1])?;
    Ok(())
}

/// Flip `root` when both syndrome qubits read 1.
pub(crate) fn majority_vote(
    circuit: &mut Circuit,
    root: QubitId,
    syndrome: [QubitId; 2],
) -> IrResult<()> {
    circuit.ccx(syndrome[0], syndrome[1], root)?;
    Ok(())
}

/// Hadamard on each listed qubit.
pub(crate) fn hadamard_layer(circuit: &mut Circuit, qubits: &[QubitId]) -> IrResult<()> {
    for &qubit in qubits {
        circuit.h(qubit)?;
    }
    Ok(())
}

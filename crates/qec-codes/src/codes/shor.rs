//! Nine-qubit Shor code.
//!
//! The outer layer is a phase-flip code over the block roots 0, 3 and 6; each
//! root is then protected by its own bit-flip code over `root+1` and
//! `root+2`.
//!
//! ```text
//!   encode   CX(0→3) CX(0→6) · H(0,3,6) · CX(r→r+1) CX(r→r+2)   r ∈ {0,3,6}
//!   ░ fault ░
//!   inner    CX(r→r+1) CX(r→r+2) · CCX(r+1, r+2 → r)
//!   outer    H(0,3,6) · CX(0→3) CX(0→6) · CCX(3, 6 → 0)
//!   ░ measure q0
//! ```

use qec_ir::{Circuit, ClbitId, IrResult, QubitId};

use super::repetition::{hadamard_layer, majority_vote, repetition_encode};
use super::{CodeOptions, prepare_logical};
use crate::injector::inject;

/// Roots of the three inner blocks.
const ROOTS: [QubitId; 3] = [QubitId(0), QubitId(3), QubitId(6)];

fn block_copies(root: QubitId) -> [QubitId; 2] {
    [QubitId(root.0 + 1), QubitId(root.0 + 2)]
}

fn outer_encode(circuit: &mut Circuit) -> IrResult<()> {
    repetition_encode(circuit, ROOTS[0], [ROOTS[1], ROOTS[2]])
}

fn inner_encode(circuit: &mut Circuit) -> IrResult<()> {
    for root in ROOTS {
        repetition_encode(circuit, root, block_copies(root))?;
    }
    Ok(())
}

/// Build the Shor code circuit.
///
/// Barriers fence off the fault region and close the correction stage.
pub fn shor_code(options: &CodeOptions) -> IrResult<Circuit> {
    let mut circuit = Circuit::new("shor_code", 9, 1)?;
    prepare_logical(&mut circuit, options.logical)?;

    // Encoding
    outer_encode(&mut circuit)?;
    hadamard_layer(&mut circuit, &ROOTS)?;
    inner_encode(&mut circuit)?;
    circuit.barrier_all()?;

    inject(&mut circuit, options.fault)?;
    circuit.barrier_all()?;

    // Inner correction: one bit-flip decode per block
    inner_encode(&mut circuit)?;
    for root in ROOTS {
        majority_vote(&mut circuit, root, block_copies(root))?;
    }

    // Outer correction: phase-flip decode over the roots
    hadamard_layer(&mut circuit, &ROOTS)?;
    outer_encode(&mut circuit)?;
    majority_vote(&mut circuit, ROOTS[0], [ROOTS[1], ROOTS[2]])?;
    circuit.barrier_all()?;

    circuit.measure(ROOTS[0], ClbitId(0))?;
    Ok(circuit)
}

//! Calibration circuit generation and bitstring helpers.

use qec_ir::{Circuit, ClbitId, QubitId};

use crate::error::{MitigationError, MitigationResult};

/// Largest register the calibration set is generated for (`2^10` circuits).
pub const MAX_CALIBRATION_QUBITS: usize = 10;

/// Number of basis states of a `k`-bit register, `2^k`.
///
/// Fails for registers wider than [`MAX_CALIBRATION_QUBITS`].
pub fn register_dim(num_qubits: usize) -> MitigationResult<usize> {
    if num_qubits > MAX_CALIBRATION_QUBITS {
        return Err(MitigationError::InvalidCalibration(format!(
            "{num_qubits} qubits exceeds the calibration limit of {MAX_CALIBRATION_QUBITS}"
        )));
    }
    Ok(1usize << num_qubits)
}

/// Label of basis state `state` over `num_qubits` bits, qubit 0 rightmost.
pub fn state_label(state: usize, num_qubits: usize) -> String {
    (0..num_qubits)
        .rev()
        .map(|bit| if (state >> bit) & 1 == 1 { '1' } else { '0' })
        .collect()
}

/// Parse a bitstring of exactly `num_qubits` binary characters.
pub fn parse_state(bitstring: &str, num_qubits: usize) -> Option<usize> {
    if bitstring.len() != num_qubits {
        return None;
    }
    bitstring.chars().try_fold(0usize, |acc, c| match c {
        '0' => Some(acc << 1),
        '1' => Some((acc << 1) | 1),
        _ => None,
    })
}

/// Build the `2^k` basis-state preparation circuits.
///
/// Circuit `j` prepares basis state `j` by applying `X` to every qubit whose
/// bit is set, then measures qubit `i` into clbit `i`. Entries are returned
/// in state order together with their labels.
pub fn calibration_circuits(num_qubits: usize) -> MitigationResult<Vec<(String, Circuit)>> {
    let dim = register_dim(num_qubits)?;
    let width = u32::try_from(num_qubits).unwrap_or(u32::MAX);
    (0..dim)
        .map(|state| {
            let label = state_label(state, num_qubits);
            let mut circuit = Circuit::new(format!("cal_{label}"), width, width)?;
            for qubit in 0..width {
                if (state >> qubit) & 1 == 1 {
                    circuit.x(QubitId(qubit))?;
                }
            }
            for qubit in 0..width {
                circuit.measure(QubitId(qubit), ClbitId(qubit))?;
            }
            Ok((label, circuit))
        })
        .collect::<Result<_, qec_ir::IrError>>()
        .map_err(MitigationError::from)
}

//! Calibration matrix.

use ndarray::Array2;
use qec_hal::Counts;

use crate::calibration::{parse_state, register_dim, state_label};
use crate::error::{MitigationError, MitigationResult};

/// Column-stochastic readout response of a `k`-bit register.
///
/// Entry `(i, j)` is the probability of observing basis state `i` when basis
/// state `j` was prepared. Built once and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationMatrix {
    num_qubits: usize,
    matrix: Array2<f64>,
}

impl CalibrationMatrix {
    /// Build the matrix from calibration counts in state order.
    ///
    /// `counts[j]` holds the outcomes of the circuit that prepared state `j`;
    /// each column is normalized by its own shot total.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_counts(num_qubits: usize, counts: &[Counts]) -> MitigationResult<Self> {
        let dim = register_dim(num_qubits)?;
        if counts.len() != dim {
            return Err(MitigationError::InvalidCalibration(format!(
                "expected {dim} calibration results for {num_qubits} qubits, got {}",
                counts.len()
            )));
        }

        let mut matrix = Array2::<f64>::zeros((dim, dim));
        for (prepared, column) in counts.iter().enumerate() {
            let total = column.total_shots();
            if total == 0 {
                return Err(MitigationError::InvalidCalibration(format!(
                    "no shots recorded for prepared state {}",
                    state_label(prepared, num_qubits)
                )));
            }
            for (bitstring, &count) in column.iter() {
                let observed = parse_state(bitstring, num_qubits).ok_or_else(|| {
                    MitigationError::ShapeMismatch(format!(
                        "calibration outcome '{bitstring}' is not a {num_qubits}-bit string"
                    ))
                })?;
                matrix[[observed, prepared]] = count as f64 / total as f64;
            }
        }

        Ok(Self { num_qubits, matrix })
    }

    /// Perfect readout.
    pub fn identity(num_qubits: usize) -> MitigationResult<Self> {
        let dim = register_dim(num_qubits)?;
        Ok(Self {
            num_qubits,
            matrix: Array2::eye(dim),
        })
    }

    /// Readout where each bit flips independently with probability `p`.
    pub fn from_readout_error(num_qubits: usize, p: f64) -> MitigationResult<Self> {
        let dim = register_dim(num_qubits)?;
        let matrix = Array2::from_shape_fn((dim, dim), |(observed, prepared)| {
            let flips = (observed ^ prepared).count_ones();
            let kept = u32::try_from(num_qubits).unwrap_or(u32::MAX) - flips;
            p.powi(flips as i32) * (1.0 - p).powi(kept as i32)
        });
        Ok(Self { num_qubits, matrix })
    }

    /// Number of calibrated bits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Matrix dimension, `2^k`.
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Probability of observing `observed` given `prepared`.
    pub fn get(&self, observed: usize, prepared: usize) -> f64 {
        self.matrix[[observed, prepared]]
    }

    /// Underlying matrix.
    pub fn as_array(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Rows of the matrix, for reporting.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.matrix.rows().into_iter().map(|row| row.to_vec()).collect()
    }

    /// Probability that prepared basis state `state` reads back correctly.
    pub fn readout_fidelity(&self, state: usize) -> f64 {
        self.matrix[[state, state]]
    }

    /// Mean of the diagonal.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_fidelity(&self) -> f64 {
        self.matrix.diag().sum() / self.dim() as f64
    }

    /// Largest entry-wise difference to another matrix of the same size.
    pub fn max_deviation(&self, other: &CalibrationMatrix) -> Option<f64> {
        (self.dim() == other.dim()).then(|| {
            self.matrix
                .iter()
                .zip(other.matrix.iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max)
        })
    }
}

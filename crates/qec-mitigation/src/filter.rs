//! Applying a calibration matrix to raw counts.

use ndarray::Array1;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qec_hal::Counts;

use crate::calibration::{parse_state, state_label};
use crate::error::{MitigationError, MitigationResult};
use crate::matrix::CalibrationMatrix;
use crate::solve::{SolveMethod, solve};

/// Readout-corrected counts.
///
/// Keys are bitstrings of the calibrated width; values are non-negative and
/// sum to the shot total of the raw counts they were derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MitigatedCounts {
    counts: FxHashMap<String, f64>,
    total: f64,
}

impl MitigatedCounts {
    /// Corrected count for a bitstring.
    pub fn get(&self, bitstring: &str) -> f64 {
        self.counts.get(bitstring).copied().unwrap_or(0.0)
    }

    /// Iterate over (bitstring, count) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.counts.iter()
    }

    /// Shot total the counts were renormalized to.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Corrected probability of each bitstring.
    pub fn probabilities(&self) -> FxHashMap<String, f64> {
        if self.total <= 0.0 {
            return FxHashMap::default();
        }
        self.counts
            .iter()
            .map(|(k, &v)| (k.clone(), v / self.total))
            .collect()
    }

    /// Probability of one bitstring.
    pub fn probability(&self, bitstring: &str) -> f64 {
        if self.total <= 0.0 {
            0.0
        } else {
            self.get(bitstring) / self.total
        }
    }

    /// Sorted by count descending, then bitstring ascending.
    pub fn sorted(&self) -> Vec<(&String, f64)> {
        let mut items: Vec<_> = self.counts.iter().map(|(k, &v)| (k, v)).collect();
        items.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        items
    }

    /// Most likely bitstring after correction.
    pub fn most_likely(&self) -> Option<(&String, f64)> {
        self.sorted().into_iter().next()
    }

    /// Number of bitstrings with non-zero weight.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no bitstring carries weight.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Corrects raw counts with a calibration matrix.
#[derive(Debug, Clone)]
pub struct MeasurementFilter {
    matrix: CalibrationMatrix,
    method: SolveMethod,
}

impl MeasurementFilter {
    /// Create a filter using the default solver.
    pub fn new(matrix: CalibrationMatrix) -> Self {
        Self {
            matrix,
            method: SolveMethod::default(),
        }
    }

    /// Choose the solver.
    pub fn with_method(mut self, method: SolveMethod) -> Self {
        self.method = method;
        self
    }

    /// The calibration this filter applies.
    pub fn matrix(&self) -> &CalibrationMatrix {
        &self.matrix
    }

    /// Solve `A x = b` for the raw counts `b`, clip negatives and
    /// renormalize to the raw shot total.
    #[allow(clippy::cast_precision_loss)]
    pub fn apply(&self, raw: &Counts) -> MitigationResult<MitigatedCounts> {
        let num_qubits = self.matrix.num_qubits();
        let total = raw.total_shots() as f64;
        if raw.is_empty() {
            return Ok(MitigatedCounts::default());
        }

        let mut observed = Array1::<f64>::zeros(self.matrix.dim());
        for (bitstring, &count) in raw.iter() {
            let state = parse_state(bitstring, num_qubits).ok_or_else(|| {
                MitigationError::ShapeMismatch(format!(
                    "outcome '{bitstring}' does not match the {num_qubits}-bit calibration"
                ))
            })?;
            observed[state] += count as f64;
        }

        let mut corrected = solve(self.matrix.as_array(), &observed, self.method)?;
        corrected.mapv_inplace(|v| v.max(0.0));
        let clipped_total = corrected.sum();
        if clipped_total <= 0.0 {
            return Err(MitigationError::SingularCalibration(
                "corrected distribution has no positive weight".into(),
            ));
        }

        let scale = total / clipped_total;
        let counts: FxHashMap<String, f64> = corrected
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.0)
            .map(|(state, v)| (state_label(state, num_qubits), v * scale))
            .collect();

        debug!(
            num_qubits,
            method = %self.method,
            outcomes = counts.len(),
            "applied measurement filter"
        );
        Ok(MitigatedCounts { counts, total })
    }
}

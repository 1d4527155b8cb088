//! Per-backend calibration cache.

use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument};

use qec_hal::{Backend, Counts};
use qec_ir::Circuit;

use crate::calibration::calibration_circuits;
use crate::error::{MitigationError, MitigationResult};
use crate::filter::{MeasurementFilter, MitigatedCounts};
use crate::matrix::CalibrationMatrix;
use crate::solve::SolveMethod;

/// Default shots per calibration circuit.
pub const DEFAULT_CALIBRATION_SHOTS: u32 = 1000;

/// Measurement mitigation bound to one backend session.
///
/// The calibration set for a register width `k` is executed once and the
/// resulting matrix is reused for every later correction of `k`-bit counts,
/// unless caching is disabled.
pub struct MitigationSession<'a, B: Backend + ?Sized> {
    backend: &'a B,
    shots: u32,
    method: SolveMethod,
    cache: bool,
    calibrations: FxHashMap<usize, CalibrationMatrix>,
    calibration_runs: usize,
}

impl<'a, B: Backend + ?Sized> MitigationSession<'a, B> {
    /// Create a session for `backend`.
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            shots: DEFAULT_CALIBRATION_SHOTS,
            method: SolveMethod::default(),
            cache: true,
            calibrations: FxHashMap::default(),
            calibration_runs: 0,
        }
    }

    /// Shots per calibration circuit.
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    /// Solver used when correcting counts.
    pub fn with_method(mut self, method: SolveMethod) -> Self {
        self.method = method;
        self
    }

    /// Keep calibrations between corrections (default `true`).
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Install a known calibration, e.g. one loaded from an earlier run.
    pub fn insert_calibration(&mut self, matrix: CalibrationMatrix) {
        self.calibrations.insert(matrix.num_qubits(), matrix);
    }

    /// Cached calibration for `k` bits, if any.
    pub fn calibration(&self, num_qubits: usize) -> Option<&CalibrationMatrix> {
        self.calibrations.get(&num_qubits)
    }

    /// Number of calibration sets submitted so far.
    pub fn calibration_runs(&self) -> usize {
        self.calibration_runs
    }

    /// Solver in use.
    pub fn method(&self) -> SolveMethod {
        self.method
    }

    /// Drop all cached calibrations.
    pub fn clear(&mut self) {
        self.calibrations.clear();
    }

    /// Calibrate a `k`-bit register, reusing the cached matrix if present.
    pub async fn calibrate(&mut self, num_qubits: usize) -> MitigationResult<&CalibrationMatrix> {
        if !(self.cache && self.calibrations.contains_key(&num_qubits)) {
            let matrix = self.run_calibration(num_qubits).await?;
            self.calibrations.insert(num_qubits, matrix);
        }
        self.calibrations.get(&num_qubits).ok_or_else(|| {
            MitigationError::InvalidCalibration(format!("no calibration for {num_qubits} qubits"))
        })
    }

    /// Correct `counts`, calibrating their width first if needed.
    pub async fn mitigate(&mut self, counts: &Counts) -> MitigationResult<MitigatedCounts> {
        let num_qubits = counts.width().ok_or_else(|| {
            MitigationError::ShapeMismatch("counts are empty or of mixed width".into())
        })?;
        let matrix = self.calibrate(num_qubits).await?.clone();
        MeasurementFilter::new(matrix)
            .with_method(self.method)
            .apply(counts)
    }

    #[instrument(skip(self), fields(backend = self.backend.name(), shots = self.shots))]
    async fn run_calibration(&mut self, num_qubits: usize) -> MitigationResult<CalibrationMatrix> {
        let circuits: Vec<Circuit> = calibration_circuits(num_qubits)?
            .into_iter()
            .map(|(_, circuit)| circuit)
            .collect();
        info!(circuits = circuits.len(), "running measurement calibration");

        let counts = self.backend.execute_batch(&circuits, self.shots).await?;
        let matrix = CalibrationMatrix::from_counts(num_qubits, &counts)?;
        self.calibration_runs += 1;

        debug!(
            average_fidelity = matrix.average_fidelity(),
            "calibration complete"
        );
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::MAX_CALIBRATION_QUBITS;
    use qec_adapter_sim::SimulatorBackend;
    use qec_ir::{ClbitId, QubitId};

    #[tokio::test]
    async fn test_ideal_backend_calibrates_to_identity() {
        let backend = SimulatorBackend::new().with_seed(1);
        let mut session = MitigationSession::new(&backend).with_shots(200);

        let matrix = session.calibrate(2).await.unwrap();
        assert_eq!(
            matrix.max_deviation(&CalibrationMatrix::identity(2).unwrap()),
            Some(0.0)
        );
    }

    #[tokio::test]
    async fn test_calibration_is_cached() {
        let backend = SimulatorBackend::new().with_seed(2);
        let mut session = MitigationSession::new(&backend).with_shots(100);

        session.calibrate(1).await.unwrap();
        session.calibrate(1).await.unwrap();
        assert_eq!(session.calibration_runs(), 1);

        session.calibrate(2).await.unwrap();
        assert_eq!(session.calibration_runs(), 2);
        assert!(session.calibration(1).is_some());
        assert!(session.calibration(3).is_none());
    }

    #[tokio::test]
    async fn test_cache_disabled_recalibrates() {
        let backend = SimulatorBackend::new().with_seed(3);
        let mut session = MitigationSession::new(&backend)
            .with_shots(100)
            .with_cache(false);

        session.calibrate(1).await.unwrap();
        session.calibrate(1).await.unwrap();
        assert_eq!(session.calibration_runs(), 2);
    }

    #[tokio::test]
    async fn test_noisy_calibration_matches_model() {
        let backend = SimulatorBackend::new().with_readout_error(0.05).with_seed(4);
        let mut session = MitigationSession::new(&backend).with_shots(20_000);

        let matrix = session.calibrate(2).await.unwrap().clone();
        let model = CalibrationMatrix::from_readout_error(2, 0.05).unwrap();
        let deviation = matrix.max_deviation(&model).unwrap();
        assert!(deviation < 0.02, "deviation {deviation}");
    }

    #[tokio::test]
    async fn test_mitigate_improves_noisy_counts() {
        let backend = SimulatorBackend::new().with_readout_error(0.1).with_seed(5);
        let mut circuit = Circuit::new("one", 1, 1).unwrap();
        circuit.x(QubitId(0)).unwrap().measure(QubitId(0), ClbitId(0)).unwrap();

        let raw = backend.execute(&circuit, 4000).await.unwrap();
        let mut session = MitigationSession::new(&backend).with_shots(4000);
        let mitigated = session.mitigate(&raw).await.unwrap();

        let raw_one = raw.get("1") as f64 / 4000.0;
        assert!(mitigated.probability("1") > raw_one);
        assert!((mitigated.total() - 4000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_mitigate_rejects_mixed_width() {
        let backend = SimulatorBackend::new();
        let mut session = MitigationSession::new(&backend);
        let counts = Counts::from_pairs([("0", 1), ("10", 1)]);

        let err = session.mitigate(&counts).await.unwrap_err();
        assert!(matches!(err, MitigationError::ShapeMismatch(_)));
        assert_eq!(session.calibration_runs(), 0);
    }

    #[tokio::test]
    async fn test_inserted_calibration_skips_backend() {
        let backend = SimulatorBackend::new();
        let mut session = MitigationSession::new(&backend);
        session.insert_calibration(CalibrationMatrix::from_readout_error(1, 0.1).unwrap());

        let mitigated = session
            .mitigate(&Counts::from_pairs([("0", 100), ("1", 900)]))
            .await
            .unwrap();
        assert_eq!(session.calibration_runs(), 0);
        assert!((mitigated.get("1") - 1000.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_calibration_width_limit() {
        let backend = SimulatorBackend::new();
        let mut session = MitigationSession::new(&backend);
        let err = session.calibrate(MAX_CALIBRATION_QUBITS + 1).await.unwrap_err();
        assert!(matches!(err, MitigationError::InvalidCalibration(_)));
    }
}

//! Build, execute and optionally readout-correct one code.

use serde::Serialize;
use tracing::{info, instrument, warn};

use qec_hal::{Backend, Counts};
use qec_ir::Circuit;
use qec_mitigation::{MitigatedCounts, MitigationSession};

use crate::codes::{CodeKind, CodeOptions};
use crate::error::CodeResult;

/// Shots per experiment when the caller does not choose.
pub const DEFAULT_SHOTS: u32 = 1000;

/// One run of an error-correcting code against a backend.
#[derive(Debug, Clone)]
pub struct Experiment {
    code: CodeKind,
    options: CodeOptions,
    shots: u32,
    mitigate: bool,
}

impl Experiment {
    /// Run `code` with its default fault, logical zero and default shots.
    pub fn new(code: CodeKind) -> Self {
        Self {
            code,
            options: code.default_options(),
            shots: DEFAULT_SHOTS,
            mitigate: code.mitigated_by_default(),
        }
    }

    /// Replace the builder options.
    pub fn with_options(mut self, options: CodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the number of shots.
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    /// Enable or disable readout correction.
    pub fn with_mitigation(mut self, mitigate: bool) -> Self {
        self.mitigate = mitigate;
        self
    }

    /// The code being run.
    pub fn code(&self) -> CodeKind {
        self.code
    }

    /// Builder options.
    pub fn options(&self) -> &CodeOptions {
        &self.options
    }

    /// Shots per run.
    pub fn shots(&self) -> u32 {
        self.shots
    }

    /// Whether results are readout-corrected.
    pub fn mitigation_enabled(&self) -> bool {
        self.mitigate
    }

    /// Build the circuit without running it.
    pub fn build(&self) -> CodeResult<Circuit> {
        Ok(self.code.build(&self.options)?)
    }

    /// Execute the experiment.
    ///
    /// With mitigation enabled, `session` supplies (and caches) the
    /// calibration; without one a throwaway session on `backend` is used. A
    /// singular calibration is logged and the report falls back to raw
    /// counts. Every other failure is returned.
    #[instrument(skip_all, fields(code = %self.code, shots = self.shots))]
    pub async fn run<'b, B: Backend + ?Sized>(
        &self,
        backend: &'b B,
        session: Option<&mut MitigationSession<'b, B>>,
    ) -> CodeResult<ExperimentReport> {
        let circuit = self.build()?;
        info!(
            fault = %self.options.fault,
            logical = %self.options.logical,
            backend = backend.name(),
            "running experiment"
        );

        let raw = backend.execute(&circuit, self.shots).await?;

        let mut mitigated = None;
        let mut mitigation_fallback = None;
        if self.mitigate {
            let mut local;
            let session = match session {
                Some(session) => session,
                None => {
                    local = MitigationSession::new(backend);
                    &mut local
                }
            };
            match session.mitigate(&raw).await {
                Ok(corrected) => mitigated = Some(corrected),
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "mitigation unavailable, reporting raw counts");
                    mitigation_fallback = Some(e.to_string());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(ExperimentReport {
            code: self.code,
            options: self.options,
            shots: self.shots,
            circuit,
            raw,
            mitigated,
            mitigation_fallback,
        })
    }
}

/// Outcome of an [`Experiment`].
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    /// Code that was run.
    pub code: CodeKind,
    /// Builder options used.
    pub options: CodeOptions,
    /// Shots executed.
    pub shots: u32,
    /// Circuit submitted to the backend.
    pub circuit: Circuit,
    /// Counts as returned by the backend.
    pub raw: Counts,
    /// Readout-corrected counts, when mitigation ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitigated: Option<MitigatedCounts>,
    /// Why mitigation was requested but not applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitigation_fallback: Option<String>,
}

impl ExperimentReport {
    /// Outcome an error-free decode reports.
    pub fn expected_outcome(&self) -> &'static str {
        self.options.logical.expected_outcome()
    }

    /// Probability of `expected`, from the corrected counts when present.
    pub fn success_probability(&self, expected: &str) -> f64 {
        match &self.mitigated {
            Some(mitigated) => mitigated.probability(expected),
            None => self.raw_success_probability(expected),
        }
    }

    /// Probability of `expected` in the raw counts.
    #[allow(clippy::cast_precision_loss)]
    pub fn raw_success_probability(&self, expected: &str) -> f64 {
        let total = self.raw.total_shots();
        if total == 0 {
            return 0.0;
        }
        self.raw.get(expected) as f64 / total as f64
    }

    /// Probability of any outcome other than `expected`.
    pub fn logical_error_rate(&self, expected: &str) -> f64 {
        1.0 - self.success_probability(expected)
    }

    /// Outcome carrying the most weight in the reported counts.
    pub fn decoded_outcome(&self) -> Option<&str> {
        match &self.mitigated {
            Some(mitigated) => mitigated.most_likely().map(|(bitstring, _)| bitstring.as_str()),
            None => self.raw.most_frequent().map(|(bitstring, _)| bitstring.as_str()),
        }
    }

    /// Whether the reported counts (corrected when present) put at most
    /// `tolerance` of the mass outside the expected outcome.
    pub fn is_corrected(&self, tolerance: f64) -> bool {
        self.logical_error_rate(self.expected_outcome()) <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::LogicalState;
    use crate::error::CodeError;
    use crate::injector::Fault;
    use qec_adapter_sim::SimulatorBackend;
    use qec_hal::HalError;
    use qec_ir::QubitId;

    #[test]
    fn test_defaults() {
        let shor = Experiment::new(CodeKind::Shor);
        assert_eq!(shor.shots(), DEFAULT_SHOTS);
        assert!(shor.mitigation_enabled());
        assert_eq!(shor.options().fault, Fault::both(QubitId(0)));

        let bit = Experiment::new(CodeKind::BitFlip).with_shots(10);
        assert!(!bit.mitigation_enabled());
        assert_eq!(bit.shots(), 10);
    }

    #[tokio::test]
    async fn test_run_without_mitigation() {
        let backend = SimulatorBackend::new().with_seed(11);
        let report = Experiment::new(CodeKind::BitFlip)
            .with_options(CodeOptions::new(LogicalState::One, Fault::bit_flip(QubitId(2))))
            .with_shots(200)
            .run(&backend, None)
            .await
            .unwrap();

        assert_eq!(report.expected_outcome(), "1");
        assert_eq!(report.decoded_outcome(), Some("1"));
        assert!(report.is_corrected(0.0));
        assert!(report.mitigated.is_none());
        assert_eq!(report.logical_error_rate("1"), 0.0);
        assert_eq!(report.success_probability("0"), 0.0);
    }

    #[tokio::test]
    async fn test_run_with_local_session() {
        let backend = SimulatorBackend::new().with_seed(12);
        let report = Experiment::new(CodeKind::Shor)
            .with_shots(100)
            .run(&backend, None)
            .await
            .unwrap();

        let mitigated = report.mitigated.as_ref().unwrap();
        assert!((mitigated.get("0") - 100.0).abs() < 1e-9);
        assert!(report.mitigation_fallback.is_none());
    }

    #[tokio::test]
    async fn test_shared_session_calibrates_once() {
        let backend = SimulatorBackend::new().with_seed(13);
        let mut session = MitigationSession::new(&backend).with_shots(100);

        for target in 0..3 {
            Experiment::new(CodeKind::Shor)
                .with_options(CodeOptions::new(LogicalState::Zero, Fault::both(QubitId(target))))
                .with_shots(50)
                .run(&backend, Some(&mut session))
                .await
                .unwrap();
        }
        assert_eq!(session.calibration_runs(), 1);
    }

    #[tokio::test]
    async fn test_verdict_uses_corrected_counts() {
        let backend = SimulatorBackend::new().with_readout_error(0.05).with_seed(15);
        let mut session = MitigationSession::new(&backend).with_shots(4000);
        let report = Experiment::new(CodeKind::Shor)
            .with_shots(4000)
            .run(&backend, Some(&mut session))
            .await
            .unwrap();

        assert!(report.raw_success_probability("0") < 0.99);
        assert_eq!(report.decoded_outcome(), Some("0"));
        assert!(report.is_corrected(0.03), "error rate {}", report.logical_error_rate("0"));

        let raw_only = Experiment::new(CodeKind::Shor)
            .with_shots(4000)
            .with_mitigation(false)
            .run(&backend, None)
            .await
            .unwrap();
        assert!(!raw_only.is_corrected(0.03));
    }

    #[tokio::test]
    async fn test_zero_shots_propagates() {
        let backend = SimulatorBackend::new();
        let err = Experiment::new(CodeKind::BitFlip)
            .with_shots(0)
            .run(&backend, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CodeError::Backend(HalError::InvalidShots(_))));
    }

    #[tokio::test]
    async fn test_bad_fault_target_never_reaches_backend() {
        let backend = SimulatorBackend::new();
        let err = Experiment::new(CodeKind::PhaseFlip)
            .with_options(CodeOptions::new(LogicalState::Zero, Fault::phase_flip(QubitId(5))))
            .run(&backend, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CodeError::Circuit(ref e) if e.is_index_error()));
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let backend = SimulatorBackend::new().with_seed(14);
        let report = Experiment::new(CodeKind::BitFlip)
            .with_shots(10)
            .run(&backend, None)
            .await
            .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["code"], "bit-flip");
        assert_eq!(json["shots"], 10);
        assert!(json.get("mitigated").is_none());
    }
}

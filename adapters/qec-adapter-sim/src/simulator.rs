//! Simulator backend implementation.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use qec_hal::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, Capabilities, Counts,
    ExecutionResult, HalError, HalResult, Job, JobId, JobStatus, ValidationResult,
};
use qec_ir::Circuit;

use crate::statevector::Statevector;

/// Default number of qubits the simulator accepts.
pub const DEFAULT_MAX_QUBITS: u32 = 20;

/// Default number of jobs kept in the job table.
///
/// Once the table is full, the oldest finished jobs are evicted on submit.
pub const DEFAULT_JOB_RETENTION: usize = 256;

/// Job data for the simulator.
struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
    /// Submission order, for eviction.
    seq: u64,
}

/// Local simulator backend.
///
/// Circuits run on an exact statevector. Gates before the first measurement
/// are applied once per job; the measurement suffix is replayed for every
/// shot, so mid-circuit measurement collapses the state the way hardware
/// would. An optional readout error flips each recorded bit independently.
pub struct SimulatorBackend {
    /// Backend configuration.
    config: BackendConfig,
    /// Cached capabilities.
    capabilities: Capabilities,
    /// Active jobs.
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    /// Next submission sequence number.
    next_seq: AtomicU64,
    /// Jobs kept before finished ones are evicted.
    job_retention: usize,
    /// Shot sampler.
    rng: Mutex<StdRng>,
    /// Probability that a measured bit is reported flipped.
    readout_error: f64,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self {
            config: BackendConfig::new("simulator"),
            capabilities: Capabilities::simulator(DEFAULT_MAX_QUBITS),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            next_seq: AtomicU64::new(0),
            job_retention: DEFAULT_JOB_RETENTION,
            rng: Mutex::new(StdRng::from_entropy()),
            readout_error: 0.0,
        }
    }

    /// Limit the number of qubits the simulator accepts.
    pub fn with_max_qubits(mut self, max_qubits: u32) -> Self {
        self.capabilities.num_qubits = max_qubits;
        self
    }

    /// Set the readout error probability, clamped to `[0, 1]`.
    pub fn with_readout_error(mut self, probability: f64) -> Self {
        self.readout_error = probability.clamp(0.0, 1.0);
        let flagged = self.capabilities.features.iter().any(|f| f == "readout_noise");
        if self.readout_error > 0.0 && !flagged {
            self.capabilities = self.capabilities.with_feature("readout_noise");
        }
        self
    }

    /// Seed the shot sampler for reproducible counts.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Number of jobs kept before the oldest finished ones are evicted.
    pub fn with_job_retention(mut self, jobs: usize) -> Self {
        self.job_retention = jobs.max(1);
        self
    }

    /// Readout error probability.
    pub fn readout_error(&self) -> f64 {
        self.readout_error
    }

    /// Number of jobs currently held in the job table.
    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Run simulation synchronously.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    fn run_simulation(&self, circuit: &Circuit, shots: u32) -> ExecutionResult {
        let start = Instant::now();

        let instructions = circuit.instructions();
        let split = instructions
            .iter()
            .position(|inst| inst.is_measure())
            .unwrap_or(instructions.len());
        let (prefix, suffix) = instructions.split_at(split);

        let mut prepared = Statevector::new(circuit.num_qubits());
        for inst in prefix {
            prepared.apply(inst);
        }
        debug!(
            qubits = prepared.num_qubits(),
            unitary_ops = prefix.len(),
            sampled_ops = suffix.len(),
            "prepared statevector"
        );

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut counts = Counts::new();
        let mut clbits = vec![false; circuit.num_clbits()];

        for _ in 0..shots {
            let mut sv = prepared.clone();
            clbits.fill(false);

            for inst in suffix {
                if !inst.is_measure() {
                    sv.apply(inst);
                    continue;
                }
                for (qubit, clbit) in inst.qubits.iter().zip(&inst.clbits) {
                    let mut bit = sv.measure(qubit.index(), &mut *rng);
                    if self.readout_error > 0.0 && rng.r#gen::<f64>() < self.readout_error {
                        bit = !bit;
                    }
                    clbits[clbit.index()] = bit;
                }
            }

            counts.insert(bitstring(&clbits), 1);
        }

        let elapsed = start.elapsed();
        debug!(?elapsed, outcomes = counts.len(), "simulation completed");

        ExecutionResult::new(counts, shots)
            .with_execution_time(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .with_metadata(serde_json::json!({ "readout_error": self.readout_error }))
    }

    fn update_job(&self, job_id: &JobId, f: impl FnOnce(&mut SimJob)) -> HalResult<()> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let sim_job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        f(sim_job);
        Ok(())
    }
}

/// Drop the oldest finished jobs so one more fits under `limit`.
///
/// Jobs still queued or running are never evicted.
fn evict_finished(jobs: &mut FxHashMap<String, SimJob>, limit: usize) {
    if jobs.len() < limit {
        return;
    }
    let mut finished: Vec<(u64, String)> = jobs
        .iter()
        .filter(|(_, sim_job)| sim_job.job.status.is_terminal())
        .map(|(id, sim_job)| (sim_job.seq, id.clone()))
        .collect();
    finished.sort_unstable();

    let excess = jobs.len() + 1 - limit;
    for (_, id) in finished.into_iter().take(excess) {
        jobs.remove(&id);
    }
    debug!(retained = jobs.len(), "evicted finished jobs");
}

/// Render classical bits with clbit 0 as the rightmost character.
fn bitstring(clbits: &[bool]) -> String {
    clbits
        .iter()
        .rev()
        .map(|&bit| if bit { '1' } else { '0' })
        .collect()
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        Ok(BackendAvailability::always_available())
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        Ok(ValidationResult::from_reasons(
            self.capabilities.check(circuit),
        ))
    }

    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        if circuit.num_qubits() > self.capabilities.num_qubits as usize {
            return Err(HalError::CircuitTooLarge {
                required: circuit.num_qubits(),
                available: self.capabilities.num_qubits,
            });
        }

        let job_id = JobId::new(Uuid::new_v4().to_string());
        {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            evict_finished(&mut jobs, self.job_retention);
            jobs.insert(
                job_id.0.clone(),
                SimJob {
                    job: Job::new(job_id.clone(), circuit.name(), shots),
                    result: None,
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                },
            );
        }
        debug!(job = %job_id, shots, "submitted job");

        self.update_job(&job_id, |sim_job| {
            sim_job.job.transition(JobStatus::Running);
        })?;

        let result = self.run_simulation(circuit, shots);

        self.update_job(&job_id, |sim_job| {
            if sim_job.job.transition(JobStatus::Completed) {
                sim_job.result = Some(result);
            }
        })?;

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let sim_job = jobs
            .get(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        match (&sim_job.job.status, &sim_job.result) {
            (JobStatus::Completed, Some(result)) => Ok(result.clone()),
            (JobStatus::Failed(msg), _) => Err(HalError::JobFailed(msg.clone())),
            (JobStatus::Cancelled, _) => Err(HalError::JobCancelled),
            (status, _) => Err(HalError::JobFailed(format!(
                "job {job_id} has no result (status: {status})"
            ))),
        }
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.update_job(job_id, |sim_job| {
            sim_job.job.transition(JobStatus::Cancelled);
        })
    }
}

impl BackendFactory for SimulatorBackend {
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let max_qubits = match config.extra_u64("max_qubits") {
            Some(n) => u32::try_from(n).map_err(|_| {
                HalError::Configuration(format!("max_qubits {n} is out of range"))
            })?,
            None => DEFAULT_MAX_QUBITS,
        };

        let readout_error = config.extra_f64("readout_error").unwrap_or(0.0);
        if !(0.0..=1.0).contains(&readout_error) {
            return Err(HalError::Configuration(format!(
                "readout_error must be a probability, got {readout_error}"
            )));
        }

        let mut backend = Self::new()
            .with_max_qubits(max_qubits)
            .with_readout_error(readout_error);
        if let Some(seed) = config.extra_u64("seed") {
            backend = backend.with_seed(seed);
        }
        backend.config = config;
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qec_ir::{ClbitId, QubitId};

    fn bell() -> Circuit {
        let mut circuit = Circuit::new("bell", 2, 2).unwrap();
        circuit
            .h(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .measure_all()
            .unwrap();
        circuit
    }

    #[test]
    fn test_simulator_capabilities() {
        let backend = SimulatorBackend::new();
        let caps = backend.capabilities();

        assert!(caps.is_simulator);
        assert_eq!(caps.num_qubits, 20);
        assert!(!caps.features.iter().any(|f| f == "readout_noise"));

        let noisy = SimulatorBackend::new().with_readout_error(0.1);
        assert!(noisy.capabilities().features.iter().any(|f| f == "readout_noise"));
    }

    #[test]
    fn test_bitstring_order() {
        assert_eq!(bitstring(&[true, false, false]), "001");
        assert_eq!(bitstring(&[]), "");
    }

    #[tokio::test]
    async fn test_simulator_bell_state() {
        let backend = SimulatorBackend::new().with_seed(42);

        let job_id = backend.submit(&bell(), 1000).await.unwrap();
        assert!(backend.status(&job_id).await.unwrap().is_success());

        let result = backend.result(&job_id).await.unwrap();
        assert_eq!(result.shots, 1000);
        assert!(result.is_complete());

        let counts = &result.counts;
        assert_eq!(counts.get("00") + counts.get("11"), 1000);
        assert!(counts.get("00") > 350 && counts.get("11") > 350);
    }

    #[tokio::test]
    async fn test_measurement_maps_to_requested_clbit() {
        let backend = SimulatorBackend::new();
        let mut circuit = Circuit::new("mapped", 2, 2).unwrap();
        circuit
            .x(QubitId(0))
            .unwrap()
            .measure(QubitId(0), ClbitId(1))
            .unwrap();

        let counts = backend.execute(&circuit, 100).await.unwrap();
        assert_eq!(counts.get("10"), 100);
    }

    #[tokio::test]
    async fn test_seeded_runs_are_reproducible() {
        let first = SimulatorBackend::new().with_seed(9);
        let second = SimulatorBackend::new().with_seed(9);

        let a = first.execute(&bell(), 500).await.unwrap();
        let b = second.execute(&bell(), 500).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_readout_error_flips_bits() {
        let backend = SimulatorBackend::new().with_readout_error(0.2).with_seed(3);
        let mut circuit = Circuit::new("zero", 1, 1).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();

        let counts = backend.execute(&circuit, 5000).await.unwrap();
        let flipped = counts.get("1") as f64 / 5000.0;
        assert!((flipped - 0.2).abs() < 0.03, "flip rate {flipped}");
    }

    #[tokio::test]
    async fn test_simulator_too_many_qubits() {
        let backend = SimulatorBackend::new().with_max_qubits(5);
        let circuit = Circuit::new("wide", 10, 0).unwrap();

        let result = backend.submit(&circuit, 100).await;
        assert!(matches!(result, Err(HalError::CircuitTooLarge { .. })));

        let result = backend.execute(&circuit, 100).await;
        assert!(matches!(result, Err(HalError::InvalidCircuit(_))));
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let backend = SimulatorBackend::new();
        let missing = JobId::new("missing");

        assert!(matches!(
            backend.status(&missing).await,
            Err(HalError::JobNotFound(_))
        ));
        assert!(matches!(
            backend.cancel(&missing).await,
            Err(HalError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_completed_job_keeps_result() {
        let backend = SimulatorBackend::new();
        let job_id = backend.submit(&bell(), 10).await.unwrap();

        backend.cancel(&job_id).await.unwrap();
        assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::Completed);
        assert!(backend.result(&job_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_job_table_stays_bounded() {
        let backend = SimulatorBackend::new().with_seed(5);
        for _ in 0..(DEFAULT_JOB_RETENTION + 244) {
            backend.execute(&bell(), 1).await.unwrap();
        }
        assert_eq!(backend.job_count(), DEFAULT_JOB_RETENTION);
    }

    #[tokio::test]
    async fn test_eviction_keeps_newest_jobs() {
        let backend = SimulatorBackend::new().with_job_retention(2);
        let first = backend.submit(&bell(), 1).await.unwrap();
        let second = backend.submit(&bell(), 1).await.unwrap();
        let third = backend.submit(&bell(), 1).await.unwrap();

        assert_eq!(backend.job_count(), 2);
        assert!(matches!(
            backend.result(&first).await,
            Err(HalError::JobNotFound(_))
        ));
        assert!(backend.result(&second).await.is_ok());
        assert!(backend.result(&third).await.is_ok());
    }

    #[test]
    fn test_from_config() {
        let config = BackendConfig::new("simulator")
            .with_token("session")
            .with_extra("max_qubits", serde_json::json!(12))
            .with_extra("readout_error", serde_json::json!(0.05))
            .with_extra("seed", serde_json::json!(1));
        let backend = SimulatorBackend::from_config(config).unwrap();

        assert_eq!(backend.capabilities().num_qubits, 12);
        assert!((backend.readout_error() - 0.05).abs() < 1e-12);

        let bad = BackendConfig::new("simulator").with_extra("readout_error", serde_json::json!(1.5));
        assert!(matches!(
            SimulatorBackend::from_config(bad),
            Err(HalError::Configuration(_))
        ));
    }
}

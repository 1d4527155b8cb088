//! Where circuits run.
//!
//! A [`Backend`] takes a circuit and a shot count and hands back a histogram
//! of measured bitstrings. Code experiments and readout calibration only ever
//! call the two provided entry points:
//!
//! ```text
//!   execute(circuit, shots)
//!     ├─ shots in 1..=max_shots ?
//!     ├─ availability()   unavailable ──→ BackendUnavailable
//!     ├─ validate()       invalid ──────→ InvalidCircuit
//!     ├─ submit() ──→ wait() ──→ Counts
//!
//!   execute_batch(circuits, shots) = execute() per circuit, in order
//! ```
//!
//! Adapters implement the lower-level job methods; `wait` has a polling
//! default that synchronous adapters never actually sleep in.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qec_ir::Circuit;

use crate::capability::Capabilities;
use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::{Counts, ExecutionResult};

/// Delay between status polls in [`Backend::wait`].
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Polls before [`Backend::wait`] gives up (five minutes).
pub const WAIT_MAX_POLLS: u32 = 600;

/// Opaque session handle used to construct a backend.
///
/// Adapters read what they understand from `extra`. The token is never
/// serialized and never printed.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend name, e.g. `simulator`.
    pub name: String,
    /// Service URL for remote adapters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Credential or session token.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Adapter-specific settings.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BackendConfig {
    /// Handle for the backend called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            token: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Service URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Credential.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set an adapter-specific value.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Read a numeric extra.
    pub fn extra_f64(&self, key: &str) -> Option<f64> {
        self.extra.get(key).and_then(serde_json::Value::as_f64)
    }

    /// Read an unsigned integer extra.
    pub fn extra_u64(&self, key: &str) -> Option<u64> {
        self.extra.get(key).and_then(serde_json::Value::as_u64)
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("extra", &self.extra)
            .finish()
    }
}

/// An execution target for circuits.
///
/// Implementors guarantee:
///
/// - `capabilities()` is cheap and never fails;
/// - a job returned by `submit()` starts `Queued` or has already moved on;
/// - counts of a `Completed` job sum to the shots requested.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name used in logs and errors.
    fn name(&self) -> &str;

    /// Static limits of this backend.
    fn capabilities(&self) -> &Capabilities;

    /// Whether jobs are being accepted right now.
    async fn availability(&self) -> HalResult<BackendAvailability>;

    /// Check `circuit` against [`Backend::capabilities`].
    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult>;

    /// Queue `circuit` for `shots` repetitions.
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId>;

    /// Current lifecycle state of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Counts of a `Completed` job.
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult>;

    /// Withdraw a job; a no-op once it is terminal.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// Poll until the job is terminal, then fetch its result.
    async fn wait(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        for _ in 0..WAIT_MAX_POLLS {
            match self.status(job_id).await? {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => {
                    tokio::time::sleep(WAIT_POLL_INTERVAL).await;
                }
            }
        }

        Err(HalError::Timeout(job_id.0.clone()))
    }

    /// Run one circuit for `shots` repetitions and return its counts.
    ///
    /// Fails with [`HalError::BackendUnavailable`] if the backend reports it
    /// cannot take jobs, and with [`HalError::InvalidCircuit`] if the circuit
    /// does not fit the backend. No retries are attempted.
    async fn execute(&self, circuit: &Circuit, shots: u32) -> HalResult<Counts> {
        if shots == 0 {
            return Err(HalError::InvalidShots("shots must be positive".into()));
        }
        let max_shots = self.capabilities().max_shots;
        if shots > max_shots {
            return Err(HalError::InvalidShots(format!(
                "{shots} shots requested, backend allows at most {max_shots}"
            )));
        }

        let availability = self.availability().await?;
        if !availability.is_available {
            return Err(HalError::BackendUnavailable(
                availability
                    .status_message
                    .unwrap_or_else(|| self.name().to_string()),
            ));
        }

        if let ValidationResult::Invalid { reasons } = self.validate(circuit).await? {
            return Err(HalError::InvalidCircuit(reasons.join("; ")));
        }

        let job_id = self.submit(circuit, shots).await?;
        debug!(
            backend = self.name(),
            circuit = circuit.name(),
            shots,
            job = %job_id,
            "submitted circuit"
        );

        let result = self.wait(&job_id).await?;
        if !result.is_complete() {
            return Err(HalError::JobFailed(format!(
                "job {job_id} returned {} outcomes for {shots} shots",
                result.counts.total_shots()
            )));
        }
        Ok(result.counts)
    }

    /// Run several circuits with the same shot count.
    ///
    /// Returns one [`Counts`] per input circuit, in input order. The first
    /// failure aborts the batch.
    async fn execute_batch(&self, circuits: &[Circuit], shots: u32) -> HalResult<Vec<Counts>> {
        let mut results = Vec::with_capacity(circuits.len());
        for circuit in circuits {
            results.push(self.execute(circuit, shots).await?);
        }
        debug!(
            backend = self.name(),
            circuits = circuits.len(),
            shots,
            "batch complete"
        );
        Ok(results)
    }
}

/// Snapshot of whether a backend takes jobs.
#[derive(Debug, Clone)]
pub struct BackendAvailability {
    /// Jobs are accepted.
    pub is_available: bool,
    /// Jobs ahead in the queue, when reported.
    pub queue_depth: Option<u32>,
    /// Reason or status text shown to users.
    pub status_message: Option<String>,
}

impl BackendAvailability {
    /// Availability of a backend with no queue, such as a local simulator.
    pub fn always_available() -> Self {
        Self {
            is_available: true,
            queue_depth: Some(0),
            status_message: None,
        }
    }

    /// An offline backend, with the reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            is_available: false,
            queue_depth: None,
            status_message: Some(reason.into()),
        }
    }
}

/// Outcome of [`Backend::validate`].
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// The circuit can be submitted as is.
    Valid,
    /// The circuit does not fit.
    Invalid {
        /// One entry per violated limit.
        reasons: Vec<String>,
    },
}

impl ValidationResult {
    /// No violations.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Build a result from a list of problems; empty means valid.
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        if reasons.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid { reasons }
        }
    }
}

/// Backends that can be built from a [`BackendConfig`].
pub trait BackendFactory: Backend + Sized {
    /// Build the backend, rejecting settings it cannot honour.
    fn from_config(config: BackendConfig) -> HalResult<Self>;
}

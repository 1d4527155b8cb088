//! Job lifecycle.
//!
//! ```text
//!   submit() ──→ Queued ──→ Running ──→ Completed
//!                  │           ├──→ Failed(reason)
//!                  └───────────┴──→ Cancelled
//! ```
//!
//! A job only moves forward along these arrows; the three right-hand states
//! are terminal.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend-assigned job handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Wrap a backend id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, not started.
    Queued,
    /// Shots are being taken.
    Running,
    /// Counts are available.
    Completed,
    /// Ended without counts.
    Failed(String),
    /// Withdrawn before completion.
    Cancelled,
}

impl JobStatus {
    /// Completed, failed or cancelled.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }

    /// Counts can be fetched.
    pub fn is_success(&self) -> bool {
        *self == JobStatus::Completed
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Running => 1,
            JobStatus::Completed | JobStatus::Failed(_) | JobStatus::Cancelled => 2,
        }
    }

    /// Whether `next` lies strictly forward of this status.
    pub fn can_become(&self, next: &JobStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => f.write_str("queued"),
            JobStatus::Running => f.write_str("running"),
            JobStatus::Completed => f.write_str("completed"),
            JobStatus::Failed(reason) => write!(f, "failed ({reason})"),
            JobStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Bookkeeping record for a submitted circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Job handle.
    pub id: JobId,
    /// Name of the submitted circuit.
    pub circuit: String,
    /// Current status.
    pub status: JobStatus,
    /// Shots requested.
    pub shots: u32,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Time the job reached a terminal status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// A queued job.
    pub fn new(id: impl Into<JobId>, circuit: impl Into<String>, shots: u32) -> Self {
        Self {
            id: id.into(),
            circuit: circuit.into(),
            status: JobStatus::Queued,
            shots,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to `next` if that is a forward step.
    ///
    /// Returns `false` and leaves the job untouched otherwise.
    pub fn transition(&mut self, next: JobStatus) -> bool {
        if !self.status.can_become(&next) {
            return false;
        }
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        self.status = next;
        true
    }
}

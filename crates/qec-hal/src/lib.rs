//! Execution backend abstraction.
//!
//! Error-correction circuits are built by `qec-codes` and executed through
//! this crate's [`Backend`] trait. The trait covers the full job lifecycle
//! (submit, poll, fetch) and adds two convenience methods that the rest of
//! the workspace relies on:
//!
//! - [`Backend::execute`]: run one circuit for a number of shots and return
//!   its [`Counts`].
//! - [`Backend::execute_batch`]: run a list of circuits (e.g. a measurement
//!   calibration set), one [`Counts`] per input, order preserved.
//!
//! Credentials, if a backend needs any, travel in the opaque
//! [`BackendConfig`] session handle supplied by the caller.
//!
//! # Example
//!
//! ```ignore
//! use qec_adapter_sim::SimulatorBackend;
//! use qec_hal::Backend;
//! use qec_ir::{Circuit, ClbitId, QubitId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut circuit = Circuit::new("flip", 1, 1)?;
//!     circuit.x(QubitId(0))?.measure(QubitId(0), ClbitId(0))?;
//!
//!     let backend = SimulatorBackend::new();
//!     let counts = backend.execute(&circuit, 1000).await?;
//!     assert_eq!(counts.get("1"), 1000);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod capability;
pub mod error;
pub mod job;
pub mod result;

pub use backend::{Backend, BackendAvailability, BackendConfig, BackendFactory, ValidationResult};
pub use capability::Capabilities;
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use result::{Counts, ExecutionResult};

//! Read-only access to the workflow orchestrator.
//!
//! [`WorkflowSource`] is the seam the observer loops depend on;
//! [`AirflowClient`] implements it over the Airflow stable REST API.

pub mod airflow;
pub mod error;
pub mod source;

pub use airflow::AirflowClient;
pub use error::OrchestratorError;
pub use source::{RunQuery, RunState, Workflow, WorkflowRun, WorkflowSource};

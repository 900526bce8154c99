//! The [`WorkflowSource`] trait and the records it returns.

use crate::error::OrchestratorError;

/// A schedulable unit of orchestrated work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub id: String,
    pub is_paused: bool,
}

/// One execution of a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    pub run_id: String,
}

/// Run states the observer filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Failed => "failed",
        }
    }
}

/// Filter and ordering for [`WorkflowSource::list_runs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunQuery {
    pub state: Option<RunState>,
    pub limit: u32,
    /// Orchestrator sort key; a leading `-` means descending.
    pub order_by: String,
}

impl RunQuery {
    /// The `limit` most recent failed runs, newest first.
    pub fn recent_failures(limit: u32) -> Self {
        Self {
            state: Some(RunState::Failed),
            limit,
            order_by: "-start_date".to_string(),
        }
    }
}

/// Read-only queries over workflows, runs, and step logs.
#[async_trait::async_trait]
pub trait WorkflowSource: Send + Sync {
    /// List workflows; `include_paused` also returns paused ones.
    async fn list_workflows(&self, include_paused: bool) -> Result<Vec<Workflow>, OrchestratorError>;

    /// List runs of one workflow matching `query`.
    async fn list_runs(
        &self,
        workflow_id: &str,
        query: &RunQuery,
    ) -> Result<Vec<WorkflowRun>, OrchestratorError>;

    /// Fetch the log text of one step attempt within a run.
    async fn get_log(
        &self,
        workflow_id: &str,
        run_id: &str,
        step_id: &str,
        attempt: u32,
    ) -> Result<String, OrchestratorError>;
}

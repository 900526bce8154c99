//! In-memory collaborators for the loop tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use atlas_notify::{Block, Messenger, NotifyError};
use atlas_orchestrator::{OrchestratorError, RunQuery, Workflow, WorkflowRun, WorkflowSource};

fn unavailable(what: &str) -> OrchestratorError {
    OrchestratorError::Status {
        status: 503,
        url: format!("fake://{what}"),
    }
}

/// Scripted orchestrator state.
#[derive(Default)]
pub struct FakeSource {
    workflows: Vec<Workflow>,
    failed_runs: HashMap<String, usize>,
    logs: HashMap<(String, String), String>,
    broken_logs: HashSet<(String, String)>,
    /// Remaining `list_workflows` calls that should fail.
    listing_failures: AtomicUsize,
    /// Workflow whose run listing always fails.
    broken_runs: Option<String>,
    pub list_calls: AtomicUsize,
    pub log_calls: Mutex<Vec<(String, String)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a workflow with `failed` failed runs (newest is `<id>-run-0`).
    pub fn workflow(mut self, id: &str, failed: usize) -> Self {
        self.workflows.push(Workflow {
            id: id.to_string(),
            is_paused: false,
        });
        self.failed_runs.insert(id.to_string(), failed);
        self
    }

    pub fn paused_workflow(mut self, id: &str, failed: usize) -> Self {
        self.workflows.push(Workflow {
            id: id.to_string(),
            is_paused: true,
        });
        self.failed_runs.insert(id.to_string(), failed);
        self
    }

    pub fn log(mut self, workflow: &str, step: &str, text: &str) -> Self {
        self.logs
            .insert((workflow.to_string(), step.to_string()), text.to_string());
        self
    }

    pub fn broken_log(mut self, workflow: &str, step: &str) -> Self {
        self.broken_logs
            .insert((workflow.to_string(), step.to_string()));
        self
    }

    pub fn failing_listings(self, count: usize) -> Self {
        self.listing_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn broken_runs(mut self, workflow: &str) -> Self {
        self.broken_runs = Some(workflow.to_string());
        self
    }

    pub fn probed_steps(&self) -> Vec<(String, String)> {
        self.log_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl WorkflowSource for FakeSource {
    async fn list_workflows(&self, include_paused: bool) -> Result<Vec<Workflow>, OrchestratorError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.listing_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.listing_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(unavailable("dags"));
        }
        Ok(self
            .workflows
            .iter()
            .filter(|w| include_paused || !w.is_paused)
            .cloned()
            .collect())
    }

    async fn list_runs(
        &self,
        workflow_id: &str,
        query: &RunQuery,
    ) -> Result<Vec<WorkflowRun>, OrchestratorError> {
        if self.broken_runs.as_deref() == Some(workflow_id) {
            return Err(unavailable("dagRuns"));
        }
        let failed = self.failed_runs.get(workflow_id).copied().unwrap_or(0);
        Ok((0..failed)
            .take(query.limit as usize)
            .map(|i| WorkflowRun {
                run_id: format!("{workflow_id}-run-{i}"),
            })
            .collect())
    }

    async fn get_log(
        &self,
        workflow_id: &str,
        run_id: &str,
        step_id: &str,
        _attempt: u32,
    ) -> Result<String, OrchestratorError> {
        assert_eq!(run_id, format!("{workflow_id}-run-0"), "snippet must come from the newest run");
        self.log_calls
            .lock()
            .unwrap()
            .push((workflow_id.to_string(), step_id.to_string()));

        let key = (workflow_id.to_string(), step_id.to_string());
        if self.broken_logs.contains(&key) {
            return Err(unavailable("logs"));
        }
        self.logs
            .get(&key)
            .cloned()
            .ok_or_else(|| OrchestratorError::Status {
                status: 404,
                url: format!("fake://logs/{step_id}"),
            })
    }
}

/// Messenger that records what it was asked to post.
#[derive(Default)]
pub struct RecordingMessenger {
    fail: bool,
    pub posts: Mutex<Vec<(String, String, usize)>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Messenger for RecordingMessenger {
    async fn post(
        &self,
        channel: &str,
        text: &str,
        blocks: Option<&[Block]>,
    ) -> Result<(), NotifyError> {
        self.posts.lock().unwrap().push((
            channel.to_string(),
            text.to_string(),
            blocks.map_or(0, <[Block]>::len),
        ));
        if self.fail {
            Err(NotifyError::Api("channel_not_found".to_string()))
        } else {
            Ok(())
        }
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

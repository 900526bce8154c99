//! Fixed-interval failure sampler.
//!
//! Each iteration counts workflows (paused ones included) that have at least
//! one failed run among their most recent [`RECENT_FAILED_RUNS`], and
//! publishes the count as a gauge. An upstream error abandons the iteration
//! and leaves the gauges at their previous values.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use atlas_orchestrator::{RunQuery, WorkflowSource};

use crate::error::ObserverError;
use crate::metrics::{AtlasMetrics, IncidentKind};
use crate::RECENT_FAILED_RUNS;

/// Late-workflow detection is not implemented; the gauge is pinned here.
const LATE_WORKFLOWS_PLACEHOLDER: usize = 0;

/// Count workflows with at least one recent failed run.
pub async fn count_failed_workflows(source: &dyn WorkflowSource) -> Result<usize, ObserverError> {
    let workflows = source.list_workflows(true).await?;
    let query = RunQuery::recent_failures(RECENT_FAILED_RUNS);

    let mut failed = 0;
    for workflow in workflows.iter().filter(|w| !w.id.is_empty()) {
        let runs = source.list_runs(&workflow.id, &query).await?;
        if !runs.is_empty() {
            failed += 1;
        }
    }
    debug!(workflows = workflows.len(), failed, "poll counted failing workflows");
    Ok(failed)
}

/// The perpetual health poller.
pub struct PollLoop {
    source: Arc<dyn WorkflowSource>,
    metrics: Arc<AtlasMetrics>,
    interval: Duration,
}

impl PollLoop {
    pub fn new(source: Arc<dyn WorkflowSource>, metrics: Arc<AtlasMetrics>, interval: Duration) -> Self {
        Self {
            source,
            metrics,
            interval,
        }
    }

    /// Run one iteration: sample, update gauges, record latency.
    ///
    /// Returns the failed-workflow count, or `None` if the iteration failed.
    pub async fn tick(&self) -> Option<usize> {
        let started = Instant::now();
        let outcome = count_failed_workflows(self.source.as_ref()).await;
        self.metrics.observe_poll_latency(started.elapsed());

        match outcome {
            Ok(failed) => {
                self.metrics.set_failed_workflows(failed);
                self.metrics.set_late_workflows(LATE_WORKFLOWS_PLACEHOLDER);
                Some(failed)
            }
            Err(e) => {
                self.metrics.record_incident(IncidentKind::PollError);
                warn!(error = %e, "poll iteration failed, keeping previous gauge values");
                None
            }
        }
    }

    /// Poll forever, sleeping the full interval after every iteration.
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "poll loop started");
        loop {
            self.tick().await;
            tokio::time::sleep(self.interval).await;
        }
    }
}

//! Builds one [`DigestReport`] from current orchestrator state.

use std::sync::Arc;

use tracing::{debug, info};

use atlas_core::{DigestReport, WorkflowFailureSummary};
use atlas_orchestrator::{RunQuery, Workflow, WorkflowSource};

use crate::error::ObserverError;
use crate::snippet::probe_candidates;
use crate::RECENT_FAILED_RUNS;

/// Attempt number whose log is read for a snippet.
const SNIPPET_ATTEMPT: u32 = 1;

/// Turns orchestrator state into a digest report.
pub struct DigestBuilder {
    source: Arc<dyn WorkflowSource>,
    snippet_candidates: Vec<String>,
}

impl DigestBuilder {
    /// `snippet_candidates` are step ids tried, in order, for error snippets.
    pub fn new(source: Arc<dyn WorkflowSource>, snippet_candidates: Vec<String>) -> Self {
        Self {
            source,
            snippet_candidates,
        }
    }

    /// Build a report covering every workflow, paused ones included.
    ///
    /// Listing errors propagate; snippet lookups never fail the build.
    pub async fn build(&self) -> Result<DigestReport, ObserverError> {
        let workflows = self.source.list_workflows(true).await?;

        let mut summaries = Vec::with_capacity(workflows.len());
        for workflow in workflows.iter().filter(|w| !w.id.is_empty()) {
            summaries.push(self.summarize(workflow).await?);
        }

        let report = DigestReport::from_summaries(summaries);
        info!(
            workflows = workflows.len(),
            total_failed = report.total_failed,
            listed = report.top_offenders.len(),
            "digest report built"
        );
        Ok(report)
    }

    async fn summarize(&self, workflow: &Workflow) -> Result<WorkflowFailureSummary, ObserverError> {
        let query = RunQuery::recent_failures(RECENT_FAILED_RUNS);
        let runs = self.source.list_runs(&workflow.id, &query).await?;
        let failed_runs = runs.len().min(RECENT_FAILED_RUNS as usize) as u32;

        let snippet = match runs.first() {
            Some(latest) if !latest.run_id.is_empty() => {
                self.error_snippet(&workflow.id, &latest.run_id).await
            }
            _ => None,
        };
        if failed_runs > 0 && snippet.is_none() {
            debug!(workflow = %workflow.id, "no snippet candidate produced a log");
        }

        Ok(WorkflowFailureSummary::new(workflow.id.clone(), failed_runs).with_snippet(snippet))
    }

    async fn error_snippet(&self, workflow_id: &str, run_id: &str) -> Option<String> {
        let source = self.source.as_ref();
        probe_candidates(&self.snippet_candidates, |step| {
            let workflow_id = workflow_id.to_string();
            let run_id = run_id.to_string();
            async move {
                source
                    .get_log(&workflow_id, &run_id, &step, SNIPPET_ATTEMPT)
                    .await
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use atlas_core::{MAX_SNIPPET_CHARS, MAX_TOP_OFFENDERS};

    use super::*;
    use crate::testing::FakeSource;

    fn default_candidates() -> Vec<String> {
        ["main", "extract", "transform", "load"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn make_builder(source: FakeSource) -> (DigestBuilder, Arc<FakeSource>) {
        let source = Arc::new(source);
        (DigestBuilder::new(source.clone(), default_candidates()), source)
    }

    #[tokio::test]
    async fn three_workflow_scenario() {
        let (builder, source) = make_builder(
            FakeSource::new()
                .workflow("A", 2)
                .log("A", "extract", "boom")
                .workflow("B", 0)
                .workflow("C", 1)
                .broken_log("C", "main"),
        );

        let report = builder.build().await.unwrap();

        assert_eq!(report.total_failed, 2);
        assert_eq!(report.total_late, 0);
        let got: Vec<(&str, u32, Option<&str>)> = report
            .top_offenders
            .iter()
            .map(|s| (s.workflow_id.as_str(), s.failed_runs, s.last_error_snippet.as_deref()))
            .collect();
        assert_eq!(got, [("A", 2, Some("boom")), ("C", 1, None), ("B", 0, None)]);

        // A stops at "extract"; C exhausts all four; B has no failed run to probe.
        let probed = source.probed_steps();
        let for_a: Vec<&str> = probed.iter().filter(|(w, _)| w == "A").map(|(_, s)| s.as_str()).collect();
        let for_c: Vec<&str> = probed.iter().filter(|(w, _)| w == "C").map(|(_, s)| s.as_str()).collect();
        assert_eq!(for_a, ["main", "extract"]);
        assert_eq!(for_c, ["main", "extract", "transform", "load"]);
        assert!(probed.iter().all(|(w, _)| w != "B"));
    }

    #[tokio::test]
    async fn long_logs_keep_last_500_chars() {
        let log = format!("{}TAIL", "x".repeat(2_000));
        let (builder, _) = make_builder(FakeSource::new().workflow("wf", 1).log("wf", "main", &log));

        let report = builder.build().await.unwrap();
        let snippet = report.top_offenders[0].last_error_snippet.clone().unwrap();
        assert_eq!(snippet.len(), MAX_SNIPPET_CHARS);
        assert_eq!(snippet, log[log.len() - MAX_SNIPPET_CHARS..]);
        assert!(snippet.ends_with("TAIL"));
    }

    #[tokio::test]
    async fn failed_runs_are_capped_at_recent_window() {
        let (builder, _) = make_builder(FakeSource::new().workflow("noisy", 40));
        let report = builder.build().await.unwrap();
        assert_eq!(report.top_offenders[0].failed_runs, RECENT_FAILED_RUNS);
    }

    #[tokio::test]
    async fn top_offenders_is_min_of_ten_and_workflow_count() {
        for n in [0usize, 3, 10, 17] {
            let mut source = FakeSource::new();
            for i in 0..n {
                source = source.workflow(&format!("wf-{i}"), i % 6);
            }
            let (builder, _) = make_builder(source);
            let report = builder.build().await.unwrap();

            assert_eq!(report.top_offenders.len(), n.min(MAX_TOP_OFFENDERS));
            assert!(report
                .top_offenders
                .windows(2)
                .all(|w| w[0].failed_runs >= w[1].failed_runs));
        }
    }

    #[tokio::test]
    async fn building_twice_is_idempotent() {
        let (builder, _) = make_builder(
            FakeSource::new()
                .workflow("a", 1)
                .workflow("b", 3)
                .workflow("c", 1)
                .paused_workflow("d", 0)
                .log("b", "load", "ValueError: bad row"),
        );
        let first = builder.build().await.unwrap();
        let second = builder.build().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn paused_workflows_are_included() {
        let (builder, _) = make_builder(FakeSource::new().paused_workflow("test_dag", 2));
        let report = builder.build().await.unwrap();
        assert_eq!(report.total_failed, 1);
        assert_eq!(report.top_offenders[0].workflow_id, "test_dag");
    }

    #[tokio::test]
    async fn listing_errors_fail_the_build() {
        let (builder, _) = make_builder(FakeSource::new().workflow("a", 1).failing_listings(1));
        assert!(matches!(builder.build().await, Err(ObserverError::Orchestrator(_))));

        let (builder, _) = make_builder(FakeSource::new().workflow("a", 1).broken_runs("a"));
        assert!(builder.build().await.is_err());
    }
}

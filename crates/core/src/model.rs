//! Digest data model.
//!
//! Both types live for a single digest cycle: built from upstream state,
//! rendered, delivered, dropped.

use serde::{Deserialize, Serialize};

/// Maximum number of workflows listed in a digest.
pub const MAX_TOP_OFFENDERS: usize = 10;

/// Maximum length, in characters, of a stored error snippet.
pub const MAX_SNIPPET_CHARS: usize = 500;

/// Recent failure state of one workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowFailureSummary {
    pub workflow_id: String,
    /// Failed runs among the most recent few, not all history.
    pub failed_runs: u32,
    /// Reserved; lateness is not computed yet.
    pub late_runs: u32,
    /// Reserved; never populated.
    pub longest_task: Option<String>,
    /// Tail of the latest failing run's log, if one could be found.
    pub last_error_snippet: Option<String>,
}

impl WorkflowFailureSummary {
    pub fn new(workflow_id: impl Into<String>, failed_runs: u32) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            failed_runs,
            late_runs: 0,
            longest_task: None,
            last_error_snippet: None,
        }
    }

    /// Attach a snippet, keeping only its last [`MAX_SNIPPET_CHARS`] characters.
    pub fn with_snippet(mut self, snippet: Option<String>) -> Self {
        self.last_error_snippet = snippet.map(|s| tail_chars(&s, MAX_SNIPPET_CHARS).to_string());
        self
    }
}

/// Aggregated failure report for one digest cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestReport {
    /// Workflows with at least one recent failed run.
    pub total_failed: u32,
    /// Reserved; always 0.
    pub total_late: u32,
    /// Worst offenders first, at most [`MAX_TOP_OFFENDERS`].
    pub top_offenders: Vec<WorkflowFailureSummary>,
}

impl DigestReport {
    /// Build a report from every workflow's summary.
    ///
    /// Sorting is stable, so workflows with equal failure counts keep the
    /// order they were listed in.
    pub fn from_summaries(mut summaries: Vec<WorkflowFailureSummary>) -> Self {
        let total_failed = summaries.iter().filter(|s| s.failed_runs > 0).count() as u32;
        let total_late = summaries.iter().filter(|s| s.late_runs > 0).count() as u32;

        summaries.sort_by(|a, b| b.failed_runs.cmp(&a.failed_runs));
        summaries.truncate(MAX_TOP_OFFENDERS);

        Self {
            total_failed,
            total_late,
            top_offenders: summaries,
        }
    }
}

/// Return the last `max_chars` characters of `text`.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, failed: u32) -> WorkflowFailureSummary {
        WorkflowFailureSummary::new(id, failed)
    }

    #[test]
    fn report_counts_only_failing_workflows() {
        let report = DigestReport::from_summaries(vec![
            summary("a", 2),
            summary("b", 0),
            summary("c", 1),
        ]);
        assert_eq!(report.total_failed, 2);
        assert_eq!(report.total_late, 0);
        assert_eq!(report.top_offenders.len(), 3);
    }

    #[test]
    fn report_sorts_descending_and_keeps_tie_order() {
        let report = DigestReport::from_summaries(vec![
            summary("first-one", 1),
            summary("big", 5),
            summary("second-one", 1),
            summary("zero", 0),
            summary("third-one", 1),
        ]);
        let ids: Vec<&str> = report
            .top_offenders
            .iter()
            .map(|s| s.workflow_id.as_str())
            .collect();
        assert_eq!(ids, ["big", "first-one", "second-one", "third-one", "zero"]);
    }

    #[test]
    fn report_truncates_to_top_ten() {
        let summaries: Vec<_> = (0..25).map(|i| summary(&format!("wf-{i}"), i % 4)).collect();
        let report = DigestReport::from_summaries(summaries);

        assert_eq!(report.top_offenders.len(), MAX_TOP_OFFENDERS);
        assert!(report
            .top_offenders
            .windows(2)
            .all(|w| w[0].failed_runs >= w[1].failed_runs));
        // Totals cover every workflow, not only the listed ones.
        assert_eq!(report.total_failed, 18);
    }

    #[test]
    fn report_from_nothing_is_empty() {
        let report = DigestReport::from_summaries(Vec::new());
        assert_eq!(report.total_failed, 0);
        assert!(report.top_offenders.is_empty());
    }

    #[test]
    fn snippet_keeps_the_tail() {
        let log = format!("{}{}", "x".repeat(600), "y".repeat(100));
        let s = summary("a", 1).with_snippet(Some(log.clone()));
        let snippet = s.last_error_snippet.unwrap();
        assert_eq!(snippet.chars().count(), MAX_SNIPPET_CHARS);
        assert_eq!(snippet, &log[log.len() - MAX_SNIPPET_CHARS..]);
    }

    #[test]
    fn short_snippet_is_untouched() {
        let s = summary("a", 1).with_snippet(Some("boom".into()));
        assert_eq!(s.last_error_snippet.as_deref(), Some("boom"));
    }

    #[test]
    fn tail_chars_respects_multibyte_boundaries() {
        let text = "ééééé";
        assert_eq!(tail_chars(text, 2), "éé");
        assert_eq!(tail_chars(text, 10), text);
        assert_eq!(tail_chars(text, 0), "");
    }
}

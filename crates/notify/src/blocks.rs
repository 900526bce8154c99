//! Slack Block Kit rendering of a [`DigestReport`].
//!
//! Layout: header, aggregate counts, divider, then one section per top
//! offender. Offenders with a snippet get a fenced excerpt of the
//! snippet's last line.

use serde::Serialize;

use atlas_core::{DigestReport, WorkflowFailureSummary, MAX_TOP_OFFENDERS};

/// Fallback text posted alongside the blocks.
pub const DIGEST_TITLE: &str = "Atlas daily digest";

const HEADER_TEXT: &str = "Atlas Daily Digest";

/// Maximum characters of a snippet line shown in a block, after escaping.
const EXCERPT_MAX_CHARS: usize = 180;

/// A Block Kit text object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    #[serde(rename = "mrkdwn")]
    Markdown { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        TextObject::Plain { text: text.into() }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        TextObject::Markdown { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            TextObject::Plain { text } | TextObject::Markdown { text } => text,
        }
    }
}

/// A Block Kit layout block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: TextObject },
    Section { text: TextObject },
    Divider,
}

fn escape_sequence(ch: char) -> Option<&'static str> {
    match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    }
}

/// Escape the three characters Slack treats as control sequences in mrkdwn.
pub fn escape_mrkdwn(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match escape_sequence(ch) {
            Some(seq) => out.push_str(seq),
            None => out.push(ch),
        }
    }
    out
}

/// Last line of the trimmed snippet, escaped and capped to
/// [`EXCERPT_MAX_CHARS`] of posted text. Escape sequences are never split.
fn excerpt(snippet: &str) -> Option<String> {
    let line = snippet.trim().lines().last()?;
    let mut out = String::new();
    let mut width = 0;
    for ch in line.chars() {
        let seq = escape_sequence(ch);
        let w = seq.map_or(1, str::len);
        if width + w > EXCERPT_MAX_CHARS {
            break;
        }
        width += w;
        match seq {
            Some(seq) => out.push_str(seq),
            None => out.push(ch),
        }
    }
    Some(out)
}

fn offender_block(summary: &WorkflowFailureSummary) -> Block {
    let mut text = format!(
        "*{}* — failed_runs: {}, late_runs: {}",
        escape_mrkdwn(&summary.workflow_id),
        summary.failed_runs,
        summary.late_runs
    );
    if let Some(line) = summary.last_error_snippet.as_deref().and_then(excerpt) {
        text.push_str(&format!("\n```{line}```"));
    }
    Block::Section {
        text: TextObject::markdown(text),
    }
}

/// Render a digest report into its ordered blocks.
pub fn render_digest(report: &DigestReport) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(3 + report.top_offenders.len().min(MAX_TOP_OFFENDERS));
    blocks.push(Block::Header {
        text: TextObject::plain(HEADER_TEXT),
    });
    blocks.push(Block::Section {
        text: TextObject::markdown(format!(
            "*Failed workflows:* {}   |   *Late workflows:* {}",
            report.total_failed, report.total_late
        )),
    });
    blocks.push(Block::Divider);
    blocks.extend(
        report
            .top_offenders
            .iter()
            .take(MAX_TOP_OFFENDERS)
            .map(offender_block),
    );
    blocks
}

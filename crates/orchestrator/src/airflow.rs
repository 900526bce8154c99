//! Airflow stable REST API client.
//!
//! Provides [`AirflowClient`], a [`WorkflowSource`] backed by
//! `/api/v1/dags`, `/api/v1/dags/{id}/dagRuns`, and the task-instance log
//! endpoint. Requests use HTTP basic auth. Metadata calls and log fetches
//! carry separate fixed timeouts since logs can be large.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use atlas_core::config::OrchestratorConfig;

use crate::error::OrchestratorError;
use crate::source::{RunQuery, Workflow, WorkflowRun, WorkflowSource};

/// Timeout for workflow and run listings.
const METADATA_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for log retrieval.
const LOG_TIMEOUT: Duration = Duration::from_secs(60);

/// Page size requested when listing workflows.
const WORKFLOW_PAGE_LIMIT: usize = 200;

/// Upper bound on workflow pages fetched in one listing.
const MAX_WORKFLOW_PAGES: usize = 100;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DagList {
    #[serde(default)]
    dags: Vec<DagEntry>,
    total_entries: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct DagEntry {
    dag_id: Option<String>,
    #[serde(default)]
    is_paused: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DagRunList {
    #[serde(default)]
    dag_runs: Vec<DagRunEntry>,
}

#[derive(Debug, Deserialize)]
struct DagRunEntry {
    dag_run_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogContent {
    #[serde(default)]
    content: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for one Airflow deployment.
pub struct AirflowClient {
    base_url: Url,
    username: String,
    password: String,
    client: reqwest::Client,
}

impl AirflowClient {
    /// Create a client for the deployment described by `config`.
    pub fn new(config: &OrchestratorConfig) -> Result<Self, OrchestratorError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| OrchestratorError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(OrchestratorError::InvalidUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
            client,
        })
    }

    /// Join `segments` onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, OrchestratorError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| OrchestratorError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }

    async fn get(
        &self,
        url: Url,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<reqwest::Response, OrchestratorError> {
        debug!(url = %url, "orchestrator request");
        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .query(query)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OrchestratorError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl WorkflowSource for AirflowClient {
    async fn list_workflows(&self, include_paused: bool) -> Result<Vec<Workflow>, OrchestratorError> {
        let url = self.endpoint(&["dags"])?;
        let mut workflows = Vec::new();
        let mut offset = 0;

        for _ in 0..MAX_WORKFLOW_PAGES {
            // Airflow's `only_active` excludes paused DAGs when true.
            let query = [
                ("only_active", (!include_paused).to_string()),
                ("limit", WORKFLOW_PAGE_LIMIT.to_string()),
                ("offset", offset.to_string()),
            ];
            let body = self
                .get(url.clone(), &query, METADATA_TIMEOUT)
                .await?
                .text()
                .await?;
            let page = parse_dag_page(&body)?;
            offset += page.entries;
            workflows.extend(page.workflows);

            if !has_more_pages(offset, page.entries, page.total_entries) {
                return Ok(workflows);
            }
        }

        warn!(
            fetched = offset,
            pages = MAX_WORKFLOW_PAGES,
            "workflow listing stopped at page limit; counts may be incomplete"
        );
        Ok(workflows)
    }

    async fn list_runs(
        &self,
        workflow_id: &str,
        query: &RunQuery,
    ) -> Result<Vec<WorkflowRun>, OrchestratorError> {
        let url = self.endpoint(&["dags", workflow_id, "dagRuns"])?;
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("order_by", query.order_by.clone()),
        ];
        if let Some(state) = query.state {
            params.push(("state", state.as_str().to_string()));
        }
        let body = self.get(url, &params, METADATA_TIMEOUT).await?.text().await?;
        parse_dag_runs(&body)
    }

    async fn get_log(
        &self,
        workflow_id: &str,
        run_id: &str,
        step_id: &str,
        attempt: u32,
    ) -> Result<String, OrchestratorError> {
        let attempt = attempt.to_string();
        let url = self.endpoint(&[
            "dags",
            workflow_id,
            "dagRuns",
            run_id,
            "taskInstances",
            step_id,
            "logs",
            &attempt,
        ])?;
        let response = self.get(url, &[], LOG_TIMEOUT).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;
        log_text(&content_type, body)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// One page of the DAG listing.
#[derive(Debug)]
struct DagPage {
    workflows: Vec<Workflow>,
    /// Raw entries on the page, including ones skipped for a missing id.
    entries: usize,
    total_entries: Option<usize>,
}

fn parse_dag_page(body: &str) -> Result<DagPage, OrchestratorError> {
    let list: DagList =
        serde_json::from_str(body).map_err(|e| OrchestratorError::Decode(e.to_string()))?;
    let entries = list.dags.len();
    let workflows = list
        .dags
        .into_iter()
        .filter_map(|d| {
            let id = d.dag_id.filter(|id| !id.is_empty())?;
            Some(Workflow {
                id,
                is_paused: d.is_paused.unwrap_or(false),
            })
        })
        .collect();
    Ok(DagPage {
        workflows,
        entries,
        total_entries: list.total_entries,
    })
}

/// Whether another page should be requested after `fetched` entries.
///
/// Without `total_entries`, a full page is taken to mean more may follow.
fn has_more_pages(fetched: usize, page_entries: usize, total_entries: Option<usize>) -> bool {
    if page_entries == 0 {
        return false;
    }
    match total_entries {
        Some(total) => fetched < total,
        None => page_entries >= WORKFLOW_PAGE_LIMIT,
    }
}

fn parse_dag_runs(body: &str) -> Result<Vec<WorkflowRun>, OrchestratorError> {
    let list: DagRunList =
        serde_json::from_str(body).map_err(|e| OrchestratorError::Decode(e.to_string()))?;
    Ok(list
        .dag_runs
        .into_iter()
        .map(|r| WorkflowRun {
            run_id: r.dag_run_id.unwrap_or_default(),
        })
        .collect())
}

/// Log endpoints answer either JSON (`{"content": ...}`) or plain text.
fn log_text(content_type: &str, body: String) -> Result<String, OrchestratorError> {
    if content_type.starts_with("application/json") {
        let parsed: LogContent =
            serde_json::from_str(&body).map_err(|e| OrchestratorError::Decode(e.to_string()))?;
        Ok(parsed.content)
    } else {
        Ok(body)
    }
}

//! Prometheus series shared by the poll loop, the digest scheduler, and the
//! `/metrics` endpoint.
//!
//! Every collector is internally synchronized, so one `Arc<AtlasMetrics>` is
//! handed to each task without further locking. The environment label is
//! fixed at construction.

use std::time::Duration;

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};

use crate::error::ObserverError;

/// Poll latency histogram buckets, in milliseconds.
pub const POLL_LATENCY_BUCKETS_MS: [f64; 7] = [50.0, 100.0, 250.0, 500.0, 1000.0, 2000.0, 5000.0];

/// Content type of [`AtlasMetrics::render`] output.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Internal failures of the observer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentKind {
    PollError,
    DigestError,
}

impl IncidentKind {
    pub const ALL: [IncidentKind; 2] = [IncidentKind::PollError, IncidentKind::DigestError];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentKind::PollError => "poll_error",
            IncidentKind::DigestError => "digest_error",
        }
    }
}

/// The observer's metric registry.
pub struct AtlasMetrics {
    env: String,
    registry: Registry,
    incidents: IntCounterVec,
    failed_workflows: IntGaugeVec,
    late_workflows: IntGaugeVec,
    poll_latency: Histogram,
}

impl AtlasMetrics {
    /// Create and register every series for environment `env`.
    pub fn new(env: impl Into<String>) -> Result<Self, ObserverError> {
        let env = env.into();
        let registry = Registry::new();

        let incidents = IntCounterVec::new(
            Opts::new("atlas_incidents_total", "Total incidents seen by Atlas"),
            &["env", "kind"],
        )?;
        let failed_workflows = IntGaugeVec::new(
            Opts::new("atlas_failed_workflows", "Number of workflows with recent failed runs"),
            &["env"],
        )?;
        let late_workflows = IntGaugeVec::new(
            Opts::new("atlas_late_workflows", "Number of workflows with late runs"),
            &["env"],
        )?;
        let poll_latency = Histogram::with_opts(
            HistogramOpts::new("atlas_poll_latency_ms", "Orchestrator poll latency (ms)")
                .buckets(POLL_LATENCY_BUCKETS_MS.to_vec()),
        )?;

        registry.register(Box::new(incidents.clone()))?;
        registry.register(Box::new(failed_workflows.clone()))?;
        registry.register(Box::new(late_workflows.clone()))?;
        registry.register(Box::new(poll_latency.clone()))?;

        // Touch every labelled series so scrapes see zeros before the first event.
        for kind in IncidentKind::ALL {
            incidents.with_label_values(&[env.as_str(), kind.as_str()]);
        }
        failed_workflows.with_label_values(&[env.as_str()]);
        late_workflows.with_label_values(&[env.as_str()]);

        Ok(Self {
            env,
            registry,
            incidents,
            failed_workflows,
            late_workflows,
            poll_latency,
        })
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn record_incident(&self, kind: IncidentKind) {
        self.incidents
            .with_label_values(&[self.env.as_str(), kind.as_str()])
            .inc();
    }

    pub fn incident_count(&self, kind: IncidentKind) -> u64 {
        self.incidents
            .with_label_values(&[self.env.as_str(), kind.as_str()])
            .get()
    }

    pub fn set_failed_workflows(&self, count: usize) {
        self.failed_workflows
            .with_label_values(&[self.env.as_str()])
            .set(count as i64);
    }

    pub fn failed_workflows(&self) -> i64 {
        self.failed_workflows.with_label_values(&[self.env.as_str()]).get()
    }

    pub fn set_late_workflows(&self, count: usize) {
        self.late_workflows
            .with_label_values(&[self.env.as_str()])
            .set(count as i64);
    }

    pub fn late_workflows(&self) -> i64 {
        self.late_workflows.with_label_values(&[self.env.as_str()]).get()
    }

    pub fn observe_poll_latency(&self, elapsed: Duration) {
        self.poll_latency.observe(elapsed.as_secs_f64() * 1000.0);
    }

    /// Number of poll iterations recorded so far.
    pub fn poll_latency_samples(&self) -> u64 {
        self.poll_latency.get_sample_count()
    }

    /// Encode every series in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, ObserverError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

//! [`DigestScheduler`]: the perpetual digest task.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use atlas_core::DigestReport;
use atlas_notify::{render_digest, Messenger, DIGEST_TITLE};

use super::cursor::SchedulerCursor;
use crate::digest::DigestBuilder;
use crate::error::ObserverError;
use crate::metrics::{AtlasMetrics, IncidentKind};

/// How often the scheduler compares the clock against the cursor.
pub const CLOCK_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Source of "now" for the scheduler.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The wall clock.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// What one clock check did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not due yet.
    Waiting,
    /// A digest cycle ran; `next_fire` is the recomputed cursor.
    Fired {
        delivered: bool,
        next_fire: Option<DateTime<Tz>>,
    },
}

/// Fires the digest on cron boundaries.
pub struct DigestScheduler {
    builder: DigestBuilder,
    messenger: Arc<dyn Messenger>,
    channel: String,
    metrics: Arc<AtlasMetrics>,
    cursor: SchedulerCursor,
    clock: Clock,
}

impl DigestScheduler {
    pub fn new(
        builder: DigestBuilder,
        messenger: Arc<dyn Messenger>,
        channel: impl Into<String>,
        metrics: Arc<AtlasMetrics>,
        cursor: SchedulerCursor,
    ) -> Self {
        Self {
            builder,
            messenger,
            channel: channel.into(),
            metrics,
            cursor,
            clock: system_clock(),
        }
    }

    /// Replace the wall clock (used by tests).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn cursor(&self) -> &SchedulerCursor {
        &self.cursor
    }

    /// Build, render, and post one digest.
    pub async fn run_cycle(&self) -> Result<DigestReport, ObserverError> {
        let report = self.builder.build().await?;
        let blocks = render_digest(&report);
        self.messenger
            .post(&self.channel, DIGEST_TITLE, Some(blocks.as_slice()))
            .await?;
        Ok(report)
    }

    /// One clock check. Fires at most once, then always advances the cursor.
    pub async fn tick(&mut self) -> TickOutcome {
        let now = (self.clock)();
        if !self.cursor.is_due(now) {
            return TickOutcome::Waiting;
        }

        info!(
            scheduled = ?self.cursor.next_fire(),
            channel = %self.channel,
            via = self.messenger.channel_name(),
            "digest due, building"
        );
        let delivered = match self.run_cycle().await {
            Ok(report) => {
                info!(
                    total_failed = report.total_failed,
                    listed = report.top_offenders.len(),
                    "digest delivered"
                );
                true
            }
            Err(e) => {
                self.metrics.record_incident(IncidentKind::DigestError);
                warn!(error = %e, "digest cycle failed");
                false
            }
        };

        // Recompute from the time the cycle finished, not the missed boundary.
        let next_fire = self.cursor.advance((self.clock)());
        match next_fire {
            Some(next) => info!(next_fire = %next, "next digest scheduled"),
            None => warn!("digest schedule has no further occurrences"),
        }
        TickOutcome::Fired {
            delivered,
            next_fire,
        }
    }

    /// Check the clock forever at [`CLOCK_CHECK_INTERVAL`].
    pub async fn run(mut self) {
        match self.cursor.next_fire() {
            Some(next) => info!(next_fire = %next, "digest scheduler started"),
            None => warn!("digest scheduler started with nothing to schedule"),
        }
        loop {
            self.tick().await;
            tokio::time::sleep(CLOCK_CHECK_INTERVAL).await;
        }
    }
}

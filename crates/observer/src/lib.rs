//! The observer's two perpetual loops and what they share.
//!
//! - [`PollLoop`] refreshes failure gauges at a fixed interval.
//! - [`DigestScheduler`] fires [`DigestBuilder`] on cron boundaries and
//!   delivers the rendered report.
//!
//! The loops share nothing but [`AtlasMetrics`].

pub mod digest;
pub mod error;
pub mod metrics;
pub mod poller;
pub mod scheduler;
pub mod snippet;

#[cfg(test)]
pub(crate) mod testing;

pub use digest::DigestBuilder;
pub use error::ObserverError;
pub use metrics::{AtlasMetrics, IncidentKind};
pub use poller::PollLoop;
pub use scheduler::{Clock, DigestScheduler, SchedulerCursor, TickOutcome};

/// How many of a workflow's most recent failed runs are inspected.
pub const RECENT_FAILED_RUNS: u32 = 5;

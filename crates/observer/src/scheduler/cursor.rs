//! [`SchedulerCursor`]: the digest's "next fire" instant.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use atlas_core::config::ScheduleConfig;

use super::cron::{parse_schedule, parse_timezone, truncate_to_minute};
use crate::error::ObserverError;

/// Next-fire state for a cron schedule evaluated in a fixed timezone.
///
/// `next_fire` is `None` only once the schedule has no future occurrences
/// (possible with a year field); the cursor is then never due again.
#[derive(Debug, Clone)]
pub struct SchedulerCursor {
    schedule: Schedule,
    tz: Tz,
    next_fire: Option<DateTime<Tz>>,
}

impl SchedulerCursor {
    /// Position the cursor at the first occurrence after `now`'s minute.
    ///
    /// Fails if the schedule has no future occurrence at all.
    pub fn new(schedule: Schedule, tz: Tz, now: DateTime<Utc>) -> Result<Self, ObserverError> {
        let start = truncate_to_minute(&now.with_timezone(&tz));
        let next_fire = schedule.after(&start).next();
        if next_fire.is_none() {
            return Err(ObserverError::InvalidCron {
                expr: schedule.to_string(),
                reason: "schedule has no upcoming occurrence".to_string(),
            });
        }
        Ok(Self {
            schedule,
            tz,
            next_fire,
        })
    }

    /// Parse the configured cron expression and timezone, then position at `now`.
    pub fn from_config(config: &ScheduleConfig, now: DateTime<Utc>) -> Result<Self, ObserverError> {
        let schedule = parse_schedule(&config.digest_cron)?;
        let tz = parse_timezone(&config.timezone)?;
        Self::new(schedule, tz, now)
    }

    pub fn next_fire(&self) -> Option<DateTime<Tz>> {
        self.next_fire
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Whether `now` has reached the next fire time.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_fire
            .is_some_and(|next| now >= next.with_timezone(&Utc))
    }

    /// Recompute the next fire from `now`, truncated to the minute.
    ///
    /// The result is always strictly after the previous `next_fire`, even if
    /// the clock reads earlier than it, so a fire can never repeat.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Option<DateTime<Tz>> {
        let truncated = truncate_to_minute(&now.with_timezone(&self.tz));
        let base = match self.next_fire {
            Some(previous) if previous > truncated => previous,
            _ => truncated,
        };
        self.next_fire = self.schedule.after(&base).next();
        self.next_fire
    }
}

//! Cron-aligned digest scheduling.
//!
//! [`SchedulerCursor`] owns the single "next fire" instant and only ever
//! moves it forward. [`DigestScheduler`] checks the cursor on a fixed
//! five-second clock, runs a digest cycle when it is due, and advances the
//! cursor whether or not the cycle succeeded. Missed fires are not replayed.

pub(crate) mod cron;
mod cursor;
mod runner;


pub use self::cron::{normalize_cron, parse_schedule, parse_timezone};
pub use self::cursor::SchedulerCursor;
pub use self::runner::{system_clock, Clock, DigestScheduler, TickOutcome, CLOCK_CHECK_INTERVAL};

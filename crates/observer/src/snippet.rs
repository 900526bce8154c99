//! Best-effort error snippet lookup.
//!
//! The orchestrator does not say which step of a failed run broke, so a
//! fixed list of likely step ids is tried in order. The first non-empty log
//! wins; errors and empty logs move on to the next candidate.

use std::fmt::Display;
use std::future::Future;

use tracing::debug;

/// Try `fetch` on each candidate in order and return the first non-empty text.
///
/// Exhausting the list returns `None`; that is an expected outcome, not an
/// error.
pub async fn probe_candidates<F, Fut, E>(candidates: &[String], mut fetch: F) -> Option<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, E>>,
    E: Display,
{
    for candidate in candidates {
        match fetch(candidate.clone()).await {
            Ok(text) if !text.is_empty() => {
                debug!(step = %candidate, bytes = text.len(), "found log for snippet");
                return Some(text);
            }
            Ok(_) => debug!(step = %candidate, "empty log, trying next candidate"),
            Err(e) => debug!(step = %candidate, error = %e, "log fetch failed, trying next candidate"),
        }
    }
    None
}

//! Daily progress history for goals.

use chrono::NaiveDate;
use hobbi_core::LocalCache;

use crate::error::SyncError;
use crate::model::{Goal, HistoryEntry};

/// Number of most recent days kept per goal.
pub const HISTORY_DAYS: usize = 30;

/// Local cache key holding the last day history was appended.
pub const LAST_SAVED_KEY: &str = "hobbi-last-saved";

/// Calendar-day label used in history entries, e.g. `Sat Oct 17 2026`.
pub fn day_label(day: NaiveDate) -> String {
    day.format("%a %b %d %Y").to_string()
}

impl Goal {
    /// Append today's progress unless an entry for `day` already exists.
    ///
    /// Returns `true` when an entry was appended. The history is trimmed to
    /// the most recent `HISTORY_DAYS` entries, oldest first.
    pub fn record_progress(&mut self, day: NaiveDate) -> bool {
        let label = day_label(day);
        if self.history.iter().any(|h| h.date == label) {
            return false;
        }

        self.history.push(HistoryEntry {
            date: label,
            progress: self.progress_percent(),
        });

        if self.history.len() > HISTORY_DAYS {
            let excess = self.history.len() - HISTORY_DAYS;
            self.history.drain(..excess);
        }
        true
    }
}

/// Record one history entry per goal for `today`, at most once per day.
///
/// The last tracked day is kept in the local cache so reloading the
/// dashboard on the same day does no work. Returns `true` if goals were
/// visited.
pub fn track_daily_progress(
    goals: &mut [Goal],
    today: NaiveDate,
    cache: &LocalCache,
) -> Result<bool, SyncError> {
    let label = day_label(today);
    if cache.get(LAST_SAVED_KEY)?.as_deref() == Some(label.as_str()) {
        tracing::debug!("Progress history already tracked for {}", label);
        return Ok(false);
    }

    let appended = goals
        .iter_mut()
        .map(|goal| goal.record_progress(today))
        .filter(|added| *added)
        .count();

    cache.set(LAST_SAVED_KEY, &label)?;
    tracing::info!("Tracked progress history for {} goal(s) on {}", appended, label);
    Ok(true)
}

//! Deadline races for slow sources.
//!
//! The raced operation runs on its own task and reports back through a
//! oneshot channel. When the deadline wins, the receiver is dropped: the
//! operation keeps running to completion but has nowhere to deliver its
//! result, so a late answer can never be applied twice.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;

/// Result of racing an operation against a deadline.
#[derive(Debug, PartialEq, Eq)]
pub enum RaceOutcome<T> {
    /// The operation finished before the deadline.
    Finished(T),
    /// The deadline fired first; the operation was abandoned.
    DeadlineFirst,
    /// The operation's task ended without producing a value (it panicked).
    Dropped,
}

impl<T> RaceOutcome<T> {
    pub fn finished(self) -> Option<T> {
        match self {
            RaceOutcome::Finished(value) => Some(value),
            RaceOutcome::DeadlineFirst | RaceOutcome::Dropped => None,
        }
    }
}

/// Race `operation` against `deadline`.
///
/// The operation is spawned, not awaited in place, so losing the race
/// abandons it instead of aborting it.
pub async fn race_deadline<F>(operation: F, deadline: Duration, label: &'static str) -> RaceOutcome<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let output = operation.await;
        if tx.send(output).is_err() {
            tracing::debug!("{}: result arrived after the deadline and was discarded", label);
        }
    });

    tokio::select! {
        received = rx => match received {
            Ok(output) => RaceOutcome::Finished(output),
            Err(_) => {
                tracing::warn!("{}: operation ended without a result", label);
                RaceOutcome::Dropped
            }
        },
        _ = tokio::time::sleep(deadline) => {
            tracing::warn!("{}: no answer within {:?}, falling back", label, deadline);
            RaceOutcome::DeadlineFirst
        }
    }
}

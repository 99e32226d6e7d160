// Local crates
use crate::{
    render::render::{DisplayMode, Palette},
    transport::client::TransportError,
};

// External crates
use chrono::{DateTime, Timelike, Utc};
use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::time::Duration;

/// Pause between two polls in tailing mode unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Line written after a poll that returned records, before sleeping.
pub const WAITING_INDICATOR: &str = "Waiting for new events...\n";

/// Caller supplied parameters, fixed for the lifetime of one tail invocation.
#[derive(Debug, Clone)]
pub struct TailOptions {
    /// Narrow the feed to one entity (function id, host).
    pub entity_filter: Option<String>,
    /// Requested result count per poll. Non-positive values are clamped.
    pub limit: i64,
    /// Keep polling until cancelled instead of stopping after one pass.
    pub tail: bool,
    /// Pause between polls in tailing mode.
    pub interval: Duration,
    pub mode: DisplayMode,
    pub palette: Palette,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            entity_filter: None,
            limit: i64::from(crate::query::builder::DEFAULT_LIMIT),
            tail: false,
            interval: DEFAULT_POLL_INTERVAL,
            mode: DisplayMode::Compact,
            palette: Palette::plain(),
        }
    }
}

/// Everything the loop mutates. Owned by one `Tailer`, never shared.
///
/// `watermark` is the timestamp of the newest record seen so far, or the
/// look-back default until the first record arrives. It never moves backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailState {
    pub watermark: DateTime<Utc>,
    /// Result count requested by the next poll. Raised above the configured
    /// limit while one second holds more records than a poll returns.
    pub limit: u32,
    pub polls: u64,
    pub rendered: u64,
    pub skipped: u64,
}

impl TailState {
    pub fn new(watermark: DateTime<Utc>, limit: u32) -> Self {
        Self {
            watermark,
            limit,
            polls: 0,
            rendered: 0,
            skipped: 0,
        }
    }
}

/// What one successful poll did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub received: usize,
    pub rendered: usize,
    pub skipped: usize,
    /// Newest timestamp in the poll result, committed as the next watermark.
    pub staged: Option<DateTime<Utc>>,
}

/// How a tail invocation ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailExit {
    /// One-shot pass finished.
    Completed,
    /// Cancellation was observed while polling or sleeping.
    Cancelled,
}

/// Totals reported when the loop stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailSummary {
    pub exit: TailExit,
    pub polls: u64,
    pub rendered: u64,
    pub skipped: u64,
    pub watermark: DateTime<Utc>,
}

/// Tail loop error handling
/// - A failed poll ends the invocation; nothing from it is rendered.
/// - A failing output sink ends it too, there is nowhere left to write to.
#[derive(Debug, thiserror::Error)]
pub enum TailError {
    #[error("poll failed")]
    Transport(#[from] TransportError),
    #[error("failed to write events to output")]
    Output(#[from] io::Error),
}

/// The polling state machine for one feed.
///
/// ```text
/// POLLING -> RENDERING -> ADVANCING -> SLEEPING -> POLLING ...
///                                   \-> TERMINATED (one-shot, cancel, error)
/// ```
///
/// `T` executes queries, `F` picks the dataset, `W` receives rendered text.
pub struct Tailer<T, F, W> {
    pub(crate) transport: T,
    pub(crate) options: TailOptions,
    pub(crate) state: TailState,
    pub(crate) output: W,
    pub(crate) _feed: PhantomData<F>,
}

impl<T, F, W> fmt::Debug for Tailer<T, F, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tailer")
            .field("options", &self.options)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Look-back default for the first poll: `now - lookback`, whole seconds.
/// Look-backs reaching past what chrono can represent start at the earliest
/// representable instant.
pub fn initial_watermark(now: DateTime<Utc>, lookback: Duration) -> DateTime<Utc> {
    let lookback = chrono::Duration::from_std(lookback).unwrap_or(chrono::Duration::MAX);
    let start = now
        .checked_sub_signed(lookback)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    start.with_nanosecond(0).unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + chrono::Duration::milliseconds(750)
    }

    #[test]
    fn initial_watermark_subtracts_lookback_and_truncates() {
        let watermark = initial_watermark(now(), Duration::from_secs(300));

        assert_eq!(watermark, Utc.with_ymd_and_hms(2024, 5, 1, 9, 55, 0).unwrap());
    }

    #[test]
    fn oversized_lookback_starts_at_earliest_instant() {
        let lookback = Duration::from_secs(1_000_000_000_000u64.saturating_mul(60));

        let watermark = initial_watermark(now(), lookback);

        assert_eq!(watermark, DateTime::<Utc>::MIN_UTC);
        assert!(watermark < now());
    }
}

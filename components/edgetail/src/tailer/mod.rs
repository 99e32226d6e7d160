//! The tail loop: poll, render, advance the watermark, sleep, repeat.

pub mod models;
pub mod tailer;

#[cfg(test)]
mod tests;

pub use models::{
    DEFAULT_POLL_INTERVAL, PollOutcome, TailError, TailExit, TailOptions, TailState, TailSummary,
    Tailer, WAITING_INDICATOR, initial_watermark,
};

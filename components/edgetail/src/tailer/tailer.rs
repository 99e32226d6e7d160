// Local crates
use crate::{
    events::{feed::EventFeed, models::EventRecord},
    query::builder::{build_query, effective_limit, format_watermark},
    render::render::Render,
    tailer::models::{
        PollOutcome, TailError, TailExit, TailOptions, TailState, TailSummary, Tailer,
        WAITING_INDICATOR,
    },
    transport::client::{Transport, fetch},
};

// External crates
use chrono::{DateTime, Utc};
use std::io::Write;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

impl<T, F, W> Tailer<T, F, W>
where
    T: Transport,
    F: EventFeed,
    W: Write + Send,
{
    /// Create a `Tailer` starting from `watermark`. Nothing happens until
    /// `run` or `poll_once` is called.
    pub fn new(transport: T, options: TailOptions, watermark: DateTime<Utc>, output: W) -> Self {
        let limit = effective_limit(options.limit);
        Self {
            transport,
            options,
            state: TailState::new(watermark, limit),
            output,
            _feed: PhantomData,
        }
    }

    /// Last committed watermark.
    pub fn watermark(&self) -> DateTime<Utc> {
        self.state.watermark
    }

    pub fn state(&self) -> &TailState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the loop until it terminates.
    ///
    /// One-shot mode performs exactly one poll. Tailing mode polls, sleeps
    /// `interval` and polls again until `cancel` fires; cancellation is
    /// observed during the sleep and while a poll is in flight, in which case
    /// the in-flight poll is dropped unrendered.
    ///
    /// A failed poll returns its error immediately and leaves the watermark at
    /// its last committed value.
    #[instrument(
        name = "edgetail_tailer::run",
        target = "tailer::tailer::Tailer",
        skip_all,
        fields(feed = F::NAME, tail = self.options.tail),
        level = "debug"
    )]
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<TailSummary, TailError> {
        info!(
            watermark = %format_watermark(self.state.watermark),
            interval_secs = self.options.interval.as_secs(),
            "Starting event tail"
        );

        loop {
            if cancel.is_cancelled() {
                return Ok(self.summary(TailExit::Cancelled));
            }

            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                outcome = self.poll_once() => Some(outcome),
            };

            let outcome = match polled {
                Some(outcome) => outcome?,
                None => {
                    info!("Tail cancelled while a poll was in flight");
                    return Ok(self.summary(TailExit::Cancelled));
                }
            };

            if !self.options.tail {
                return Ok(self.summary(TailExit::Completed));
            }

            if outcome.received > 0 {
                self.output.write_all(WAITING_INDICATOR.as_bytes())?;
                self.output.flush()?;
            }

            trace!(interval_secs = self.options.interval.as_secs(), "Sleeping until next poll");

            let woke = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                _ = tokio::time::sleep(self.options.interval) => true,
            };

            if !woke {
                info!("Tail cancelled while sleeping");
                return Ok(self.summary(TailExit::Cancelled));
            }
        }
    }

    /// One POLLING -> RENDERING -> ADVANCING cycle.
    #[instrument(
        name = "edgetail_tailer::poll",
        target = "tailer::tailer::Tailer",
        skip_all,
        fields(feed = F::NAME, poll = self.state.polls + 1),
        level = "debug"
    )]
    pub async fn poll_once(&mut self) -> Result<PollOutcome, TailError> {
        let query = build_query::<F>(
            self.state.watermark,
            self.options.entity_filter.as_deref(),
            i64::from(self.state.limit),
        );

        let records = match fetch(&self.transport, &query).await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    error = %e,
                    watermark = %format_watermark(self.state.watermark),
                    "Poll failed, aborting tail"
                );
                return Err(e.into());
            }
        };
        self.state.polls += 1;

        let outcome = self.render_poll(&records)?;

        // Empty polls leave the watermark alone.
        if let Some(staged) = outcome.staged {
            if staged > self.state.watermark {
                self.state.watermark = staged;
            }
        }
        self.state.rendered += outcome.rendered as u64;
        self.state.skipped += outcome.skipped as u64;
        self.adjust_limit(&outcome);

        debug!(
            received = outcome.received,
            rendered = outcome.rendered,
            skipped = outcome.skipped,
            watermark = %format_watermark(self.state.watermark),
            "Poll complete"
        );

        Ok(outcome)
    }

    /// Render a poll result in received order. In tailing mode records at or
    /// before the watermark are boundary repeats and are skipped; one-shot
    /// mode trusts the query filter and renders everything.
    fn render_poll(&mut self, records: &[F::Record]) -> Result<PollOutcome, TailError> {
        let watermark = self.state.watermark;
        let mut outcome = PollOutcome {
            received: records.len(),
            ..PollOutcome::default()
        };

        for record in records {
            let ts = record.timestamp();

            if self.options.tail && ts <= watermark {
                trace!(
                    timestamp = %ts,
                    watermark = %watermark,
                    "Skipping already rendered event"
                );
                outcome.skipped += 1;
            } else {
                let text = record.render(self.options.mode, self.options.palette);
                self.output.write_all(text.as_bytes())?;
                outcome.rendered += 1;
            }

            if outcome.staged.is_none_or(|staged| ts > staged) {
                outcome.staged = Some(ts);
            }
        }

        self.output.flush()?;
        Ok(outcome)
    }

    /// A full page of nothing but boundary repeats means one second holds at
    /// least `limit` records. The `tsGt` filter cannot move past that second,
    /// so the next poll asks for twice as many. Back to the configured limit
    /// once a poll makes progress again.
    fn adjust_limit(&mut self, outcome: &PollOutcome) {
        let base = effective_limit(self.options.limit);
        let saturated = self.options.tail
            && outcome.rendered == 0
            && u32::try_from(outcome.received).unwrap_or(u32::MAX) >= self.state.limit;

        if saturated {
            let raised = self.state.limit.saturating_mul(2);
            warn!(
                second = %format_watermark(self.state.watermark),
                limit = self.state.limit,
                next_limit = raised,
                "Every event of the poll shares one already rendered second, raising the limit"
            );
            self.state.limit = raised;
        } else if self.state.limit != base && outcome.rendered > 0 {
            debug!(limit = base, "Poll made progress, restoring the configured limit");
            self.state.limit = base;
        }
    }

    fn summary(&self, exit: TailExit) -> TailSummary {
        TailSummary {
            exit,
            polls: self.state.polls,
            rendered: self.state.rendered,
            skipped: self.state.skipped,
            watermark: self.state.watermark,
        }
    }
}

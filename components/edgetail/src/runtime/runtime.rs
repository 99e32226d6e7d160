// Local crates
use crate::{
    events::feed::EventFeed,
    helpers::{load_config::Config, shutdown::Shutdown},
    query::builder::format_watermark,
    render::render::{DisplayMode, Palette},
    tailer::models::{TailError, TailOptions, TailSummary, Tailer, initial_watermark},
    transport::client::HttpTransport,
};

// External crates
use anyhow::{Context, Result};
use chrono::Utc;
use std::io::{self, ErrorKind};
use std::time::Duration;
use tracing::{info, instrument};

/// Per-invocation choices coming from the command line. `None` falls back to
/// the configuration file.
#[derive(Debug, Clone, Default)]
pub struct TailRequest {
    pub entity_filter: Option<String>,
    pub limit: Option<i64>,
    pub tail: bool,
    pub verbose: bool,
    pub no_color: bool,
    pub lookback_minutes: Option<u64>,
    pub interval_secs: Option<u64>,
}

impl TailRequest {
    /// Resolve the loop options against the loaded configuration.
    pub fn options(&self, cfg: &Config, palette: Palette) -> TailOptions {
        TailOptions {
            entity_filter: self.entity_filter.clone(),
            limit: self.limit.unwrap_or(cfg.tail.default_limit),
            tail: self.tail,
            interval: Duration::from_secs(self.interval_secs.unwrap_or(cfg.tail.interval_secs).max(1)),
            mode: if self.verbose {
                DisplayMode::Verbose
            } else {
                DisplayMode::Compact
            },
            palette,
        }
    }

    pub fn lookback(&self, cfg: &Config) -> Duration {
        let minutes = self.lookback_minutes.unwrap_or(cfg.tail.lookback_minutes);
        Duration::from_secs(minutes.saturating_mul(60))
    }
}

/// Tail one feed to stdout until the one-shot pass finishes, the operator
/// interrupts, or a poll fails.
#[instrument(
    name = "edgetail_runtime::run_tail",
    target = "runtime::runtime",
    skip_all,
    fields(feed = F::NAME),
    level = "debug"
)]
pub async fn run_tail<F: EventFeed>(cfg: Config, request: TailRequest) -> Result<()> {
    let token = cfg.require_token()?;

    let transport = HttpTransport::new(&cfg.general.events_url, token, cfg.request_timeout())
        .context("Failed to create events API client")?;

    let options = request.options(&cfg, Palette::detect(request.no_color));
    let watermark = initial_watermark(Utc::now(), request.lookback(&cfg));

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();
    let cancel = shutdown.child();

    let mut tailer = Tailer::<_, F, _>::new(transport, options, watermark, io::stdout());

    let summary = match tailer.run(&cancel).await {
        Ok(summary) => summary,
        // Downstream reader went away (`edgetail http | head`): nothing left to do.
        Err(TailError::Output(e)) if e.kind() == ErrorKind::BrokenPipe => {
            tracing::debug!("Output closed by reader, stopping");
            return Ok(());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to tail {} events", F::NAME));
        }
    };

    log_summary::<F>(&summary);
    Ok(())
}

fn log_summary<F: EventFeed>(summary: &TailSummary) {
    info!(
        feed = F::NAME,
        exit = ?summary.exit,
        polls = summary.polls,
        rendered = summary.rendered,
        skipped = summary.skipped,
        watermark = %format_watermark(summary.watermark),
        "Event tail finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_values_override_configuration() {
        // Arrange
        let cfg = Config::default();
        let request = TailRequest {
            entity_filter: Some("fn-1".to_string()),
            limit: Some(5),
            tail: true,
            verbose: true,
            interval_secs: Some(2),
            lookback_minutes: Some(60),
            ..TailRequest::default()
        };

        // Act
        let options = request.options(&cfg, Palette::plain());

        // Assert
        assert_eq!(options.entity_filter.as_deref(), Some("fn-1"));
        assert_eq!(options.limit, 5);
        assert_eq!(options.interval, Duration::from_secs(2));
        assert_eq!(options.mode, DisplayMode::Verbose);
        assert_eq!(request.lookback(&cfg), Duration::from_secs(3600));
    }

    #[test]
    fn configuration_fills_unset_request_values() {
        // Arrange
        let cfg = Config::default();
        let request = TailRequest::default();

        // Act
        let options = request.options(&cfg, Palette::plain());

        // Assert
        assert_eq!(options.limit, 100);
        assert_eq!(options.interval, Duration::from_secs(10));
        assert_eq!(options.mode, DisplayMode::Compact);
        assert!(!options.tail);
        assert_eq!(request.lookback(&cfg), Duration::from_secs(300));
    }

    #[test]
    fn zero_interval_is_raised_to_one_second() {
        let request = TailRequest {
            interval_secs: Some(0),
            ..TailRequest::default()
        };

        let options = request.options(&Config::default(), Palette::plain());

        assert_eq!(options.interval, Duration::from_secs(1));
    }
}

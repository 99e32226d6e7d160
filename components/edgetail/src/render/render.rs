// Local crates
use crate::events::models::{ConsoleEvent, HttpEvent, Severity};

// External crates
use chrono::{DateTime, SecondsFormat, Utc};
use owo_colors::{OwoColorize, Style};
use std::env;
use std::io::{self, IsTerminal};

/// Placeholder printed for attributes the service left empty.
const EMPTY_FIELD: &str = "-";

/// How much of each record is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// One comma-joined line per record.
    #[default]
    Compact,
    /// One labeled line per attribute, then a blank line.
    Verbose,
}

/// Whether ANSI styling is written at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// No styling, for pipes, files and tests.
    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Color only when stdout is a terminal, `NO_COLOR` is unset and the
    /// operator did not pass `--no-color`.
    pub fn detect(no_color: bool) -> Self {
        let env_disabled = env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self::new(!no_color && !env_disabled && io::stdout().is_terminal())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn paint(&self, text: &str, style: Option<Style>) -> String {
        match style {
            Some(style) if self.enabled => text.style(style).to_string(),
            _ => text.to_string(),
        }
    }

    fn label(&self, label: &str) -> String {
        self.paint(label, Some(Style::new().bold()))
    }
}

/// Fixed severity colors. Anything the service invents later stays unstyled.
pub fn severity_style(severity: &Severity) -> Option<Style> {
    match severity {
        Severity::Info => Some(Style::new().green()),
        Severity::Error => Some(Style::new().red()),
        Severity::Unknown(_) => None,
    }
}

/// Status colors by class; unparseable or out-of-range codes stay unstyled.
pub fn status_style(status: Option<u16>) -> Option<Style> {
    match status? {
        200..=299 => Some(Style::new().green()),
        300..=399 => Some(Style::new().cyan()),
        400..=499 => Some(Style::new().yellow()),
        500..=599 => Some(Style::new().red()),
        _ => None,
    }
}

/// Formatting of one record into the text written to the output sink,
/// trailing newline(s) included.
pub trait Render {
    fn render(&self, mode: DisplayMode, palette: Palette) -> String;
}

impl Render for ConsoleEvent {
    fn render(&self, mode: DisplayMode, palette: Palette) -> String {
        let level = palette.paint(or_empty(self.level.label()), severity_style(&self.level));

        match mode {
            DisplayMode::Compact => compact(&[
                display_ts(self.ts),
                or_empty(&self.function_id).to_string(),
                level,
                or_empty(&self.line_source).to_string(),
                or_empty(&self.line).to_string(),
            ]),
            DisplayMode::Verbose => verbose(
                palette,
                &[
                    ("Timestamp", display_ts(self.ts)),
                    ("Solution ID", or_empty(&self.solution_id).to_string()),
                    ("Configuration ID", or_empty(&self.configuration_id).to_string()),
                    ("Function ID", or_empty(&self.function_id).to_string()),
                    ("Event ID", or_empty(&self.id).to_string()),
                    ("Level", level),
                    ("Line Source", or_empty(&self.line_source).to_string()),
                    ("Line", or_empty(&self.line).to_string()),
                ],
            ),
        }
    }
}

impl Render for HttpEvent {
    fn render(&self, mode: DisplayMode, palette: Palette) -> String {
        let status = palette.paint(or_empty(&self.status), status_style(self.status_code()));

        match mode {
            DisplayMode::Compact => compact(&[
                display_ts(self.ts),
                or_empty(&self.request_method).to_string(),
                or_empty(&self.host).to_string(),
                or_empty(&self.request_uri).to_string(),
                status,
                or_empty(&self.request_time).to_string(),
            ]),
            DisplayMode::Verbose => verbose(
                palette,
                &[
                    ("Timestamp", display_ts(self.ts)),
                    ("Host", or_empty(&self.host).to_string()),
                    ("Country", or_empty(&self.geoloc_country_name).to_string()),
                    ("Region", or_empty(&self.geoloc_region_name).to_string()),
                    ("User Agent", or_empty(&self.http_user_agent).to_string()),
                    ("Request URI", or_empty(&self.request_uri).to_string()),
                    ("Status", status),
                    ("Upstream Bytes Sent", or_empty(&self.upstream_bytes_sent).to_string()),
                    ("Request Time", or_empty(&self.request_time).to_string()),
                    ("Request Method", or_empty(&self.request_method).to_string()),
                ],
            ),
        }
    }
}

fn display_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn or_empty(value: &str) -> &str {
    if value.trim().is_empty() {
        EMPTY_FIELD
    } else {
        value
    }
}

fn compact(fields: &[String]) -> String {
    let mut line = fields.join(", ");
    line.push('\n');
    line
}

fn verbose(palette: Palette, fields: &[(&str, String)]) -> String {
    let mut block = String::new();
    for (label, value) in fields {
        block.push_str(&palette.label(&format!("{label}:")));
        block.push(' ');
        block.push_str(value);
        block.push('\n');
    }
    block.push('\n');
    block
}

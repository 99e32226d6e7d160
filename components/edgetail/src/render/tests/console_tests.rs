use crate::events::models::{ConsoleEvent, Severity};
use crate::render::{DisplayMode, Palette, Render, severity_style};

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

// ---------------------------
// Helpers
// ---------------------------

fn event(level: Severity) -> ConsoleEvent {
    ConsoleEvent {
        ts: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 1).unwrap(),
        function_id: "fn-1".to_string(),
        level,
        line_source: "STDOUT".to_string(),
        line: "handled request".to_string(),
        solution_id: "sol-9".to_string(),
        configuration_id: "cfg-3".to_string(),
        id: "evt-7".to_string(),
    }
}

// ---------------------------
// Tests
// ---------------------------

#[test]
fn compact_is_one_comma_joined_line() {
    // Act
    let out = event(Severity::Info).render(DisplayMode::Compact, Palette::plain());

    // Assert
    assert_eq!(
        out,
        "2024-05-01T10:00:01Z, fn-1, LOG, STDOUT, handled request\n"
    );
}

#[test]
fn verbose_is_labeled_block_with_trailing_blank_line() {
    // Act
    let out = event(Severity::Error).render(DisplayMode::Verbose, Palette::plain());

    // Assert
    assert_eq!(
        out,
        "\
Timestamp: 2024-05-01T10:00:01Z
Solution ID: sol-9
Configuration ID: cfg-3
Function ID: fn-1
Event ID: evt-7
Level: ERROR
Line Source: STDOUT
Line: handled request

"
    );
}

#[test]
fn empty_attributes_render_as_placeholder() {
    // Arrange
    let mut record = event(Severity::Info);
    record.line_source = String::new();

    // Act
    let out = record.render(DisplayMode::Compact, Palette::plain());

    // Assert
    assert!(out.contains(", LOG, -, handled request"));
}

#[test]
fn known_severities_are_colored_when_enabled() {
    // Act
    let info = event(Severity::Info).render(DisplayMode::Compact, Palette::new(true));
    let error = event(Severity::Error).render(DisplayMode::Compact, Palette::new(true));

    // Assert
    assert!(info.contains("\u{1b}[32mLOG"), "info not green: {info:?}");
    assert!(error.contains("\u{1b}[31mERROR"), "error not red: {error:?}");
}

#[test]
fn unknown_severity_renders_uncolored_without_error() {
    // Arrange
    let record = event(Severity::Unknown("TRACE".to_string()));

    // Act
    let compact = record.render(DisplayMode::Compact, Palette::new(true));

    // Assert
    assert_eq!(severity_style(&record.level), None);
    assert!(compact.contains(", TRACE, "));
    assert!(!compact.contains("\u{1b}[3"));
}

#[test]
fn plain_palette_never_emits_escape_codes() {
    // Act
    let out = event(Severity::Error).render(DisplayMode::Verbose, Palette::plain());

    // Assert
    assert!(!out.contains('\u{1b}'));
}

// Local crates
use crate::events::feed::EventFeed;

// External crates
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use std::fmt::Write as _;
use std::marker::PhantomData;

/// Result size used when the caller asks for a non-positive limit.
pub const DEFAULT_LIMIT: u32 = 100;

/// Query text ready to be handed to a `Transport`, tagged with the feed it
/// was built for so its response can only be decoded as that feed's records.
#[derive(Debug, Clone)]
pub struct QueryDescriptor<F> {
    text: String,
    dataset: &'static str,
    _feed: PhantomData<F>,
}

impl<F: EventFeed> QueryDescriptor<F> {
    /// GraphQL document sent to the service.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Field of the response `data` object holding the records.
    pub fn dataset(&self) -> &'static str {
        self.dataset
    }
}

/// Clamp a caller supplied limit. The service decides the real cap, so a bad
/// value is replaced instead of rejected.
pub fn effective_limit(limit: i64) -> u32 {
    if limit <= 0 {
        return DEFAULT_LIMIT;
    }
    u32::try_from(limit).unwrap_or(u32::MAX)
}

/// Text form of a watermark as the service compares it: UTC, whole seconds,
/// `Z` suffix. Sub-second precision is dropped, never rounded up, so the query
/// can only ever ask for more than was seen, not less.
pub fn format_watermark(watermark: DateTime<Utc>) -> String {
    watermark
        .with_nanosecond(0)
        .unwrap_or(watermark)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Build the query for one poll: records strictly after `watermark`, oldest
/// first, at most `limit` of them, optionally narrowed to one entity.
pub fn build_query<F: EventFeed>(
    watermark: DateTime<Utc>,
    entity_filter: Option<&str>,
    limit: i64,
) -> QueryDescriptor<F> {
    let mut text = String::with_capacity(256);

    // Writing into a String cannot fail.
    let _ = writeln!(text, "query {} {{", F::OPERATION);
    let _ = writeln!(text, "  {}(", F::DATASET);
    let _ = writeln!(text, "    limit: {}", effective_limit(limit));
    let _ = writeln!(text, "    filter: {{");
    if let Some(entity) = entity_filter.filter(|e| !e.trim().is_empty()) {
        let _ = writeln!(text, "      {}: {}", F::ENTITY_FILTER, string_literal(entity.trim()));
    }
    let _ = writeln!(
        text,
        "      tsGt: {}",
        string_literal(&format_watermark(watermark))
    );
    let _ = writeln!(text, "    }}");
    let _ = writeln!(text, "    orderBy: [ts_ASC]");
    let _ = writeln!(text, "  ) {{");
    for field in F::FIELDS {
        let _ = writeln!(text, "    {field}");
    }
    let _ = writeln!(text, "  }}");
    let _ = writeln!(text, "}}");

    QueryDescriptor {
        text,
        dataset: F::DATASET,
        _feed: PhantomData,
    }
}

/// GraphQL string literals share JSON's escaping rules.
fn string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::feed::{ConsoleFeed, HttpFeed};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn watermark() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn console_query_matches_expected_document() {
        let query = build_query::<ConsoleFeed>(watermark(), Some("fn-42"), 50);

        let expected = "\
query ConsoleEventsQuery {
  cellsConsoleEvents(
    limit: 50
    filter: {
      functionIdEq: \"fn-42\"
      tsGt: \"2024-05-01T10:00:00Z\"
    }
    orderBy: [ts_ASC]
  ) {
    ts
    solutionId
    configurationId
    functionId
    id
    lineSource
    level
    line
  }
}
";
        assert_eq!(query.text(), expected);
        assert_eq!(query.dataset(), "cellsConsoleEvents");
    }

    #[test]
    fn entity_filter_is_omitted_when_absent_or_blank() {
        let none = build_query::<HttpFeed>(watermark(), None, 10);
        let blank = build_query::<HttpFeed>(watermark(), Some("  "), 10);

        assert!(!none.text().contains("hostEq"));
        assert!(!blank.text().contains("hostEq"));
        assert!(none.text().contains("httpEvents("));
    }

    #[test]
    fn entity_filter_is_escaped() {
        let query = build_query::<HttpFeed>(watermark(), Some("a\"b"), 10);

        assert!(query.text().contains(r#"hostEq: "a\"b""#));
    }

    #[test]
    fn non_positive_limit_falls_back_to_default() {
        assert_eq!(effective_limit(0), DEFAULT_LIMIT);
        assert_eq!(effective_limit(-7), DEFAULT_LIMIT);
        assert_eq!(effective_limit(25), 25);

        let query = build_query::<ConsoleFeed>(watermark(), None, -1);
        assert!(query.text().contains("limit: 100\n"));
    }

    #[test]
    fn watermark_is_truncated_to_whole_seconds() {
        let precise = watermark() + chrono::Duration::milliseconds(999);

        assert_eq!(format_watermark(precise), "2024-05-01T10:00:00Z");
    }
}

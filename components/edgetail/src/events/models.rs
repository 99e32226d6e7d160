// External crates
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Anything returned by the events API that carries an ordering timestamp.
///
/// The tail loop only ever looks at the timestamp; every other attribute is
/// opaque to it and only matters to the renderer.
pub trait EventRecord {
    /// Timestamp the remote service ordered this record by.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Severity of a function console line.
///
/// The service sends free text here. `LOG` and `ERROR` are the two values it
/// documents, everything else is kept verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
    Unknown(String),
}

impl Severity {
    /// Text shown to the operator, matching what the service sent.
    pub fn label(&self) -> &str {
        match self {
            Severity::Info => "LOG",
            Severity::Error => "ERROR",
            Severity::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for Severity {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOG" => Severity::Info,
            "ERROR" => Severity::Error,
            _ => Severity::Unknown(raw.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(Severity::from(raw.as_str()))
    }
}

/// One line written by an edge function to its console.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleEvent {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub ts: DateTime<Utc>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub function_id: String,
    #[serde(default = "unknown_severity")]
    pub level: Severity,
    #[serde(default, deserialize_with = "string_or_number")]
    pub line_source: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub line: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub solution_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub configuration_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
}

impl EventRecord for ConsoleEvent {
    fn timestamp(&self) -> DateTime<Utc> {
        self.ts
    }
}

/// One HTTP request served at the edge.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HttpEvent {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub ts: DateTime<Utc>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub host: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub geoloc_country_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub geoloc_region_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub http_user_agent: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub request_uri: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub status: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub upstream_bytes_sent: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub request_time: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub request_method: String,
}

impl HttpEvent {
    /// Numeric status code, when the service sent something parseable.
    pub fn status_code(&self) -> Option<u16> {
        self.status.trim().parse().ok()
    }
}

impl EventRecord for HttpEvent {
    fn timestamp(&self) -> DateTime<Utc> {
        self.ts
    }
}

fn unknown_severity() -> Severity {
    Severity::Unknown(String::new())
}

/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`, `...+02:00`, with or without
/// fractional seconds) and naive `2024-05-01T10:00:00[.fff]`, read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp `{raw}`")))
}

/// The API is loose about scalar types (status and byte counts show up both as
/// strings and as numbers), so every display field is kept as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn severity_parses_known_values_case_insensitively() {
        assert_eq!(Severity::from("LOG"), Severity::Info);
        assert_eq!(Severity::from("error"), Severity::Error);
        assert_eq!(
            Severity::from("DEBUG"),
            Severity::Unknown("DEBUG".to_string())
        );
    }

    #[test]
    fn timestamp_accepts_rfc3339_and_naive_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2024-05-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn console_event_tolerates_missing_and_numeric_fields() {
        let event: ConsoleEvent = serde_json::from_value(json!({
            "ts": "2024-05-01T10:00:01.250Z",
            "functionId": 1234,
            "level": null,
            "line": "hello"
        }))
        .unwrap();

        assert_eq!(event.function_id, "1234");
        assert_eq!(event.level, Severity::Unknown(String::new()));
        assert_eq!(event.line_source, "");
        assert_eq!(event.ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn http_event_exposes_numeric_status() {
        let event: HttpEvent = serde_json::from_value(json!({
            "ts": "2024-05-01T10:00:00Z",
            "status": 503,
            "requestMethod": "GET"
        }))
        .unwrap();

        assert_eq!(event.status_code(), Some(503));
        assert_eq!(event.request_method, "GET");
    }
}

// Local crates
use crate::{events::feed::EventFeed, transport::client::TransportError};

// External crates
use serde::Deserialize;
use serde_json::Value;

/// Longest piece of an error body kept in a `TransportError::Status`.
const BODY_SNIPPET_LEN: usize = 512;

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: String,
}

/// Turn a raw HTTP answer into the GraphQL `data` object.
///
/// Any `errors` entry fails the whole response even when `data` is present,
/// since partial results are never rendered.
pub fn decode_envelope(status: u16, body: &str) -> Result<Value, TransportError> {
    if !(200..300).contains(&status) {
        return Err(TransportError::Status {
            status,
            body: snippet(body),
        });
    }

    let envelope: GraphqlEnvelope = serde_json::from_str(body)
        .map_err(|e| TransportError::Malformed(format!("response is not a GraphQL envelope: {e}")))?;

    if !envelope.errors.is_empty() {
        let messages: Vec<&str> = envelope
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .filter(|m| !m.is_empty())
            .collect();
        let joined = if messages.is_empty() {
            "unspecified error".to_string()
        } else {
            messages.join("; ")
        };
        return Err(TransportError::Query(joined));
    }

    match envelope.data {
        Some(data @ Value::Object(_)) => Ok(data),
        Some(other) => Err(TransportError::Malformed(format!(
            "`data` is not an object: {other}"
        ))),
        None => Err(TransportError::Malformed("response has no `data`".to_string())),
    }
}

/// Pull the feed's record list out of a `data` object. A `null` dataset is an
/// empty poll; a missing one is a malformed response.
pub fn decode_records<F: EventFeed>(
    mut data: Value,
    dataset: &str,
) -> Result<Vec<F::Record>, TransportError> {
    let records = match data.get_mut(dataset) {
        Some(value) => value.take(),
        None => {
            return Err(TransportError::Malformed(format!(
                "`data.{dataset}` is missing"
            )));
        }
    };

    if records.is_null() {
        return Ok(Vec::new());
    }

    serde_json::from_value(records).map_err(|e| {
        TransportError::Malformed(format!("`data.{dataset}` does not hold {} records: {e}", F::NAME))
    })
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

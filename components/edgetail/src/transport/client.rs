//! Transport - the only part of the engine that talks to the network.
//!
//! A `Transport` takes a `QueryDescriptor` and hands back the `data` object of
//! the GraphQL response, nothing more. It does not retry and does not try to
//! salvage half of a response: every failure comes back as a `TransportError`
//! and the caller decides what that means (the tail loop treats all of them
//! as fatal).

// Local crates
use crate::{
    events::feed::EventFeed,
    query::builder::QueryDescriptor,
    transport::envelope::{decode_envelope, decode_records},
};

// External crates
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::instrument;

/// Transport error handling
/// - One variant per way a poll can fail, so the operator sees whether the
/// network, the credential, the query or the payload was at fault.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to events API failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("events API answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("events API rejected the query: {0}")]
    Query(String),
    #[error("malformed response from events API: {0}")]
    Malformed(String),
    #[error("credential contains characters not allowed in an HTTP header")]
    InvalidCredential,
}

/// Executes queries against the events API.
pub trait Transport: Send + Sync {
    /// Run one query and return the `data` object of the response.
    fn execute<F: EventFeed>(
        &self,
        query: &QueryDescriptor<F>,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// Run `query` and decode the feed's records out of the response.
pub async fn fetch<T, F>(
    transport: &T,
    query: &QueryDescriptor<F>,
) -> Result<Vec<F::Record>, TransportError>
where
    T: Transport,
    F: EventFeed,
{
    let data = transport.execute(query).await?;
    decode_records::<F>(data, query.dataset())
}

/// `Transport` over HTTPS with a `Token` credential.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Build a client that sends `Authorization: Token <token>` on every request.
    #[instrument(
        name = "edgetail_transport::create",
        target = "transport::client::HttpTransport",
        skip(token),
        level = "debug"
    )]
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut credential = HeaderValue::from_str(&format!("Token {}", token.trim()))
            .map_err(|_| TransportError::InvalidCredential)?;
        credential.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, credential);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(concat!("edgetail/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::Client)?;

        tracing::debug!("Events API client created");

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl Transport for HttpTransport {
    #[instrument(
        name = "edgetail_transport::execute",
        target = "transport::client::HttpTransport",
        skip_all,
        fields(endpoint = %self.endpoint, dataset = query.dataset()),
        level = "debug"
    )]
    async fn execute<F: EventFeed>(&self, query: &QueryDescriptor<F>) -> Result<Value, TransportError> {
        tracing::trace!(query = query.text(), "Sending events query");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query.text() }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(status, bytes = body.len(), "Events API responded");

        decode_envelope(status, &body)
    }
}

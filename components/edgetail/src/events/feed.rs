// Local crates
use crate::{
    events::models::{ConsoleEvent, EventRecord, HttpEvent},
    render::render::Render,
};

// External crates
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Describes one dataset of the events API: what to ask for and what comes back.
///
/// Both feeds share the whole tailing engine; they differ only in the GraphQL
/// field names and the record type the response decodes into.
pub trait EventFeed: Debug + Send + Sync + 'static {
    /// Record type one element of the dataset decodes into.
    type Record: EventRecord + Render + DeserializeOwned + Send;

    /// Short name used in logs and on the CLI.
    const NAME: &'static str;

    /// GraphQL operation name.
    const OPERATION: &'static str;

    /// GraphQL field holding the list of records.
    const DATASET: &'static str;

    /// Filter argument narrowing the dataset to one entity.
    const ENTITY_FILTER: &'static str;

    /// Selection set, in display order.
    const FIELDS: &'static [&'static str];
}

/// Console output of edge functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFeed;

impl EventFeed for ConsoleFeed {
    type Record = ConsoleEvent;

    const NAME: &'static str = "functions";
    const OPERATION: &'static str = "ConsoleEventsQuery";
    const DATASET: &'static str = "cellsConsoleEvents";
    const ENTITY_FILTER: &'static str = "functionIdEq";
    const FIELDS: &'static [&'static str] = &[
        "ts",
        "solutionId",
        "configurationId",
        "functionId",
        "id",
        "lineSource",
        "level",
        "line",
    ];
}

/// HTTP access log of the edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFeed;

impl EventFeed for HttpFeed {
    type Record = HttpEvent;

    const NAME: &'static str = "http";
    const OPERATION: &'static str = "HttpEventsQuery";
    const DATASET: &'static str = "httpEvents";
    const ENTITY_FILTER: &'static str = "hostEq";
    const FIELDS: &'static [&'static str] = &[
        "ts",
        "host",
        "geolocCountryName",
        "geolocRegionName",
        "httpUserAgent",
        "requestUri",
        "status",
        "upstreamBytesSent",
        "requestTime",
        "requestMethod",
    ];
}

//! edgetail follows edge platform events from a GraphQL events API.
//!
//! The engine polls one feed at a time (function console logs or HTTP access
//! logs), renders every new record exactly once and advances a timestamp
//! watermark so the next poll only asks for what came after it.
//!
//! - [`query`] builds the GraphQL documents.
//! - [`transport`] executes them and decodes the response envelope.
//! - [`render`] turns records into terminal lines.
//! - [`tailer`] owns the poll, render and commit loop.

pub mod cli;
pub mod events;
pub mod helpers;
pub mod instrumentation;
pub mod query;
pub mod render;
pub mod runtime;
pub mod tailer;
pub mod transport;

//! Event records returned by the events API and the feeds that produce them.

pub mod feed;
pub mod models;

pub use feed::{ConsoleFeed, EventFeed, HttpFeed};
pub use models::{ConsoleEvent, EventRecord, HttpEvent, Severity};

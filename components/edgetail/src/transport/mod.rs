pub mod client;
pub mod envelope;

pub use client::{HttpTransport, Transport, TransportError, fetch};

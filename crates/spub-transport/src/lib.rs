//! spub-transport
//!
//! The two network edges of the bridge:
//! - `ingest`: UDP datagram listener feeding raw readings in
//! - `mqtt`: broker connection publishing readings out, with a background
//!   event loop that keeps the connection alive and reconnects with backoff
//!
//! The bridge core only sees the [`IngestSource`] and [`Publisher`] traits,
//! so tests swap both for in-memory versions (see `spub-testkit`).

pub mod backoff;
pub mod ingest;
pub mod mqtt;
pub mod publisher;

pub use backoff::Backoff;
pub use ingest::{IngestError, IngestSource, RawReading, UdpIngest, MAX_DATAGRAM};
pub use mqtt::{ConnectionState, MqttPublisher, MqttSettings};
pub use publisher::{Publisher, TransportError};

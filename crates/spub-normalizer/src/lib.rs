//! spub-normalizer
//!
//! Turns one inbound datagram into a typed [`SensorSnapshot`].
//!
//! This crate does **not**:
//! - receive datagrams (see `spub-transport::ingest`)
//! - decide whether a snapshot is fresh (see `spub-reconcile`)
//! - apply sign flips or rounding for publication (also `spub-reconcile`)
//!
//! Pure functions of the input bytes. No IO, no logging.

pub mod normalizer;
pub mod snapshot;

pub use normalizer::{normalize, ParseFailure};
pub use snapshot::SensorSnapshot;

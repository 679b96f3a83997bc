//! spub-testkit
//!
//! In-memory stand-ins for the bridge's two network edges plus builders for
//! the datagrams the producers send. Used by scenario tests across the
//! workspace; never linked into a production binary.

mod datagrams;
mod recording;
mod scripted;

pub use datagrams::{cloud_datagram, live_datagram, mixed_datagram, LIVE_FIELDS_SAMPLE};
pub use recording::{Published, RecordingPublisher};
pub use scripted::ScriptedIngest;

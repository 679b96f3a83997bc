//! spub-daemon library target.
//!
//! The bridge loop, discovery announcement and the optional status router.
//! The binary `main.rs` wires these to the real UDP socket and MQTT broker;
//! scenario tests wire them to `spub-testkit` doubles.

pub mod announce;
pub mod api_types;
pub mod bridge;
pub mod routes;
pub mod state;

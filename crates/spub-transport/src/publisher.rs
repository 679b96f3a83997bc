//! Outbound publish boundary.

use std::fmt;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors surfaced by a [`Publisher`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The broker answered the connect with a non-zero return code.
    ConnectRefused { code: u8 },
    /// The connection could not be established at all (DNS, TCP, TLS, ...).
    Connect { detail: String },
    /// No CONNACK within the configured connect timeout.
    ConnectTimeout { secs: u64 },
    /// The publish could not be queued (request queue full or client closed).
    Publish { topic: String, detail: String },
}

impl TransportError {
    /// Process exit status for a fatal startup failure.
    ///
    /// A refusal exits with the broker's reason code; any other failure
    /// exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            TransportError::ConnectRefused { code } if *code != 0 => i32::from(*code),
            _ => 1,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectRefused { code } => {
                write!(f, "broker refused connection: reason code {code}")
            }
            TransportError::Connect { detail } => write!(f, "broker connect failed: {detail}"),
            TransportError::ConnectTimeout { secs } => {
                write!(f, "broker did not acknowledge connect within {secs}s")
            }
            TransportError::Publish { topic, detail } => {
                write!(f, "publish to '{topic}' failed: {detail}")
            }
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Publisher trait
// ---------------------------------------------------------------------------

/// Publish/subscribe client contract.
///
/// `publish` is fire-and-forget: implementations queue the message and return
/// without waiting for the broker. Delivery guarantees are the transport's
/// (QoS at the connection level); callers never retry individual messages.
pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &str, payload: &str, retained: bool) -> Result<(), TransportError>;
}

impl<P: Publisher + ?Sized> Publisher for std::sync::Arc<P> {
    fn publish(&self, topic: &str, payload: &str, retained: bool) -> Result<(), TransportError> {
        (**self).publish(topic, payload, retained)
    }
}

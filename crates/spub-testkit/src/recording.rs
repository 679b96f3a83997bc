use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use spub_transport::{Publisher, TransportError};

/// One captured `publish` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub retained: bool,
}

/// Publisher that records every call in order.
///
/// With [`fail_publishes`][RecordingPublisher::fail_publishes] set, calls
/// are still recorded but return [`TransportError::Publish`], the way a full
/// request queue would.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    log: Mutex<Vec<Published>>,
    failing: AtomicBool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_publishes(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }

    /// Snapshot of everything published so far.
    pub fn published(&self) -> Vec<Published> {
        self.lock().clone()
    }

    /// Payloads sent to `topic`, oldest first.
    pub fn payloads_for(&self, topic: &str) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|p| p.topic == topic)
            .map(|p| p.payload.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Published>> {
        // A panicking test thread poisons the lock; the data is still usable.
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, topic: &str, payload: &str, retained: bool) -> Result<(), TransportError> {
        self.lock().push(Published {
            topic: topic.to_string(),
            payload: payload.to_string(),
            retained,
        });
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Publish {
                topic: topic.to_string(),
                detail: "recording publisher set to fail".to_string(),
            });
        }
        Ok(())
    }
}

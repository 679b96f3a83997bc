//! Discovery announcement.
//!
//! Every discovery document goes out retained, once per process, before the
//! bridge reads its first datagram. The document set is built once and
//! reused, so repeated announcements are byte-identical.

use spub_schemas::DiscoveryDocument;
use spub_transport::{Publisher, TransportError};
use tracing::{debug, info};

/// Publish every record in `doc` with `retained = true`.
///
/// Stops at the first failure; a partial announcement is reported as the
/// error so startup can abort. Returns the number of documents published.
pub fn announce_all<P>(publisher: &P, doc: &DiscoveryDocument) -> Result<usize, TransportError>
where
    P: Publisher + ?Sized,
{
    for record in doc.records() {
        publisher.publish(&record.topic, &record.payload, true)?;
        debug!(topic = %record.topic, metric = %record.metric, "discovery published");
    }
    info!(documents = doc.len(), "discovery announced");
    Ok(doc.len())
}

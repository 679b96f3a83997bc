use std::collections::VecDeque;
use std::net::SocketAddr;

use spub_transport::{IngestError, IngestSource, RawReading};

/// Finite ingest source that replays a fixed list of datagrams, then ends.
#[derive(Debug, Default)]
pub struct ScriptedIngest {
    queue: VecDeque<RawReading>,
    delivered: usize,
}

impl ScriptedIngest {
    pub fn new<I, B>(datagrams: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        let source: Option<SocketAddr> = Some(SocketAddr::from(([127, 0, 0, 1], 52005)));
        Self {
            queue: datagrams
                .into_iter()
                .map(|d| RawReading::new(d, source))
                .collect(),
            delivered: 0,
        }
    }

    /// Datagrams handed out so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

#[async_trait::async_trait]
impl IngestSource for ScriptedIngest {
    async fn recv(&mut self) -> Result<Option<RawReading>, IngestError> {
        let next = self.queue.pop_front();
        if next.is_some() {
            self.delivered += 1;
        }
        Ok(next)
    }
}

//! In-process transport for deterministic tests.
//!
//! Each `open` creates a [`MemoryPeer`] that plays the remote side: tests
//! push events through it and read the frames the session wrote.

use std::sync::Arc;

use canvaslink_core::errors::ChannelError;
use canvaslink_core::events::ChannelEvent;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::ChannelConfig;
use crate::transport::{ChannelLink, Transport};

/// Remote side of one in-memory channel.
pub struct MemoryPeer {
    endpoint: String,
    events: mpsc::Sender<ChannelEvent>,
    outbound: Mutex<mpsc::Receiver<String>>,
    shutdown: CancellationToken,
}

impl MemoryPeer {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Deliver an event to the session. Returns false once the session side
    /// has gone away.
    pub async fn emit(&self, event: ChannelEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    pub async fn open(&self) -> bool {
        self.emit(ChannelEvent::Open).await
    }

    pub async fn message(&self, text: impl Into<String>) -> bool {
        self.emit(ChannelEvent::Message(text.into())).await
    }

    pub async fn fail(&self, error: ChannelError) -> bool {
        self.emit(ChannelEvent::Error(error)).await
    }

    pub async fn close(&self) -> bool {
        self.emit(ChannelEvent::Close).await
    }

    /// Next frame written by the session, if one is queued.
    pub fn try_recv(&self) -> Option<String> {
        self.outbound.lock().try_recv().ok()
    }

    /// Whether the session released this channel.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// Transport that records every channel it opens.
#[derive(Default)]
pub struct MemoryTransport {
    peers: Mutex<Vec<Arc<MemoryPeer>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> usize {
        self.peers.lock().len()
    }

    pub fn peer(&self, index: usize) -> Option<Arc<MemoryPeer>> {
        self.peers.lock().get(index).cloned()
    }

    pub fn last_peer(&self) -> Option<Arc<MemoryPeer>> {
        self.peers.lock().last().cloned()
    }
}

impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(&self, endpoint: &str, config: &ChannelConfig) -> ChannelLink {
        let (out_tx, out_rx) = mpsc::channel(config.outbound_capacity());
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity());
        let shutdown = CancellationToken::new();

        self.peers.lock().push(Arc::new(MemoryPeer {
            endpoint: endpoint.to_owned(),
            events: event_tx,
            outbound: Mutex::new(out_rx),
            shutdown: shutdown.clone(),
        }));

        ChannelLink {
            outbound: out_tx,
            events: event_rx,
            shutdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_records_peer() {
        let transport = MemoryTransport::new();
        assert_eq!(transport.opened(), 0);

        let mut link = transport.open("mem://a", &ChannelConfig::default());
        assert_eq!(transport.opened(), 1);

        let peer = transport.last_peer().unwrap();
        assert_eq!(peer.endpoint(), "mem://a");

        assert!(peer.open().await);
        assert_eq!(link.events.recv().await, Some(ChannelEvent::Open));

        link.outbound.send("hello".into()).await.unwrap();
        assert_eq!(peer.try_recv().as_deref(), Some("hello"));
        assert!(peer.try_recv().is_none());
    }

    #[tokio::test]
    async fn emit_fails_after_link_dropped() {
        let transport = MemoryTransport::new();
        let link = transport.open("mem://a", &ChannelConfig::default());
        let peer = transport.peer(0).unwrap();

        link.shutdown.cancel();
        assert!(peer.is_shut_down());

        drop(link);
        assert!(!peer.close().await);
    }
}

use canvaslink_core::events::ChannelEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::ChannelConfig;

/// The owner's end of one duplex channel.
///
/// Frames pushed into `outbound` are written to the remote side in order.
/// The transport reports lifecycle and inbound frames on `events`.
/// Cancelling `shutdown` closes the channel; after that the transport stops
/// emitting events.
pub struct ChannelLink {
    pub outbound: mpsc::Sender<String>,
    pub events: mpsc::Receiver<ChannelEvent>,
    pub shutdown: CancellationToken,
}

/// Opens duplex message channels.
///
/// `open` returns immediately; the handshake runs in the background and
/// finishes with either `ChannelEvent::Open` or `ChannelEvent::Error`
/// followed by `ChannelEvent::Close`. Must be called from within a Tokio
/// runtime.
pub trait Transport: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn open(&self, endpoint: &str, config: &ChannelConfig) -> ChannelLink;
}

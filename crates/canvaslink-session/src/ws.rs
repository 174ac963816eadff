//! WebSocket transport over `tokio-tungstenite`.

use canvaslink_core::errors::ChannelError;
use canvaslink_core::events::ChannelEvent;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;

use crate::config::ChannelConfig;
use crate::transport::{ChannelLink, Transport};

/// Opens one WebSocket connection per `open` call.
#[derive(Clone, Debug, Default)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for WsTransport {
    fn name(&self) -> &str {
        "websocket"
    }

    fn open(&self, endpoint: &str, config: &ChannelConfig) -> ChannelLink {
        let (out_tx, out_rx) = mpsc::channel(config.outbound_capacity());
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity());
        let shutdown = CancellationToken::new();

        tokio::spawn(drive(
            endpoint.to_owned(),
            config.clone(),
            out_rx,
            event_tx,
            shutdown.clone(),
        ));

        ChannelLink {
            outbound: out_tx,
            events: event_rx,
            shutdown,
        }
    }
}

/// Connect, then pump frames both ways until either side closes.
async fn drive(
    endpoint: String,
    config: ChannelConfig,
    mut outbound: mpsc::Receiver<String>,
    events: mpsc::Sender<ChannelEvent>,
    shutdown: CancellationToken,
) {
    let connect = tokio::time::timeout(config.connect_timeout, connect_async(endpoint.as_str()));
    let connected = tokio::select! {
        _ = shutdown.cancelled() => return,
        result = connect => result,
    };

    let ws = match connected {
        Ok(Ok((ws, _response))) => ws,
        Ok(Err(e)) => {
            fail(&events, ChannelError::Connect(e.to_string())).await;
            return;
        }
        Err(_) => {
            fail(&events, ChannelError::Timeout(config.connect_timeout)).await;
            return;
        }
    };

    tracing::debug!(endpoint = %endpoint, "websocket handshake complete");
    if events.send(ChannelEvent::Open).await.is_err() {
        return;
    }

    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = sink.close().await;
                break;
            }
            frame = outbound.recv() => {
                match frame {
                    Some(text) => {
                        if let Err(e) = sink.send(Message::text(text)).await {
                            fail(&events, classify(e)).await;
                            break;
                        }
                    }
                    None => {
                        let _ = sink.close().await;
                        break;
                    }
                }
            }
            inbound = stream.next() => {
                let event = match inbound {
                    Some(Ok(Message::Text(text))) => ChannelEvent::Message(text.as_str().to_owned()),
                    Some(Ok(Message::Binary(bytes))) => {
                        ChannelEvent::Message(String::from_utf8_lossy(&bytes).into_owned())
                    }
                    Some(Ok(Message::Close(_))) => {
                        let _ = events.send(ChannelEvent::Close).await;
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        fail(&events, classify(e)).await;
                        break;
                    }
                    None => {
                        fail(&events, ChannelError::Closed).await;
                        break;
                    }
                };
                if events.send(event).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(endpoint = %endpoint, "websocket driver exited");
}

/// Map a socket failure on an open channel. A peer that drops the
/// connection without the closing handshake counts as `Closed`.
fn classify(error: WsError) -> ChannelError {
    match error {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => ChannelError::Closed,
        other => ChannelError::Protocol(other.to_string()),
    }
}

async fn fail(events: &mpsc::Sender<ChannelEvent>, error: ChannelError) {
    if events.send(ChannelEvent::Error(error)).await.is_ok() {
        let _ = events.send(ChannelEvent::Close).await;
    }
}

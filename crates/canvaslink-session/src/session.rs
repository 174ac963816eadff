//! Connection session: owns at most one live channel and relays its events
//! to the owner's callbacks.

use std::fmt;
use std::sync::Arc;

use canvaslink_core::errors::ChannelError;
use canvaslink_core::events::{ChannelEvent, SessionState};
use canvaslink_core::ids::SessionId;
use parking_lot::{Mutex, ReentrantMutex};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::transport::Transport;

pub type MessageHandler = Arc<dyn Fn(Value) + Send + Sync>;
pub type LifecycleHandler = Arc<dyn Fn() + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(&ChannelError) + Send + Sync>;

/// Optional handlers for channel events. Absent handlers are skipped.
#[derive(Clone, Default)]
pub struct SessionCallbacks {
    on_message: Option<MessageHandler>,
    on_open: Option<LifecycleHandler>,
    on_close: Option<LifecycleHandler>,
    on_error: Option<ErrorHandler>,
}

impl SessionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with each inbound frame. Frames that are not JSON arrive as
    /// `Value::String` holding the raw text.
    pub fn on_message(mut self, f: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(f));
        self
    }

    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(f));
        self
    }

    pub fn on_close(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&ChannelError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCallbacks")
            .field("on_message", &self.on_message.is_some())
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Why a frame was not sent.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("session is not connected")]
    NotConnected,
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("outbound queue full")]
    QueueFull,
    #[error("channel closed")]
    ChannelClosed,
}

/// Live channel owned by a session.
struct ChannelHandle {
    outbound: mpsc::Sender<String>,
    shutdown: CancellationToken,
    dispatcher: JoinHandle<()>,
}

impl ChannelHandle {
    fn release(self) {
        self.shutdown.cancel();
        self.dispatcher.abort();
    }

    /// Release from inside the dispatcher itself, which exits on its own.
    fn release_from_dispatcher(self) {
        self.shutdown.cancel();
    }
}

struct Inner {
    endpoint: String,
    state: SessionState,
    generation: u64,
    /// Set once the live channel reported an error; only its close is
    /// delivered after that.
    failed: bool,
    channel: Option<ChannelHandle>,
    callbacks: SessionCallbacks,
}

impl Inner {
    /// Drop the live channel, if any. Events from it are stale afterwards.
    fn teardown(&mut self) {
        self.generation += 1;
        self.failed = false;
        if let Some(channel) = self.channel.take() {
            channel.release();
        }
        self.state = SessionState::Disconnected;
    }
}

/// State shared between the session and its dispatcher task.
///
/// `gate` is held for the whole of a callback invocation and for every
/// teardown, so a teardown never interleaves with a delivery. It is
/// re-entrant so a callback may call back into the session.
struct Shared {
    id: SessionId,
    gate: ReentrantMutex<()>,
    inner: Mutex<Inner>,
}

impl Shared {
    /// Apply one channel event and invoke its callback. Returns false when
    /// the dispatcher should stop.
    fn deliver(&self, generation: u64, event: ChannelEvent) -> bool {
        let _gate = self.gate.lock();

        let (callbacks, endpoint) = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                tracing::trace!(
                    session_id = %self.id,
                    generation,
                    event = event.kind(),
                    "dropping stale channel event"
                );
                return false;
            }
            if inner.failed && !matches!(event, ChannelEvent::Close) {
                tracing::trace!(
                    session_id = %self.id,
                    event = event.kind(),
                    "dropping event from failed channel"
                );
                return true;
            }

            match &event {
                ChannelEvent::Open => inner.state = SessionState::Connected,
                ChannelEvent::Message(_) => {}
                ChannelEvent::Error(_) => {
                    inner.failed = true;
                    inner.state = SessionState::Disconnected;
                    if let Some(channel) = inner.channel.take() {
                        channel.release_from_dispatcher();
                    }
                }
                ChannelEvent::Close => {
                    inner.generation += 1;
                    inner.failed = false;
                    inner.state = SessionState::Disconnected;
                    if let Some(channel) = inner.channel.take() {
                        channel.release_from_dispatcher();
                    }
                }
            }
            (inner.callbacks.clone(), inner.endpoint.clone())
        };

        match event {
            ChannelEvent::Open => {
                tracing::info!(session_id = %self.id, endpoint = %endpoint, "session connected");
                if let Some(f) = &callbacks.on_open {
                    f();
                }
                true
            }
            ChannelEvent::Message(raw) => {
                tracing::trace!(session_id = %self.id, len = raw.len(), "inbound message");
                if let Some(f) = &callbacks.on_message {
                    f(parse_inbound(&raw));
                }
                true
            }
            ChannelEvent::Error(error) => {
                tracing::warn!(
                    session_id = %self.id,
                    endpoint = %endpoint,
                    kind = error.error_kind(),
                    error = %error,
                    "channel error"
                );
                if let Some(f) = &callbacks.on_error {
                    f(&error);
                }
                true
            }
            ChannelEvent::Close => {
                tracing::info!(session_id = %self.id, endpoint = %endpoint, "session closed");
                if let Some(f) = &callbacks.on_close {
                    f();
                }
                false
            }
        }
    }
}

async fn dispatch(shared: Arc<Shared>, generation: u64, mut events: mpsc::Receiver<ChannelEvent>) {
    while let Some(event) = events.recv().await {
        if !shared.deliver(generation, event) {
            break;
        }
    }
}

fn parse_inbound(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// One owner's connection to a remote endpoint.
///
/// Starting, updating and sending take `&self`; callbacks run on the
/// dispatcher task and may call back into the session. Dropping the session
/// stops it.
pub struct Session {
    shared: Arc<Shared>,
    transport: Arc<dyn Transport>,
    config: SessionConfig,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>, config: SessionConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: SessionId::new(),
                gate: ReentrantMutex::new(()),
                inner: Mutex::new(Inner {
                    endpoint: String::new(),
                    state: SessionState::Disconnected,
                    generation: 0,
                    failed: false,
                    channel: None,
                    callbacks: SessionCallbacks::default(),
                }),
            }),
            transport,
            config,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.shared.id
    }

    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    pub fn endpoint(&self) -> String {
        self.shared.inner.lock().endpoint.clone()
    }

    /// Open a channel to `endpoint`, replacing any live one.
    ///
    /// An empty endpoint leaves the session disconnected and opens nothing.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, endpoint: impl Into<String>, callbacks: SessionCallbacks) {
        let endpoint = endpoint.into();
        let _gate = self.shared.gate.lock();
        let mut inner = self.shared.inner.lock();

        inner.teardown();
        inner.callbacks = callbacks;
        inner.endpoint = endpoint.clone();

        if endpoint.is_empty() {
            tracing::debug!(session_id = %self.shared.id, "empty endpoint, staying disconnected");
            return;
        }

        let link = self.transport.open(&endpoint, &self.config.channel);
        inner.state = SessionState::Connecting;
        let generation = inner.generation;
        let dispatcher = tokio::spawn(dispatch(Arc::clone(&self.shared), generation, link.events));
        inner.channel = Some(ChannelHandle {
            outbound: link.outbound,
            shutdown: link.shutdown,
            dispatcher,
        });

        tracing::info!(
            session_id = %self.shared.id,
            endpoint = %endpoint,
            transport = self.transport.name(),
            generation,
            "session connecting"
        );
    }

    /// Re-apply owner inputs. Callbacks are always replaced; the channel is
    /// only re-opened when `endpoint` differs from the current one.
    pub fn update(&self, endpoint: impl Into<String>, callbacks: SessionCallbacks) {
        let endpoint = endpoint.into();
        let _gate = self.shared.gate.lock();
        let unchanged = self.shared.inner.lock().endpoint == endpoint;
        if unchanged {
            self.set_callbacks(callbacks);
        } else {
            self.start(endpoint, callbacks);
        }
    }

    /// Swap handlers without touching the channel.
    pub fn set_callbacks(&self, callbacks: SessionCallbacks) {
        self.shared.inner.lock().callbacks = callbacks;
    }

    /// Close and release the live channel. No callback fires for that
    /// channel once this returns.
    pub fn stop(&self) {
        let _gate = self.shared.gate.lock();
        let mut inner = self.shared.inner.lock();
        let had_channel = inner.channel.is_some();
        inner.teardown();
        if had_channel {
            tracing::info!(
                session_id = %self.shared.id,
                endpoint = %inner.endpoint,
                "session stopped"
            );
        }
    }

    /// Serialize `payload` as JSON and queue it, only while connected.
    pub fn try_send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<(), SendError> {
        let outbound = {
            let inner = self.shared.inner.lock();
            if inner.state != SessionState::Connected {
                return Err(SendError::NotConnected);
            }
            inner
                .channel
                .as_ref()
                .map(|c| c.outbound.clone())
                .ok_or(SendError::NotConnected)?
        };

        let text = serde_json::to_string(payload)?;
        outbound.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Best-effort send. Returns false instead of failing when the frame
    /// could not be queued.
    pub fn send<T: Serialize + ?Sized>(&self, payload: &T) -> bool {
        match self.try_send(payload) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(session_id = %self.shared.id, error = %e, "send dropped");
                false
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

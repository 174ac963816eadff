use std::time::Duration;

/// Channel-level failures. Reported to the session owner through the
/// error callback; never fatal to the process.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("channel closed unexpectedly")]
    Closed,
}

impl ChannelError {
    /// Whether the failure happened before the channel ever opened.
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout(_))
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect",
            Self::Timeout(_) => "timeout",
            Self::Protocol(_) => "protocol",
            Self::Closed => "closed",
        }
    }
}

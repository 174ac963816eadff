use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ChannelError;

/// Events a duplex channel delivers to its owner, in delivery order.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    Open,
    Message(String),
    Error(ChannelError),
    Close,
}

impl ChannelEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Message(_) => "message",
            Self::Error(_) => "error",
            Self::Close => "close",
        }
    }
}

/// Observed lifecycle of a session's channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(s)
    }
}

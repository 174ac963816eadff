pub mod config;
pub mod memory;
pub mod session;
pub mod transport;
pub mod ws;

pub use config::{ChannelConfig, SessionConfig};
pub use memory::{MemoryPeer, MemoryTransport};
pub use session::{SendError, Session, SessionCallbacks};
pub use transport::{ChannelLink, Transport};
pub use ws::WsTransport;

pub mod errors;
pub mod events;
pub mod ids;

pub use errors::ChannelError;
pub use events::{ChannelEvent, SessionState};
pub use ids::{EdgeId, NodeId, SessionId};

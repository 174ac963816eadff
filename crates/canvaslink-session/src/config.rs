use std::time::Duration;

/// Per-channel queue sizes and timeouts.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// Capacity of the outbound frame queue. `send` drops when it is full.
    /// Zero is treated as one.
    pub outbound_queue: usize,
    /// Capacity of the inbound event queue between transport and dispatcher.
    /// Zero is treated as one.
    pub event_queue: usize,
    /// How long the transport waits for the handshake before reporting an error.
    pub connect_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            outbound_queue: 256,
            event_queue: 256,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ChannelConfig {
    pub fn outbound_capacity(&self) -> usize {
        self.outbound_queue.max(1)
    }

    pub fn event_capacity(&self) -> usize {
        self.event_queue.max(1)
    }
}

/// Session configuration.
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    pub channel: ChannelConfig,
}

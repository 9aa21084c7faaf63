use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur when addressing a channel through the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The handle refers to a channel that has since been removed
    #[error("Channel handle {index}:{generation} is stale. The channel was removed, most likely after a remote failure")]
    StaleHandle { index: u32, generation: u32 },

    /// The address failed recently and may not be reconnected yet
    #[error("Address {address} failed recently and is refused until the quiet period has passed")]
    RecentlyDead { address: SocketAddr },

    /// No channel exists for the address
    #[error("No channel to {address}")]
    NoChannel { address: SocketAddr },

    /// An ack arrived with no critical message outstanding
    #[error("Received ack from {address} with no outstanding critical message")]
    UnexpectedAck { address: SocketAddr },
}

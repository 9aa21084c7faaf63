use std::net::SocketAddr;

use thiserror::Error;

/// Errors reported by a [`super::Transport`] implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The remote address could not be connected to
    #[error("Cannot open connection to {address}. The remote cell may be down")]
    ConnectFailed { address: SocketAddr },

    /// The remote side is known to be gone
    #[error("Connection to {address} has failed")]
    RemoteFailed { address: SocketAddr },

    /// Attempted to send without opening the destination first
    #[error("Connection to {address} was never opened")]
    NotOpen { address: SocketAddr },
}

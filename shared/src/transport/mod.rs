use std::net::SocketAddr;

pub mod error;

use error::TransportError;

/// Reliable, ordered, per-destination delivery between cells.
///
/// Failures detected by the transport itself (for instance an ack timeout)
/// are reported to the owning cell exactly once per address, outside of this
/// trait.
pub trait Transport {
    fn open(&mut self, address: &SocketAddr) -> Result<(), TransportError>;
    fn send(&mut self, address: &SocketAddr, payload: &[u8]) -> Result<(), TransportError>;
}

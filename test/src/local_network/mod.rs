//! In-memory network for cluster testing
//! Routes bundles between cells without network I/O

use std::collections::{HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use cellrep_shared::{Transport, TransportError};

/// One bundle in flight
#[derive(Clone, Debug)]
pub struct Packet {
    pub from: SocketAddr,
    pub to: SocketAddr,
    pub payload: Vec<u8>,
}

#[derive(Default)]
struct NetworkState {
    in_flight: VecDeque<Packet>,
    down: HashSet<SocketAddr>,
    sent: usize,
}

/// Shared medium all cells of a test cluster send through
#[derive(Clone, Default)]
pub struct LocalNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport sending from `address` onto this network
    pub fn transport(&self, address: SocketAddr) -> LocalTransport {
        LocalTransport {
            address,
            state: self.state.clone(),
        }
    }

    /// Makes `address` unreachable; bundles already in flight to it are lost
    pub fn take_down(&self, address: &SocketAddr) {
        let mut state = self.state.lock().unwrap();
        state.down.insert(*address);
        state.in_flight.retain(|packet| packet.to != *address);
    }

    pub fn bring_up(&self, address: &SocketAddr) {
        self.state.lock().unwrap().down.remove(address);
    }

    pub fn is_down(&self, address: &SocketAddr) -> bool {
        self.state.lock().unwrap().down.contains(address)
    }

    /// Removes and returns every bundle in flight, oldest first
    pub fn drain(&self) -> Vec<Packet> {
        self.state.lock().unwrap().in_flight.drain(..).collect()
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().unwrap().in_flight.len()
    }

    /// Bundles sent since the network was created
    pub fn sent(&self) -> usize {
        self.state.lock().unwrap().sent
    }
}

/// The sending side of one cell
pub struct LocalTransport {
    address: SocketAddr,
    state: Arc<Mutex<NetworkState>>,
}

impl Transport for LocalTransport {
    fn open(&mut self, address: &SocketAddr) -> Result<(), TransportError> {
        if self.state.lock().unwrap().down.contains(address) {
            return Err(TransportError::ConnectFailed { address: *address });
        }
        Ok(())
    }

    fn send(&mut self, address: &SocketAddr, payload: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.down.contains(address) {
            return Err(TransportError::RemoteFailed { address: *address });
        }
        state.sent += 1;
        state.in_flight.push_back(Packet {
            from: self.address,
            to: *address,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

use std::net::SocketAddr;

use crate::{messages::cell_message::CellMessage, types::GameTime};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    /// Created, the transport has not been asked to connect yet
    Pending,
    Open,
    /// The remote side is gone; nothing is sent any more
    Failed,
}

/// Reliable outbound connection to one remote cell. Messages are batched
/// between flushes and sent as one bundle.
pub struct Channel {
    address: SocketAddr,
    state: ChannelState,
    outgoing: Vec<CellMessage>,
    unacked_criticals: u16,
    ref_count: u32,
    last_used: GameTime,
    bundles_sent: u64,
}

impl Channel {
    pub fn new(address: SocketAddr, now: GameTime) -> Self {
        Self {
            address,
            state: ChannelState::Pending,
            outgoing: Vec::new(),
            unacked_criticals: 0,
            ref_count: 0,
            last_used: now,
            bundles_sent: 0,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_failed(&self) -> bool {
        self.state == ChannelState::Failed
    }

    /// Queues a message for the next flush. Messages sent to a failed channel
    /// are dropped.
    pub fn send(&mut self, message: CellMessage, now: GameTime) {
        if self.is_failed() {
            return;
        }
        self.last_used = now;
        self.outgoing.push(message);
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    pub fn outgoing(&self) -> &[CellMessage] {
        &self.outgoing
    }

    pub(crate) fn take_outgoing(&mut self) -> Vec<CellMessage> {
        std::mem::take(&mut self.outgoing)
    }

    pub(crate) fn mark_open(&mut self) {
        if self.state == ChannelState::Pending {
            self.state = ChannelState::Open;
        }
    }

    pub(crate) fn mark_failed(&mut self) {
        self.state = ChannelState::Failed;
        self.outgoing.clear();
    }

    pub(crate) fn record_bundle_sent(&mut self) {
        self.bundles_sent += 1;
    }

    pub fn bundles_sent(&self) -> u64 {
        self.bundles_sent
    }

    pub fn unacked_criticals(&self) -> u16 {
        self.unacked_criticals
    }

    pub(crate) fn add_critical(&mut self) {
        self.unacked_criticals = self.unacked_criticals.saturating_add(1);
    }

    pub(crate) fn ack_critical(&mut self) -> bool {
        if self.unacked_criticals == 0 {
            return false;
        }
        self.unacked_criticals -= 1;
        true
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub(crate) fn retain(&mut self) {
        self.ref_count += 1;
    }

    pub(crate) fn release(&mut self, now: GameTime) {
        self.ref_count = self.ref_count.saturating_sub(1);
        self.last_used = now;
    }

    /// True once nothing references the channel and it has been quiet for
    /// `keep_alive` ticks
    pub fn is_idle(&self, now: GameTime, keep_alive: GameTime) -> bool {
        self.ref_count == 0
            && self.outgoing.is_empty()
            && self.unacked_criticals == 0
            && now.saturating_sub(self.last_used) >= keep_alive
    }
}

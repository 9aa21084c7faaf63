use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
};

use log::{debug, info, warn};

use crate::{
    messages::{cell_message::CellMessage, message_bundle::MessageBundle},
    transport::Transport,
    types::GameTime,
};

use super::{channel::Channel, channel_config::ChannelConfig, error::ChannelError};

/// Stable reference to a channel owned by the [`ChannelRegistry`]. A handle
/// outlives its channel safely: once the channel is removed every lookup
/// through the handle fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    index: u32,
    generation: u32,
}

struct ChannelSlot {
    generation: u32,
    channel: Option<Channel>,
}

/// Owns one channel per remote cell address
pub struct ChannelRegistry {
    config: ChannelConfig,
    slots: Vec<ChannelSlot>,
    free_slots: Vec<u32>,
    by_address: HashMap<SocketAddr, ChannelHandle>,
    recently_dead: HashSet<SocketAddr>,
    last_failure: Option<GameTime>,
}

impl ChannelRegistry {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            free_slots: Vec::new(),
            by_address: HashMap::new(),
            recently_dead: HashSet::new(),
            last_failure: None,
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Returns the channel to `address`, creating it if asked to. Addresses
    /// that failed recently are never recreated.
    pub fn get(
        &mut self,
        address: &SocketAddr,
        create_if_absent: bool,
        now: GameTime,
    ) -> Option<ChannelHandle> {
        if let Some(handle) = self.by_address.get(address) {
            return Some(*handle);
        }
        if !create_if_absent {
            return None;
        }
        if self.recently_dead.contains(address) {
            debug!(
                "ChannelRegistry::get: refusing to recreate channel to recently dead {}",
                address
            );
            return None;
        }

        let channel = Channel::new(*address, now);
        let handle = match self.free_slots.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                slot.channel = Some(channel);
                ChannelHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(ChannelSlot {
                    generation: 0,
                    channel: Some(channel),
                });
                ChannelHandle {
                    index,
                    generation: 0,
                }
            }
        };
        self.by_address.insert(*address, handle);
        Some(handle)
    }

    /// Like [`ChannelRegistry::get`] with creation, but says why it failed
    pub fn try_get_or_create(
        &mut self,
        address: &SocketAddr,
        now: GameTime,
    ) -> Result<ChannelHandle, ChannelError> {
        self.get(address, true, now)
            .ok_or(ChannelError::RecentlyDead { address: *address })
    }

    pub fn find(&self, address: &SocketAddr) -> Option<ChannelHandle> {
        self.by_address.get(address).copied()
    }

    pub fn channel(&self, handle: &ChannelHandle) -> Option<&Channel> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.channel.as_ref()
    }

    pub fn channel_mut(&mut self, handle: &ChannelHandle) -> Option<&mut Channel> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.channel.as_mut()
    }

    fn try_channel_mut(&mut self, handle: &ChannelHandle) -> Result<&mut Channel, ChannelError> {
        let stale = ChannelError::StaleHandle {
            index: handle.index,
            generation: handle.generation,
        };
        self.channel_mut(handle).ok_or(stale)
    }

    pub fn contains(&self, handle: &ChannelHandle) -> bool {
        self.channel(handle).is_some()
    }

    pub fn send(
        &mut self,
        handle: &ChannelHandle,
        message: CellMessage,
        now: GameTime,
    ) -> Result<(), ChannelError> {
        self.try_channel_mut(handle)?.send(message, now);
        Ok(())
    }

    /// A channel can take an offload while it is not failed and its critical
    /// backlog is below the configured limit
    pub fn is_healthy(&self, handle: &ChannelHandle) -> bool {
        match self.channel(handle) {
            Some(channel) => {
                !channel.is_failed()
                    && channel.unacked_criticals() < self.config.max_unacked_criticals
            }
            None => false,
        }
    }

    pub fn is_recently_dead(&self, address: &SocketAddr) -> bool {
        self.recently_dead.contains(address)
    }

    // Haunt references

    pub fn retain(&mut self, handle: &ChannelHandle) -> Result<(), ChannelError> {
        self.try_channel_mut(handle)?.retain();
        Ok(())
    }

    /// Drops a reference. Releasing a handle whose channel is already gone is
    /// not an error: failure cleanup may have removed it first.
    pub fn release(&mut self, handle: &ChannelHandle, now: GameTime) {
        if let Some(channel) = self.channel_mut(handle) {
            channel.release(now);
        }
    }

    // Critical messages

    pub fn add_critical(&mut self, handle: &ChannelHandle) -> Result<(), ChannelError> {
        self.try_channel_mut(handle)?.add_critical();
        Ok(())
    }

    pub fn ack_critical(&mut self, address: &SocketAddr) -> Result<(), ChannelError> {
        let handle = self
            .find(address)
            .ok_or(ChannelError::NoChannel { address: *address })?;
        let channel = self.try_channel_mut(&handle)?;
        if channel.ack_critical() {
            Ok(())
        } else {
            Err(ChannelError::UnexpectedAck { address: *address })
        }
    }

    // Failure

    /// The remote side of `address` is permanently gone. Its channel is
    /// removed and the address refused until the quiet period has passed.
    /// Returns whether a channel existed.
    pub fn remote_failure(&mut self, address: &SocketAddr, now: GameTime) -> bool {
        info!("ChannelRegistry::remote_failure: {}", address);

        self.recently_dead.insert(*address);
        self.last_failure = Some(now);

        let Some(handle) = self.by_address.remove(address) else {
            return false;
        };
        let slot = &mut self.slots[handle.index as usize];
        if let Some(channel) = slot.channel.as_mut() {
            channel.mark_failed();
        }
        slot.channel = None;
        self.free_slots.push(handle.index);
        true
    }

    // Tick

    /// Clears the recently-dead set once quiet, and drops idle channels.
    /// Returns the addresses of the dropped channels.
    pub fn update(&mut self, now: GameTime) -> Vec<SocketAddr> {
        if let Some(last_failure) = self.last_failure {
            if now.saturating_sub(last_failure) >= self.config.recently_dead_quiet_period {
                if !self.recently_dead.is_empty() {
                    info!(
                        "ChannelRegistry: clearing {} recently dead addresses",
                        self.recently_dead.len()
                    );
                }
                self.recently_dead.clear();
                self.last_failure = None;
            }
        }

        let keep_alive = self.config.keep_alive;
        let idle: Vec<SocketAddr> = self
            .by_address
            .iter()
            .filter(|(_, handle)| {
                self.channel(handle)
                    .map(|channel| channel.is_idle(now, keep_alive))
                    .unwrap_or(false)
            })
            .map(|(address, _)| *address)
            .collect();

        for address in &idle {
            if let Some(handle) = self.by_address.remove(address) {
                debug!("ChannelRegistry: dropping idle channel to {}", address);
                let slot = &mut self.slots[handle.index as usize];
                slot.channel = None;
                self.free_slots.push(handle.index);
            }
        }
        idle
    }

    /// Flushes every live channel with queued messages through `transport`.
    /// Returns the addresses the transport refused; they must be reported
    /// through the owner's remote failure path.
    pub fn send_all(&mut self, transport: &mut dyn Transport) -> Vec<SocketAddr> {
        let mut failed = Vec::new();

        for slot in self.slots.iter_mut() {
            let Some(channel) = slot.channel.as_mut() else {
                continue;
            };
            if channel.is_failed() || !channel.has_outgoing() {
                continue;
            }
            let address = channel.address();

            if channel.state() == super::channel::ChannelState::Pending {
                if let Err(error) = transport.open(&address) {
                    warn!("ChannelRegistry::send_all: {}", error);
                    failed.push(address);
                    continue;
                }
                channel.mark_open();
            }

            let messages = channel.take_outgoing();
            let payload = MessageBundle::write(&messages);
            match transport.send(&address, &payload) {
                Ok(()) => channel.record_bundle_sent(),
                Err(error) => {
                    warn!("ChannelRegistry::send_all: {}", error);
                    failed.push(address);
                }
            }
        }

        failed
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &SocketAddr> {
        self.by_address.keys()
    }
}

use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
};

use log::debug;

use cellrep_shared::{CellMessage, EntityId};

/// Ghost messages held back because they arrived ahead of the handover they
/// belong to.
///
/// A new owner announces itself with `GhostSetReal` on its own channel, which
/// has no ordering with the old owner's channel. Until the old owner signs
/// off with `GhostSetNextReal`, everything the new owner sends for that
/// entity is kept here in arrival order, one subsequence per
/// `(entity, sender)`.
#[derive(Default)]
pub struct BufferedGhostMessages {
    subsequences: HashMap<(EntityId, SocketAddr), VecDeque<CellMessage>>,
}

impl BufferedGhostMessages {
    pub fn new() -> Self {
        Self {
            subsequences: HashMap::new(),
        }
    }

    /// Whether messages from `sender` about `entity` must queue behind
    /// earlier ones already held back
    pub fn is_delaying(&self, entity: &EntityId, sender: &SocketAddr) -> bool {
        self.subsequences.contains_key(&(*entity, *sender))
    }

    pub fn delay(&mut self, sender: SocketAddr, message: CellMessage) {
        self.subsequences
            .entry((message.entity(), sender))
            .or_default()
            .push_back(message);
    }

    /// Removes and returns what `sender` sent about `entity`, oldest first
    pub fn take_subsequence(&mut self, entity: &EntityId, sender: &SocketAddr) -> Vec<CellMessage> {
        self.subsequences
            .remove(&(*entity, *sender))
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Drops everything held for `entity`. Returns the number of messages
    /// dropped.
    pub fn drop_entity(&mut self, entity: &EntityId) -> usize {
        let mut dropped = 0;
        self.subsequences.retain(|(buffered, sender), messages| {
            if buffered != entity {
                return true;
            }
            debug!(
                "BufferedGhostMessages: dropping {} messages from {} for {}",
                messages.len(),
                sender,
                entity
            );
            dropped += messages.len();
            false
        });
        dropped
    }

    /// Drops everything sent by `sender`. Returns the number of messages
    /// dropped.
    pub fn drop_sender(&mut self, sender: &SocketAddr) -> usize {
        let mut dropped = 0;
        self.subsequences.retain(|(_, buffered), messages| {
            if buffered != sender {
                return true;
            }
            dropped += messages.len();
            false
        });
        dropped
    }

    /// Number of messages held
    pub fn len(&self) -> usize {
        self.subsequences.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.subsequences.is_empty()
    }
}

use std::{collections::HashSet, net::SocketAddr};

use cellrep_shared::{EntityId, EventHistory, GameTime, Position};

use super::haunt::Haunt;

/// The authoritative copy of an entity. Exactly one cell holds it at a time.
pub struct RealEntity {
    id: EntityId,
    position: Position,
    appeal_radius: f32,
    state: Vec<u8>,
    history: EventHistory,
    haunts: Vec<Haunt>,
    created: GameTime,
    position_dirty: bool,
    state_dirty: bool,
}

impl RealEntity {
    pub fn new(
        id: EntityId,
        position: Position,
        appeal_radius: f32,
        state: Vec<u8>,
        history: EventHistory,
        created: GameTime,
    ) -> Self {
        Self {
            id,
            position,
            appeal_radius,
            state,
            history,
            haunts: Vec::new(),
            created,
            position_dirty: false,
            state_dirty: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn set_position(&mut self, position: Position) {
        if self.position != position {
            self.position = position;
            self.position_dirty = true;
        }
    }

    /// Extra distance at which this entity is interesting to other cells
    pub fn appeal_radius(&self) -> f32 {
        self.appeal_radius
    }

    pub fn state(&self) -> &[u8] {
        &self.state
    }

    pub fn set_state(&mut self, state: Vec<u8>) {
        self.state = state;
        self.state_dirty = true;
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut EventHistory {
        &mut self.history
    }

    pub fn created(&self) -> GameTime {
        self.created
    }

    pub fn age(&self, now: GameTime) -> GameTime {
        now.saturating_sub(self.created)
    }

    // Haunts

    pub fn haunts(&self) -> &[Haunt] {
        &self.haunts
    }

    pub fn haunt_addresses(&self) -> HashSet<SocketAddr> {
        self.haunts.iter().map(Haunt::address).collect()
    }

    pub fn haunt(&self, address: &SocketAddr) -> Option<&Haunt> {
        self.haunts.iter().find(|haunt| haunt.address() == *address)
    }

    pub fn add_haunt(&mut self, haunt: Haunt) {
        debug_assert!(self.haunt(&haunt.address()).is_none());
        self.haunts.push(haunt);
    }

    pub fn remove_haunt(&mut self, address: &SocketAddr) -> Option<Haunt> {
        let index = self
            .haunts
            .iter()
            .position(|haunt| haunt.address() == *address)?;
        Some(self.haunts.swap_remove(index))
    }

    pub fn take_haunts(&mut self) -> Vec<Haunt> {
        std::mem::take(&mut self.haunts)
    }

    // Ghost updates

    /// Returns what changed since the last call: the position flag and, if
    /// the state changed, the state to forward
    pub(crate) fn take_dirty(&mut self) -> Option<Option<Vec<u8>>> {
        if !self.position_dirty && !self.state_dirty {
            return None;
        }
        let delta = if self.state_dirty {
            Some(self.state.clone())
        } else {
            None
        };
        self.position_dirty = false;
        self.state_dirty = false;
        Some(delta)
    }

    /// Splits the real into the parts carried by an offload
    pub(crate) fn into_parts(self) -> (Position, f32, Vec<u8>, EventHistory) {
        (self.position, self.appeal_radius, self.state, self.history)
    }
}

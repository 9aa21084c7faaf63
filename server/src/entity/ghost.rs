use std::net::SocketAddr;

use cellrep_shared::{EntityId, EventHistory, GameTime, Position};

/// A read-only copy of an entity whose real lives on another cell.
///
/// The ghost mirrors the real's event history so local witnesses can stream
/// it. The mirror keeps the real's numbering and becomes the real's history
/// if this cell takes the entity over.
pub struct Ghost {
    id: EntityId,
    position: Position,
    appeal_radius: f32,
    state: Vec<u8>,
    history: EventHistory,
    real: SocketAddr,
    next_real: Option<SocketAddr>,
    created: GameTime,
}

impl Ghost {
    pub fn new(
        id: EntityId,
        position: Position,
        appeal_radius: f32,
        state: Vec<u8>,
        history: EventHistory,
        real: SocketAddr,
        created: GameTime,
    ) -> Self {
        Self {
            id,
            position,
            appeal_radius,
            state,
            history,
            real,
            next_real: None,
            created,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn appeal_radius(&self) -> f32 {
        self.appeal_radius
    }

    pub fn state(&self) -> &[u8] {
        &self.state
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut EventHistory {
        &mut self.history
    }

    /// Address of the cell holding the real
    pub fn real(&self) -> SocketAddr {
        self.real
    }

    pub fn next_real(&self) -> Option<SocketAddr> {
        self.next_real
    }

    pub fn created(&self) -> GameTime {
        self.created
    }

    /// Only the real may update a ghost. Once the real has signed off with a
    /// next real, only that next real may.
    pub fn accepts_from(&self, address: &SocketAddr) -> bool {
        match self.next_real {
            Some(next_real) => next_real == *address,
            None => self.real == *address,
        }
    }

    /// An empty delta moves the ghost without touching its state
    pub fn apply_update(&mut self, position: Position, delta: Vec<u8>) {
        self.position = position;
        if !delta.is_empty() {
            self.state = delta;
        }
    }

    pub fn set_real(&mut self, real: SocketAddr) {
        self.real = real;
        if self.next_real == Some(real) {
            self.next_real = None;
        }
    }

    pub fn set_next_real(&mut self, next_real: SocketAddr) {
        self.next_real = Some(next_real);
    }

    pub fn clear_next_real(&mut self) {
        self.next_real = None;
    }

    pub(crate) fn into_history(self) -> EventHistory {
        self.history
    }
}

use std::net::SocketAddr;

use cellrep_shared::{EntityId, GameTime};

/// Outcome of a finished [`DeathAckTask`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeathAck {
    pub address: SocketAddr,
    /// Entities offloaded to the dead cell whose offload was never acked
    pub lost_entities: Vec<EntityId>,
}

/// Tracks the recovery from one remote cell's death
#[derive(Debug)]
pub struct DeathAckTask {
    address: SocketAddr,
    lost_entities: Vec<EntityId>,
    acknowledge_at: GameTime,
}

impl DeathAckTask {
    pub fn new(address: SocketAddr, lost_entities: Vec<EntityId>, acknowledge_at: GameTime) -> Self {
        Self {
            address,
            lost_entities,
            acknowledge_at,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn lost_entities(&self) -> &[EntityId] {
        &self.lost_entities
    }

    pub fn acknowledge_at(&self) -> GameTime {
        self.acknowledge_at
    }

    pub fn is_complete(&self, now: GameTime) -> bool {
        now >= self.acknowledge_at
    }

    /// Folds a second failure report for the same address into this task
    pub(crate) fn merge(&mut self, lost_entities: Vec<EntityId>, acknowledge_at: GameTime) {
        for entity in lost_entities {
            if !self.lost_entities.contains(&entity) {
                self.lost_entities.push(entity);
            }
        }
        self.acknowledge_at = self.acknowledge_at.max(acknowledge_at);
    }

    pub fn complete(self) -> DeathAck {
        DeathAck {
            address: self.address,
            lost_entities: self.lost_entities,
        }
    }
}

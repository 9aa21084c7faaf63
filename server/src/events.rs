use std::net::SocketAddr;

use cellrep_shared::{DetailLevel, EntityId};

/// Notifications for the layer embedding a cell, drained with
/// [`crate::Cell::take_events`]
#[derive(Clone, Debug, PartialEq)]
pub enum CellEvent {
    GhostCreated {
        entity: EntityId,
        real: SocketAddr,
    },
    GhostUpdated {
        entity: EntityId,
    },
    GhostDestroyed {
        entity: EntityId,
    },
    /// An offload from `from` landed and the entity is real here now
    AuthorityGained {
        entity: EntityId,
        from: SocketAddr,
    },
    AuthorityLost {
        entity: EntityId,
        to: SocketAddr,
    },
    /// The entity was offloaded to `address`, which died before acking it
    RealLost {
        entity: EntityId,
        address: SocketAddr,
    },
    EnteredAoi {
        witness: EntityId,
        entity: EntityId,
        detail_level: DetailLevel,
    },
    LeftAoi {
        witness: EntityId,
        entity: EntityId,
    },
    DeathAcknowledged {
        address: SocketAddr,
        lost_entities: Vec<EntityId>,
    },
}

//! # Cellrep Server
//! A simulation cell that owns the real entities inside its region, keeps
//! ghosts of them on neighbouring cells, hands them over when they cross a
//! boundary and streams their surroundings to witnesses.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use cellrep_shared::{
        BitReader, BitWrite, BitWriter, CellMessage, ChannelConfig, ChannelError,
        ChannelHandle, ChannelRegistry, DetailLevel, EntityId, EventDescription, EventHistory,
        EventLevel, EventNumber, GameTime, HistoryError, HistoryEvent, IdAlias, MessageBundle,
        OffloadData, Position, Rect, Serde, SerdeErr, Transport, TransportError, NO_ID_ALIAS,
    };
}

mod cell;
mod death;
mod entity;
mod error;
mod events;
mod space;
mod witness;

pub use cell::{
    cell::Cell,
    cell_config::{CellConfig, GhostConfig, HistoryConfig, WitnessConfig},
    ghost_maintainer::{GhostMaintainer, GhostPlan},
    offload_checker::{OffloadCandidate, OffloadChecker},
};
pub use death::{
    death_ack_task::{DeathAck, DeathAckTask},
    death_scheduler::DeathScheduler,
    deletion_budget::DeletionBudget,
};
pub use entity::{
    buffered_ghost_messages::BufferedGhostMessages, ghost::Ghost, haunt::Haunt,
    real_entity::RealEntity,
};
pub use error::CellError;
pub use events::CellEvent;
pub use space::{CellInfo, SpaceQuery};
pub use witness::{
    aoi_update_scheme::{AoiUpdateScheme, DistanceScheme},
    detail_levels::DetailLevels,
    entity_cache::{CacheFlags, CacheUpdate, EntityCache},
    witness::{EntityLookup, ObservedEntity, Witness},
    witness_message::WitnessMessage,
};

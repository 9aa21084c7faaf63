use std::net::SocketAddr;

use thiserror::Error;

use cellrep_shared::{ChannelError, EntityId, HistoryError, SerdeErr};

/// Errors returned by [`crate::Cell`] operations. None of them leave the
/// cell in an inconsistent state; remote-caused ones are also logged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellError {
    /// A bundle from another cell could not be decoded
    #[error("Malformed bundle from {from}: {source}")]
    Decode {
        from: SocketAddr,
        #[source]
        source: SerdeErr,
    },

    #[error("Entity {entity} already exists on this cell")]
    EntityExists { entity: EntityId },

    #[error("Entity {entity} is not real on this cell")]
    NotReal { entity: EntityId },

    /// A ghost message named an entity with no ghost here
    #[error("Received {message} for {entity}, which has no ghost on this cell")]
    NoGhost {
        entity: EntityId,
        message: &'static str,
    },

    /// A ghost message came from a cell that does not hold the real
    #[error("Received {message} for {entity} from {from}, which does not own it")]
    UnexpectedSender {
        entity: EntityId,
        from: SocketAddr,
        message: &'static str,
    },

    #[error("Entity {entity} has no witness")]
    NoWitness { entity: EntityId },

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

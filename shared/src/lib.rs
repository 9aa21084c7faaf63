//! # Cellrep Shared
//! Common functionality shared between cells: entity event histories, the
//! cell-to-cell channel registry and the messages sent over it.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use cellrep_serde::{
    BitCounter, BitReader, BitWrite, BitWriter, Serde, SerdeErr, UnsignedInteger,
    UnsignedVariableInteger,
};

mod channel;
mod geometry;
mod history;
mod messages;
mod transport;
mod types;

pub use channel::{
    channel::{Channel, ChannelState},
    channel_config::ChannelConfig,
    channel_registry::{ChannelHandle, ChannelRegistry},
    error::ChannelError,
};
pub use geometry::{Position, Rect};
pub use history::{
    error::HistoryError,
    event_history::EventHistory,
    history_event::{EventDescription, EventLevel, HistoryEvent},
};
pub use messages::{
    cell_message::{CellMessage, OffloadData},
    message_bundle::MessageBundle,
};
pub use transport::{error::TransportError, Transport};
pub use types::{DetailLevel, EntityId, EventNumber, GameTime, IdAlias, NO_ID_ALIAS};

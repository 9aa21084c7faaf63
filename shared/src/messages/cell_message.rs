use std::net::SocketAddr;

use cellrep_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedInteger};

use crate::{
    geometry::Position,
    history::history_event::HistoryEvent,
    types::{EntityId, EventNumber},
};

/// Everything a real hands to its next owner
#[derive(Clone, Debug, PartialEq)]
pub struct OffloadData {
    pub entity: EntityId,
    pub position: Position,
    pub appeal_radius: f32,
    pub state: Vec<u8>,
    /// Cells holding a ghost once the offload lands, the sender included
    pub haunts: Vec<SocketAddr>,
    pub events: Vec<HistoryEvent>,
    pub last_event_number: EventNumber,
    pub last_trimmed_event_number: EventNumber,
    pub aoi_radius: Option<f32>,
}

impl Serde for OffloadData {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.entity.ser(writer);
        self.position.ser(writer);
        self.appeal_radius.ser(writer);
        self.state.ser(writer);
        self.haunts.ser(writer);
        self.events.ser(writer);
        self.last_event_number.ser(writer);
        self.last_trimmed_event_number.ser(writer);
        self.aoi_radius.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            entity: EntityId::de(reader)?,
            position: Position::de(reader)?,
            appeal_radius: f32::de(reader)?,
            state: Vec::<u8>::de(reader)?,
            haunts: Vec::<SocketAddr>::de(reader)?,
            events: Vec::<HistoryEvent>::de(reader)?,
            last_event_number: EventNumber::de(reader)?,
            last_trimmed_event_number: EventNumber::de(reader)?,
            aoi_radius: Option::<f32>::de(reader)?,
        })
    }
}

/// Messages exchanged between cells over a [`crate::Channel`]
#[derive(Clone, Debug, PartialEq)]
pub enum CellMessage {
    GhostCreate {
        entity: EntityId,
        position: Position,
        appeal_radius: f32,
        last_event_number: EventNumber,
        state: Vec<u8>,
    },
    GhostUpdate {
        entity: EntityId,
        position: Position,
        delta: Vec<u8>,
    },
    GhostDelete {
        entity: EntityId,
    },
    GhostHistoryEvent {
        entity: EntityId,
        event: HistoryEvent,
    },
    /// Sent by a new real to every haunt once it has taken over
    GhostSetReal {
        entity: EntityId,
        real: SocketAddr,
    },
    /// Sent by a departing real so ghosts accept traffic from the next owner
    GhostSetNextReal {
        entity: EntityId,
        next_real: SocketAddr,
    },
    EntityOffload(Box<OffloadData>),
    AckOffload {
        entity: EntityId,
    },
}

type MessageTag = UnsignedInteger<3>;

impl CellMessage {
    pub fn entity(&self) -> EntityId {
        match self {
            CellMessage::GhostCreate { entity, .. }
            | CellMessage::GhostUpdate { entity, .. }
            | CellMessage::GhostDelete { entity }
            | CellMessage::GhostHistoryEvent { entity, .. }
            | CellMessage::GhostSetReal { entity, .. }
            | CellMessage::GhostSetNextReal { entity, .. }
            | CellMessage::AckOffload { entity } => *entity,
            CellMessage::EntityOffload(data) => data.entity,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CellMessage::GhostCreate { .. } => "ghostCreate",
            CellMessage::GhostUpdate { .. } => "ghostUpdate",
            CellMessage::GhostDelete { .. } => "ghostDelete",
            CellMessage::GhostHistoryEvent { .. } => "ghostHistoryEvent",
            CellMessage::GhostSetReal { .. } => "ghostSetReal",
            CellMessage::GhostSetNextReal { .. } => "ghostSetNextReal",
            CellMessage::EntityOffload(_) => "entityOffload",
            CellMessage::AckOffload { .. } => "ackOffload",
        }
    }

    /// Offload traffic must survive until acknowledged, see
    /// [`crate::ChannelRegistry::add_critical`]
    pub fn is_critical(&self) -> bool {
        matches!(self, CellMessage::EntityOffload(_))
    }

    fn tag(&self) -> u8 {
        match self {
            CellMessage::GhostCreate { .. } => 0,
            CellMessage::GhostUpdate { .. } => 1,
            CellMessage::GhostDelete { .. } => 2,
            CellMessage::GhostHistoryEvent { .. } => 3,
            CellMessage::GhostSetReal { .. } => 4,
            CellMessage::GhostSetNextReal { .. } => 5,
            CellMessage::EntityOffload(_) => 6,
            CellMessage::AckOffload { .. } => 7,
        }
    }
}

impl Serde for CellMessage {
    fn ser(&self, writer: &mut dyn BitWrite) {
        MessageTag::new(self.tag()).ser(writer);
        match self {
            CellMessage::GhostCreate {
                entity,
                position,
                appeal_radius,
                last_event_number,
                state,
            } => {
                entity.ser(writer);
                position.ser(writer);
                appeal_radius.ser(writer);
                last_event_number.ser(writer);
                state.ser(writer);
            }
            CellMessage::GhostUpdate {
                entity,
                position,
                delta,
            } => {
                entity.ser(writer);
                position.ser(writer);
                delta.ser(writer);
            }
            CellMessage::GhostDelete { entity } | CellMessage::AckOffload { entity } => {
                entity.ser(writer);
            }
            CellMessage::GhostHistoryEvent { entity, event } => {
                entity.ser(writer);
                event.ser(writer);
            }
            CellMessage::GhostSetReal { entity, real } => {
                entity.ser(writer);
                real.ser(writer);
            }
            CellMessage::GhostSetNextReal { entity, next_real } => {
                entity.ser(writer);
                next_real.ser(writer);
            }
            CellMessage::EntityOffload(data) => {
                data.ser(writer);
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let tag = MessageTag::de(reader)?.get();
        let message = match tag {
            0 => CellMessage::GhostCreate {
                entity: EntityId::de(reader)?,
                position: Position::de(reader)?,
                appeal_radius: f32::de(reader)?,
                last_event_number: EventNumber::de(reader)?,
                state: Vec::<u8>::de(reader)?,
            },
            1 => CellMessage::GhostUpdate {
                entity: EntityId::de(reader)?,
                position: Position::de(reader)?,
                delta: Vec::<u8>::de(reader)?,
            },
            2 => CellMessage::GhostDelete {
                entity: EntityId::de(reader)?,
            },
            3 => CellMessage::GhostHistoryEvent {
                entity: EntityId::de(reader)?,
                event: HistoryEvent::de(reader)?,
            },
            4 => CellMessage::GhostSetReal {
                entity: EntityId::de(reader)?,
                real: SocketAddr::de(reader)?,
            },
            5 => CellMessage::GhostSetNextReal {
                entity: EntityId::de(reader)?,
                next_real: SocketAddr::de(reader)?,
            },
            6 => CellMessage::EntityOffload(Box::new(OffloadData::de(reader)?)),
            7 => CellMessage::AckOffload {
                entity: EntityId::de(reader)?,
            },
            other => {
                return Err(SerdeErr::InvalidDiscriminant {
                    type_name: "CellMessage",
                    value: other as u8,
                })
            }
        };
        Ok(message)
    }
}

use cellrep_shared::{DetailLevel, EntityId, EventNumber, HistoryEvent, IdAlias, Position};

/// Output of a [`crate::Witness`], drained by the layer that forwards it to
/// the observer's client
#[derive(Clone, Debug, PartialEq)]
pub enum WitnessMessage {
    EnterAoi {
        entity: EntityId,
        id_alias: Option<IdAlias>,
    },
    /// Full state, sent once after the entity entered
    Create {
        entity: EntityId,
        position: Position,
        detail_level: DetailLevel,
        last_event_number: EventNumber,
        state: Vec<u8>,
    },
    Position {
        entity: EntityId,
        position: Position,
    },
    Event {
        entity: EntityId,
        event: HistoryEvent,
    },
    DetailLevel {
        entity: EntityId,
        detail_level: DetailLevel,
    },
    LeaveAoi {
        entity: EntityId,
    },
}

impl WitnessMessage {
    pub fn entity(&self) -> EntityId {
        match self {
            WitnessMessage::EnterAoi { entity, .. }
            | WitnessMessage::Create { entity, .. }
            | WitnessMessage::Position { entity, .. }
            | WitnessMessage::Event { entity, .. }
            | WitnessMessage::DetailLevel { entity, .. }
            | WitnessMessage::LeaveAoi { entity } => *entity,
        }
    }

    /// Approximate bytes the message costs on the observer's connection
    pub fn size(&self) -> usize {
        const HEADER: usize = 9;
        match self {
            WitnessMessage::EnterAoi { .. } | WitnessMessage::LeaveAoi { .. } => HEADER,
            WitnessMessage::DetailLevel { .. } => HEADER + 1,
            WitnessMessage::Position { .. } => HEADER + 12,
            WitnessMessage::Create { state, .. } => HEADER + 17 + state.len(),
            WitnessMessage::Event { event, .. } => HEADER + 4 + event.payload().len(),
        }
    }
}

use cellrep_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedVariableInteger};

use crate::types::{DetailLevel, EventNumber};

/// Decides which observers an event is relevant to
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EventLevel {
    /// Sent to observers whose level-of-detail priority is below the threshold
    Priority(f32),
    /// Sent to observers currently at this detail level or a more detailed one
    Detail(DetailLevel),
}

impl EventLevel {
    pub fn should_send(&self, lod_priority: f32, detail_level: DetailLevel) -> bool {
        match self {
            EventLevel::Priority(threshold) => lod_priority < *threshold,
            EventLevel::Detail(level) => *level >= detail_level,
        }
    }
}

impl Serde for EventLevel {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self {
            EventLevel::Priority(threshold) => {
                writer.write_bit(false);
                threshold.ser(writer);
            }
            EventLevel::Detail(level) => {
                writer.write_bit(true);
                level.ser(writer);
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        if reader.read_bit()? {
            Ok(EventLevel::Detail(u8::de(reader)?))
        } else {
            Ok(EventLevel::Priority(f32::de(reader)?))
        }
    }
}

/// How an event is to be recorded, fixed per property or method
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventDescription {
    /// `Some(slot)` marks a latest-value-only event: a newer event in the same
    /// slot replaces the older one instead of being appended beside it
    pub compaction_slot: Option<u16>,
    pub is_reliable: bool,
    pub level: EventLevel,
}

impl EventDescription {
    pub fn latest_value_only(slot: u16, level: EventLevel) -> Self {
        Self {
            compaction_slot: Some(slot),
            is_reliable: true,
            level,
        }
    }

    pub fn reliable(level: EventLevel) -> Self {
        Self {
            compaction_slot: None,
            is_reliable: true,
            level,
        }
    }

    pub fn unreliable(level: EventLevel) -> Self {
        Self {
            compaction_slot: None,
            is_reliable: false,
            level,
        }
    }
}

/// A recorded state change or message of a real entity
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEvent {
    number: EventNumber,
    description: EventDescription,
    payload: Vec<u8>,
}

impl HistoryEvent {
    pub fn new(number: EventNumber, description: EventDescription, payload: Vec<u8>) -> Self {
        Self {
            number,
            description,
            payload,
        }
    }

    pub fn number(&self) -> EventNumber {
        self.number
    }

    pub fn compaction_slot(&self) -> Option<u16> {
        self.description.compaction_slot
    }

    pub fn is_reliable(&self) -> bool {
        self.description.is_reliable
    }

    pub fn level(&self) -> EventLevel {
        self.description.level
    }

    pub fn description(&self) -> &EventDescription {
        &self.description
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn should_send(&self, lod_priority: f32, detail_level: DetailLevel) -> bool {
        self.description.level.should_send(lod_priority, detail_level)
    }
}

impl Serde for HistoryEvent {
    fn ser(&self, writer: &mut dyn BitWrite) {
        UnsignedVariableInteger::<7>::new(self.number).ser(writer);
        self.description
            .compaction_slot
            .map(UnsignedVariableInteger::<7>::new)
            .ser(writer);
        self.description.is_reliable.ser(writer);
        self.description.level.ser(writer);
        self.payload.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let number = UnsignedVariableInteger::<7>::de(reader)?.get();
        let number = EventNumber::try_from(number).map_err(|_| SerdeErr::LengthOverflow {
            type_name: "EventNumber",
            length: number,
            max: u64::from(EventNumber::MAX),
        })?;
        let compaction_slot = match Option::<UnsignedVariableInteger<7>>::de(reader)? {
            Some(slot) => {
                let slot = slot.get();
                Some(u16::try_from(slot).map_err(|_| SerdeErr::LengthOverflow {
                    type_name: "compaction slot",
                    length: slot,
                    max: u64::from(u16::MAX),
                })?)
            }
            None => None,
        };
        let is_reliable = bool::de(reader)?;
        let level = EventLevel::de(reader)?;
        let payload = Vec::<u8>::de(reader)?;
        Ok(Self {
            number,
            description: EventDescription {
                compaction_slot,
                is_reliable,
                level,
            },
            payload,
        })
    }
}

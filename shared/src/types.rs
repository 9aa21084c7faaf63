use std::fmt;

use cellrep_serde::{BitReader, BitWrite, Serde, SerdeErr};

/// Monotonically increasing number assigned to each history event of a real
pub type EventNumber = u32;
/// Simulation time, counted in ticks
pub type GameTime = u32;
/// 0 is the most detailed level; larger values are further away
pub type DetailLevel = u8;
/// Short per-witness alias for an entity id
pub type IdAlias = u8;

pub const NO_ID_ALIAS: IdAlias = 255;

/// Space-wide unique id of a replicated entity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl Serde for EntityId {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self(u64::de(reader)?))
    }
}

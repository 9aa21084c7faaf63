use std::default::Default;

use cellrep_shared::{ChannelConfig, GameTime};

use crate::witness::detail_levels::DetailLevels;

/// Contains Config properties which will be used by a Cell
#[derive(Clone)]
pub struct CellConfig {
    /// Controls where ghosts are placed and how fast they are removed
    pub ghost: GhostConfig,
    /// Used to configure the channels to other cells
    pub channel: ChannelConfig,
    /// Controls how long entity event histories are kept
    pub history: HistoryConfig,
    /// Controls how witnesses stream entities to their observers
    pub witness: WitnessConfig,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            ghost: GhostConfig::default(),
            channel: ChannelConfig::default(),
            history: HistoryConfig::default(),
            witness: WitnessConfig::default(),
        }
    }
}

#[derive(Clone)]
pub struct GhostConfig {
    /// Distance beyond a cell's region within which entities are ghosted to it
    pub ghost_distance: f32,
    /// Extra margin added on top of `ghost_distance` and the appeal radius
    pub ghost_fudge: f32,
    /// A haunt younger than this many ticks is never deleted
    pub min_ghost_lifespan: GameTime,
    /// No haunt of a real younger than this many ticks is deleted
    pub real_grace_period: GameTime,
    /// Upper bound on haunt deletions per tick, the rest waits for later ticks
    pub max_ghost_deletions_per_tick: usize,
    /// How far outside its own region a real must be before it is offloaded
    pub offload_hysteresis: f32,
    /// Ticks between a remote cell failing and its death being acknowledged.
    /// Offloads are paused until then.
    pub death_recovery_period: GameTime,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            ghost_distance: 500.0,
            ghost_fudge: 20.0,
            min_ghost_lifespan: 10,
            real_grace_period: 10,
            max_ghost_deletions_per_tick: 50,
            offload_hysteresis: 5.0,
            death_recovery_period: 5,
        }
    }
}

impl GhostConfig {
    /// Distance by which a real's position is inflated to find the cells that
    /// must ghost it
    pub fn interest_distance(&self, appeal_radius: f32) -> f32 {
        self.ghost_distance + appeal_radius + self.ghost_fudge
    }
}

#[derive(Clone)]
pub struct HistoryConfig {
    /// Histories are trimmed every this many ticks
    pub trim_period: GameTime,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { trim_period: 10 }
    }
}

#[derive(Clone)]
pub struct WitnessConfig {
    /// AoI radius used when a witness is enabled without one
    pub default_aoi_radius: f32,
    /// Growth of an entry's priority delta is capped at this multiple of the
    /// previous delta
    pub priority_throttle_factor: f32,
    /// Entries further than this beyond the front of the queue wait for a
    /// later tick
    pub max_priority_delta: f32,
    /// Payload bytes a witness may emit per tick
    pub bandwidth_per_tick: usize,
    pub detail_levels: DetailLevels,
}

impl Default for WitnessConfig {
    fn default() -> Self {
        Self {
            default_aoi_radius: 500.0,
            priority_throttle_factor: 2.0,
            max_priority_delta: 10.0,
            bandwidth_per_tick: 2048,
            detail_levels: DetailLevels::default(),
        }
    }
}

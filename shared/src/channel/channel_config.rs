use crate::types::GameTime;

/// Contains Config properties which will be used by the channel registry
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// Ticks that must pass without any new remote failure before the
    /// recently-dead set is cleared
    pub recently_dead_quiet_period: GameTime,
    /// Ticks an unreferenced, idle channel is kept before being dropped
    pub keep_alive: GameTime,
    /// A channel with this many unacknowledged critical messages is not
    /// considered healthy enough to take an offload
    pub max_unacked_criticals: u16,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            recently_dead_quiet_period: 100,
            keep_alive: 600,
            max_unacked_criticals: 8,
        }
    }
}

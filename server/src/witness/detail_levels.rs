use cellrep_shared::DetailLevel;

/// Distance bands of the levels of detail an entity is streamed at.
///
/// Level 0 is the most detailed and covers level-of-detail priorities below
/// the first threshold. Each threshold starts the next, coarser level. A
/// band is only left once the priority is `hysteresis` beyond its edge.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailLevels {
    thresholds: Vec<f32>,
    hysteresis: f32,
}

impl DetailLevels {
    /// Panics if `thresholds` is not strictly ascending, or if it describes
    /// more levels than a [`DetailLevel`] can number
    pub fn new(thresholds: Vec<f32>, hysteresis: f32) -> Self {
        if thresholds.windows(2).any(|pair| !(pair[0] < pair[1])) {
            panic!("DetailLevels thresholds must be strictly ascending: {:?}", thresholds);
        }
        if thresholds.len() >= usize::from(DetailLevel::MAX) {
            panic!("DetailLevels supports at most {} thresholds", DetailLevel::MAX - 1);
        }
        Self {
            thresholds,
            hysteresis,
        }
    }

    pub fn count(&self) -> usize {
        self.thresholds.len() + 1
    }

    pub fn coarsest(&self) -> DetailLevel {
        self.thresholds.len() as DetailLevel
    }

    /// The level a priority falls in, ignoring hysteresis
    pub fn level_for(&self, lod_priority: f32) -> DetailLevel {
        self.thresholds
            .iter()
            .take_while(|threshold| **threshold <= lod_priority)
            .count() as DetailLevel
    }

    /// The level to move to from `current`, at most one step away
    pub fn step(&self, current: DetailLevel, lod_priority: f32) -> DetailLevel {
        let index = usize::from(current);
        if current < self.coarsest() && lod_priority >= self.thresholds[index] + self.hysteresis {
            return current + 1;
        }
        if current > 0 && lod_priority < self.thresholds[index - 1] - self.hysteresis {
            return current - 1;
        }
        current
    }
}

impl Default for DetailLevels {
    fn default() -> Self {
        Self::new(vec![50.0, 150.0, 300.0], 5.0)
    }
}

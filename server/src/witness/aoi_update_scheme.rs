/// Policy turning the distance between a witness and an entity into update
/// scheduling values
pub trait AoiUpdateScheme {
    /// How far an entry's priority advances after each update. Entries with
    /// a smaller delta come round again sooner.
    fn priority_delta(&self, distance: f32) -> f32;

    /// The value compared against [`crate::DetailLevels`] and event priority
    /// thresholds
    fn lod_priority(&self, distance: f32) -> f32 {
        distance
    }
}

/// `distance / divisor + offset`
#[derive(Clone, Debug)]
pub struct DistanceScheme {
    pub divisor: f32,
    pub offset: f32,
}

impl Default for DistanceScheme {
    fn default() -> Self {
        Self {
            divisor: 5.0,
            offset: 1.0,
        }
    }
}

impl AoiUpdateScheme for DistanceScheme {
    fn priority_delta(&self, distance: f32) -> f32 {
        distance / self.divisor + self.offset
    }
}

use cellrep_serde::{BitReader, BitWrite, Serde, SerdeErr};

/// World position. Cell boundaries partition the x/z plane; y is carried
/// along but never used for partitioning.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Ground-plane position, y = 0
    pub fn flat(x: f32, z: f32) -> Self {
        Self { x, y: 0.0, z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl Serde for Position {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.x.ser(writer);
        self.y.ser(writer);
        self.z.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            x: f32::de(reader)?,
            y: f32::de(reader)?,
            z: f32::de(reader)?,
        })
    }
}

/// Axis-aligned rectangle on the x/z plane. Bounds may be infinite for
/// edge cells of a space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x_min: f32,
    pub z_min: f32,
    pub x_max: f32,
    pub z_max: f32,
}

impl Rect {
    pub fn new(x_min: f32, z_min: f32, x_max: f32, z_max: f32) -> Self {
        Self {
            x_min,
            z_min,
            x_max,
            z_max,
        }
    }

    /// Degenerate rectangle covering a single point
    pub fn from_point(position: &Position) -> Self {
        Self::new(position.x, position.z, position.x, position.z)
    }

    pub fn inflated(&self, by: f32) -> Self {
        Self::new(
            self.x_min - by,
            self.z_min - by,
            self.x_max + by,
            self.z_max + by,
        )
    }

    pub fn contains(&self, position: &Position) -> bool {
        self.x_min <= position.x
            && position.x < self.x_max
            && self.z_min <= position.z
            && position.z < self.z_max
    }

    /// Closed intersection test, so rectangles that share an edge intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x_min <= other.x_max
            && other.x_min <= self.x_max
            && self.z_min <= other.z_max
            && other.z_min <= self.z_max
    }
}

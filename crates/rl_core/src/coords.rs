use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Grid position of a micro chunk in chunk-space coordinates.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Component, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the given world position.
    ///
    /// Coordinates beyond the `i32` range saturate, so every finite input maps
    /// to some chunk.
    pub fn from_world(x: f64, z: f64, chunk_size: f64) -> Self {
        Self {
            x: (x / chunk_size).floor() as i32,
            z: (z / chunk_size).floor() as i32,
        }
    }

    /// World-space position of this chunk's minimum corner.
    pub fn world_origin(&self, chunk_size: f64) -> WorldPos {
        WorldPos::new(self.x as f64 * chunk_size, self.z as f64 * chunk_size)
    }

    /// Squared distance in chunk units, used for circular neighborhoods.
    pub fn distance_sq(&self, other: ChunkCoord) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dz = self.z as i64 - other.z as i64;
        dx * dx + dz * dz
    }

    pub const fn offset(&self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            z: self.z.saturating_add(dz),
        }
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Continuous world-space position on the ground plane using f64 for precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f64,
    pub z: f64,
}

impl WorldPos {
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn distance(&self, other: WorldPos) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_world_floors_negative_positions() {
        assert_eq!(ChunkCoord::from_world(-0.5, 10.0, 64.0), ChunkCoord::new(-1, 0));
        assert_eq!(ChunkCoord::from_world(64.0, -64.0, 64.0), ChunkCoord::new(1, -1));
        assert_eq!(ChunkCoord::from_world(63.99, 0.0, 64.0), ChunkCoord::new(0, 0));
    }

    #[test]
    fn from_world_saturates_far_positions() {
        let coord = ChunkCoord::from_world(1.0e300, -1.0e300, 64.0);
        assert_eq!(coord, ChunkCoord::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn distance_sq_is_circular_metric() {
        let origin = ChunkCoord::new(0, 0);
        assert_eq!(origin.distance_sq(ChunkCoord::new(1, 0)), 1);
        assert_eq!(origin.distance_sq(ChunkCoord::new(1, 1)), 2);
        assert_eq!(origin.distance_sq(ChunkCoord::new(-3, 4)), 25);
    }

    #[test]
    fn world_origin_scales_by_chunk_size() {
        let origin = ChunkCoord::new(-2, 3).world_origin(64.0);
        assert_eq!(origin, WorldPos::new(-128.0, 192.0));
    }
}

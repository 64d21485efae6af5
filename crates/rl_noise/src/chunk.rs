use rl_core::ChunkCoord;

/// A high-resolution heightmap tile. Immutable once built.
///
/// Vertex `(i, j)` sits at `origin + size * (i, j) / (resolution - 1)`, so
/// adjacent chunks share the world positions of their edge vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    coord: ChunkCoord,
    height_map: Vec<f64>,
    world_origin_x: f64,
    world_origin_z: f64,
    size: f64,
    resolution: usize,
}

impl Chunk {
    /// Wrap a finished heightmap. `height_map` holds `resolution²` values, row-major in z.
    pub fn new(
        coord: ChunkCoord,
        world_origin_x: f64,
        world_origin_z: f64,
        size: f64,
        resolution: usize,
        height_map: Vec<f64>,
    ) -> Self {
        debug_assert!(resolution >= 2);
        debug_assert_eq!(height_map.len(), resolution * resolution);
        Self {
            coord,
            height_map,
            world_origin_x,
            world_origin_z,
            size,
            resolution,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn height_map(&self) -> &[f64] {
        &self.height_map
    }

    pub fn world_origin_x(&self) -> f64 {
        self.world_origin_x
    }

    pub fn world_origin_z(&self) -> f64 {
        self.world_origin_z
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Distance between neighbouring vertices in world units.
    pub fn spacing(&self) -> f64 {
        self.size / (self.resolution - 1) as f64
    }

    /// Height of vertex `(i, j)`.
    pub fn vertex(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.resolution && j < self.resolution {
            Some(self.height_map[j * self.resolution + i])
        } else {
            None
        }
    }

    /// Whether the chunk's closed extent contains the world position.
    pub fn contains(&self, x: f64, z: f64) -> bool {
        x >= self.world_origin_x
            && x <= self.world_origin_x + self.size
            && z >= self.world_origin_z
            && z <= self.world_origin_z + self.size
    }

    /// Bilinear height at a world position, `None` outside the chunk.
    pub fn height_at(&self, x: f64, z: f64) -> Option<f64> {
        if !self.contains(x, z) {
            return None;
        }

        let last = (self.resolution - 1) as f64;
        let gx = ((x - self.world_origin_x) / self.size * last).clamp(0.0, last);
        let gz = ((z - self.world_origin_z) / self.size * last).clamp(0.0, last);

        let i = (gx.floor() as usize).min(self.resolution - 2);
        let j = (gz.floor() as usize).min(self.resolution - 2);
        let tx = gx - i as f64;
        let tz = gz - j as f64;

        let row = j * self.resolution;
        let h00 = self.height_map[row + i];
        let h10 = self.height_map[row + i + 1];
        let h01 = self.height_map[row + self.resolution + i];
        let h11 = self.height_map[row + self.resolution + i + 1];

        let top = h00 + (h10 - h00) * tx;
        let bottom = h01 + (h11 - h01) * tx;
        Some(top + (bottom - top) * tz)
    }

    pub fn height_range(&self) -> (f64, f64) {
        self.height_map
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 3×3 chunk whose height equals the vertex's x index.
    fn ramp() -> Chunk {
        let heights = (0..3).flat_map(|_| (0..3).map(|i| i as f64)).collect();
        Chunk::new(ChunkCoord::new(1, 0), 10.0, 0.0, 10.0, 3, heights)
    }

    #[test]
    fn height_at_interpolates() {
        let chunk = ramp();
        assert_eq!(chunk.height_at(10.0, 0.0), Some(0.0));
        assert_eq!(chunk.height_at(20.0, 10.0), Some(2.0));
        let mid = chunk.height_at(12.5, 3.0).unwrap();
        assert!((mid - 0.5).abs() < 1e-12);
    }

    #[test]
    fn height_at_outside_is_none() {
        let chunk = ramp();
        assert!(chunk.height_at(9.99, 5.0).is_none());
        assert!(chunk.height_at(15.0, 10.01).is_none());
    }

    #[test]
    fn vertex_lookup_is_bounded() {
        let chunk = ramp();
        assert_eq!(chunk.vertex(2, 1), Some(2.0));
        assert!(chunk.vertex(3, 0).is_none());
        assert!((chunk.spacing() - 5.0).abs() < 1e-12);
    }
}

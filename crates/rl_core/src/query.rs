/// Narrow read-only terrain interface handed to movement, analysis and render code.
///
/// Implementations must be total: every finite `(x, z)` yields a finite height.
pub trait TerrainQuery {
    /// Ground height at a world position.
    fn height_at(&self, x: f64, z: f64) -> f64;

    /// Whether the position sits on a ridge line.
    ///
    /// A point is a ridge when it rises above both east/west neighbours while
    /// staying within `threshold` of both north/south neighbours, or the same
    /// test with the axes swapped. Neighbours are probed `probe_step()` apart.
    fn is_ridge(&self, x: f64, z: f64, threshold: f64) -> bool {
        let step = self.probe_step();
        ridge_crest(
            self.height_at(x, z),
            [
                self.height_at(x + step, z),
                self.height_at(x - step, z),
                self.height_at(x, z - step),
                self.height_at(x, z + step),
            ],
            threshold,
        )
    }

    /// Distance between probe samples used by [`TerrainQuery::is_ridge`].
    fn probe_step(&self) -> f64 {
        1.0
    }
}

/// Ridge test on a height and its `[east, west, north, south]` neighbours.
///
/// True when `h` rises above both neighbours on one axis while staying within
/// `threshold` of both neighbours on the other. Negating every height turns
/// this into the valley test.
pub fn ridge_crest(h: f64, [east, west, north, south]: [f64; 4], threshold: f64) -> bool {
    let level = |n: f64| (h - n).abs() <= threshold;
    let across_x = h > east && h > west && level(north) && level(south);
    let across_z = h > north && h > south && level(east) && level(west);
    across_x || across_z
}

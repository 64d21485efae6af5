use rl_core::ridge_crest;
use rl_noise::{Chunk, MacroField};
use serde::{Deserialize, Serialize};

/// Square grid of stored heights with known world positions.
pub trait HeightGrid {
    /// Samples per side.
    fn resolution(&self) -> usize;

    /// Height of cell `(i, j)`, `None` outside the grid.
    fn height(&self, i: usize, j: usize) -> Option<f64>;

    /// World position of cell `(i, j)`.
    fn position(&self, i: usize, j: usize) -> (f64, f64);
}

impl HeightGrid for MacroField {
    fn resolution(&self) -> usize {
        MacroField::resolution(self)
    }

    fn height(&self, i: usize, j: usize) -> Option<f64> {
        self.get(i, j)
    }

    fn position(&self, i: usize, j: usize) -> (f64, f64) {
        self.cell_position(i, j)
    }
}

impl HeightGrid for Chunk {
    fn resolution(&self) -> usize {
        Chunk::resolution(self)
    }

    fn height(&self, i: usize, j: usize) -> Option<f64> {
        self.vertex(i, j)
    }

    fn position(&self, i: usize, j: usize) -> (f64, f64) {
        let spacing = self.spacing();
        (
            self.world_origin_x() + i as f64 * spacing,
            self.world_origin_z() + j as f64 * spacing,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    Ridge,
    Valley,
    Peak,
}

/// A classified grid cell in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeaturePoint {
    pub x: f64,
    pub z: f64,
    pub height: f64,
    pub kind: FeatureKind,
}

/// Heights of the 4-neighbourhood as `[east, west, north, south]`.
fn cross<G: HeightGrid + ?Sized>(grid: &G, i: usize, j: usize) -> Option<[f64; 4]> {
    if i == 0 || j == 0 {
        return None;
    }
    Some([
        grid.height(i + 1, j)?,
        grid.height(i - 1, j)?,
        grid.height(i, j - 1)?,
        grid.height(i, j + 1)?,
    ])
}

/// Ridge cell: higher than both neighbours on one axis and within
/// `threshold` of both neighbours on the other. Border cells never qualify.
pub fn is_ridge<G: HeightGrid + ?Sized>(grid: &G, i: usize, j: usize, threshold: f64) -> bool {
    match (grid.height(i, j), cross(grid, i, j)) {
        (Some(h), Some(neighbours)) => ridge_crest(h, neighbours, threshold),
        _ => false,
    }
}

/// The ridge test on negated heights.
pub fn is_valley<G: HeightGrid + ?Sized>(grid: &G, i: usize, j: usize, threshold: f64) -> bool {
    match (grid.height(i, j), cross(grid, i, j)) {
        (Some(h), Some(neighbours)) => ridge_crest(-h, neighbours.map(|n| -n), threshold),
        _ => false,
    }
}

/// Peak cell: exceeds all eight neighbours by more than `threshold`.
pub fn is_peak<G: HeightGrid + ?Sized>(grid: &G, i: usize, j: usize, threshold: f64) -> bool {
    let Some(h) = grid.height(i, j) else {
        return false;
    };
    if i == 0 || j == 0 {
        return false;
    }

    for nj in j - 1..=j + 1 {
        for ni in i - 1..=i + 1 {
            if ni == i && nj == j {
                continue;
            }
            match grid.height(ni, nj) {
                Some(n) if h - n > threshold => {}
                _ => return false,
            }
        }
    }
    true
}

/// Classify every interior cell. A peak is reported as a peak only, not
/// also as a ridge.
pub fn detect_features<G: HeightGrid + ?Sized>(grid: &G, threshold: f64) -> Vec<FeaturePoint> {
    let res = grid.resolution();
    let mut features = Vec::new();
    if res < 3 {
        return features;
    }

    for j in 1..res - 1 {
        for i in 1..res - 1 {
            let kind = if is_peak(grid, i, j, threshold) {
                FeatureKind::Peak
            } else if is_ridge(grid, i, j, threshold) {
                FeatureKind::Ridge
            } else if is_valley(grid, i, j, threshold) {
                FeatureKind::Valley
            } else {
                continue;
            };

            let Some(height) = grid.height(i, j) else {
                continue;
            };
            let (x, z) = grid.position(i, j);
            features.push(FeaturePoint { x, z, height, kind });
        }
    }

    features
}

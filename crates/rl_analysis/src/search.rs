use rl_core::{ridge_crest, TerrainQuery, WorldPos};

use crate::grid::{FeatureKind, FeaturePoint};

/// Point height source that may have holes (unloaded or out-of-range positions).
pub trait HeightSampler {
    fn sample(&self, x: f64, z: f64) -> Option<f64>;
}

impl<F> HeightSampler for F
where
    F: Fn(f64, f64) -> Option<f64>,
{
    fn sample(&self, x: f64, z: f64) -> Option<f64> {
        self(x, z)
    }
}

/// Samples a [`TerrainQuery`], which has no holes.
pub struct QuerySampler<'a, Q: TerrainQuery + ?Sized>(pub &'a Q);

impl<Q: TerrainQuery + ?Sized> HeightSampler for QuerySampler<'_, Q> {
    fn sample(&self, x: f64, z: f64) -> Option<f64> {
        Some(self.0.height_at(x, z))
    }
}

/// Largest lattice half-width, in samples. Wider scans coarsen the step.
pub const MAX_HALF_WIDTH: i64 = 256;

/// Square scan lattice around a center.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Lattice {
    center: WorldPos,
    half_width: i64,
    step: f64,
}

impl Lattice {
    /// Lattice of spacing `step` covering `radius`. When that would exceed
    /// [`MAX_HALF_WIDTH`] samples per side the step grows to `radius / MAX_HALF_WIDTH`.
    /// A non-positive or non-finite step, or a non-finite radius, gives a
    /// single sample at the center with no usable neighbour spacing.
    fn new(center: WorldPos, radius: f64, step: f64) -> Self {
        if !(step > 0.0 && step.is_finite() && radius.is_finite()) {
            return Self { center, half_width: 0, step: 0.0 };
        }

        let wanted = radius.max(0.0) / step;
        if wanted > MAX_HALF_WIDTH as f64 {
            Self {
                center,
                half_width: MAX_HALF_WIDTH,
                step: radius / MAX_HALF_WIDTH as f64,
            }
        } else {
            Self { center, half_width: wanted.floor() as i64, step }
        }
    }

    fn points(&self) -> impl Iterator<Item = (f64, f64)> {
        let Self { center, half_width: n, step } = *self;
        (-n..=n).flat_map(move |dz| {
            (-n..=n).map(move |dx| (center.x + dx as f64 * step, center.z + dz as f64 * step))
        })
    }
}

/// Lattice samples that exceed all eight neighbours one step away by more than `threshold`.
///
/// The lattice spacing is `step`, coarsened for very wide radii (see [`MAX_HALF_WIDTH`]).
pub fn find_local_peaks<S: HeightSampler + ?Sized>(
    sampler: &S,
    center: WorldPos,
    radius: f64,
    step: f64,
    threshold: f64,
) -> Vec<FeaturePoint> {
    let lattice = Lattice::new(center, radius, step);
    let step = lattice.step;
    let mut peaks = Vec::new();
    if step <= 0.0 {
        return peaks;
    }

    'candidates: for (x, z) in lattice.points() {
        let Some(h) = sampler.sample(x, z) else {
            continue;
        };

        for dz in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                match sampler.sample(x + dx as f64 * step, z + dz as f64 * step) {
                    Some(n) if h - n > threshold => {}
                    _ => continue 'candidates,
                }
            }
        }

        peaks.push(FeaturePoint { x, z, height: h, kind: FeatureKind::Peak });
    }

    peaks
}

/// Lattice samples passing the ridge test against neighbours one step away.
pub fn find_local_ridges<S: HeightSampler + ?Sized>(
    sampler: &S,
    center: WorldPos,
    radius: f64,
    step: f64,
    threshold: f64,
) -> Vec<FeaturePoint> {
    let lattice = Lattice::new(center, radius, step);
    let step = lattice.step;
    let mut ridges = Vec::new();
    if step <= 0.0 {
        return ridges;
    }

    for (x, z) in lattice.points() {
        let samples = (
            sampler.sample(x, z),
            sampler.sample(x + step, z),
            sampler.sample(x - step, z),
            sampler.sample(x, z - step),
            sampler.sample(x, z + step),
        );
        let (Some(h), Some(east), Some(west), Some(north), Some(south)) = samples else {
            continue;
        };

        if ridge_crest(h, [east, west, north, south], threshold) {
            ridges.push(FeaturePoint { x, z, height: h, kind: FeatureKind::Ridge });
        }
    }

    ridges
}

use rayon::prelude::*;
use rl_core::{chunk_seed, ChunkCoord, NoiseChannel};
use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::fractal::height_at;
use crate::layers::ZoneTable;
use crate::macro_field::MacroField;
use crate::profile::Profile;

/// Sub-grid ranges narrower than this count as flat.
const FLAT_RANGE_EPSILON: f64 = 1e-6;

/// Configuration of micro chunk synthesis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// World units per chunk side.
    pub chunk_size: f64,
    /// Vertices per chunk side.
    pub resolution: usize,
    /// Samples per side of the coarse macro sub-grid.
    pub base_grid: usize,
    /// Sub-grid footprint relative to the chunk size.
    pub footprint_scale: f64,
    /// Macro weight in the chunk interior.
    pub interior_blend: f64,
    /// Fraction of the chunk extent over which the blend rises to 1.0.
    pub edge_band: f64,
    /// World-to-noise scale of the chunk detail channel.
    pub detail_frequency: f64,
    /// Base-surface slope (height per world unit) at which detail is fully attenuated.
    pub slope_limit: f64,
    /// Lower bound on the slope attenuation.
    pub min_attenuation: f64,
    /// Heights below this are raised to it (flat water).
    pub water_level: f64,
    pub zones: ZoneTable,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64.0,
            resolution: 65,
            base_grid: 17,
            footprint_scale: 1.2,
            interior_blend: 0.8,
            edge_band: 0.1,
            detail_frequency: 0.05,
            slope_limit: 1.5,
            min_attenuation: 0.2,
            water_level: 18.0,
            zones: ZoneTable::default(),
        }
    }
}

/// Macro samples over the chunk footprint, interpolated for every fine vertex.
struct BaseGrid {
    values: Vec<f64>,
    samples: usize,
    origin_x: f64,
    origin_z: f64,
    step: f64,
    min: f64,
    max: f64,
}

impl BaseGrid {
    fn sample(field: &MacroField, origin_x: f64, origin_z: f64, extent: f64, samples: usize) -> Self {
        let step = extent / (samples - 1) as f64;
        let mut values = Vec::with_capacity(samples * samples);
        for j in 0..samples {
            for i in 0..samples {
                values.push(field.sample(origin_x + i as f64 * step, origin_z + j as f64 * step));
            }
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &h| (lo.min(h), hi.max(h)));

        Self {
            values,
            samples,
            origin_x,
            origin_z,
            step,
            min,
            max,
        }
    }

    fn interpolate(&self, x: f64, z: f64) -> f64 {
        let last = (self.samples - 1) as f64;
        let gx = ((x - self.origin_x) / self.step).clamp(0.0, last);
        let gz = ((z - self.origin_z) / self.step).clamp(0.0, last);

        let i = (gx.floor() as usize).min(self.samples - 2);
        let j = (gz.floor() as usize).min(self.samples - 2);
        let tx = gx - i as f64;
        let tz = gz - j as f64;

        let row = j * self.samples;
        let h00 = self.values[row + i];
        let h10 = self.values[row + i + 1];
        let h01 = self.values[row + self.samples + i];
        let h11 = self.values[row + self.samples + i + 1];

        let top = h00 + (h10 - h00) * tx;
        let bottom = h01 + (h11 - h01) * tx;
        top + (bottom - top) * tz
    }

    /// Gradient magnitude of the interpolated surface (central differences).
    fn slope(&self, x: f64, z: f64) -> f64 {
        let d = self.step;
        let dx = (self.interpolate(x + d, z) - self.interpolate(x - d, z)) / (2.0 * d);
        let dz = (self.interpolate(x, z + d) - self.interpolate(x, z - d)) / (2.0 * d);
        (dx * dx + dz * dz).sqrt()
    }

    /// Height normalized to the sub-grid range; flat grids fall back to `scale`.
    fn normalize(&self, height: f64, scale: f64) -> f64 {
        let span = self.max - self.min;
        let normalized = if span > FLAT_RANGE_EPSILON {
            (height - self.min) / span
        } else if scale > 0.0 {
            height / scale
        } else {
            0.0
        };
        normalized.clamp(0.0, 1.0)
    }
}

/// Builds micro chunks on top of the macro field.
#[derive(Clone, Debug, Default)]
pub struct ChunkSynthesizer {
    config: ChunkConfig,
}

impl ChunkSynthesizer {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Macro weight for a vertex at normalized chunk position `(u, v)`.
    ///
    /// Constant in the interior and rising smoothly to exactly 1.0 on the boundary.
    pub fn blend_factor(&self, u: f64, v: f64) -> f64 {
        let edge_distance = u.min(1.0 - u).min(v).min(1.0 - v).max(0.0);
        let band = self.config.edge_band;
        if band <= 0.0 || edge_distance >= band {
            if edge_distance <= 0.0 {
                return 1.0;
            }
            return self.config.interior_blend;
        }

        let t = edge_distance / band;
        let s = t * t * (3.0 - 2.0 * t);
        1.0 + (self.config.interior_blend - 1.0) * s
    }

    /// Detail attenuation for a given base-surface slope.
    pub fn slope_attenuation(&self, slope: f64) -> f64 {
        if self.config.slope_limit <= 0.0 {
            return 1.0;
        }
        (1.0 - slope / self.config.slope_limit).clamp(self.config.min_attenuation, 1.0)
    }

    /// Synthesize the chunk at `coord`. Pure given the same inputs.
    pub fn synthesize(
        &self,
        coord: ChunkCoord,
        field: &MacroField,
        profile: &Profile,
        root_seed: u32,
    ) -> Chunk {
        let config = &self.config;
        let resolution = config.resolution.max(2);
        let size = config.chunk_size;
        let origin = coord.world_origin(size);

        // Expanded footprint so interpolation never starves at the edges.
        let footprint = size * config.footprint_scale.max(1.0);
        let margin = (footprint - size) * 0.5;
        let grid = BaseGrid::sample(
            field,
            origin.x - margin,
            origin.z - margin,
            footprint,
            config.base_grid.max(2),
        );

        let detail_channel = NoiseChannel::new(chunk_seed(coord, root_seed));
        let last = (resolution - 1) as f64;

        let mut heights = vec![0.0; resolution * resolution];
        heights
            .par_chunks_mut(resolution)
            .enumerate()
            .for_each(|(j, row)| {
                let v = j as f64 / last;
                let z = origin.z + size * v;
                let boundary_row = j == 0 || j == resolution - 1;

                for (i, cell) in row.iter_mut().enumerate() {
                    let u = i as f64 / last;
                    let x = origin.x + size * u;

                    // Boundary vertices are pinned to the shared macro surface.
                    let base = if boundary_row || i == 0 || i == resolution - 1 {
                        field.sample(x, z)
                    } else {
                        grid.interpolate(x, z)
                    };

                    let blend = self.blend_factor(u, v);
                    let zone = config
                        .zones
                        .classify(grid.normalize(base, profile.height_scale));
                    let detail = height_at(
                        x,
                        z,
                        &detail_channel,
                        &zone.detail.fractal(config.detail_frequency),
                        zone.detail.amplitude,
                    );
                    let offset = detail - zone.detail.amplitude * 0.5;
                    let attenuation = self.slope_attenuation(grid.slope(x, z));

                    *cell = base * blend + (base + offset * attenuation) * (1.0 - blend);
                }
            });

        for h in heights.iter_mut() {
            if *h < config.water_level {
                *h = config.water_level;
            }
        }

        for _ in 0..profile.smoothing_passes {
            smooth_interior(&mut heights, resolution);
        }

        Chunk::new(coord, origin.x, origin.z, size, resolution, heights)
    }
}

/// One in-place 3×3 box-filter pass over interior vertices.
///
/// Boundary vertices are left untouched so chunk edges keep matching their
/// neighbours.
fn smooth_interior(heights: &mut [f64], resolution: usize) {
    if resolution < 3 {
        return;
    }

    for j in 1..resolution - 1 {
        for i in 1..resolution - 1 {
            let mut sum = 0.0;
            for dj in 0..3 {
                let row = (j + dj - 1) * resolution;
                for di in 0..3 {
                    sum += heights[row + i + di - 1];
                }
            }
            heights[j * resolution + i] = sum / 9.0;
        }
    }
}

use bevy::log::debug;
use rayon::prelude::*;
use rl_core::NoiseChannel;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::fractal::{height_at, NonlinearScaling};
use crate::layers::{default_scale_layers, ScaleLayers};
use crate::profile::Profile;

/// Configuration of the coarse whole-world heightmap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MacroConfig {
    /// Samples per side of the stored grid.
    pub resolution: usize,
    /// World units covered by the grid, centered on the origin.
    pub world_size: f64,
    pub layers: ScaleLayers,
    pub scaling: NonlinearScaling,
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self {
            resolution: 257,
            world_size: 4096.0,
            layers: default_scale_layers(),
            scaling: NonlinearScaling::default(),
        }
    }
}

/// The weighted multi-scale composition behind the macro field.
///
/// Usable on its own, so heights exist anywhere even before (or outside) a
/// stored grid.
#[derive(Clone, Debug)]
pub struct MacroComposer {
    profile: Profile,
    layers: ScaleLayers,
    channels: Vec<NoiseChannel>,
    scaling: NonlinearScaling,
}

impl MacroComposer {
    pub fn new(profile: &Profile, root_seed: u32, config: &MacroConfig) -> Self {
        let channels = (0..config.layers.len())
            .map(|i| NoiseChannel::new(root_seed.wrapping_add(1 + i as u32)))
            .collect();

        Self {
            profile: profile.clone(),
            layers: config.layers.clone(),
            channels,
            scaling: config.scaling,
        }
    }

    /// Composite height at a world position.
    pub fn evaluate(&self, x: f64, z: f64) -> f64 {
        let base = self.profile.fractal();
        let mut sum = 0.0;
        let mut total_weight = 0.0;

        for (layer, channel) in self.layers.iter().zip(&self.channels) {
            let params = base.with_octaves(self.profile.octaves.min(layer.octave_cap));
            let h = height_at(
                x / layer.spatial_scale,
                z / layer.spatial_scale,
                channel,
                &params,
                self.profile.height_scale,
            );
            sum += h * layer.weight;
            total_weight += layer.weight;
        }

        if total_weight <= 0.0 {
            return 0.0;
        }

        self.scaling.scale(sum / total_weight, self.profile.height_scale)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Largest height the composition can produce.
    pub fn max_height(&self) -> f64 {
        self.profile.height_scale
    }
}

/// Coarse heightmap for one (seed, profile) pair. Read-only once built.
#[derive(Clone, Debug)]
pub struct MacroField {
    height_map: Vec<f64>,
    world_size: f64,
    resolution: usize,
    cell_size: f64,
    composer: MacroComposer,
}

impl MacroField {
    /// Evaluate the composition on every grid cell, rows in parallel.
    pub fn build(profile: &Profile, root_seed: u32, config: &MacroConfig) -> Self {
        let started = Instant::now();
        let composer = MacroComposer::new(profile, root_seed, config);
        let resolution = config.resolution.max(2);
        let cell_size = config.world_size / (resolution - 1) as f64;
        let half = config.world_size * 0.5;

        let mut height_map = vec![0.0; resolution * resolution];
        height_map
            .par_chunks_mut(resolution)
            .enumerate()
            .for_each(|(j, row)| {
                let z = -half + j as f64 * cell_size;
                for (i, cell) in row.iter_mut().enumerate() {
                    let x = -half + i as f64 * cell_size;
                    *cell = composer.evaluate(x, z);
                }
            });

        debug!(
            "Built {}x{} macro field for `{}` (seed {}) in {:.1?}",
            resolution,
            resolution,
            profile.name,
            root_seed,
            started.elapsed()
        );

        Self {
            height_map,
            world_size: config.world_size,
            resolution,
            cell_size,
            composer,
        }
    }

    /// Stored value at grid cell `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.resolution && j < self.resolution {
            Some(self.height_map[j * self.resolution + i])
        } else {
            None
        }
    }

    /// Smooth height at a world position.
    ///
    /// Bilinear over the four enclosing cells. Positions without four stored
    /// corners (outside the grid or on its far edge) are evaluated from the
    /// composition directly instead of extrapolated.
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let half = self.world_size * 0.5;
        let gx = (x + half) / self.cell_size;
        let gz = (z + half) / self.cell_size;
        let last = (self.resolution - 1) as f64;

        if !(gx >= 0.0 && gz >= 0.0 && gx < last && gz < last) {
            return self.composer.evaluate(x, z);
        }

        let i = gx.floor() as usize;
        let j = gz.floor() as usize;
        let tx = gx - i as f64;
        let tz = gz - j as f64;

        let row = j * self.resolution;
        let h00 = self.height_map[row + i];
        let h10 = self.height_map[row + i + 1];
        let h01 = self.height_map[row + self.resolution + i];
        let h11 = self.height_map[row + self.resolution + i + 1];

        let top = h00 + (h10 - h00) * tx;
        let bottom = h01 + (h11 - h01) * tx;
        top + (bottom - top) * tz
    }

    /// Whether a world position lies within the interpolable part of the grid.
    pub fn covers(&self, x: f64, z: f64) -> bool {
        let half = self.world_size * 0.5;
        x >= -half && z >= -half && x < half && z < half
    }

    pub fn composer(&self) -> &MacroComposer {
        &self.composer
    }

    pub fn profile(&self) -> &Profile {
        self.composer.profile()
    }

    pub fn height_map(&self) -> &[f64] {
        &self.height_map
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn world_size(&self) -> f64 {
        self.world_size
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// World position of grid cell `(i, j)`.
    pub fn cell_position(&self, i: usize, j: usize) -> (f64, f64) {
        let half = self.world_size * 0.5;
        (-half + i as f64 * self.cell_size, -half + j as f64 * self.cell_size)
    }

    /// Lowest and highest stored heights.
    pub fn height_range(&self) -> (f64, f64) {
        self.height_map
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> MacroConfig {
        MacroConfig {
            resolution: 33,
            world_size: 1024.0,
            ..MacroConfig::default()
        }
    }

    #[test]
    fn builds_expected_size() {
        let field = MacroField::build(&Profile::weathered_range(), 42, &small_config());
        assert_eq!(field.height_map().len(), 33 * 33);
        assert!((field.cell_size() - 32.0).abs() < 1e-12);
    }

    #[test]
    fn build_is_deterministic() {
        let a = MacroField::build(&Profile::weathered_range(), 42, &small_config());
        let b = MacroField::build(&Profile::weathered_range(), 42, &small_config());
        assert_eq!(a.height_map(), b.height_map());

        let c = MacroField::build(&Profile::weathered_range(), 43, &small_config());
        assert_ne!(a.height_map(), c.height_map());
    }

    #[test]
    fn heights_stay_within_profile_scale() {
        let profile = Profile::dramatic_range();
        let field = MacroField::build(&profile, 7, &small_config());
        let (lo, hi) = field.height_range();
        assert!(lo >= 0.0, "Lowest {} below zero", lo);
        assert!(hi <= profile.height_scale + 1e-9, "Highest {} above scale", hi);
    }

    #[test]
    fn sample_hits_grid_points() {
        let field = MacroField::build(&Profile::weathered_range(), 42, &small_config());
        let (x, z) = field.cell_position(10, 12);
        let stored = field.get(10, 12).unwrap();
        assert!((field.sample(x, z) - stored).abs() < 1e-9);
    }

    #[test]
    fn sample_interpolates_between_cells() {
        let field = MacroField::build(&Profile::weathered_range(), 42, &small_config());
        let (x0, z0) = field.cell_position(4, 4);
        let mid = field.sample(x0 + 16.0, z0);
        let a = field.get(4, 4).unwrap();
        let b = field.get(5, 4).unwrap();
        assert!((mid - (a + b) * 0.5).abs() < 1e-9);
    }

    #[test]
    fn outside_grid_falls_back_to_composition() {
        let field = MacroField::build(&Profile::weathered_range(), 42, &small_config());
        for (x, z) in [(5000.0, 0.0), (-700.0, 20.0), (512.0, 0.0), (0.0, -512.5), (1.0e6, -3.0e5)] {
            assert!(!field.covers(x, z));
            assert_eq!(field.sample(x, z), field.composer().evaluate(x, z));
        }
    }

    #[test]
    fn get_out_of_bounds_is_none() {
        let field = MacroField::build(&Profile::weathered_range(), 42, &small_config());
        assert!(field.get(33, 0).is_none());
        assert!(field.get(0, 33).is_none());
    }

    #[test]
    fn zero_weight_layers_yield_zero() {
        let mut config = small_config();
        for layer in config.layers.iter_mut() {
            layer.weight = 0.0;
        }
        let composer = MacroComposer::new(&Profile::weathered_range(), 42, &config);
        assert_eq!(composer.evaluate(10.0, 10.0), 0.0);
    }
}

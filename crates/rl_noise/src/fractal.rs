use rl_core::{GradientNoise, TerrainError};
use serde::{Deserialize, Serialize};

/// Parameters for one ridged multi-octave evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractalParams {
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub frequency: f64,
    pub ridge: f64,
    pub exponent: f64,
    /// Directional skew of the ridge fold; 0.0 is symmetric.
    pub asymmetry: f64,
}

impl FractalParams {
    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }
}

/// Ridged multifractal height at `(x, z)`.
///
/// Each octave folds the noise as `ridge - |n|` and squares it so ridges
/// come out sharp. The sum is normalized by the accumulated amplitude, raised
/// to `exponent` and scaled by `height_scale`. Zero octaves yield 0.0.
pub fn height_at<N>(x: f64, z: f64, channel: &N, params: &FractalParams, height_scale: f64) -> f64
where
    N: GradientNoise + ?Sized,
{
    if params.octaves == 0 {
        return 0.0;
    }

    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = params.frequency;
    let mut total_weight = 0.0;

    for _ in 0..params.octaves {
        let n = channel.sample(x * frequency, z * frequency);

        // Asymmetry stretches one side of the fold so one flank is steeper.
        let n = if n >= 0.0 {
            n * (1.0 + params.asymmetry)
        } else {
            n * (1.0 - params.asymmetry)
        };

        let signal = params.ridge - n.abs();
        value += signal * signal * amplitude;
        total_weight += amplitude;

        amplitude *= params.persistence;
        frequency *= params.lacunarity;
    }

    if total_weight <= 0.0 {
        return 0.0;
    }

    let normalized = (value / total_weight).max(0.0);
    normalized.powf(params.exponent) * height_scale
}

/// Piecewise peak exaggeration / lowland flattening curve.
///
/// Below `inflection` heights are compressed linearly by `flattening_factor`;
/// above it they are exaggerated by `exponent`. The curve is monotonic
/// non-decreasing for every valid parameter set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NonlinearScaling {
    pub enabled: bool,
    pub exponent: f64,
    pub inflection: f64,
    pub flattening_factor: f64,
}

impl Default for NonlinearScaling {
    fn default() -> Self {
        Self {
            enabled: true,
            exponent: 1.6,
            inflection: 0.35,
            flattening_factor: 0.25,
        }
    }
}

impl NonlinearScaling {
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            exponent: 1.0,
            inflection: 0.5,
            flattening_factor: 0.5,
        }
    }

    pub fn validate(&self) -> Result<(), TerrainError> {
        if !(self.inflection > 0.0 && self.inflection < 1.0) {
            return Err(TerrainError::InvalidScaling(format!(
                "inflection {} must lie in (0, 1)",
                self.inflection
            )));
        }
        if !(self.flattening_factor > 0.0 && self.flattening_factor < 1.0) {
            return Err(TerrainError::InvalidScaling(format!(
                "flattening factor {} must lie in (0, 1)",
                self.flattening_factor
            )));
        }
        if !(self.exponent > 0.0) {
            return Err(TerrainError::InvalidScaling(format!(
                "exponent {} must be positive",
                self.exponent
            )));
        }
        Ok(())
    }

    /// Remap `height` given the largest height the source can produce.
    pub fn scale(&self, height: f64, max_expected: f64) -> f64 {
        if !self.enabled || max_expected <= 0.0 {
            return height;
        }

        let normalized = (height / max_expected).max(0.0);
        let remapped = if normalized < self.inflection {
            normalized * self.flattening_factor / self.inflection
        } else {
            let t = (normalized - self.inflection) / (1.0 - self.inflection);
            self.flattening_factor + (1.0 - self.flattening_factor) * t.powf(self.exponent)
        };

        remapped * max_expected
    }
}

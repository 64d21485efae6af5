use rl_core::TerrainError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::fractal::FractalParams;

/// One band of the macro composition (continental, regional, local landforms).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseScaleLayer {
    /// World units covered by one noise period at the base frequency.
    pub spatial_scale: f64,
    pub weight: f64,
    /// Upper bound on the octaves this band evaluates.
    pub octave_cap: u32,
}

impl NoiseScaleLayer {
    pub const fn new(spatial_scale: f64, weight: f64, octave_cap: u32) -> Self {
        Self {
            spatial_scale,
            weight,
            octave_cap,
        }
    }
}

pub type ScaleLayers = SmallVec<[NoiseScaleLayer; 4]>;

/// Default three-band composition: large, medium and small landforms.
pub fn default_scale_layers() -> ScaleLayers {
    SmallVec::from_slice(&[
        NoiseScaleLayer::new(1800.0, 0.6, 8),
        NoiseScaleLayer::new(600.0, 0.3, 6),
        NoiseScaleLayer::new(180.0, 0.1, 4),
    ])
}

/// Detail-noise parameters attached to an elevation zone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetailParams {
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub ridge: f64,
    pub exponent: f64,
    /// Peak-to-valley height of the detail offset in world units.
    pub amplitude: f64,
}

impl DetailParams {
    /// Fractal parameters sampling at the given detail frequency.
    pub fn fractal(&self, frequency: f64) -> FractalParams {
        FractalParams {
            octaves: self.octaves,
            persistence: self.persistence,
            lacunarity: self.lacunarity,
            frequency,
            ridge: self.ridge,
            exponent: self.exponent,
            asymmetry: 0.0,
        }
    }
}

/// Named band of normalized height.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElevationZone {
    pub name: String,
    pub upper_threshold: f64,
    pub detail: DetailParams,
}

/// Ordered elevation zones partitioning normalized height `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ElevationZone>", into = "Vec<ElevationZone>")]
pub struct ZoneTable {
    zones: Vec<ElevationZone>,
}

impl ZoneTable {
    /// Thresholds must lie in `(0, 1]` and strictly increase.
    pub fn new(zones: Vec<ElevationZone>) -> Result<Self, TerrainError> {
        if zones.is_empty() {
            return Err(TerrainError::InvalidZones("at least one zone is required".into()));
        }

        let mut previous = 0.0;
        for zone in &zones {
            if !(zone.upper_threshold > previous && zone.upper_threshold <= 1.0) {
                return Err(TerrainError::InvalidZones(format!(
                    "zone `{}` threshold {} must exceed {} and be at most 1",
                    zone.name, zone.upper_threshold, previous
                )));
            }
            previous = zone.upper_threshold;
        }

        Ok(Self { zones })
    }

    /// Zone containing a normalized height. The last zone covers everything up to 1.0
    /// and beyond.
    pub fn classify(&self, normalized: f64) -> &ElevationZone {
        self.zones
            .iter()
            .find(|zone| normalized < zone.upper_threshold)
            .unwrap_or_else(|| &self.zones[self.zones.len() - 1])
    }

    pub fn zones(&self) -> &[ElevationZone] {
        &self.zones
    }
}

impl TryFrom<Vec<ElevationZone>> for ZoneTable {
    type Error = TerrainError;

    fn try_from(zones: Vec<ElevationZone>) -> Result<Self, Self::Error> {
        Self::new(zones)
    }
}

impl From<ZoneTable> for Vec<ElevationZone> {
    fn from(table: ZoneTable) -> Self {
        table.zones
    }
}

impl Default for ZoneTable {
    fn default() -> Self {
        let zone = |name: &str, upper_threshold: f64, detail: DetailParams| ElevationZone {
            name: name.to_string(),
            upper_threshold,
            detail,
        };

        Self {
            zones: vec![
                zone("water", 0.12, DetailParams {
                    octaves: 2,
                    persistence: 0.3,
                    lacunarity: 2.0,
                    ridge: 1.0,
                    exponent: 1.0,
                    amplitude: 0.5,
                }),
                zone("lowlands", 0.3, DetailParams {
                    octaves: 3,
                    persistence: 0.4,
                    lacunarity: 2.0,
                    ridge: 1.0,
                    exponent: 1.0,
                    amplitude: 3.0,
                }),
                zone("foothills", 0.55, DetailParams {
                    octaves: 4,
                    persistence: 0.5,
                    lacunarity: 2.0,
                    ridge: 1.0,
                    exponent: 1.2,
                    amplitude: 8.0,
                }),
                zone("mountains", 0.8, DetailParams {
                    octaves: 5,
                    persistence: 0.55,
                    lacunarity: 2.1,
                    ridge: 1.0,
                    exponent: 1.5,
                    amplitude: 16.0,
                }),
                zone("peaks", 1.0, DetailParams {
                    octaves: 6,
                    persistence: 0.6,
                    lacunarity: 2.2,
                    ridge: 1.0,
                    exponent: 2.0,
                    amplitude: 24.0,
                }),
            ],
        }
    }
}

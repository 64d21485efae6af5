use rl_core::TerrainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fractal::FractalParams;

/// Name of the profile used when nothing else is selected.
pub const DEFAULT_PROFILE: &str = "weathered_range";

/// Immutable parameter bundle describing one style of mountain terrain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub initial_frequency: f64,
    pub ridge: f64,
    pub exponent: f64,
    pub height_scale: f64,
    pub smoothing_passes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asymmetry: Option<f64>,
}

impl Profile {
    /// Old, eroded range: rounded crests, broad valleys.
    pub fn weathered_range() -> Self {
        Self {
            name: "weathered_range".to_string(),
            octaves: 6,
            persistence: 0.45,
            lacunarity: 2.0,
            initial_frequency: 1.0,
            ridge: 1.0,
            exponent: 1.3,
            height_scale: 240.0,
            smoothing_passes: 2,
            asymmetry: None,
        }
    }

    /// Young, steep range with knife-edge ridges.
    pub fn dramatic_range() -> Self {
        Self {
            name: "dramatic_range".to_string(),
            octaves: 8,
            persistence: 0.55,
            lacunarity: 2.1,
            initial_frequency: 1.2,
            ridge: 1.0,
            exponent: 2.2,
            height_scale: 420.0,
            smoothing_passes: 1,
            asymmetry: Some(0.25),
        }
    }

    pub fn rolling_foothills() -> Self {
        Self {
            name: "rolling_foothills".to_string(),
            octaves: 4,
            persistence: 0.4,
            lacunarity: 1.9,
            initial_frequency: 0.8,
            ridge: 0.9,
            exponent: 1.0,
            height_scale: 120.0,
            smoothing_passes: 3,
            asymmetry: None,
        }
    }

    pub fn jagged_alpine() -> Self {
        Self {
            name: "jagged_alpine".to_string(),
            octaves: 9,
            persistence: 0.6,
            lacunarity: 2.2,
            initial_frequency: 1.4,
            ridge: 1.0,
            exponent: 2.6,
            height_scale: 520.0,
            smoothing_passes: 0,
            asymmetry: Some(0.1),
        }
    }

    /// Fractal parameters for the profile's own octave stack.
    pub fn fractal(&self) -> FractalParams {
        FractalParams {
            octaves: self.octaves,
            persistence: self.persistence,
            lacunarity: self.lacunarity,
            frequency: self.initial_frequency,
            ridge: self.ridge,
            exponent: self.exponent,
            asymmetry: self.asymmetry.unwrap_or(0.0),
        }
    }

    pub fn validate(&self) -> Result<(), TerrainError> {
        let invalid = |reason: &str| TerrainError::InvalidProfile {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.octaves == 0 {
            return Err(invalid("octaves must be at least 1"));
        }
        if !(self.persistence > 0.0 && self.persistence < 1.0) {
            return Err(invalid("persistence must lie in (0, 1)"));
        }
        if !(self.lacunarity >= 1.0) {
            return Err(invalid("lacunarity must be >= 1"));
        }
        if !(self.initial_frequency > 0.0) {
            return Err(invalid("initial frequency must be positive"));
        }
        if !(self.exponent > 0.0) {
            return Err(invalid("exponent must be positive"));
        }
        if !(self.height_scale > 0.0) {
            return Err(invalid("height scale must be positive"));
        }
        if let Some(asymmetry) = self.asymmetry {
            if !(-1.0..=1.0).contains(&asymmetry) {
                return Err(invalid("asymmetry must lie in [-1, 1]"));
            }
        }
        Ok(())
    }

    /// Per-field linear interpolation between two profiles.
    ///
    /// Integer fields are interpolated and rounded. An optional field present
    /// in only one profile passes through unchanged.
    pub fn blend(a: &Profile, b: &Profile, factor: f64) -> Profile {
        let t = factor.clamp(0.0, 1.0);
        let lerp = |x: f64, y: f64| x + (y - x) * t;
        let lerp_u32 = |x: u32, y: u32| lerp(x as f64, y as f64).round() as u32;

        let name = if a.name == b.name {
            a.name.clone()
        } else {
            format!("{}~{}", a.name, b.name)
        };

        let asymmetry = match (a.asymmetry, b.asymmetry) {
            (Some(x), Some(y)) => Some(lerp(x, y)),
            (Some(x), None) => Some(x),
            (None, Some(y)) => Some(y),
            (None, None) => None,
        };

        Profile {
            name,
            octaves: lerp_u32(a.octaves, b.octaves),
            persistence: lerp(a.persistence, b.persistence),
            lacunarity: lerp(a.lacunarity, b.lacunarity),
            initial_frequency: lerp(a.initial_frequency, b.initial_frequency),
            ridge: lerp(a.ridge, b.ridge),
            exponent: lerp(a.exponent, b.exponent),
            height_scale: lerp(a.height_scale, b.height_scale),
            smoothing_passes: lerp_u32(a.smoothing_passes, b.smoothing_passes),
            asymmetry,
        }
    }
}

/// Named registry of terrain profiles.
#[derive(Clone, Debug)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileRegistry {
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    /// Registry with the four built-in presets.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for profile in [
            Profile::weathered_range(),
            Profile::dramatic_range(),
            Profile::rolling_foothills(),
            Profile::jagged_alpine(),
        ] {
            registry.profiles.insert(profile.name.clone(), profile);
        }
        registry
    }

    /// Add or replace a profile after validating it.
    pub fn register(&mut self, profile: Profile) -> Result<(), TerrainError> {
        profile.validate()?;
        self.profiles.insert(profile.name.clone(), profile);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Profile, TerrainError> {
        self.profiles
            .get(name)
            .ok_or_else(|| TerrainError::UnknownProfile(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Blend two registered profiles into an ephemeral, unregistered profile.
    pub fn blend(&self, a: &str, b: &str, factor: f64) -> Result<Profile, TerrainError> {
        Ok(Profile::blend(self.get(a)?, self.get(b)?, factor))
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_numeric_eq(a: &Profile, b: &Profile) {
        assert_eq!(a.octaves, b.octaves);
        assert_eq!(a.smoothing_passes, b.smoothing_passes);
        for (x, y) in [
            (a.persistence, b.persistence),
            (a.lacunarity, b.lacunarity),
            (a.initial_frequency, b.initial_frequency),
            (a.ridge, b.ridge),
            (a.exponent, b.exponent),
            (a.height_scale, b.height_scale),
        ] {
            assert!((x - y).abs() < 1e-12, "{} != {}", x, y);
        }
    }

    #[test]
    fn builtins_are_valid() {
        let registry = ProfileRegistry::with_builtins();
        assert!(registry.contains(DEFAULT_PROFILE));
        for name in registry.names() {
            registry.get(name).unwrap().validate().unwrap();
        }
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let registry = ProfileRegistry::with_builtins();
        assert_eq!(
            registry.get("flatlands").unwrap_err(),
            TerrainError::UnknownProfile("flatlands".to_string())
        );
    }

    #[test]
    fn self_blend_is_identity() {
        let registry = ProfileRegistry::with_builtins();
        let a = registry.get("weathered_range").unwrap();
        let blended = registry.blend("weathered_range", "weathered_range", 0.5).unwrap();
        assert_numeric_eq(&blended, a);
        assert_eq!(blended.name, a.name);
    }

    #[test]
    fn blend_endpoints_match_sources() {
        let registry = ProfileRegistry::with_builtins();
        let a = registry.get("weathered_range").unwrap();
        let b = registry.get("dramatic_range").unwrap();

        assert_numeric_eq(&registry.blend("weathered_range", "dramatic_range", 0.0).unwrap(), a);
        assert_numeric_eq(&registry.blend("weathered_range", "dramatic_range", 1.0).unwrap(), b);
    }

    #[test]
    fn optional_fields_pass_through() {
        let a = Profile::weathered_range();
        let b = Profile::dramatic_range();
        assert_eq!(Profile::blend(&a, &b, 0.0).asymmetry, b.asymmetry);

        let c = Profile::jagged_alpine();
        let mixed = Profile::blend(&b, &c, 0.5).asymmetry.unwrap();
        assert!((mixed - 0.175).abs() < 1e-12);
    }

    #[test]
    fn blend_factor_is_clamped() {
        let a = Profile::weathered_range();
        let b = Profile::dramatic_range();
        assert_numeric_eq(&Profile::blend(&a, &b, 3.0), &b);
        assert_numeric_eq(&Profile::blend(&a, &b, -1.0), &a);
    }

    #[test]
    fn register_rejects_zero_octaves() {
        let mut registry = ProfileRegistry::empty();
        let profile = Profile {
            octaves: 0,
            ..Profile::weathered_range()
        };
        assert!(matches!(
            registry.register(profile),
            Err(TerrainError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn register_replaces_existing() {
        let mut registry = ProfileRegistry::with_builtins();
        let profile = Profile {
            height_scale: 999.0,
            ..Profile::weathered_range()
        };
        registry.register(profile).unwrap();
        assert_eq!(registry.get("weathered_range").unwrap().height_scale, 999.0);
    }
}

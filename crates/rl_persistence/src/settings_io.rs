use rl_core::TerrainError;
use rl_noise::{Profile, ProfileRegistry, DEFAULT_PROFILE};
use rl_stream::{StreamSettings, WorldContext};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default directory for terrain settings files.
pub const SETTINGS_DIR: &str = "assets/terrain";

/// Error type for settings I/O operations.
#[derive(Debug, Error)]
pub enum SettingsIoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON serialization error: {0}")]
    Ron(#[from] ron::Error),
    #[error("RON parse error: {0}")]
    RonSpanned(#[from] ron::error::SpannedError),
    #[error("no settings named `{name}` (available: {})", available.join(", "))]
    NotFound { name: String, available: Vec<String> },
}

/// Everything needed to start a terrain session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainSettings {
    pub root_seed: u32,
    pub initial_profile: String,
    /// Profiles registered on top of the built-in presets.
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub stream: StreamSettings,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            root_seed: 42,
            initial_profile: DEFAULT_PROFILE.to_string(),
            profiles: Vec::new(),
            stream: StreamSettings::default(),
        }
    }
}

impl TerrainSettings {
    /// Built-in presets plus the extra profiles. Extras replace presets of the same name.
    pub fn registry(&self) -> Result<ProfileRegistry, TerrainError> {
        let mut registry = ProfileRegistry::with_builtins();
        for profile in &self.profiles {
            registry.register(profile.clone())?;
        }
        Ok(registry)
    }

    /// Validate and build the world context for the initial profile.
    pub fn context(&self) -> Result<WorldContext, TerrainError> {
        self.stream.macro_field.scaling.validate()?;
        WorldContext::new(self.registry()?, &self.initial_profile, self.root_seed)
    }
}

/// Save terrain settings to a RON file.
pub fn save_settings(path: &Path, settings: &TerrainSettings) -> Result<(), SettingsIoError> {
    let pretty_config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .separate_tuple_members(true);

    let ron_string = ron::ser::to_string_pretty(settings, pretty_config)?;
    fs::write(path, ron_string)?;
    Ok(())
}

/// Load terrain settings from a RON file.
pub fn load_settings(path: &Path) -> Result<TerrainSettings, SettingsIoError> {
    let contents = fs::read_to_string(path)?;
    let settings: TerrainSettings = ron::from_str(&contents)?;
    Ok(settings)
}

/// Names (file stems) of the settings files in `dir`, sorted. A missing
/// directory holds none.
pub fn available_settings(dir: &Path) -> Result<Vec<String>, std::io::Error> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "ron"))
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .collect();
    names.sort();
    Ok(names)
}

/// File name for a settings name: lowercased, with anything outside
/// `[alphanumeric, '-', '_']` replaced by `_`.
pub fn settings_filename(name: &str) -> String {
    let mut stem: String = name
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_') { c } else { '_' })
        .collect();
    if stem.is_empty() {
        stem.push_str("terrain");
    }
    stem + ".ron"
}

/// Path of the named settings file inside `dir`.
pub fn settings_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(settings_filename(name))
}

/// Resolve a command-line settings argument.
///
/// An existing file is used as given; anything else is treated as a settings
/// name inside `dir`. Unknown names report what `dir` does contain.
pub fn resolve_settings(dir: &Path, arg: &str) -> Result<PathBuf, SettingsIoError> {
    let direct = Path::new(arg);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }

    let named = settings_path(dir, arg);
    if named.is_file() {
        return Ok(named);
    }

    Err(SettingsIoError::NotFound {
        name: arg.to_string(),
        available: available_settings(dir)?,
    })
}

/// Write `settings` under `name` in `dir`, creating the directory if needed.
pub fn init_settings(dir: &Path, name: &str, settings: &TerrainSettings) -> Result<PathBuf, SettingsIoError> {
    fs::create_dir_all(dir)?;
    let path = settings_path(dir, name);
    save_settings(&path, settings)?;
    Ok(path)
}

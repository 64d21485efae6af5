//! RON persistence for terrain settings.

pub mod settings_io;

pub use settings_io::{
    available_settings, init_settings, load_settings, resolve_settings, save_settings,
    settings_filename, settings_path, SettingsIoError, TerrainSettings, SETTINGS_DIR,
};

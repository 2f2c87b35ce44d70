pub mod state;

pub use state::{AppSettings, SettingsError, SettingsStore, extract_settings, settings_json};

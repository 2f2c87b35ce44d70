use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use threadline_chat::{ControllerConfig, DEFAULT_ECHO_PREFIX, DEFAULT_LOAD_DELAY_MS, EchoResponder};

pub const SETTINGS_DIRECTORY_NAME: &str = "threadline";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const SETTINGS_ENV_PREFIX: &str = "THREADLINE_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_load_delay_ms")]
    pub load_delay_ms: u64,
    #[serde(default = "default_reply_prefix")]
    pub reply_prefix: String,
    #[serde(default = "default_initial_sessions")]
    pub initial_sessions: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            load_delay_ms: default_load_delay_ms(),
            reply_prefix: default_reply_prefix(),
            initial_sessions: default_initial_sessions(),
        }
    }
}

impl AppSettings {
    /// Trims session ids and drops blank or repeated ones, keeping first occurrence order.
    pub fn normalized(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.initial_sessions.len());
        for id in self.initial_sessions {
            let id = id.trim().to_string();
            if id.is_empty() || seen.contains(&id) {
                continue;
            }
            seen.push(id);
        }
        self.initial_sessions = seen;
        self
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::default().with_load_delay(Duration::from_millis(self.load_delay_ms))
    }

    pub fn reply_generator(&self) -> EchoResponder {
        EchoResponder::with_prefix(self.reply_prefix.clone())
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<AppSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".threadline"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn settings(&self) -> Arc<AppSettings> {
        self.settings.load_full()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Re-reads the settings file, keeping the current settings on failure.
    ///
    /// Only the load delay and reply prefix reach a running controller; the
    /// initial session list is read once at startup.
    pub fn reload(&self) -> Result<Arc<AppSettings>, SettingsError> {
        let settings = Arc::new(extract_settings(&self.config_path)?);
        self.settings.store(settings.clone());
        tracing::info!("reloaded settings from {:?}", self.config_path);
        Ok(settings)
    }

    fn load_from_disk(path: &Path) -> AppSettings {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
        }

        match extract_settings(path) {
            Ok(settings) => settings,
            Err(error) => {
                tracing::warn!("{error}. using defaults");
                AppSettings::default()
            }
        }
    }
}

/// Layers defaults, the JSON file at `path` and `THREADLINE_*` environment variables.
pub fn extract_settings(path: &Path) -> Result<AppSettings, SettingsError> {
    extract_settings_with_env(path, SETTINGS_ENV_PREFIX)
}

fn extract_settings_with_env(path: &Path, env_prefix: &str) -> Result<AppSettings, SettingsError> {
    settings_figment(path, env_prefix)
        .extract::<AppSettings>()
        .map(AppSettings::normalized)
        .context(ExtractSnafu {
            stage: "extract-settings",
            path: path.to_path_buf(),
        })
}

fn settings_figment(path: &Path, env_prefix: &str) -> Figment {
    Figment::from(Serialized::defaults(AppSettings::default()))
        .merge(Json::file(path))
        .merge(Env::prefixed(env_prefix))
}

/// Effective settings as pretty JSON, as printed by `--print-config`.
pub fn settings_json(settings: &AppSettings) -> Result<String, SettingsError> {
    serde_json::to_string_pretty(settings).context(SerializeSnafu {
        stage: "print-settings",
    })
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to parse settings from {path:?} on `{stage}`: {source}"))]
    Extract {
        stage: &'static str,
        path: PathBuf,
        #[snafu(source(from(figment::Error, Box::new)))]
        source: Box<figment::Error>,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    Serialize {
        stage: &'static str,
        source: serde_json::Error,
    },
}

fn default_load_delay_ms() -> u64 {
    DEFAULT_LOAD_DELAY_MS
}

fn default_reply_prefix() -> String {
    DEFAULT_ECHO_PREFIX.to_string()
}

fn default_initial_sessions() -> Vec<String> {
    vec!["General".to_string(), "Scratch".to_string()]
}

//! Application configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ai::AiSettings;
use crate::error::{NeoError, NeoResult};
use crate::session::{AppContext, Session, Theme};

static DEFAULT_DATA_FILE: &str = "~/.neomind/events.json";
static DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
static DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
static DEFAULT_PLACEHOLDER_DELAY: &str = "1s";
const DEFAULT_PORT: u16 = 4097;

fn default_user_id() -> String {
    "local".to_string()
}

fn default_display_name() -> String {
    "You".to_string()
}

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

fn default_openai_endpoint() -> String {
    DEFAULT_OPENAI_ENDPOINT.to_string()
}

fn default_placeholder_delay() -> String {
    DEFAULT_PLACEHOLDER_DELAY.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Configuration at ~/.config/neomind/config.toml, overridable with
/// `NEOMIND_*` environment variables (e.g. `NEOMIND_OPENAI_API_KEY`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeomindConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default = "default_display_name")]
    pub display_name: String,

    #[serde(default)]
    pub theme: Theme,

    /// IANA zone name. Falls back to the system zone, then UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_openai_endpoint")]
    pub openai_endpoint: String,

    /// How long placeholder AI responses take without an API key.
    #[serde(default = "default_placeholder_delay")]
    pub placeholder_delay: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for NeomindConfig {
    fn default() -> Self {
        NeomindConfig {
            user_id: default_user_id(),
            display_name: default_display_name(),
            theme: Theme::default(),
            timezone: None,
            data_file: default_data_file(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            openai_endpoint: default_openai_endpoint(),
            placeholder_delay: default_placeholder_delay(),
            port: default_port(),
        }
    }
}

impl NeomindConfig {
    pub fn config_path() -> NeoResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| NeoError::Config("Could not determine config directory".into()))?
            .join("neomind");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a default file first if
    /// there is none.
    pub fn load() -> NeoResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> NeoResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("NEOMIND").try_parsing(true))
            .build()
            .map_err(|e| NeoError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| NeoError::Config(e.to_string()))
    }

    pub fn create_default_config(path: &Path) -> NeoResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&NeomindConfig::default())
            .map_err(|e| NeoError::Serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn session(&self) -> Session {
        Session::new(self.user_id.clone(), self.display_name.clone())
    }

    pub fn context(&self) -> AppContext {
        AppContext {
            session: self.session(),
            theme: self.theme,
        }
    }

    pub fn timezone(&self) -> NeoResult<Tz> {
        if let Some(name) = &self.timezone {
            return name
                .parse::<Tz>()
                .map_err(|e| NeoError::Config(format!("Invalid timezone '{}': {}", name, e)));
        }

        Ok(iana_time_zone::get_timezone()
            .ok()
            .and_then(|name| name.parse::<Tz>().ok())
            .unwrap_or(Tz::UTC))
    }

    /// Event data file with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_file.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn placeholder_delay(&self) -> NeoResult<Duration> {
        humantime::parse_duration(&self.placeholder_delay).map_err(|e| {
            NeoError::Config(format!(
                "Invalid placeholder_delay '{}': {}",
                self.placeholder_delay, e
            ))
        })
    }

    pub fn ai_settings(&self) -> NeoResult<AiSettings> {
        Ok(AiSettings {
            api_key: self.openai_api_key.clone(),
            model: self.openai_model.clone(),
            endpoint: self.openai_endpoint.clone(),
            placeholder_delay: self.placeholder_delay()?,
        })
    }
}

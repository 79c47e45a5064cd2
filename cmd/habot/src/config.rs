//! Configuration file handling.
//!
//! Configuration is stored in ~/.habot/config.yaml. Subscription keys may be
//! left out of the file and supplied through the environment instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use habot_bot::WorkflowConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".habot";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

pub const ENV_SPEAKER_KEY: &str = "HABOT_SPEAKER_KEY";
pub const ENV_SENTIMENT_KEY: &str = "HABOT_SENTIMENT_KEY";
pub const ENV_SPEECH_KEY: &str = "HABOT_SPEECH_KEY";

/// One Cognitive Services endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL (optional, uses the service default if empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    /// Subscription key.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,

    /// Maximum number of retries of rate-limited or failed requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

/// Speech-to-text endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(flatten)]
    pub service: ServiceConfig,

    /// WebSocket base URL (optional).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ws_endpoint: String,
}

/// Conversation record storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Records live in memory and are lost on exit.
    #[default]
    Memory,
    /// Records are kept in a redb database file.
    Redb { path: PathBuf },
}

/// HTTP webhook settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:3978".to_string()
}

/// Complete configuration of the habot host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub speaker: ServiceConfig,

    #[serde(default)]
    pub sentiment: ServiceConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Name to profile id table. Replaces the built-in demo identities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identities: Option<BTreeMap<String, Uuid>>,
}

impl Config {
    /// Gets the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(DEFAULT_CONFIG_FILE))
    }

    /// Resolves the config path from an optional override.
    pub fn resolve_path(custom: Option<&str>) -> Result<PathBuf> {
        match custom {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path().context("cannot determine config path"),
        }
    }

    /// Loads the file at `path`, or the defaults when it does not exist, then
    /// applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut cfg = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            serde_yaml::from_str(&content).with_context(|| format!("parse {}", path.display()))?
        } else {
            Config::default()
        };
        cfg.apply_env(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Writes the configuration to `path`, creating its directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Overrides subscription keys from the environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let keys = [
            (ENV_SPEAKER_KEY, &mut self.speaker.key),
            (ENV_SENTIMENT_KEY, &mut self.sentiment.key),
            (ENV_SPEECH_KEY, &mut self.speech.service.key),
        ];
        for (name, slot) in keys {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }
    }

    /// Returns a copy with subscription keys masked for display.
    pub fn masked(&self) -> Self {
        let mut cfg = self.clone();
        for key in [
            &mut cfg.speaker.key,
            &mut cfg.sentiment.key,
            &mut cfg.speech.service.key,
        ] {
            *key = mask_key(key);
        }
        cfg
    }
}

/// Masks a key for display.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
    }
}

// Application configuration
//
// Read from a TOML file (default: <config dir>/gamer-dl/config.toml). A
// missing file means defaults; the Firebase API key can also come from
// GAMERDL_FIREBASE_API_KEY.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_COOKIES_FILE: &str = "youtube.com_cookies.txt";
pub const API_KEY_ENV: &str = "GAMERDL_FIREBASE_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Identity provider project settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Netscape cookie jar handed to yt-dlp
    pub cookies_file: PathBuf,
    /// Explicit yt-dlp executable; searched for when unset
    pub ytdlp_path: Option<String>,
    pub thumbnail_timeout_secs: u64,
    pub firebase: FirebaseConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cookies_file: PathBuf::from(DEFAULT_COOKIES_FILE),
            ytdlp_path: None,
            thumbnail_timeout_secs: 10,
            firebase: FirebaseConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gamer-dl").join("config.toml"))
    }

    /// Load `path`, or the default location when `None`. Environment
    /// overrides are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);

        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.firebase.api_key = Some(key);
        }
    }

    pub fn thumbnail_timeout(&self) -> Duration {
        Duration::from_secs(self.thumbnail_timeout_secs)
    }
}

//! Runtime configuration.
//!
//! Credentials are read once at startup. Later sources win:
//! built-in defaults, then `config.toml`, then the environment.
//!
//! ```toml
//! api_key = "AIza..."
//! client_id = "1234-abc.apps.googleusercontent.com"
//!
//! [defaults]
//! max_results = 24
//! order = "date"
//! region_code = "GB"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::model::{Order, ResultType, SearchParams};

pub const ENV_API_KEY: &str = "YOUTUBE_API_KEY";
pub const ENV_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
pub const ENV_REGION: &str = "TUBESEARCH_REGION";

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set (environment or config file)")]
    Missing(&'static str),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_key: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    api_base_url: Option<String>,
    #[serde(default)]
    defaults: FormDefaults,
}

/// Initial form values.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FormDefaults {
    pub max_results: Option<u32>,
    pub order: Option<Order>,
    pub result_type: Option<ResultType>,
    pub region_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Key sent with every search request.
    pub api_key: String,
    /// OAuth client identifier of a "Desktop app" client.
    pub client_id: String,
    /// Google issues a (non-confidential) secret for desktop clients too.
    pub client_secret: Option<String>,
    pub api_base_url: String,
    pub defaults: FormDefaults,
}

impl Config {
    /// `config.toml` in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tubesearch").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path` (or the default location) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        Self::load_with(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Load with an explicit environment lookup.
    ///
    /// A missing file at the default location is not an error; the caller
    /// can still supply everything through the environment.
    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match path {
            Some(path) if path.exists() => read_file(path)?,
            _ => FileConfig::default(),
        };
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_key = env(ENV_API_KEY)
            .or(file.api_key)
            .ok_or(ConfigError::Missing(ENV_API_KEY))?;
        let client_id = env(ENV_CLIENT_ID)
            .or(file.client_id)
            .ok_or(ConfigError::Missing(ENV_CLIENT_ID))?;
        let client_secret = env(ENV_CLIENT_SECRET).or(file.client_secret);

        let mut defaults = file.defaults;
        if let Some(region) = env(ENV_REGION) {
            defaults.region_code = Some(region);
        }

        Ok(Self {
            api_key,
            client_id,
            client_secret,
            api_base_url: file
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            defaults,
        })
    }

    /// Fresh form state seeded from the configured defaults.
    pub fn default_params(&self) -> SearchParams {
        let mut params = SearchParams::default();
        if let Some(max) = self.defaults.max_results {
            params.max_results = max;
        }
        if let Some(order) = self.defaults.order {
            params.order = order;
        }
        if let Some(result_type) = self.defaults.result_type {
            params.result_type = result_type;
        }
        if let Some(region) = &self.defaults.region_code {
            params.region_code = region.clone();
        }
        params
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fmt, fs};
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {key} value '{value}'")]
    InvalidVar { key: &'static str, value: String },

    #[error("MONGO_HOST must be set when the mongo backend is selected")]
    MissingMongoHost,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Mongo,
    Jsonl,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Mongo => write!(f, "mongo"),
            Backend::Jsonl => write!(f, "jsonl"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    /// Only ever taken from the environment
    #[serde(skip)]
    pub mongo_host: Option<String>,
    pub database: String,
    pub collection: String,
    pub jsonl_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Mongo,
            mongo_host: None,
            database: "grocery-db".to_string(),
            collection: "item".to_string(),
            jsonl_path: PathBuf::from("data/items.jsonl"),
        }
    }
}

impl AppConfig {
    /// Read the TOML file named by `CONFIG_PATH` (if any), then apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Missing file means all defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config file {:?}", path);
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidVar { key: "PORT", value: port })?;
        }
        if let Some(backend) = lookup("STORAGE_BACKEND") {
            self.storage.backend = match backend.to_ascii_lowercase().as_str() {
                "mongo" => Backend::Mongo,
                "jsonl" => Backend::Jsonl,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        key: "STORAGE_BACKEND",
                        value: backend,
                    });
                }
            };
        }
        if let Some(host) = lookup("MONGO_HOST").filter(|h| !h.trim().is_empty()) {
            self.storage.mongo_host = Some(host);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == Backend::Mongo && self.storage.mongo_host.is_none() {
            return Err(ConfigError::MissingMongoHost);
        }
        Ok(())
    }
}

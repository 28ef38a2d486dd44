use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::dispatch::DEFAULT_MODEL;
use crate::error::{GeoMeshError, Result};
use crate::geo::DistanceMetric;
use crate::transport::OPENAI_BASE_URL;

const PLACEHOLDER_API_KEY: &str = "PLACEHOLDER_OPENAI_API_KEY";

/// Main configuration structure for geomesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub openai: OpenAIConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP page and API listen on
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// CSV file with one facility per row
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub metric: DistanceMetric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: "school_geolocation.csv".to_string(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: PLACEHOLDER_API_KEY.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a config - call [`Config::validate`] before use
    pub fn load() -> Self {
        let env_paths = [".env", "../.env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }

        if !env_loaded {
            tracing::warn!("No .env file found - continuing with env vars only");
        }

        let config_path =
            env::var("GEOMESH_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse config file {}: {} - using defaults",
                            config_path,
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::info!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup("GEOMESH_BIND") {
            self.server.bind = bind;
        }
        if let Some(path) = lookup("GEOMESH_DATASET") {
            self.dataset.path = path;
        }
        if let Some(metric) = lookup("GEOMESH_METRIC") {
            match metric.parse::<DistanceMetric>() {
                Ok(metric) => self.index.metric = metric,
                Err(e) => tracing::warn!("Ignoring GEOMESH_METRIC: {}", e),
            }
        }

        if let Some(api_key) = lookup("OPENAI_API_KEY") {
            self.openai.api_key = api_key;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.openai.model = model;
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            self.openai.base_url = base_url;
        }
    }

    /// Validate configuration. A missing API key is fatal at startup.
    pub fn validate(&self) -> Result<()> {
        let key = self.openai.api_key.trim();
        if key.is_empty() || key == PLACEHOLDER_API_KEY {
            return Err(GeoMeshError::MissingCredential("OPENAI_API_KEY".to_string()));
        }
        if self.openai.model.trim().is_empty() {
            return Err(GeoMeshError::Config("openai.model cannot be empty".to_string()));
        }
        if self.openai.base_url.trim().is_empty() {
            return Err(GeoMeshError::Config("openai.base_url cannot be empty".to_string()));
        }
        if self.dataset.path.trim().is_empty() {
            return Err(GeoMeshError::Config("dataset.path cannot be empty".to_string()));
        }
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(GeoMeshError::Config(format!(
                "server.bind '{}' is not a host:port address",
                self.server.bind
            )));
        }
        Ok(())
    }
}

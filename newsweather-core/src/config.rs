use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::{
    model::{Coordinates, LocationContext, Place},
    provider::{
        ProviderId,
        gnews::{DEFAULT_LANG, DEFAULT_MAX},
    },
};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// News search parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsConfig {
    pub lang: String,
    pub max: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self { lang: DEFAULT_LANG.to_string(), max: DEFAULT_MAX }
    }
}

/// How device location is obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    /// Use the configured coordinates.
    #[default]
    Fixed,
    /// Estimate coordinates from the public IP address.
    Ip,
    /// Start on the fallback location until access is explicitly enabled.
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocationConfig {
    #[serde(default)]
    pub mode: LocationMode,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationConfig {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

/// Override for the built-in fallback location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub city: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP request timeout for every provider call.
    pub request_timeout_secs: Option<u64>,

    /// Example TOML:
    /// [providers.gnews]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub news: NewsConfig,

    #[serde(default)]
    pub location: LocationConfig,

    pub fallback: Option<FallbackConfig>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "newsweather", "newsweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    /// API key stored in the config file, ignoring the environment.
    pub fn stored_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    /// API key for a provider; the environment variable wins over the file.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<String> {
        std::env::var(provider_id.env_var())
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.stored_api_key(provider_id).map(str::to_owned))
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// The context used whenever device location is unavailable.
    pub fn fallback_context(&self) -> LocationContext {
        match &self.fallback {
            Some(fb) => LocationContext::fallback_at(
                Coordinates::new(fb.latitude, fb.longitude),
                Place::new(fb.country.clone(), fb.city.clone()),
            ),
            None => LocationContext::default(),
        }
    }
}

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::city::City;

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Key used when nothing is configured. The provider rejects it, which lets
/// the dashboard run end to end (showing the error snapshot) during local
/// development.
pub const PLACEHOLDER_API_KEY: &str = "demo_key";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_KEEPALIVE_URL: &str = "https://pogoda34-bot.onrender.com/";

/// Weather provider connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub units: String,
    pub language: String,
    pub request_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            units: "metric".to_string(),
            language: "ru".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl ProviderSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Auto-refresh cadence. Zero values in the file are raised to a usable minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    pub interval_secs: u64,
    pub tick_millis: u64,
    /// Upper bound for one whole fetch, all tiers included.
    pub fetch_deadline_secs: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_secs: 15 * 60,
            tick_millis: 1000,
            fetch_deadline_secs: 30,
        }
    }
}

impl RefreshSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }

    pub fn fetch_deadline(&self) -> Duration {
        Duration::from_secs(self.fetch_deadline_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepAliveSettings {
    pub enabled: bool,
    pub url: String,
}

impl Default for KeepAliveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_KEEPALIVE_URL.to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "Камышин"
///
/// [refresh]
/// interval_secs = 900
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    /// Display name of the city opened on start, e.g. "Волгоград".
    pub default_city: Option<String>,
    pub provider: ProviderSettings,
    pub refresh: RefreshSettings,
    pub keepalive: KeepAliveSettings,
}

impl Config {
    /// Default city as a strongly-typed `City`, falling back to Волгоград.
    pub fn default_city(&self) -> Result<City> {
        match self.default_city.as_deref() {
            Some(name) => City::try_from(name).with_context(|| {
                format!("Invalid default_city in {}", display_path(Self::config_file_path()))
            }),
            None => Ok(City::default()),
        }
    }

    pub fn set_default_city(&mut self, city: City) {
        self.default_city = Some(city.as_str().to_string());
    }

    /// API key to send, taking the environment override into account.
    pub fn api_key(&self) -> String {
        resolve_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Keep-alive URL, or `None` when the ping is switched off.
    pub fn keepalive_url(&self) -> Option<&str> {
        let url = self.keepalive.url.trim();
        (self.keepalive.enabled && !url.is_empty()).then_some(url)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
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

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "pogoda34", "forecast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn resolve_api_key(env: Option<String>, configured: Option<&str>) -> String {
    if let Some(key) = env.filter(|k| !k.trim().is_empty()) {
        return key.trim().to_string();
    }
    if let Some(key) = configured.filter(|k| !k.trim().is_empty()) {
        return key.trim().to_string();
    }
    tracing::warn!(
        "No API key configured; using placeholder. Set {API_KEY_ENV} or run `forecast configure`."
    );
    PLACEHOLDER_API_KEY.to_string()
}

fn display_path(path: Result<PathBuf>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|_| "config".to_string())
}

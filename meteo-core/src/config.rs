use anyhow::{Context, anyhow};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::{
    classify::ColorThresholds,
    error::{Error, Result},
    model::Slot,
    provider::{ProviderId, Region},
};

pub const DEFAULT_TIMEZONE: &str = "Europe/Rome";
pub const DEFAULT_COUNTRY: &str = "IT";

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather" or "openmeteo".
    pub default_provider: Option<String>,

    /// IANA zone target dates and forecast hours are read in. Defaults to Europe/Rome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// ISO country code passed to geocoding. Defaults to IT; empty disables it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Color bands. When absent, the preset matching the default provider is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ColorThresholds>,

    /// Named slots for requests without an explicit hour range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<Vec<Slot>>,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow!(
                "No default provider configured.\n\
                 Hint: run `meteo configure <provider>` (e.g. `meteo configure openweather`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> anyhow::Result<()> {
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
    pub fn config_file_path() -> anyhow::Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "meteo", "meteo-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay settings taken from the process environment.
    ///
    /// `OPENWEATHER_API_KEY` registers an OpenWeather key; `METEO_TIMEZONE`
    /// replaces the reference zone.
    pub fn apply_env(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (name, value) in vars {
            match name.as_str() {
                "OPENWEATHER_API_KEY" if !value.is_empty() => {
                    self.upsert_provider_api_key(ProviderId::OpenWeather, value);
                }
                "METEO_TIMEZONE" if !value.is_empty() => self.timezone = Some(value),
                _ => {}
            }
        }
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        !provider_id.requires_api_key() || self.provider_api_key(provider_id).is_some()
    }

    pub fn timezone(&self) -> Result<Tz> {
        let name = self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE);
        name.parse::<Tz>()
            .map_err(|_| Error::InvalidInput(format!("Unknown time zone '{name}'.")))
    }

    pub fn region(&self) -> Result<Region> {
        let country = match self.country.as_deref() {
            None => Some(DEFAULT_COUNTRY.to_string()),
            Some("") => None,
            Some(code) => Some(code.to_string()),
        };

        Ok(Region { timezone: self.timezone()?, country })
    }

    /// Explicit thresholds, or the preset matching the default provider.
    pub fn color_thresholds(&self) -> ColorThresholds {
        if let Some(thresholds) = self.thresholds {
            return thresholds;
        }

        match self.default_provider_id() {
            Ok(ProviderId::OpenMeteo) => ColorThresholds::variant_b(),
            _ => ColorThresholds::variant_a(),
        }
    }

    pub fn slots(&self) -> Vec<Slot> {
        self.slots.clone().unwrap_or_else(Slot::defaults)
    }
}

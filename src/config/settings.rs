//! Configuration settings management
//!
//! This module handles loading configuration from multiple sources,
//! validation, and persistence.

use crate::account::StorageAccountSkuType;
use crate::error::{Result, XstoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub subscription_id: String,
    pub default_resource_group: String,
    pub default_location: String,
    /// SKU applied when `xs plan` is not given one
    pub default_sku: Option<StorageAccountSkuType>,
    pub https_only: bool,
    /// Tags merged into every planned definition before command-line tags
    pub default_tags: HashMap<String, String>,
    pub output_json: bool,
    pub no_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            subscription_id: String::new(),
            default_resource_group: "Storage".to_string(),
            default_location: "eastus".to_string(),
            default_sku: None,
            https_only: true,
            default_tags: HashMap::new(),
            output_json: false,
            no_color: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_location.trim().is_empty() {
            return Err(XstoreError::config("Default location is required"));
        }

        if self.default_resource_group.trim().is_empty() {
            return Err(XstoreError::config("Default resource group is required"));
        }

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        // XDG layout on Linux and macOS, platform config directory elsewhere
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| XstoreError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("xs").join("xs.conf"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| XstoreError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("xs").join("xs.conf"))
        }
    }

    /// Update one setting by name, as `xs config set` does
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "debug" => self.debug = parse_bool(value),
            "subscription_id" => self.subscription_id = value.to_string(),
            "default_resource_group" => self.default_resource_group = value.to_string(),
            "default_location" => self.default_location = value.to_string(),
            "default_sku" => {
                self.default_sku = if value.is_empty() {
                    None
                } else {
                    Some(value.parse()?)
                };
            }
            "https_only" => self.https_only = parse_bool(value),
            "output_json" => self.output_json = parse_bool(value),
            "no_color" => self.no_color = parse_bool(value),
            _ => {
                if let Some(tag) = key.strip_prefix("default_tags.") {
                    if tag.is_empty() {
                        return Err(XstoreError::config("Tag name cannot be empty"));
                    }
                    if value.is_empty() {
                        self.default_tags.remove(tag);
                    } else {
                        self.default_tags.insert(tag.to_string(), value.to_string());
                    }
                } else {
                    return Err(XstoreError::config(format!(
                        "Unknown configuration key: {key}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve the resource group, preferring the command-line value
    pub fn resolve_resource_group(&self, rg_arg: Option<String>) -> Result<String> {
        if let Some(rg) = rg_arg {
            return Ok(rg);
        }

        if !self.default_resource_group.is_empty() {
            return Ok(self.default_resource_group.clone());
        }

        Err(XstoreError::config("No resource group specified"))
    }

    /// Resolve the region, preferring the command-line value
    pub fn resolve_location(&self, location_arg: Option<String>) -> Result<String> {
        if let Some(location) = location_arg {
            return Ok(location);
        }

        if !self.default_location.is_empty() {
            return Ok(self.default_location.clone());
        }

        Err(XstoreError::config("No region specified"))
    }
}

fn parse_bool(value: &str) -> bool {
    value.to_lowercase() == "true" || value == "1"
}

/// Load configuration from multiple sources with priority order:
/// 1. Command-line flags (handled by clap)
/// 2. Environment variables
/// 3. Configuration file
/// 4. Default values
///
/// Not validated here; `xs config` must work on a broken file, so commands
/// that need a usable configuration call [`Config::validate`] themselves.
pub async fn load_config() -> Result<Config> {
    let mut config = load_file_or_default(&Config::get_config_path()?).await?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    Ok(config)
}

async fn load_file_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_from_file(path).await
    } else {
        Ok(Config::default())
    }
}

/// Read a configuration file, TOML first and JSON as fallback
pub async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;

    match toml::from_str::<Config>(&contents) {
        Ok(config) => Ok(config),
        Err(e) if !contents.trim_start().starts_with('{') => Err(e.into()),
        Err(_) => Ok(serde_json::from_str::<Config>(&contents)?),
    }
}

/// Apply environment overrides, reading variables through `lookup`
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("DEBUG") {
        config.debug = parse_bool(&value);
    }

    if let Some(value) = lookup("AZURE_SUBSCRIPTION_ID") {
        config.subscription_id = value;
    }

    if let Some(value) = lookup("XS_DEFAULT_LOCATION") {
        config.default_location = value;
    }

    if let Some(value) = lookup("XS_DEFAULT_RESOURCE_GROUP") {
        config.default_resource_group = value;
    }

    if let Some(value) = lookup("XS_DEFAULT_SKU") {
        match value.parse::<StorageAccountSkuType>() {
            Ok(sku) => config.default_sku = Some(sku),
            Err(e) => tracing::warn!("Ignoring XS_DEFAULT_SKU: {}", e),
        }
    }
}

/// Persist one setting in the configuration file.
///
/// Only the file's own contents are rewritten; environment overrides and
/// command-line flags of the current run never reach the disk.
pub async fn set_config_value(key: &str, value: &str) -> Result<Config> {
    set_config_value_at(&Config::get_config_path()?, key, value).await
}

pub async fn set_config_value_at(path: &Path, key: &str, value: &str) -> Result<Config> {
    let mut config = load_file_or_default(path).await?;
    config.set_value(key, value)?;
    save_config_to(&config, path).await?;
    Ok(config)
}

/// Write the configuration as TOML, creating parent directories
pub async fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let contents = toml::to_string_pretty(config)?;
    tokio::fs::write(path, contents).await?;

    Ok(())
}

/// Write a default configuration file unless one exists.
///
/// Returns whether a file was written.
pub async fn init_default_config() -> Result<bool> {
    let config_path = Config::get_config_path()?;

    if config_path.exists() {
        return Ok(false);
    }

    save_config_to(&Config::default(), &config_path).await?;

    Ok(true)
}

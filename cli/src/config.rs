//! Configuration file management for the jptts command.
//!
//! Configuration is stored in ~/.jptts/config.yaml and holds the same
//! `services`/`backends` document that [`jptts::Config`] deserializes.

use std::path::{Path, PathBuf};

use jptts::{BackendKind, ServiceConfig};
use serde::{Deserialize, Serialize};

/// Default configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".jptts";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// CLI configuration backed by a YAML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub jptts: jptts::Config,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

impl Config {
    /// Gets the default config directory.
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR))
    }

    /// Gets the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Merges the set fields of `update` into the backend's entry and
    /// saves. Returns the canonical backend name the entry is stored under.
    pub fn set_service(&mut self, backend: &str, update: ServiceConfig) -> anyhow::Result<&'static str> {
        let kind: BackendKind = backend.parse()?;
        let name = kind.name();

        let mut entry = self.take_service(kind).unwrap_or_default();
        if update.base_url.is_some() {
            entry.base_url = update.base_url;
        }
        if update.api_key.is_some() {
            entry.api_key = update.api_key;
        }
        if update.exe_path.is_some() {
            entry.exe_path = update.exe_path;
        }
        if update.timeout.is_some() {
            entry.timeout = update.timeout;
        }
        self.jptts.services.insert(name.to_string(), entry);

        self.save()?;
        Ok(name)
    }

    /// Removes the backend's entry and saves.
    pub fn unset_service(&mut self, backend: &str) -> anyhow::Result<()> {
        let kind: BackendKind = backend.parse()?;
        if self.take_service(kind).is_none() {
            anyhow::bail!("no configuration for backend '{}'", kind);
        }
        self.save()
    }

    /// Removes and returns the entry for `kind`, whatever spelling its key uses.
    fn take_service(&mut self, kind: BackendKind) -> Option<ServiceConfig> {
        let key = self
            .jptts
            .services
            .keys()
            .find(|k| k.parse::<BackendKind>().ok() == Some(kind))
            .cloned()?;
        self.jptts.services.remove(&key)
    }

    /// A copy safe to print: API keys are masked.
    pub fn masked(&self) -> jptts::Config {
        let mut cfg = self.jptts.clone();
        for service in cfg.services.values_mut() {
            if let Some(key) = &service.api_key {
                service.api_key = Some(mask_api_key(key));
            }
        }
        cfg
    }
}

/// Loads the configuration, creating an empty file on first use.
pub fn load_config(custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_config_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        }
    } else {
        let cfg = Config::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.config_path = config_path;
    Ok(cfg)
}

/// Masks the API key for display.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

//! Backend configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;

/// Per-backend configuration. Unset fields take backend-specific defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// API key for key-gated backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Path to the engine executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exe_path: Option<PathBuf>,

    /// Timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ServiceConfig {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn exe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.exe_path = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.as_millis() as u64);
        self
    }

    /// Returns the configured timeout, or `default` if unset.
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout.map(Duration::from_millis).unwrap_or(default)
    }

    /// Returns the configured base URL without a trailing slash, or `default`.
    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    /// Returns the API key if set and non-empty.
    pub fn api_key_opt(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// Client configuration: service configs keyed by backend name, plus an
/// optional list of backends to activate (all known backends when absent).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub services: HashMap<String, ServiceConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backends: Option<Vec<String>>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service config under `name`.
    pub fn service(mut self, name: impl Into<String>, config: ServiceConfig) -> Self {
        self.services.insert(name.into(), config);
        self
    }

    /// Restricts activation to the given backend names.
    pub fn backends<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backends = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the config for a backend. Keys are matched with the same
    /// normalization as backend names, so `VOICEVOX` and `voicevox` agree.
    pub fn service_for(&self, kind: BackendKind) -> ServiceConfig {
        self.services
            .iter()
            .find(|(name, _)| name.parse::<BackendKind>().ok() == Some(kind))
            .map(|(_, cfg)| cfg.clone())
            .unwrap_or_default()
    }
}

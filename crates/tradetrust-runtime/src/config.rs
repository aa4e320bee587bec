//! Runtime configuration.
//!
//! Wraps the core [`TrustConfig`] with the settings only the async layer
//! needs: how long to wait on collaborators and how to size the score cache.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use tradetrust_core::TrustConfig;

use crate::RuntimeError;

/// Score cache sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    /// Disable to score every request from scratch
    pub enabled: bool,

    pub max_entries: u64,

    #[serde(with = "humantime_duration")]
    pub ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Configuration for the certificate service and workflow orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub trust: TrustConfig,

    /// Upper bound on any single collaborator call
    pub collaborator_timeout: Duration,

    pub cache: CacheSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            trust: TrustConfig::default(),
            collaborator_timeout: Duration::from_secs(10),
            cache: CacheSettings::default(),
        }
    }
}

/// On-disk shape. The `trust` section is kept untyped so it goes through the
/// core loader and its schema validation.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRuntimeConfig {
    #[serde(default)]
    trust: serde_json::Value,

    #[serde(default = "default_timeout", with = "humantime_duration")]
    collaborator_timeout: Duration,

    #[serde(default)]
    cache: CacheSettings,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl RuntimeConfig {
    /// Wrap an already-loaded trust configuration with runtime defaults.
    pub fn new(trust: TrustConfig) -> Self {
        Self {
            trust,
            ..Default::default()
        }
    }

    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, RuntimeError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawRuntimeConfig = serde_yaml::from_str(yaml)?;
        raw.into_config()
    }

    pub fn from_json(json: &str) -> Result<Self, RuntimeError> {
        let raw: RawRuntimeConfig = serde_json::from_str(json)?;
        raw.into_config()
    }

    /// Load a configuration file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Apply `TRADETRUST_*` environment overrides to the trust section and
    /// `TRADETRUST_COLLABORATOR_TIMEOUT` to the runtime section.
    pub fn with_env_overrides(self) -> Result<Self, RuntimeError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("TRADETRUST_COLLABORATOR_TIMEOUT") {
            self.collaborator_timeout = parse_duration(&raw)?;
        }
        self.trust = self.trust.with_overrides_from(lookup)?;
        Ok(self)
    }
}

impl RawRuntimeConfig {
    fn into_config(self) -> Result<RuntimeConfig, RuntimeError> {
        if self.collaborator_timeout.is_zero() {
            return Err(RuntimeError::InvalidConfig(
                "collaborator_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(RuntimeConfig {
            trust: TrustConfig::from_value(self.trust)?,
            collaborator_timeout: self.collaborator_timeout,
            cache: self.cache,
        })
    }
}

fn parse_duration(raw: &str) -> Result<Duration, RuntimeError> {
    humantime::parse_duration(raw.trim())
        .map_err(|e| RuntimeError::InvalidConfig(format!("invalid duration {:?}: {}", raw, e)))
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

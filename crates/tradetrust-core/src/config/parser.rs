//! Trust configuration parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_config_schema;
use crate::sources::SourceReliabilityTable;

/// Upper bound for every `data_age` band (ten years).
pub const MAX_DATA_AGE_HOURS: f64 = 87_600.0;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Config schema validation failed: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Bounds every trust score is clamped into.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreBounds {
    pub min_value: f64,
    pub max_value: f64,

    /// Score used when the provenance collaborator reports no data
    pub missing_provenance_floor: f64,
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self {
            min_value: 0.0,
            max_value: 1.0,
            missing_provenance_floor: 0.3,
        }
    }
}

/// Blend weights and bonus rates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreWeights {
    /// Weight of the classifier's own confidence against provenance confidence
    pub classification_weight: f64,

    /// Weight of provenance confidence against rate-source reliability
    pub savings_provenance_weight: f64,

    /// Bonus per expert review
    pub expert_review_bonus: f64,

    /// Cap on the total expert review bonus
    pub max_expert_bonus: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            classification_weight: 0.4,
            savings_provenance_weight: 0.7,
            expert_review_bonus: 0.02,
            max_expert_bonus: 0.1,
        }
    }
}

/// Decision thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// Summary scores at or above this are `very_high`
    pub very_high: f64,

    /// Below this, results need expert attention
    pub warning: f64,

    /// Below this, summaries report `low` confidence
    pub critical: f64,

    /// At or below this, expert escalation is critical
    pub emergency_expert: f64,

    /// At or above this, results are auto-approved
    pub auto_approval: f64,

    /// Mean source reliability required for `verified`
    pub source_agreement: f64,

    /// Mean source reliability required for `partially_verified`
    pub partial_verification: f64,

    /// Minimum provenance confidence for classification data
    pub min_classification_confidence: f64,

    /// Single-source data below this needs a second source
    pub single_source_confidence: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            very_high: 0.90,
            warning: 0.80,
            critical: 0.60,
            emergency_expert: 0.50,
            auto_approval: 0.95,
            source_agreement: 0.85,
            partial_verification: 0.70,
            min_classification_confidence: 0.70,
            single_source_confidence: 0.85,
        }
    }
}

/// Data age bands, in hours.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataAgeBands {
    /// Data verified within this window is fresh
    pub fresh_hours: f64,

    /// Data older than this is stale
    pub stale_hours: f64,

    /// Data older than this is expired and must be re-verified
    pub max_age_hours: f64,

    /// Unreviewed records older than this should get an expert look
    pub unreviewed_age_hours: f64,
}

impl Default for DataAgeBands {
    fn default() -> Self {
        Self {
            fresh_hours: 24.0,
            stale_hours: 168.0,
            max_age_hours: 168.0,
            unreviewed_age_hours: 72.0,
        }
    }
}

/// Expert response targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExpertSettings {
    pub response_time_hours: u32,
    pub emergency_response_hours: u32,
}

impl Default for ExpertSettings {
    fn default() -> Self {
        Self {
            response_time_hours: 24,
            emergency_response_hours: 2,
        }
    }
}

/// The complete trust configuration.
///
/// Loaded once at process start and shared by reference with every
/// component. Nothing in the crate re-reads it mid-computation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TrustConfig {
    pub bounds: ScoreBounds,
    pub weights: ScoreWeights,
    pub thresholds: Thresholds,
    pub data_age: DataAgeBands,
    pub expert: ExpertSettings,
    pub sources: SourceReliabilityTable,
}

impl TrustConfig {
    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Self::from_value(serde_json::Value::Null);
        }
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Load a configuration file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Build a configuration from an already-parsed document.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        // An empty document means "all defaults"
        let value = if value.is_null() {
            serde_json::json!({})
        } else {
            value
        };

        validate_config_schema(&value).map_err(ConfigError::SchemaError)?;

        let config: TrustConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TRADETRUST_*` environment overrides.
    ///
    /// Call once at startup; the result is the configuration for the life of
    /// the process.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("{}={}", key, raw)))
        }

        let float_overrides: [(&str, &mut f64); 10] = [
            ("TRADETRUST_TRUST_MIN", &mut self.bounds.min_value),
            ("TRADETRUST_TRUST_MAX", &mut self.bounds.max_value),
            ("TRADETRUST_WARNING_THRESHOLD", &mut self.thresholds.warning),
            ("TRADETRUST_CRITICAL_THRESHOLD", &mut self.thresholds.critical),
            (
                "TRADETRUST_EMERGENCY_EXPERT_THRESHOLD",
                &mut self.thresholds.emergency_expert,
            ),
            (
                "TRADETRUST_AUTO_APPROVAL_THRESHOLD",
                &mut self.thresholds.auto_approval,
            ),
            (
                "TRADETRUST_SOURCE_AGREEMENT_THRESHOLD",
                &mut self.thresholds.source_agreement,
            ),
            ("TRADETRUST_FRESH_HOURS", &mut self.data_age.fresh_hours),
            ("TRADETRUST_STALE_HOURS", &mut self.data_age.stale_hours),
            ("TRADETRUST_MAX_DATA_AGE_HOURS", &mut self.data_age.max_age_hours),
        ];

        for (key, slot) in float_overrides {
            if let Some(raw) = lookup(key) {
                *slot = parse(key, &raw)?;
            }
        }

        if let Some(raw) = lookup("TRADETRUST_EXPERT_RESPONSE_HOURS") {
            self.expert.response_time_hours = parse("TRADETRUST_EXPERT_RESPONSE_HOURS", &raw)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Semantic checks the schema cannot express.
    ///
    /// Also re-checks ranges the schema enforces, since env overrides are
    /// applied after schema validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_values = [
            ("bounds.min_value", self.bounds.min_value),
            ("bounds.max_value", self.bounds.max_value),
            ("bounds.missing_provenance_floor", self.bounds.missing_provenance_floor),
            ("weights.classification_weight", self.weights.classification_weight),
            ("weights.savings_provenance_weight", self.weights.savings_provenance_weight),
            ("weights.expert_review_bonus", self.weights.expert_review_bonus),
            ("weights.max_expert_bonus", self.weights.max_expert_bonus),
            ("thresholds.very_high", self.thresholds.very_high),
            ("thresholds.warning", self.thresholds.warning),
            ("thresholds.critical", self.thresholds.critical),
            ("thresholds.emergency_expert", self.thresholds.emergency_expert),
            ("thresholds.auto_approval", self.thresholds.auto_approval),
            ("thresholds.source_agreement", self.thresholds.source_agreement),
            ("thresholds.partial_verification", self.thresholds.partial_verification),
            (
                "thresholds.min_classification_confidence",
                self.thresholds.min_classification_confidence,
            ),
            ("thresholds.single_source_confidence", self.thresholds.single_source_confidence),
            ("sources.unknown_source", self.sources.unknown_source),
            ("sources.missing_source", self.sources.missing_source),
        ];
        let entry_values = self
            .sources
            .entries
            .iter()
            .map(|entry| ("sources.entries.reliability", entry.reliability));
        for (name, value) in unit_values.into_iter().chain(entry_values) {
            // Range check is false for NaN
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must lie within [0, 1], got {}",
                    name, value
                )));
            }
        }

        let a = &self.data_age;
        for (name, value) in [
            ("data_age.fresh_hours", a.fresh_hours),
            ("data_age.stale_hours", a.stale_hours),
            ("data_age.max_age_hours", a.max_age_hours),
            ("data_age.unreviewed_age_hours", a.unreviewed_age_hours),
        ] {
            if !(0.0..=MAX_DATA_AGE_HOURS).contains(&value) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must lie within [0, {}], got {}",
                    name, MAX_DATA_AGE_HOURS, value
                )));
            }
        }

        let b = &self.bounds;
        if b.min_value > b.max_value {
            return Err(ConfigError::InvalidValue(format!(
                "bounds.min_value ({}) exceeds bounds.max_value ({})",
                b.min_value, b.max_value
            )));
        }

        let t = &self.thresholds;
        if !(t.emergency_expert <= t.warning && t.warning < t.auto_approval) {
            return Err(ConfigError::InvalidValue(format!(
                "expected emergency_expert <= warning < auto_approval, got {} / {} / {}",
                t.emergency_expert, t.warning, t.auto_approval
            )));
        }
        if !(t.critical <= t.warning && t.warning <= t.very_high) {
            return Err(ConfigError::InvalidValue(format!(
                "expected critical <= warning <= very_high, got {} / {} / {}",
                t.critical, t.warning, t.very_high
            )));
        }
        if t.partial_verification > t.source_agreement {
            return Err(ConfigError::InvalidValue(
                "thresholds.partial_verification exceeds thresholds.source_agreement".to_string(),
            ));
        }

        if a.fresh_hours > a.stale_hours {
            return Err(ConfigError::InvalidValue(format!(
                "data_age.fresh_hours ({}) exceeds data_age.stale_hours ({})",
                a.fresh_hours, a.stale_hours
            )));
        }

        if self.expert.response_time_hours == 0 {
            return Err(ConfigError::InvalidValue(
                "expert.response_time_hours must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

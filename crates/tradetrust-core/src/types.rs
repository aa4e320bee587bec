//! Boundary types exchanged with upstream collaborators.
//!
//! Every field the engine reads is optional. Collaborators (classification
//! agents, tariff research, the provenance store) hand over whatever they
//! have, and the engine degrades on whatever is missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalise a confidence that may have been reported as a percentage.
pub(crate) fn normalize_confidence(value: f64) -> f64 {
    if value > 1.0 {
        value / 100.0
    } else {
        value
    }
}

/// Provenance fields as reported by the provenance collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProvenanceSnapshot {
    #[serde(default)]
    pub confidence_score: Option<f64>,

    #[serde(default)]
    pub age_hours: Option<f64>,

    #[serde(default)]
    pub expert_reviews: Option<u32>,

    #[serde(default)]
    pub source: Option<String>,
}

impl ProvenanceSnapshot {
    pub fn new(confidence_score: f64, age_hours: f64, expert_reviews: u32) -> Self {
        Self {
            confidence_score: Some(confidence_score),
            age_hours: Some(age_hours),
            expert_reviews: Some(expert_reviews),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Response of the provenance collaborator.
///
/// `success == false` or a missing `provenance` means "no data". It is never
/// an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProvenanceLookup {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub provenance: Option<ProvenanceSnapshot>,
}

impl ProvenanceLookup {
    /// A successful lookup.
    pub fn found(provenance: ProvenanceSnapshot) -> Self {
        Self {
            success: true,
            provenance: Some(provenance),
        }
    }

    /// A lookup that produced no provenance.
    pub fn unavailable() -> Self {
        Self {
            success: false,
            provenance: None,
        }
    }

    /// The snapshot, if the lookup is usable.
    pub fn snapshot(&self) -> Option<&ProvenanceSnapshot> {
        if self.success {
            self.provenance.as_ref()
        } else {
            None
        }
    }
}

/// One candidate code from the classification collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClassificationCandidate {
    #[serde(default)]
    pub hs_code: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, alias = "confidenceScore", alias = "confidence")]
    pub confidence_score: Option<f64>,
}

/// Output of the HS classification collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClassificationResult {
    #[serde(default)]
    pub hs_code: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, alias = "confidenceScore")]
    pub confidence_score: Option<f64>,

    /// Ranked candidates, best first
    #[serde(default)]
    pub results: Vec<ClassificationCandidate>,
}

impl ClassificationResult {
    /// Confidence of the top-ranked candidate, falling back to the result's
    /// own confidence. Percentages are normalised to [0, 1].
    pub fn top_confidence(&self) -> Option<f64> {
        self.results
            .first()
            .and_then(|c| c.confidence_score)
            .or(self.confidence_score)
            .map(normalize_confidence)
    }
}

/// Output of the USMCA qualification collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UsmcaResult {
    #[serde(default)]
    pub qualified: Option<bool>,

    /// Regional value content, in percent
    #[serde(default)]
    pub north_american_content: Option<f64>,

    /// Threshold the qualification rule required, in percent
    #[serde(default)]
    pub threshold_applied: Option<f64>,

    #[serde(default)]
    pub rule_applied: Option<String>,
}

/// Output of the tariff savings collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SavingsResult {
    #[serde(default)]
    pub annual_savings: Option<f64>,

    #[serde(default)]
    pub mfn_rate: Option<f64>,

    #[serde(default)]
    pub usmca_rate: Option<f64>,

    #[serde(default)]
    pub rates_source: Option<String>,

    #[serde(default)]
    pub mfn_rate_verified: bool,

    #[serde(default)]
    pub usmca_rate_verified: bool,
}

/// A trust-scored result of one workflow step.
///
/// Created once per step and consumed by the summary aggregator; never
/// mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScoredResult {
    #[serde(default)]
    pub operation: Option<String>,

    #[serde(default)]
    pub trust_score: Option<f64>,

    #[serde(default)]
    pub provenance: Option<ProvenanceSnapshot>,

    /// Source declared by the step itself (e.g. `rates_source`)
    #[serde(default)]
    pub data_source: Option<String>,
}

impl ScoredResult {
    pub fn new(operation: impl Into<String>, trust_score: f64) -> Self {
        Self {
            operation: Some(operation.into()),
            trust_score: Some(trust_score),
            provenance: None,
            data_source: None,
        }
    }

    pub fn with_provenance(mut self, provenance: ProvenanceSnapshot) -> Self {
        self.provenance = Some(provenance);
        self
    }

    pub fn with_data_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }

    pub fn age_hours(&self) -> Option<f64> {
        self.provenance.as_ref().and_then(|p| p.age_hours)
    }

    pub fn expert_reviews(&self) -> Option<u32> {
        self.provenance.as_ref().and_then(|p| p.expert_reviews)
    }

    /// The source this result declares, preferring its provenance.
    pub fn declared_source(&self) -> Option<&str> {
        self.provenance
            .as_ref()
            .and_then(|p| p.source.as_deref())
            .or(self.data_source.as_deref())
    }
}

/// One step recorded in an audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OperationRecord {
    #[serde(default)]
    pub operation: Option<String>,

    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub trust_score: Option<f64>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_without_success_has_no_snapshot() {
        let lookup = ProvenanceLookup {
            success: false,
            provenance: Some(ProvenanceSnapshot::new(0.9, 1.0, 0)),
        };
        assert!(lookup.snapshot().is_none());
    }

    #[test]
    fn test_top_confidence_prefers_first_candidate() {
        let result: ClassificationResult = serde_json::from_value(serde_json::json!({
            "confidenceScore": 0.5,
            "results": [
                { "hs_code": "8471.30", "confidence": 92 },
                { "hs_code": "8471.41", "confidence": 40 }
            ]
        }))
        .unwrap();
        assert_eq!(result.top_confidence(), Some(0.92));
    }

    #[test]
    fn test_top_confidence_falls_back_to_result() {
        let result: ClassificationResult =
            serde_json::from_value(serde_json::json!({ "confidenceScore": 0.81 })).unwrap();
        assert_eq!(result.top_confidence(), Some(0.81));
    }

    #[test]
    fn test_all_fields_optional() {
        let usmca: UsmcaResult = serde_json::from_str("{}").unwrap();
        assert!(usmca.qualified.is_none());
        let savings: SavingsResult = serde_json::from_str("{}").unwrap();
        assert!(!savings.mfn_rate_verified);
        let scored: ScoredResult = serde_json::from_str("{}").unwrap();
        assert!(scored.trust_score.is_none());
    }

    #[test]
    fn test_declared_source_prefers_provenance() {
        let scored = ScoredResult::new("savings", 0.8)
            .with_data_source("database_lookup")
            .with_provenance(ProvenanceSnapshot::new(0.8, 2.0, 0).with_source("CBP"));
        assert_eq!(scored.declared_source(), Some("CBP"));
    }
}

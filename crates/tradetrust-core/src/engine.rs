//! Single entry point over the scoring components.
//!
//! [`TrustEngine`] owns one [`TrustConfig`] and hands out borrowed
//! calculators. It holds no other state, so it can be shared freely across
//! threads (`Arc<TrustEngine>`) and every method is a pure function of its
//! arguments.

use chrono::{DateTime, Utc};

use crate::config::TrustConfig;
use crate::escalation::{EscalationPolicy, ExpertValidationNeed};
use crate::provenance::{Provenance, ProvenanceCalculator, ProvenanceRecord, VerificationNeed};
use crate::sources::SourceVerification;
use crate::summary::{
    create_audit_trail, generate_professional_disclaimer, AuditTrail, TrustSummary,
    TrustSummaryAggregator,
};
use crate::trust::{ScoreOptions, TrustCalculator};
use crate::types::{
    ClassificationResult, OperationRecord, ProvenanceLookup, SavingsResult, ScoredResult,
    UsmcaResult,
};

#[derive(Debug, Clone, Default)]
pub struct TrustEngine {
    config: TrustConfig,
}

impl TrustEngine {
    pub fn new(config: TrustConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    pub fn calculate_provenance(&self, record: &ProvenanceRecord, now: DateTime<Utc>) -> Provenance {
        ProvenanceCalculator::new(&self.config).calculate(record, now)
    }

    pub fn check_verification_needs(
        &self,
        record: &ProvenanceRecord,
        provenance: &Provenance,
    ) -> VerificationNeed {
        ProvenanceCalculator::new(&self.config).check_verification_needs(record, provenance)
    }

    pub fn calculate_trust_score(
        &self,
        lookup: Option<&ProvenanceLookup>,
        classification: &ClassificationResult,
        options: &ScoreOptions,
    ) -> f64 {
        TrustCalculator::new(&self.config).calculate_trust_score(lookup, classification, options)
    }

    pub fn calculate_usmca_trust_score(
        &self,
        usmca: &UsmcaResult,
        rules_lookup: Option<&ProvenanceLookup>,
    ) -> f64 {
        TrustCalculator::new(&self.config).calculate_usmca_trust_score(usmca, rules_lookup)
    }

    pub fn calculate_savings_trust_score(
        &self,
        savings: &SavingsResult,
        rates_lookup: Option<&ProvenanceLookup>,
    ) -> f64 {
        TrustCalculator::new(&self.config).calculate_savings_trust_score(savings, rates_lookup)
    }

    pub fn get_source_reliability(&self, source: Option<&str>) -> f64 {
        self.config.sources.reliability(source)
    }

    /// Cross-check sources against the configured agreement thresholds.
    pub fn verify_data_sources(&self, sources: &[String]) -> SourceVerification {
        let thresholds = &self.config.thresholds;
        self.config.sources.verify(
            sources,
            thresholds.source_agreement,
            thresholds.partial_verification,
        )
    }

    pub fn evaluate_expert_validation_need(&self, trust_score: f64) -> ExpertValidationNeed {
        EscalationPolicy::new(&self.config).evaluate(trust_score)
    }

    pub fn generate_trust_summary(&self, results: &[ScoredResult]) -> TrustSummary {
        TrustSummaryAggregator::new(&self.config).generate_trust_summary(results)
    }

    pub fn generate_trust_summary_value(&self, value: &serde_json::Value) -> TrustSummary {
        TrustSummaryAggregator::new(&self.config).generate_trust_summary_value(value)
    }

    pub fn generate_professional_disclaimer(&self, results: &[ScoredResult]) -> Vec<String> {
        generate_professional_disclaimer(&self.config, results)
    }

    pub fn create_audit_trail(&self, operations: &[OperationRecord]) -> AuditTrail {
        create_audit_trail(operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceVerificationStatus;
    use crate::types::ProvenanceSnapshot;

    #[test]
    fn test_engine_uses_owned_config() {
        let mut config = TrustConfig::default();
        config.bounds.min_value = 0.05;
        let engine = TrustEngine::new(config);
        let score = engine.calculate_trust_score(
            None,
            &ClassificationResult::default(),
            &ScoreOptions::default(),
        );
        assert_eq!(score, 0.05);
    }

    #[test]
    fn test_verify_data_sources_uses_thresholds() {
        let engine = TrustEngine::default();
        let verification =
            engine.verify_data_sources(&["CBP".to_string(), "CBSA".to_string()]);
        assert_eq!(verification.verification_status, SourceVerificationStatus::Verified);
        assert_eq!(verification.total_sources, 2);

        let partial = engine.verify_data_sources(&["unknown feed".to_string()]);
        assert_eq!(partial.verification_status, SourceVerificationStatus::PartiallyVerified);

        let failed = engine.verify_data_sources(&[]);
        assert_eq!(failed.verification_status, SourceVerificationStatus::Failed);
        assert_eq!(failed.total_sources, 0);
    }

    #[test]
    fn test_high_quality_classification_scores_high() {
        let engine = TrustEngine::default();
        let lookup = ProvenanceLookup::found(ProvenanceSnapshot::new(0.92, 2.0, 1));
        let classification: ClassificationResult = serde_json::from_value(serde_json::json!({
            "results": [{ "hs_code": "8471.30.01", "confidence_score": 0.88 }]
        }))
        .unwrap();
        let score =
            engine.calculate_trust_score(Some(&lookup), &classification, &ScoreOptions::default());
        assert!(score >= 0.85);
        assert!(score <= 1.0);
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TrustEngine>();
    }
}

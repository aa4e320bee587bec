//! Complete-workflow orchestrator.
//!
//! Scores one classification → qualification → savings workflow:
//! - Parallel fan-out of the three provenance lookups via `tokio::join!`
//! - Deterministic fan-in through the core engine
//! - Lookup failures and timeouts degrade to "no provenance", never to an error

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tradetrust_core::{
    AuditTrail, ClassificationResult, ExpertValidationNeed, OperationRecord, ProvenanceLookup,
    SavingsResult, ScoreOptions, ScoredResult, TrustEngine, TrustSummary, UsmcaResult,
};

use crate::cache::{ScoreCache, ScoreKind};
use crate::collaborators::{LookupKind, ProvenanceQuery, ProvenanceSource};
use crate::config::RuntimeConfig;

/// Collaborator outputs for one workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct WorkflowInputs {
    /// Subject of the provenance lookups, usually the HS code
    pub subject: String,

    pub classification: ClassificationResult,
    pub qualification: UsmcaResult,
    pub savings: SavingsResult,
}

/// Scored workflow with its summary, disclaimers and audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowReport {
    /// Classification, qualification and savings, in that order
    pub results: Vec<ScoredResult>,

    pub trust_summary: TrustSummary,
    pub professional_disclaimers: Vec<String>,
    pub audit_trail: AuditTrail,
    pub expert_validation: ExpertValidationNeed,
}

/// Orchestrates provenance lookups and scoring for a complete workflow.
pub struct WorkflowOrchestrator {
    engine: TrustEngine,
    config: Arc<RuntimeConfig>,
    provenance: Arc<dyn ProvenanceSource>,
    cache: Option<ScoreCache>,
}

impl WorkflowOrchestrator {
    pub fn new(config: Arc<RuntimeConfig>, provenance: Arc<dyn ProvenanceSource>) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| ScoreCache::from_settings(&config.cache));
        Self {
            engine: TrustEngine::new(config.trust.clone()),
            config,
            provenance,
            cache,
        }
    }

    pub fn engine(&self) -> &TrustEngine {
        &self.engine
    }

    /// Score a complete workflow.
    pub async fn run(&self, inputs: &WorkflowInputs, now: DateTime<Utc>) -> WorkflowReport {
        // Fan-out: parallel provenance lookups
        let (classification_lookup, qualification_lookup, rates_lookup) = tokio::join!(
            self.lookup(LookupKind::Classification, &inputs.subject),
            self.lookup(LookupKind::Qualification, &inputs.subject),
            self.lookup(LookupKind::TariffRates, &inputs.subject),
        );

        // Fan-in: deterministic scoring
        let classification_score = self
            .score(ScoreKind::Classification, &(&classification_lookup, &inputs.classification), || {
                self.engine.calculate_trust_score(
                    Some(&classification_lookup),
                    &inputs.classification,
                    &ScoreOptions::default(),
                )
            })
            .await;
        let qualification_score = self
            .score(ScoreKind::Qualification, &(&qualification_lookup, &inputs.qualification), || {
                self.engine
                    .calculate_usmca_trust_score(&inputs.qualification, Some(&qualification_lookup))
            })
            .await;
        let savings_score = self
            .score(ScoreKind::Savings, &(&rates_lookup, &inputs.savings), || {
                self.engine
                    .calculate_savings_trust_score(&inputs.savings, Some(&rates_lookup))
            })
            .await;

        let steps = [
            ("classification", classification_score, &classification_lookup, None),
            ("qualification", qualification_score, &qualification_lookup, None),
            (
                "savings",
                savings_score,
                &rates_lookup,
                inputs.savings.rates_source.clone(),
            ),
        ];

        let results: Vec<ScoredResult> = steps
            .iter()
            .map(|(operation, score, lookup, data_source)| ScoredResult {
                operation: Some(operation.to_string()),
                trust_score: Some(*score),
                provenance: lookup.snapshot().cloned(),
                data_source: data_source.clone(),
            })
            .collect();

        let operations: Vec<OperationRecord> = steps
            .iter()
            .map(|(operation, score, lookup, _)| OperationRecord {
                operation: Some(operation.to_string()),
                success: lookup.success,
                trust_score: Some(*score),
                completed_at: Some(now),
            })
            .collect();

        let trust_summary = self.engine.generate_trust_summary(&results);
        let expert_validation = self
            .engine
            .evaluate_expert_validation_need(trust_summary.overall_trust_score);

        tracing::debug!(
            subject = %inputs.subject,
            overall = trust_summary.overall_trust_score,
            expert_required = expert_validation.validation_required,
            "Workflow scored"
        );

        WorkflowReport {
            professional_disclaimers: self.engine.generate_professional_disclaimer(&results),
            audit_trail: self.engine.create_audit_trail(&operations),
            results,
            trust_summary,
            expert_validation,
        }
    }

    /// Look up provenance, degrading any failure to an unavailable lookup.
    async fn lookup(&self, kind: LookupKind, subject: &str) -> ProvenanceLookup {
        let query = ProvenanceQuery::new(kind, subject);
        let timeout = self.config.collaborator_timeout;

        match tokio::time::timeout(timeout, self.provenance.lookup(&query)).await {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => {
                tracing::warn!(kind = ?kind, error = %e, "Provenance lookup failed");
                ProvenanceLookup::unavailable()
            }
            Err(_) => {
                tracing::warn!(kind = ?kind, timeout = ?timeout, "Provenance lookup timed out");
                ProvenanceLookup::unavailable()
            }
        }
    }

    async fn score<T, F>(&self, kind: ScoreKind, inputs: &T, compute: F) -> f64
    where
        T: Serialize,
        F: FnOnce() -> f64 + Send,
    {
        match &self.cache {
            Some(cache) => cache.get_or_compute(kind, inputs, compute).await,
            None => compute(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::CollaboratorError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::time::Duration;
    use tradetrust_core::{ComplianceStatus, ProvenanceSnapshot};

    /// In-memory provenance store keyed by lookup kind.
    #[derive(Default)]
    struct FakeStore {
        lookups: HashMap<LookupKind, Result<ProvenanceLookup, CollaboratorError>>,
        delay: Duration,
    }

    #[async_trait]
    impl ProvenanceSource for FakeStore {
        async fn lookup(
            &self,
            query: &ProvenanceQuery,
        ) -> Result<ProvenanceLookup, CollaboratorError> {
            tokio::time::sleep(self.delay).await;
            self.lookups
                .get(&query.kind)
                .cloned()
                .unwrap_or_else(|| Ok(ProvenanceLookup::unavailable()))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap()
    }

    fn inputs() -> WorkflowInputs {
        WorkflowInputs {
            subject: "8471.30".to_string(),
            classification: ClassificationResult {
                confidence_score: Some(0.9),
                ..Default::default()
            },
            qualification: UsmcaResult {
                qualified: Some(true),
                north_american_content: Some(75.0),
                ..Default::default()
            },
            savings: SavingsResult {
                rates_source: Some("database_lookup".to_string()),
                mfn_rate_verified: true,
                usmca_rate_verified: true,
                ..Default::default()
            },
        }
    }

    fn healthy_store() -> FakeStore {
        let found = |source: &str| {
            Ok(ProvenanceLookup::found(
                ProvenanceSnapshot::new(0.9, 4.0, 1).with_source(source),
            ))
        };
        FakeStore {
            lookups: HashMap::from([
                (LookupKind::Classification, found("CBP")),
                (LookupKind::Qualification, found("CBP")),
                (LookupKind::TariffRates, found("database_lookup")),
            ]),
            delay: Duration::ZERO,
        }
    }

    fn orchestrator(store: FakeStore, config: RuntimeConfig) -> WorkflowOrchestrator {
        WorkflowOrchestrator::new(Arc::new(config), Arc::new(store))
    }

    #[tokio::test]
    async fn test_healthy_workflow() {
        let orch = orchestrator(healthy_store(), RuntimeConfig::default());
        let report = orch.run(&inputs(), now()).await;

        assert_eq!(report.results.len(), 3);
        assert!(report.trust_summary.overall_trust_score > 0.9);
        assert_eq!(report.audit_trail.compliance_status, ComplianceStatus::Compliant);
        assert_eq!(report.audit_trail.entries[2].operation, "savings");
        assert_eq!(
            report.trust_summary.data_sources_accessed,
            vec!["CBP", "database_lookup"]
        );
    }

    #[tokio::test]
    async fn test_failed_lookups_degrade() {
        let store = FakeStore {
            lookups: HashMap::from([(
                LookupKind::Classification,
                Err(CollaboratorError::Unavailable("db down".to_string())),
            )]),
            delay: Duration::ZERO,
        };
        let orch = orchestrator(store, RuntimeConfig::default());
        let report = orch.run(&inputs(), now()).await;

        for result in &report.results {
            assert_eq!(result.trust_score, Some(0.3));
        }
        assert_eq!(report.audit_trail.compliance_status, ComplianceStatus::NonCompliant);
        assert!(report.expert_validation.validation_required);
        assert_eq!(
            report.expert_validation.urgency_level,
            tradetrust_core::EscalationUrgency::Critical
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let mut store = healthy_store();
        store.delay = Duration::from_secs(60);
        let config = RuntimeConfig::default().with_collaborator_timeout(Duration::from_millis(50));
        let report = orchestrator(store, config).run(&inputs(), now()).await;
        assert!(report.results.iter().all(|r| r.provenance.is_none()));
        assert_eq!(report.audit_trail.successful_operations, 0);
    }

    #[tokio::test]
    async fn test_cached_and_uncached_reports_match() {
        let mut uncached_config = RuntimeConfig::default();
        uncached_config.cache.enabled = false;

        let cached = orchestrator(healthy_store(), RuntimeConfig::default());
        let uncached = orchestrator(healthy_store(), uncached_config);

        let first = cached.run(&inputs(), now()).await;
        let second = cached.run(&inputs(), now()).await;
        let plain = uncached.run(&inputs(), now()).await;

        assert_eq!(first, second);
        assert_eq!(first, plain);
    }
}

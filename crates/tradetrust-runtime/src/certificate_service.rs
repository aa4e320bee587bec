//! Trust-verified certificate of origin service.
//!
//! Issues a certificate only when every collaborator call succeeds. Any
//! failure becomes a typed [`CertificateError`] and goes through the
//! recovery engine, so `generate` always returns a structured outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

use tradetrust_core::{
    EscalationPolicy, ExpertValidationNeed, ProvenanceLookup, ProvenanceSnapshot, TrustCalculator,
    UsmcaResult,
};

use crate::collaborators::{
    CertificateFormatter, CollaboratorError, LookupKind, ProvenanceQuery, ProvenanceSource,
};
use crate::config::RuntimeConfig;
use crate::recovery::{
    CertificateData, CertificateError, CertificateRecoveryEngine, RecoveryOutcome,
    CERTIFICATE_TYPE,
};

/// A certificate issued with full trust metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrustVerifiedCertificate {
    pub certificate_type: String,
    pub data: CertificateData,
    pub rendered: String,
    pub trust_score: f64,
    pub provenance: ProvenanceSnapshot,
    pub expert_validation: ExpertValidationNeed,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CertificateOutcome {
    Issued(Box<TrustVerifiedCertificate>),
    Recovered(Box<RecoveryOutcome>),
}

impl CertificateOutcome {
    pub fn is_issued(&self) -> bool {
        matches!(self, CertificateOutcome::Issued(_))
    }
}

pub struct TrustVerifiedCertificateService {
    config: Arc<RuntimeConfig>,
    provenance: Arc<dyn ProvenanceSource>,
    formatter: Arc<dyn CertificateFormatter>,
    recovery: CertificateRecoveryEngine,
}

impl TrustVerifiedCertificateService {
    pub fn new(
        config: Arc<RuntimeConfig>,
        provenance: Arc<dyn ProvenanceSource>,
        formatter: Arc<dyn CertificateFormatter>,
    ) -> Self {
        Self::with_recovery(config, provenance, formatter, CertificateRecoveryEngine::new())
    }

    pub fn with_recovery(
        config: Arc<RuntimeConfig>,
        provenance: Arc<dyn ProvenanceSource>,
        formatter: Arc<dyn CertificateFormatter>,
        recovery: CertificateRecoveryEngine,
    ) -> Self {
        Self {
            config,
            provenance,
            formatter,
            recovery,
        }
    }

    pub fn recovery_engine(&self) -> &CertificateRecoveryEngine {
        &self.recovery
    }

    /// Generate a certificate, recovering from any failure.
    pub async fn generate(&self, data: &CertificateData, now: DateTime<Utc>) -> CertificateOutcome {
        match self.try_generate(data, now).await {
            Ok(certificate) => {
                tracing::info!(
                    trust_score = certificate.trust_score,
                    expert_required = certificate.expert_validation.validation_required,
                    "Issued trust-verified certificate"
                );
                CertificateOutcome::Issued(Box::new(certificate))
            }
            Err(e) => {
                let outcome = self.recovery.recover(&e, data, now);
                if outcome.success {
                    self.recovery.reset_attempts();
                }
                CertificateOutcome::Recovered(Box::new(outcome))
            }
        }
    }

    async fn try_generate(
        &self,
        data: &CertificateData,
        now: DateTime<Utc>,
    ) -> Result<TrustVerifiedCertificate, CertificateError> {
        let qualification = validate(data)?;
        let hs_code = data.hs_code.as_deref().unwrap_or_default();

        let lookup = self
            .call(
                self.provenance
                    .lookup(&ProvenanceQuery::new(LookupKind::Certificate, hs_code)),
            )
            .await?;
        let provenance = usable_provenance(&lookup)?;

        let trust = &self.config.trust;
        let trust_score =
            TrustCalculator::new(trust).calculate_usmca_trust_score(qualification, Some(&lookup));
        if !trust_score.is_finite() {
            return Err(CertificateError::TrustCalculation(format!(
                "non-finite trust score {}",
                trust_score
            )));
        }

        let expert_validation = EscalationPolicy::new(trust).evaluate(trust_score);

        let rendered = self
            .call(self.formatter.format(data, trust_score))
            .await
            .map_err(|e| match e {
                CertificateError::Timeout(_) => e,
                other => CertificateError::Formatting(other.to_string()),
            })?;

        Ok(TrustVerifiedCertificate {
            certificate_type: CERTIFICATE_TYPE.to_string(),
            data: data.clone(),
            rendered,
            trust_score,
            provenance,
            expert_validation,
            issued_at: now,
        })
    }

    /// Await a collaborator call within the configured timeout.
    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, CollaboratorError>>,
    ) -> Result<T, CertificateError> {
        let timeout = self.config.collaborator_timeout;
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result.map_err(CertificateError::from),
            Err(_) => {
                tracing::warn!(timeout = ?timeout, "Collaborator call timed out");
                Err(CertificateError::Timeout(timeout))
            }
        }
    }
}

/// Check the fields a certificate cannot be issued without.
fn validate(data: &CertificateData) -> Result<&UsmcaResult, CertificateError> {
    let missing = data.missing_fields();
    if !missing.is_empty() {
        return Err(CertificateError::MissingData(missing.join(", ")));
    }
    data.qualification
        .as_ref()
        .ok_or_else(|| CertificateError::MissingData("qualification".to_string()))
}

fn usable_provenance(lookup: &ProvenanceLookup) -> Result<ProvenanceSnapshot, CertificateError> {
    lookup.snapshot().cloned().ok_or_else(|| {
        CertificateError::ProvenanceUnavailable("no provenance for certificate data".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::{ErrorCategory, RecoveredCertificate, VerificationStatus};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::time::Duration;

    struct FakeProvenance {
        result: Result<ProvenanceLookup, CollaboratorError>,
        delay: Duration,
    }

    #[async_trait]
    impl ProvenanceSource for FakeProvenance {
        async fn lookup(
            &self,
            _query: &ProvenanceQuery,
        ) -> Result<ProvenanceLookup, CollaboratorError> {
            tokio::time::sleep(self.delay).await;
            self.result.clone()
        }
    }

    struct FakeFormatter {
        fail: bool,
    }

    #[async_trait]
    impl CertificateFormatter for FakeFormatter {
        async fn format(
            &self,
            data: &CertificateData,
            trust_score: f64,
        ) -> Result<String, CollaboratorError> {
            if self.fail {
                Err(CollaboratorError::Rejected("pdf renderer crashed".to_string()))
            } else {
                Ok(format!(
                    "{} / {} / {:.2}",
                    data.exporter_name.as_deref().unwrap_or_default(),
                    data.hs_code.as_deref().unwrap_or_default(),
                    trust_score
                ))
            }
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap()
    }

    fn complete_data() -> CertificateData {
        let s = |v: &str| Some(v.to_string());
        CertificateData {
            exporter_name: s("Acme Exports"),
            exporter_address: s("1 Main St, Laredo TX"),
            producer_name: s("Acme Manufacturing"),
            importer_name: s("Importadora SA"),
            certifier_name: s("Jane Doe"),
            certifier_title: s("Compliance Manager"),
            product_description: s("Laptop computers"),
            hs_code: s("8471.30"),
            origin_criterion: s("B"),
            blanket_period: s("2025-01-01 to 2025-12-31"),
            qualification: Some(UsmcaResult {
                qualified: Some(true),
                north_american_content: Some(85.0),
                ..Default::default()
            }),
        }
    }

    fn service(
        lookup: Result<ProvenanceLookup, CollaboratorError>,
        delay: Duration,
        formatter_fails: bool,
    ) -> TrustVerifiedCertificateService {
        let config = RuntimeConfig::default().with_collaborator_timeout(Duration::from_millis(100));
        TrustVerifiedCertificateService::new(
            Arc::new(config),
            Arc::new(FakeProvenance { result: lookup, delay }),
            Arc::new(FakeFormatter {
                fail: formatter_fails,
            }),
        )
    }

    fn good_lookup() -> Result<ProvenanceLookup, CollaboratorError> {
        Ok(ProvenanceLookup::found(
            ProvenanceSnapshot::new(0.9, 5.0, 2).with_source("CBP"),
        ))
    }

    fn recovered(outcome: CertificateOutcome) -> RecoveryOutcome {
        match outcome {
            CertificateOutcome::Recovered(r) => *r,
            CertificateOutcome::Issued(c) => panic!("expected recovery, got {:?}", c),
        }
    }

    #[tokio::test]
    async fn test_issues_certificate() {
        let svc = service(good_lookup(), Duration::ZERO, false);
        match svc.generate(&complete_data(), now()).await {
            CertificateOutcome::Issued(cert) => {
                assert_eq!(cert.trust_score, 1.0);
                assert!(!cert.expert_validation.validation_required);
                assert!(cert.rendered.contains("Acme Exports"));
                assert_eq!(cert.issued_at, now());
            }
            other => panic!("expected issued certificate, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_fields_recover_as_data_missing() {
        let svc = service(good_lookup(), Duration::ZERO, false);
        let mut data = complete_data();
        data.certifier_name = None;

        let outcome = recovered(svc.generate(&data, now()).await);
        assert!(outcome.success);
        assert_eq!(outcome.error_type, ErrorCategory::DataMissing);
        let trust = outcome.certificate.as_ref().unwrap().trust_verification();
        assert_eq!(trust.overall_trust_score, 0.1);
        assert!(trust.expert_validation.expert_validation_required);
        assert_eq!(outcome.certificate.unwrap().recovery_info().data_completeness, 90);
    }

    #[tokio::test]
    async fn test_unavailable_provenance_recovers() {
        let svc = service(Ok(ProvenanceLookup::unavailable()), Duration::ZERO, false);
        let outcome = recovered(svc.generate(&complete_data(), now()).await);
        assert_eq!(outcome.error_type, ErrorCategory::ProvenanceFailed);
        let trust = outcome.certificate.as_ref().unwrap().trust_verification();
        assert_eq!(trust.verification_status, VerificationStatus::ProvenanceUnavailable);
        assert_eq!(trust.overall_trust_score, 0.2);
    }

    #[tokio::test]
    async fn test_formatter_failure_yields_simple_text() {
        let svc = service(good_lookup(), Duration::ZERO, true);
        let outcome = recovered(svc.generate(&complete_data(), now()).await);
        assert_eq!(outcome.error_type, ErrorCategory::FormattingFailed);
        assert!(matches!(
            outcome.certificate,
            Some(RecoveredCertificate::SimpleText(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_system_error() {
        let svc = service(good_lookup(), Duration::from_secs(5), false);
        let outcome = recovered(svc.generate(&complete_data(), now()).await);
        assert_eq!(outcome.error_type, ErrorCategory::SystemError);
        assert!(!outcome.success);
        assert!(outcome.certificate.is_none());
        assert!(outcome.fallback.is_some());
    }

    #[tokio::test]
    async fn test_attempts_reset_after_successful_recovery() {
        let svc = service(Err(CollaboratorError::Unavailable("db down".to_string())), Duration::ZERO, false);
        let outcome = recovered(svc.generate(&complete_data(), now()).await);
        assert!(!outcome.success);
        assert_eq!(svc.recovery_engine().attempts(), 1);

        let mut data = complete_data();
        data.hs_code = None;
        let outcome = recovered(svc.generate(&data, now()).await);
        assert!(outcome.success);
        assert_eq!(outcome.attempt, 2);
        assert_eq!(svc.recovery_engine().attempts(), 0);
    }
}

//! Certificate recovery engine.
//!
//! Classifies a failure, dispatches to the category's strategy, and falls
//! back to the emergency response if the strategy itself fails. `recover`
//! never returns an error and never panics.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use super::certificate::{CertificateData, ManualFallback, RecoveryOutcome};
use super::classify::{classify_error, ErrorCategory};
use super::strategies::{RecoveryContext, StrategyTable, RESPONSIBILITY_DISCLAIMER};

pub const EMERGENCY_DISCLAIMER: &str = "Automated certificate generation failed. Complete the certificate manually and have it reviewed by a licensed customs broker.";

/// Classify-then-recover engine for certificate failures.
///
/// The attempt counter and per-category counts are telemetry only; they
/// never influence which strategy runs.
pub struct CertificateRecoveryEngine {
    strategies: StrategyTable,
    attempts: AtomicU32,
    category_counts: Mutex<BTreeMap<ErrorCategory, u32>>,
}

impl Default for CertificateRecoveryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CertificateRecoveryEngine {
    pub fn new() -> Self {
        Self::with_strategies(StrategyTable::default())
    }

    pub fn with_strategies(strategies: StrategyTable) -> Self {
        Self {
            strategies,
            attempts: AtomicU32::new(0),
            category_counts: Mutex::new(BTreeMap::new()),
        }
    }

    /// Recover from a certificate generation failure.
    pub fn recover(
        &self,
        error: &(dyn std::error::Error + 'static),
        data: &CertificateData,
        now: DateTime<Utc>,
    ) -> RecoveryOutcome {
        let category = classify_error(error);
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        *self.category_counts.lock().entry(category).or_insert(0) += 1;

        tracing::warn!(
            category = %category,
            attempt,
            error = %error,
            "Certificate generation failed, attempting recovery"
        );

        let ctx = RecoveryContext {
            category,
            data,
            error_message: error.to_string(),
            attempt,
            occurred_at: now,
        };

        match (self.strategies.get(category))(&ctx) {
            Ok(outcome) => {
                tracing::info!(
                    category = %category,
                    strategy = %outcome.recovery_strategy,
                    success = outcome.success,
                    "Certificate recovery completed"
                );
                outcome
            }
            Err(e) => {
                tracing::error!(
                    category = %category,
                    attempt,
                    error = %e,
                    "Recovery strategy failed, using emergency fallback"
                );
                self.emergency_fallback(category, attempt)
            }
        }
    }

    /// Final response when nothing else worked. Static content only.
    pub fn emergency_fallback(&self, category: ErrorCategory, attempt: u32) -> RecoveryOutcome {
        RecoveryOutcome {
            success: false,
            error_type: category,
            recovery_strategy: "emergency_fallback".to_string(),
            certificate: None,
            fallback: Some(ManualFallback {
                message: "Certificate could not be generated automatically".to_string(),
                manual_steps: vec![
                    "Download the blank USMCA certificate of origin form".to_string(),
                    "Complete all required fields manually".to_string(),
                    "Contact a licensed customs broker for review before filing".to_string(),
                ],
                contact: "Contact your licensed customs broker".to_string(),
            }),
            professional_disclaimers: vec![
                EMERGENCY_DISCLAIMER.to_string(),
                RESPONSIBILITY_DISCLAIMER.to_string(),
            ],
            attempt,
        }
    }

    /// Recovery attempts since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn reset_attempts(&self) {
        self.attempts.store(0, Ordering::SeqCst);
    }

    /// Recoveries per category since the engine was created.
    pub fn category_counts(&self) -> BTreeMap<ErrorCategory, u32> {
        self.category_counts.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::{CertificateError, RecoveredCertificate, RecoveryError};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap()
    }

    fn data() -> CertificateData {
        CertificateData {
            exporter_name: Some("Acme Exports".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_data_missing_recovery() {
        let engine = CertificateRecoveryEngine::new();
        let error = CertificateError::External("Missing required field".to_string());
        let outcome = engine.recover(&error, &data(), now());

        assert!(outcome.success);
        assert_eq!(outcome.error_type, ErrorCategory::DataMissing);
        let trust = outcome.certificate.as_ref().unwrap().trust_verification();
        assert_eq!(trust.overall_trust_score, 0.1);
        assert!(trust.expert_validation.expert_validation_required);
    }

    #[test]
    fn test_system_error_is_unrecovered() {
        let engine = CertificateRecoveryEngine::new();
        let error = CertificateError::External("Database connection timeout".to_string());
        let outcome = engine.recover(&error, &data(), now());
        assert!(!outcome.success);
        assert!(outcome.certificate.is_none());
        assert!(outcome.fallback.is_some());
    }

    #[test]
    fn test_every_category_keeps_invariants() {
        let engine = CertificateRecoveryEngine::new();
        let errors = [
            CertificateError::MissingData("hs_code".to_string()),
            CertificateError::ProvenanceUnavailable("store down".to_string()),
            CertificateError::TrustCalculation("nan".to_string()),
            CertificateError::ExpertValidation("queue full".to_string()),
            CertificateError::Formatting("pdf".to_string()),
            CertificateError::System("disk".to_string()),
            CertificateError::External("???".to_string()),
        ];
        for error in &errors {
            let outcome = engine.recover(error, &data(), now());
            assert!(!outcome.professional_disclaimers.is_empty());
            if let Some(certificate) = &outcome.certificate {
                let trust = certificate.trust_verification();
                assert!(trust.expert_validation.expert_validation_required);
                assert!((0.0..=0.2).contains(&trust.overall_trust_score));
            } else {
                assert!(!outcome.success);
            }
        }
    }

    #[test]
    fn test_failing_strategy_uses_emergency_fallback() {
        fn failing(_: &RecoveryContext<'_>) -> Result<RecoveryOutcome, RecoveryError> {
            Err(RecoveryError::StrategyFailed("broken".to_string()))
        }

        let table = StrategyTable::default().with_strategy(ErrorCategory::ProvenanceFailed, failing);
        let engine = CertificateRecoveryEngine::with_strategies(table);
        let error = CertificateError::ProvenanceUnavailable("x".to_string());
        let outcome = engine.recover(&error, &data(), now());

        assert!(!outcome.success);
        assert_eq!(outcome.recovery_strategy, "emergency_fallback");
        assert_eq!(outcome.error_type, ErrorCategory::ProvenanceFailed);
        assert!(!outcome.professional_disclaimers.is_empty());
    }

    #[test]
    fn test_formatting_without_data_still_recovers() {
        let engine = CertificateRecoveryEngine::new();
        let error = CertificateError::Formatting("renderer crashed".to_string());
        let outcome = engine.recover(&error, &CertificateData::default(), now());
        assert!(outcome.success);
        assert_eq!(outcome.recovery_strategy, "simple_text_certificate");
        assert!(matches!(
            outcome.certificate,
            Some(RecoveredCertificate::SimpleText(_))
        ));
    }

    #[test]
    fn test_attempt_counter_is_telemetry_only() {
        let engine = CertificateRecoveryEngine::new();
        let error = CertificateError::MissingData("x".to_string());

        let first = engine.recover(&error, &data(), now());
        let second = engine.recover(&error, &data(), now());
        assert_eq!(first.attempt, 1);
        assert_eq!(second.attempt, 2);
        assert_eq!(first.recovery_strategy, second.recovery_strategy);
        assert_eq!(first.certificate, second.certificate);

        engine.reset_attempts();
        assert_eq!(engine.attempts(), 0);
        assert_eq!(engine.category_counts()[&ErrorCategory::DataMissing], 2);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any foreign message yields a structured outcome with
            /// disclaimers, and any certificate demands expert review
            #[test]
            fn test_recovery_invariants(
                message in ".{0,80}",
                exporter in proptest::option::of("[A-Za-z ]{0,20}"),
                hs_code in proptest::option::of("[0-9.]{0,10}"),
            ) {
                let engine = CertificateRecoveryEngine::new();
                let data = CertificateData {
                    exporter_name: exporter,
                    hs_code,
                    ..Default::default()
                };
                let error = CertificateError::External(message);
                let outcome = engine.recover(&error, &data, now());

                prop_assert!(!outcome.professional_disclaimers.is_empty());
                match &outcome.certificate {
                    Some(certificate) => {
                        let trust = certificate.trust_verification();
                        prop_assert!(trust.expert_validation.expert_validation_required);
                        prop_assert!(trust.overall_trust_score <= 0.2);
                    }
                    None => prop_assert!(!outcome.success && outcome.fallback.is_some()),
                }
            }
        }
    }
}

//! Per-category recovery strategies.
//!
//! Every strategy has the same signature and returns the same outcome
//! shape. [`StrategyTable`] maps each [`ErrorCategory`] to one strategy; the
//! lookup is an exhaustive `match`, so adding a category without a strategy
//! does not compile.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::certificate::{
    CertificateData, CertificateFields, ExpertValidationStatus, FallbackCertificate,
    ManualFallback, RecoveredCertificate, RecoveryInfo, RecoveryOutcome, SimpleTextCertificate,
    TrustLevel, TrustVerification, VerificationStatus, CERTIFICATE_TYPE,
};
use super::classify::ErrorCategory;

const DATA_MISSING_TRUST: f64 = 0.1;
const PROVENANCE_FAILED_TRUST: f64 = 0.2;
const TRUST_FAILED_TRUST: f64 = 0.0;
const EXPERT_FAILED_TRUST: f64 = 0.1;
const SIMPLE_TEXT_TRUST: f64 = 0.1;

pub const RECOVERY_DISCLAIMER: &str = "This certificate was generated in recovery mode and is not valid for filing until reviewed by a licensed customs broker.";
pub const PLACEHOLDER_DISCLAIMER: &str =
    "Fields marked \"TO BE COMPLETED BY\" must be filled in by the named party before signature.";
pub const RESPONSIBILITY_DISCLAIMER: &str = "The certifier remains responsible for the accuracy of every statement on a certificate of origin.";
pub const SYSTEM_DISCLAIMER: &str =
    "No certificate was generated because the underlying data could not be trusted.";

/// Errors raised by a recovery strategy itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecoveryError {
    #[error("Recovery strategy failed: {0}")]
    StrategyFailed(String),
}

/// Everything a strategy may use.
#[derive(Debug, Clone)]
pub struct RecoveryContext<'a> {
    pub category: ErrorCategory,
    pub data: &'a CertificateData,
    pub error_message: String,
    pub attempt: u32,
    pub occurred_at: DateTime<Utc>,
}

pub type RecoveryFn = fn(&RecoveryContext<'_>) -> Result<RecoveryOutcome, RecoveryError>;

/// Mapping from error category to recovery strategy.
#[derive(Clone, Copy)]
pub struct StrategyTable {
    pub data_missing: RecoveryFn,
    pub provenance_failed: RecoveryFn,
    pub trust_calculation_failed: RecoveryFn,
    pub expert_validation_failed: RecoveryFn,
    pub formatting_failed: RecoveryFn,
    pub system_error: RecoveryFn,
    pub unknown_error: RecoveryFn,
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self {
            data_missing: recover_data_missing,
            provenance_failed: recover_provenance_failed,
            trust_calculation_failed: recover_trust_calculation_failed,
            expert_validation_failed: recover_expert_validation_failed,
            formatting_failed: recover_formatting_failed,
            system_error: recover_system_error,
            unknown_error: recover_data_missing,
        }
    }
}

impl StrategyTable {
    pub fn get(&self, category: ErrorCategory) -> RecoveryFn {
        match category {
            ErrorCategory::DataMissing => self.data_missing,
            ErrorCategory::ProvenanceFailed => self.provenance_failed,
            ErrorCategory::TrustCalculationFailed => self.trust_calculation_failed,
            ErrorCategory::ExpertValidationFailed => self.expert_validation_failed,
            ErrorCategory::FormattingFailed => self.formatting_failed,
            ErrorCategory::SystemError => self.system_error,
            ErrorCategory::UnknownError => self.unknown_error,
        }
    }

    /// Replace the strategy for one category.
    pub fn with_strategy(mut self, category: ErrorCategory, strategy: RecoveryFn) -> Self {
        let slot = match category {
            ErrorCategory::DataMissing => &mut self.data_missing,
            ErrorCategory::ProvenanceFailed => &mut self.provenance_failed,
            ErrorCategory::TrustCalculationFailed => &mut self.trust_calculation_failed,
            ErrorCategory::ExpertValidationFailed => &mut self.expert_validation_failed,
            ErrorCategory::FormattingFailed => &mut self.formatting_failed,
            ErrorCategory::SystemError => &mut self.system_error,
            ErrorCategory::UnknownError => &mut self.unknown_error,
        };
        *slot = strategy;
        self
    }
}

fn recovery_disclaimers() -> Vec<String> {
    vec![
        RECOVERY_DISCLAIMER.to_string(),
        PLACEHOLDER_DISCLAIMER.to_string(),
        RESPONSIBILITY_DISCLAIMER.to_string(),
    ]
}

fn recovery_info(ctx: &RecoveryContext<'_>, strategy: &str) -> RecoveryInfo {
    RecoveryInfo {
        error_category: ctx.category,
        recovery_strategy: strategy.to_string(),
        data_completeness: ctx.data.data_completeness(),
        missing_fields: ctx.data.missing_fields(),
        original_error: ctx.error_message.clone(),
        recovered_at: ctx.occurred_at,
    }
}

/// Placeholder certificate shared by most strategies.
fn base_certificate(
    ctx: &RecoveryContext<'_>,
    strategy: &str,
    trust: TrustVerification,
) -> FallbackCertificate {
    FallbackCertificate {
        certificate_type: CERTIFICATE_TYPE.to_string(),
        fields: CertificateFields::from_data(ctx.data),
        trust_verification: trust,
        recovery_info: recovery_info(ctx, strategy),
    }
}

fn certificate_outcome(
    ctx: &RecoveryContext<'_>,
    strategy: &str,
    certificate: RecoveredCertificate,
) -> RecoveryOutcome {
    RecoveryOutcome {
        success: true,
        error_type: ctx.category,
        recovery_strategy: strategy.to_string(),
        certificate: Some(certificate),
        fallback: None,
        professional_disclaimers: recovery_disclaimers(),
        attempt: ctx.attempt,
    }
}

pub fn recover_data_missing(ctx: &RecoveryContext<'_>) -> Result<RecoveryOutcome, RecoveryError> {
    const STRATEGY: &str = "placeholder_certificate";
    let certificate = base_certificate(ctx, STRATEGY, TrustVerification::recovery(DATA_MISSING_TRUST));
    Ok(certificate_outcome(ctx, STRATEGY, RecoveredCertificate::Structured(certificate)))
}

pub fn recover_provenance_failed(
    ctx: &RecoveryContext<'_>,
) -> Result<RecoveryOutcome, RecoveryError> {
    const STRATEGY: &str = "placeholder_certificate_without_provenance";
    let mut trust = TrustVerification::recovery(PROVENANCE_FAILED_TRUST);
    trust.verification_status = VerificationStatus::ProvenanceUnavailable;
    let certificate = base_certificate(ctx, STRATEGY, trust);
    Ok(certificate_outcome(ctx, STRATEGY, RecoveredCertificate::Structured(certificate)))
}

pub fn recover_trust_calculation_failed(
    ctx: &RecoveryContext<'_>,
) -> Result<RecoveryOutcome, RecoveryError> {
    const STRATEGY: &str = "placeholder_certificate_without_trust_score";
    let mut trust = TrustVerification::recovery(TRUST_FAILED_TRUST);
    trust.trust_level = TrustLevel::CalculationFailed;
    let certificate = base_certificate(ctx, STRATEGY, trust);
    Ok(certificate_outcome(ctx, STRATEGY, RecoveredCertificate::Structured(certificate)))
}

pub fn recover_expert_validation_failed(
    ctx: &RecoveryContext<'_>,
) -> Result<RecoveryOutcome, RecoveryError> {
    const STRATEGY: &str = "placeholder_certificate_pending_expert";
    let mut trust = TrustVerification::recovery(EXPERT_FAILED_TRUST);
    trust.expert_validation.validation_status = ExpertValidationStatus::ExpertSystemUnavailable;
    trust.expert_validation.reason =
        "Expert validation system unavailable; contact a licensed customs broker directly".to_string();
    let certificate = base_certificate(ctx, STRATEGY, trust);
    Ok(certificate_outcome(ctx, STRATEGY, RecoveredCertificate::Structured(certificate)))
}

/// Plain-text rendering; the formatter is assumed broken so the base
/// certificate is not used. Unknown fields render as placeholders.
pub fn recover_formatting_failed(
    ctx: &RecoveryContext<'_>,
) -> Result<RecoveryOutcome, RecoveryError> {
    const STRATEGY: &str = "simple_text_certificate";
    let fields = CertificateFields::from_data(ctx.data);

    let content = format!(
        "{}\n\nExporter: {}\nProduct: {}\nHS code: {}\nUSMCA qualification: {}\n\nThis is a simplified certificate. Review by a licensed customs broker is required.",
        CERTIFICATE_TYPE.to_uppercase(),
        fields.exporter_name,
        fields.product_description,
        fields.hs_code,
        fields.qualification_status,
    );

    let certificate = SimpleTextCertificate {
        certificate_type: CERTIFICATE_TYPE.to_string(),
        content,
        trust_verification: TrustVerification::recovery(SIMPLE_TEXT_TRUST),
        recovery_info: recovery_info(ctx, STRATEGY),
    };
    Ok(certificate_outcome(ctx, STRATEGY, RecoveredCertificate::SimpleText(certificate)))
}

/// Infrastructure failure: no certificate at all, only manual steps.
pub fn recover_system_error(ctx: &RecoveryContext<'_>) -> Result<RecoveryOutcome, RecoveryError> {
    Ok(RecoveryOutcome {
        success: false,
        error_type: ctx.category,
        recovery_strategy: "manual_process".to_string(),
        certificate: None,
        fallback: Some(ManualFallback {
            message: "Certificate generation is temporarily unavailable".to_string(),
            manual_steps: vec![
                "Download the blank USMCA certificate of origin form from CBP".to_string(),
                "Complete the nine minimum data elements by hand".to_string(),
                "Have the certificate reviewed by a licensed customs broker".to_string(),
                "Retry automated generation once the service recovers".to_string(),
            ],
            contact: "Contact your licensed customs broker".to_string(),
        }),
        professional_disclaimers: vec![
            SYSTEM_DISCLAIMER.to_string(),
            RESPONSIBILITY_DISCLAIMER.to_string(),
        ],
        attempt: ctx.attempt,
    })
}

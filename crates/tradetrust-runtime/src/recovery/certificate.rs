//! Certificate data and the recovered-certificate payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradetrust_core::UsmcaResult;

use super::classify::ErrorCategory;

pub const CERTIFICATE_TYPE: &str = "USMCA Certificate of Origin";

/// Highest trust score a recovered certificate may carry.
pub const MAX_RECOVERY_TRUST: f64 = 0.2;

const BY_EXPORTER: &str = "TO BE COMPLETED BY EXPORTER";
const BY_PRODUCER: &str = "TO BE COMPLETED BY PRODUCER";
const BY_IMPORTER: &str = "TO BE COMPLETED BY IMPORTER";
const BY_CERTIFIER: &str = "TO BE COMPLETED BY CERTIFIER";
const BY_BROKER: &str = "TO BE COMPLETED BY LICENSED CUSTOMS BROKER";

/// Input to certificate generation. Any field may be absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CertificateData {
    pub exporter_name: Option<String>,
    pub exporter_address: Option<String>,
    pub producer_name: Option<String>,
    pub importer_name: Option<String>,
    pub certifier_name: Option<String>,
    pub certifier_title: Option<String>,
    pub product_description: Option<String>,
    pub hs_code: Option<String>,
    pub origin_criterion: Option<String>,
    pub blanket_period: Option<String>,

    /// Qualification result the certificate attests to
    pub qualification: Option<UsmcaResult>,
}

impl CertificateData {
    /// The ten fields a complete certificate needs, with their values.
    pub fn required_fields(&self) -> [(&'static str, Option<&str>); 10] {
        [
            ("exporter_name", present(&self.exporter_name)),
            ("exporter_address", present(&self.exporter_address)),
            ("producer_name", present(&self.producer_name)),
            ("importer_name", present(&self.importer_name)),
            ("certifier_name", present(&self.certifier_name)),
            ("certifier_title", present(&self.certifier_title)),
            ("product_description", present(&self.product_description)),
            ("hs_code", present(&self.hs_code)),
            ("origin_criterion", present(&self.origin_criterion)),
            ("blanket_period", present(&self.blanket_period)),
        ]
    }

    pub fn missing_fields(&self) -> Vec<String> {
        self.required_fields()
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Percentage of required fields present, 0 to 100.
    pub fn data_completeness(&self) -> u8 {
        let fields = self.required_fields();
        let present = fields.iter().filter(|(_, value)| value.is_some()).count();
        ((present * 100) / fields.len()) as u8
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn or_placeholder(field: &Option<String>, placeholder: &str) -> String {
    present(field).unwrap_or(placeholder).to_string()
}

/// Certificate body with every unknown field replaced by a placeholder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertificateFields {
    pub exporter_name: String,
    pub exporter_address: String,
    pub producer_name: String,
    pub importer_name: String,
    pub certifier_name: String,
    pub certifier_title: String,
    pub product_description: String,
    pub hs_code: String,
    pub origin_criterion: String,
    pub blanket_period: String,
    pub qualification_status: String,
}

impl CertificateFields {
    pub fn from_data(data: &CertificateData) -> Self {
        Self {
            exporter_name: or_placeholder(&data.exporter_name, BY_EXPORTER),
            exporter_address: or_placeholder(&data.exporter_address, BY_EXPORTER),
            producer_name: or_placeholder(&data.producer_name, BY_PRODUCER),
            importer_name: or_placeholder(&data.importer_name, BY_IMPORTER),
            certifier_name: or_placeholder(&data.certifier_name, BY_CERTIFIER),
            certifier_title: or_placeholder(&data.certifier_title, BY_CERTIFIER),
            product_description: or_placeholder(&data.product_description, BY_EXPORTER),
            hs_code: or_placeholder(&data.hs_code, BY_BROKER),
            origin_criterion: or_placeholder(&data.origin_criterion, BY_BROKER),
            blanket_period: or_placeholder(&data.blanket_period, BY_CERTIFIER),
            qualification_status: qualification_status(data.qualification.as_ref()),
        }
    }
}

pub(crate) fn qualification_status(qualification: Option<&UsmcaResult>) -> String {
    match qualification.and_then(|q| q.qualified) {
        Some(true) => "qualified".to_string(),
        Some(false) => "not_qualified".to_string(),
        None => BY_BROKER.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    RecoveryMode,
    CalculationFailed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    IncompleteData,
    ProvenanceUnavailable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpertValidationStatus {
    Required,
    ExpertSystemUnavailable,
}

/// Expert review requirement on a recovered certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpertValidationBlock {
    /// Always `true` on a recovered certificate
    pub expert_validation_required: bool,
    pub validation_status: ExpertValidationStatus,
    pub reason: String,
}

/// Degraded trust metadata embedded in every recovered certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrustVerification {
    pub overall_trust_score: f64,
    pub trust_level: TrustLevel,
    pub verification_status: VerificationStatus,
    pub expert_validation: ExpertValidationBlock,
}

impl TrustVerification {
    /// Recovery trust metadata; the score is forced into [0, 0.2].
    pub fn recovery(score: f64) -> Self {
        let score = if score.is_finite() { score } else { 0.0 };
        Self {
            overall_trust_score: score.clamp(0.0, MAX_RECOVERY_TRUST),
            trust_level: TrustLevel::RecoveryMode,
            verification_status: VerificationStatus::IncompleteData,
            expert_validation: ExpertValidationBlock {
                expert_validation_required: true,
                validation_status: ExpertValidationStatus::Required,
                reason: "Certificate generated in recovery mode; licensed customs broker review is mandatory".to_string(),
            },
        }
    }
}

/// How and from what a certificate was recovered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecoveryInfo {
    pub error_category: ErrorCategory,
    pub recovery_strategy: String,

    /// Percentage of required fields that were available
    pub data_completeness: u8,

    pub missing_fields: Vec<String>,
    pub original_error: String,
    pub recovered_at: DateTime<Utc>,
}

/// Structured certificate with placeholders for unknown fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FallbackCertificate {
    pub certificate_type: String,
    pub fields: CertificateFields,
    pub trust_verification: TrustVerification,
    pub recovery_info: RecoveryInfo,
}

/// Plain-text certificate used when the formatter itself is broken.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimpleTextCertificate {
    pub certificate_type: String,
    pub content: String,
    pub trust_verification: TrustVerification,
    pub recovery_info: RecoveryInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum RecoveredCertificate {
    Structured(FallbackCertificate),
    SimpleText(SimpleTextCertificate),
}

impl RecoveredCertificate {
    pub fn trust_verification(&self) -> &TrustVerification {
        match self {
            RecoveredCertificate::Structured(c) => &c.trust_verification,
            RecoveredCertificate::SimpleText(c) => &c.trust_verification,
        }
    }

    pub fn recovery_info(&self) -> &RecoveryInfo {
        match self {
            RecoveredCertificate::Structured(c) => &c.recovery_info,
            RecoveredCertificate::SimpleText(c) => &c.recovery_info,
        }
    }
}

/// Manual steps returned when no certificate can be produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManualFallback {
    pub message: String,
    pub manual_steps: Vec<String>,
    pub contact: String,
}

/// Result of a recovery attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecoveryOutcome {
    /// `false` only for system errors and the emergency fallback
    pub success: bool,
    pub error_type: ErrorCategory,
    pub recovery_strategy: String,
    pub certificate: Option<RecoveredCertificate>,
    pub fallback: Option<ManualFallback>,

    /// Never empty
    pub professional_disclaimers: Vec<String>,

    /// Value of the engine's attempt counter for this recovery
    pub attempt: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial_data() -> CertificateData {
        CertificateData {
            exporter_name: Some("Acme Exports".to_string()),
            hs_code: Some("8471.30".to_string()),
            product_description: Some("  ".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_data_completeness() {
        assert_eq!(partial_data().data_completeness(), 20);
        assert_eq!(CertificateData::default().data_completeness(), 0);
    }

    #[test]
    fn test_blank_fields_count_as_missing() {
        let missing = partial_data().missing_fields();
        assert!(missing.contains(&"product_description".to_string()));
        assert_eq!(missing.len(), 8);
    }

    #[test]
    fn test_placeholders() {
        let fields = CertificateFields::from_data(&partial_data());
        assert_eq!(fields.exporter_name, "Acme Exports");
        assert_eq!(fields.certifier_name, "TO BE COMPLETED BY CERTIFIER");
        assert!(fields.product_description.starts_with("TO BE COMPLETED BY"));
        assert!(fields.qualification_status.starts_with("TO BE COMPLETED BY"));
    }

    #[test]
    fn test_recovery_trust_is_capped() {
        assert_eq!(TrustVerification::recovery(0.9).overall_trust_score, 0.2);
        assert_eq!(TrustVerification::recovery(-1.0).overall_trust_score, 0.0);
        assert_eq!(TrustVerification::recovery(f64::NAN).overall_trust_score, 0.0);
        assert!(TrustVerification::recovery(0.1).expert_validation.expert_validation_required);
    }
}

//! Certificate failure taxonomy.
//!
//! Failures raised inside this workspace carry their category in the type
//! ([`CertificateError`]). Only errors crossing a foreign boundary
//! ([`CertificateError::External`] or any other `std::error::Error`) are
//! classified by keyword.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::collaborators::CollaboratorError;

/// Recovery category of a certificate failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    DataMissing,
    ProvenanceFailed,
    TrustCalculationFailed,
    ExpertValidationFailed,
    FormattingFailed,
    SystemError,
    UnknownError,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 7] = [
        ErrorCategory::DataMissing,
        ErrorCategory::ProvenanceFailed,
        ErrorCategory::TrustCalculationFailed,
        ErrorCategory::ExpertValidationFailed,
        ErrorCategory::FormattingFailed,
        ErrorCategory::SystemError,
        ErrorCategory::UnknownError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::DataMissing => "data_missing",
            ErrorCategory::ProvenanceFailed => "provenance_failed",
            ErrorCategory::TrustCalculationFailed => "trust_calculation_failed",
            ErrorCategory::ExpertValidationFailed => "expert_validation_failed",
            ErrorCategory::FormattingFailed => "formatting_failed",
            ErrorCategory::SystemError => "system_error",
            ErrorCategory::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures raised while generating a certificate.
#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("Missing required certificate data: {0}")]
    MissingData(String),

    #[error("Provenance unavailable: {0}")]
    ProvenanceUnavailable(String),

    #[error("Trust calculation failed: {0}")]
    TrustCalculation(String),

    #[error("Expert validation unavailable: {0}")]
    ExpertValidation(String),

    #[error("Certificate formatting failed: {0}")]
    Formatting(String),

    #[error("System error: {0}")]
    System(String),

    #[error("Collaborator timed out after {0:?}")]
    Timeout(Duration),

    /// Error from a foreign library, classified by its message.
    #[error("{0}")]
    External(String),
}

impl CertificateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CertificateError::MissingData(_) => ErrorCategory::DataMissing,
            CertificateError::ProvenanceUnavailable(_) => ErrorCategory::ProvenanceFailed,
            CertificateError::TrustCalculation(_) => ErrorCategory::TrustCalculationFailed,
            CertificateError::ExpertValidation(_) => ErrorCategory::ExpertValidationFailed,
            CertificateError::Formatting(_) => ErrorCategory::FormattingFailed,
            CertificateError::System(_) | CertificateError::Timeout(_) => {
                ErrorCategory::SystemError
            }
            CertificateError::External(message) => classify_message(message),
        }
    }
}

lazy_static! {
    /// Keyword rules for foreign errors, in priority order. First match wins.
    static ref KEYWORD_RULES: Vec<(Regex, ErrorCategory)> = vec![
        (Regex::new(r"missing|required|undefined").unwrap(), ErrorCategory::DataMissing),
        (Regex::new(r"provenance|verification").unwrap(), ErrorCategory::ProvenanceFailed),
        (Regex::new(r"trust|score").unwrap(), ErrorCategory::TrustCalculationFailed),
        (Regex::new(r"expert|validation").unwrap(), ErrorCategory::ExpertValidationFailed),
        (Regex::new(r"format|template").unwrap(), ErrorCategory::FormattingFailed),
        (Regex::new(r"database|connection|timeout").unwrap(), ErrorCategory::SystemError),
    ];
}

/// Classify a free-form error message.
pub fn classify_message(message: &str) -> ErrorCategory {
    let lowered = message.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(&lowered))
        .map(|(_, category)| *category)
        .unwrap_or(ErrorCategory::UnknownError)
}

/// Classify any error, using the typed category when one is available.
pub fn classify_error(error: &(dyn std::error::Error + 'static)) -> ErrorCategory {
    if let Some(certificate_error) = error.downcast_ref::<CertificateError>() {
        return certificate_error.category();
    }
    if let Some(collaborator_error) = error.downcast_ref::<CollaboratorError>() {
        return CertificateError::from(collaborator_error.clone()).category();
    }
    classify_message(&error.to_string())
}

impl From<CollaboratorError> for CertificateError {
    fn from(error: CollaboratorError) -> Self {
        match error {
            CollaboratorError::Timeout(after) => CertificateError::Timeout(after),
            CollaboratorError::Unavailable(message) => CertificateError::System(message),
            CollaboratorError::Rejected(message) => CertificateError::External(message),
        }
    }
}

//! Certificate failure classification and recovery.
//!
//! This module provides:
//! - The error taxonomy and keyword fallback for foreign errors
//! - Placeholder and plain-text recovered certificates
//! - A category-to-strategy table
//! - The recovery engine with its infallible emergency fallback

mod certificate;
mod classify;
mod engine;
mod strategies;

pub use certificate::{
    CertificateData, CertificateFields, ExpertValidationBlock, ExpertValidationStatus,
    FallbackCertificate, ManualFallback, RecoveredCertificate, RecoveryInfo, RecoveryOutcome,
    SimpleTextCertificate, TrustLevel, TrustVerification, VerificationStatus, CERTIFICATE_TYPE,
    MAX_RECOVERY_TRUST,
};
pub use classify::{classify_error, classify_message, CertificateError, ErrorCategory};
pub use engine::{CertificateRecoveryEngine, EMERGENCY_DISCLAIMER};
pub use strategies::{RecoveryContext, RecoveryError, RecoveryFn, StrategyTable};

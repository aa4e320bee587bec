//! # tradetrust-runtime
//!
//! Async services around the deterministic `tradetrust-core` engine.
//!
//! This crate awaits the external collaborators (provenance store,
//! certificate formatter) and feeds their outputs through the core:
//! - [`WorkflowOrchestrator`] scores a complete classification,
//!   qualification and savings workflow with concurrent provenance lookups.
//! - [`TrustVerifiedCertificateService`] issues certificates of origin and
//!   routes every failure through the [`CertificateRecoveryEngine`].
//! - [`ScoreCache`] is an optional read-through cache for repeated scoring.
//!
//! ## Important
//!
//! The core never performs I/O. Timeouts, retries of collaborator calls and
//! concurrency all live here.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tradetrust_runtime::{RuntimeConfig, WorkflowOrchestrator};
//!
//! let config = Arc::new(RuntimeConfig::from_file("tradetrust.yaml")?.with_env_overrides()?);
//! let orchestrator = WorkflowOrchestrator::new(config, provenance_store);
//!
//! let report = orchestrator.run(&inputs, chrono::Utc::now()).await;
//! if report.expert_validation.validation_required {
//!     notify_broker(&report);
//! }
//! ```

pub mod cache;
pub mod certificate_service;
pub mod collaborators;
pub mod config;
pub mod orchestrator;
pub mod recovery;

pub use cache::{ScoreCache, ScoreKind};
pub use certificate_service::{CertificateOutcome, TrustVerifiedCertificate, TrustVerifiedCertificateService};
pub use collaborators::{
    CertificateFormatter, CollaboratorError, LookupKind, ProvenanceQuery, ProvenanceSource,
};
pub use config::{CacheSettings, RuntimeConfig};
pub use orchestrator::{WorkflowInputs, WorkflowOrchestrator, WorkflowReport};
pub use recovery::{
    classify_error, classify_message, CertificateData, CertificateError,
    CertificateRecoveryEngine, ErrorCategory, RecoveredCertificate, RecoveryError,
    RecoveryOutcome, StrategyTable,
};

use thiserror::Error;
use tradetrust_core::ConfigError;

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Trust configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid runtime config: {0}")]
    InvalidConfig(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

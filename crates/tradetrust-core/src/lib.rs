//! # tradetrust-core
//!
//! Deterministic trust scoring for trade-compliance results.
//!
//! This crate answers, for every classification, qualification and savings
//! result a compliance workflow produces:
//! - How far can this result be trusted?
//! - Does a licensed customs broker need to look at it?
//! - What should the report say about it?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No I/O**: Collaborator outputs are passed in, never fetched
//! 3. **Never fails**: Scoring degrades to conservative values instead of erroring
//! 4. **Parallel-safe**: No shared mutable state; one config, read only
//!
//! ## Example
//!
//! ```rust,ignore
//! use tradetrust_core::{TrustConfig, TrustEngine, ProvenanceLookup, ProvenanceSnapshot};
//!
//! let engine = TrustEngine::new(TrustConfig::from_file("trust.yaml")?.with_env_overrides()?);
//! let lookup = ProvenanceLookup::found(ProvenanceSnapshot::new(0.92, 2.0, 1));
//! let score = engine.calculate_trust_score(Some(&lookup), &classification, &Default::default());
//!
//! let need = engine.evaluate_expert_validation_need(score);
//! if need.validation_required {
//!     println!("Escalate: {}", need.reason);
//! }
//! ```

pub mod config;
pub mod engine;
pub mod escalation;
pub mod freshness;
pub mod provenance;
pub mod sources;
pub mod summary;
pub mod trust;
pub mod types;

// Re-export main types at crate root
pub use config::{ConfigError, TrustConfig};
pub use engine::TrustEngine;
pub use escalation::{EscalationPolicy, EscalationUrgency, ExpertValidationNeed};
pub use freshness::{freshness_bonus, freshness_score};
pub use provenance::{
    ExpertReview, Provenance, ProvenanceCalculator, ProvenanceRecord, ReviewDecision,
    VerificationLog, VerificationNeed, VerificationUrgency,
};
pub use sources::{
    SourceReliability, SourceReliabilityTable, SourceScore, SourceVerification,
    SourceVerificationStatus,
};
pub use summary::{
    create_audit_trail, generate_professional_disclaimer, AuditEntry, AuditTrail,
    ComplianceStatus, ConfidenceLevel, TrustSummary, TrustSummaryAggregator,
};
pub use trust::{ScoreOptions, ScoringError, TrustCalculator};
pub use types::{
    ClassificationCandidate, ClassificationResult, OperationRecord, ProvenanceLookup,
    ProvenanceSnapshot, SavingsResult, ScoredResult, UsmcaResult,
};

//! Trust summaries, disclaimers and audit trails.
//!
//! Everything here is pure: no I/O, no clock reads, no shared state.

mod aggregator;
mod audit;
mod disclaimer;

pub use aggregator::{ConfidenceLevel, TrustSummary, TrustSummaryAggregator};
pub use audit::{
    create_audit_trail, AuditEntry, AuditTrail, ComplianceStatus, OPERATION_SLOTS,
    UNKNOWN_OPERATION,
};
pub use disclaimer::{dedup_preserving_order, generate_professional_disclaimer};

//! Audit trail for a completed workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::OperationRecord;

/// Labels for the workflow steps, by position.
pub const OPERATION_SLOTS: [&str; 3] = ["classification", "qualification", "savings"];
pub const UNKNOWN_OPERATION: &str = "unknown_operation";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// 1-based position in the workflow
    pub step: usize,

    /// Positional label from [`OPERATION_SLOTS`]
    pub operation: String,

    /// Name the collaborator reported, if any
    pub reported_operation: Option<String>,

    pub success: bool,
    pub trust_score: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditTrail {
    pub entries: Vec<AuditEntry>,
    pub total_operations: usize,
    pub successful_operations: usize,
    pub compliance_status: ComplianceStatus,
}

/// Label each operation positionally and derive the compliance status.
///
/// Compliant iff every operation succeeded; an empty trail is compliant.
pub fn create_audit_trail(operations: &[OperationRecord]) -> AuditTrail {
    let entries: Vec<AuditEntry> = operations
        .iter()
        .enumerate()
        .map(|(i, op)| AuditEntry {
            step: i + 1,
            operation: OPERATION_SLOTS
                .get(i)
                .copied()
                .unwrap_or(UNKNOWN_OPERATION)
                .to_string(),
            reported_operation: op.operation.clone(),
            success: op.success,
            trust_score: op.trust_score,
            completed_at: op.completed_at,
        })
        .collect();

    let successful_operations = entries.iter().filter(|e| e.success).count();
    let compliance_status = if successful_operations == entries.len() {
        ComplianceStatus::Compliant
    } else {
        ComplianceStatus::NonCompliant
    };

    AuditTrail {
        total_operations: entries.len(),
        successful_operations,
        compliance_status,
        entries,
    }
}

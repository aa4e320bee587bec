//! Expert escalation policy.
//!
//! The single place where a trust score is turned into a decision about
//! licensed-broker review. The workflow orchestrator and the certificate
//! service both go through [`EscalationPolicy`]; nothing else compares a
//! score against the expert thresholds.

use serde::{Deserialize, Serialize};

use crate::config::TrustConfig;

/// How urgently an expert must look at a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EscalationUrgency {
    None,
    Normal,
    High,
    Critical,
}

/// Outcome of the escalation policy for one trust score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpertValidationNeed {
    pub validation_required: bool,
    pub urgency_level: EscalationUrgency,

    /// Target expert response time
    pub response_time_hours: Option<u32>,

    /// Required expert seniority, 1 (reviewer) to 3 (senior licensed broker)
    pub expert_level: Option<u8>,

    pub confidence_threshold_met: bool,
    pub trust_score: f64,
    pub reason: String,
}

/// Step function from trust score to expert review requirement.
pub struct EscalationPolicy<'a> {
    config: &'a TrustConfig,
}

impl<'a> EscalationPolicy<'a> {
    pub fn new(config: &'a TrustConfig) -> Self {
        Self { config }
    }

    /// Decide whether a result with this trust score needs expert review.
    ///
    /// | score                   | urgency  | response        | level |
    /// |-------------------------|----------|-----------------|-------|
    /// | `<= emergency_expert`   | critical | emergency hours | 3     |
    /// | `<= warning`            | high     | response hours  | 2     |
    /// | `< auto_approval`       | normal   | 2 × response    | 1     |
    /// | otherwise               | none     | -               | -     |
    pub fn evaluate(&self, trust_score: f64) -> ExpertValidationNeed {
        let thresholds = &self.config.thresholds;
        let expert = &self.config.expert;

        // NaN fails every comparison below and would fall through to
        // auto-approval; treat it as the worst possible score instead.
        let score = if trust_score.is_nan() {
            f64::NEG_INFINITY
        } else {
            trust_score
        };

        let need = if score <= thresholds.emergency_expert {
            ExpertValidationNeed {
                validation_required: true,
                urgency_level: EscalationUrgency::Critical,
                response_time_hours: Some(expert.emergency_response_hours),
                expert_level: Some(3),
                confidence_threshold_met: false,
                trust_score,
                reason: format!(
                    "Trust score at or below emergency threshold {:.2}; senior broker review required",
                    thresholds.emergency_expert
                ),
            }
        } else if score <= thresholds.warning {
            ExpertValidationNeed {
                validation_required: true,
                urgency_level: EscalationUrgency::High,
                response_time_hours: Some(expert.response_time_hours),
                expert_level: Some(2),
                confidence_threshold_met: false,
                trust_score,
                reason: format!(
                    "Trust score at or below warning threshold {:.2}; licensed broker review required",
                    thresholds.warning
                ),
            }
        } else if score < thresholds.auto_approval {
            ExpertValidationNeed {
                validation_required: true,
                urgency_level: EscalationUrgency::Normal,
                response_time_hours: Some(expert.response_time_hours.saturating_mul(2)),
                expert_level: Some(1),
                confidence_threshold_met: false,
                trust_score,
                reason: format!(
                    "Trust score below auto-approval threshold {:.2}; routine review",
                    thresholds.auto_approval
                ),
            }
        } else {
            ExpertValidationNeed {
                validation_required: false,
                urgency_level: EscalationUrgency::None,
                response_time_hours: None,
                expert_level: None,
                confidence_threshold_met: true,
                trust_score,
                reason: "Trust score meets auto-approval threshold".to_string(),
            }
        };

        if need.validation_required {
            tracing::debug!(
                trust_score,
                urgency = ?need.urgency_level,
                expert_level = ?need.expert_level,
                "Expert validation required"
            );
        }

        need
    }
}

//! Provenance model for tariff and qualification data.
//!
//! A provenance record describes where a data item came from, when it was
//! last verified, and how much independent verification and expert review
//! it has received. [`ProvenanceCalculator`] turns a record into a bounded
//! confidence score and decides whether the item needs re-verification.
//!
//! Confidence is always clamped to [0.1, 0.95]: the engine never claims
//! total certainty or total ignorance about a data item.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::TrustConfig;
use crate::freshness::freshness_bonus;
use crate::types::ProvenanceSnapshot;

pub const CONFIDENCE_FLOOR: f64 = 0.1;
pub const CONFIDENCE_CEILING: f64 = 0.95;

const WELL_VERIFIED_COUNT: usize = 5;
const WELL_VERIFIED_BONUS: f64 = 0.10;
const UNVERIFIED_PENALTY: f64 = -0.15;
const EXPERT_APPROVAL_SCALE: f64 = 0.15;
const EXPERT_REJECTION_SCALE: f64 = 0.20;
const CROSS_SOURCE_BONUS: f64 = 0.10;

/// A single verification event against some source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationLog {
    /// Kind of source the data was checked against (e.g. "CBP", "CBSA")
    pub source_type: String,

    pub verified_at: DateTime<Utc>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Expert verdict on a data item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

/// A licensed expert's review of a data item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpertReview {
    pub expert_id: String,
    pub decision: ReviewDecision,
    pub reviewed_at: DateTime<Utc>,
}

/// Storage record with its correlated verification history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProvenanceRecord {
    pub primary_source: String,
    pub last_verified: DateTime<Utc>,
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub verification_logs: Vec<VerificationLog>,

    #[serde(default)]
    pub expert_reviews: Vec<ExpertReview>,
}

/// Computed provenance of one data item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provenance {
    pub primary_source: String,
    pub last_verified: DateTime<Utc>,

    /// Hours since last verification
    pub age_hours: f64,

    /// Hours since the record was created
    pub record_age_hours: f64,

    pub confidence_score: f64,
    pub verification_count: usize,
    pub expert_review_count: usize,
    pub expert_approvals: usize,
    pub expert_rejections: usize,
    pub cross_source_validated: bool,
    pub next_verification_due: DateTime<Utc>,
}

impl Provenance {
    /// The subset of fields passed to the trust engine.
    pub fn snapshot(&self) -> ProvenanceSnapshot {
        ProvenanceSnapshot {
            confidence_score: Some(self.confidence_score),
            age_hours: Some(self.age_hours),
            expert_reviews: Some(self.expert_review_count as u32),
            source: Some(self.primary_source.clone()),
        }
    }
}

/// How soon re-verification is needed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum VerificationUrgency {
    None,
    Low,
    Medium,
    High,
}

/// Whether a data item needs re-verification, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationNeed {
    pub needed: bool,
    pub reason: Option<String>,
    pub urgency: VerificationUrgency,
    pub recommended_action: Option<String>,
}

impl VerificationNeed {
    fn not_needed() -> Self {
        Self {
            needed: false,
            reason: None,
            urgency: VerificationUrgency::None,
            recommended_action: None,
        }
    }

    fn needed(
        urgency: VerificationUrgency,
        reason: String,
        recommended_action: impl Into<String>,
    ) -> Self {
        Self {
            needed: true,
            reason: Some(reason),
            urgency,
            recommended_action: Some(recommended_action.into()),
        }
    }
}

/// Computes provenance confidence from storage records.
pub struct ProvenanceCalculator<'a> {
    config: &'a TrustConfig,
}

impl<'a> ProvenanceCalculator<'a> {
    pub fn new(config: &'a TrustConfig) -> Self {
        Self { config }
    }

    /// Compute the provenance of a record as of `now`.
    pub fn calculate(&self, record: &ProvenanceRecord, now: DateTime<Utc>) -> Provenance {
        let age_hours = hours_between(record.last_verified, now);
        let record_age_hours = hours_between(record.created_at, now);

        let approvals = record
            .expert_reviews
            .iter()
            .filter(|r| r.decision == ReviewDecision::Approved)
            .count();
        let rejections = record.expert_reviews.len() - approvals;

        let verification_count = record.verification_logs.len();
        let cross_source_validated = distinct_source_types(record) >= 2;

        let base = self
            .config
            .sources
            .reliability(Some(&record.primary_source));

        let mut confidence = base + freshness_bonus(age_hours, &self.config.data_age);

        if verification_count > WELL_VERIFIED_COUNT {
            confidence += WELL_VERIFIED_BONUS;
        } else if verification_count == 0 {
            confidence += UNVERIFIED_PENALTY;
        }

        confidence += expert_adjustment(approvals, rejections);

        if cross_source_validated {
            confidence += CROSS_SOURCE_BONUS;
        }

        let confidence_score = confidence.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING);

        tracing::debug!(
            source = %record.primary_source,
            base,
            age_hours,
            verification_count,
            approvals,
            rejections,
            cross_source_validated,
            confidence_score,
            "Calculated provenance"
        );

        Provenance {
            primary_source: record.primary_source.clone(),
            last_verified: record.last_verified,
            age_hours,
            record_age_hours,
            confidence_score,
            verification_count,
            expert_review_count: record.expert_reviews.len(),
            expert_approvals: approvals,
            expert_rejections: rejections,
            cross_source_validated,
            next_verification_due: verification_due(
                record.last_verified,
                self.config.data_age.max_age_hours,
            ),
        }
    }

    /// Decide whether a record needs re-verification.
    ///
    /// Rules are evaluated in priority order and the first match wins.
    pub fn check_verification_needs(
        &self,
        record: &ProvenanceRecord,
        provenance: &Provenance,
    ) -> VerificationNeed {
        let ages = &self.config.data_age;
        let thresholds = &self.config.thresholds;

        if provenance.age_hours > ages.max_age_hours {
            return VerificationNeed::needed(
                VerificationUrgency::High,
                format!(
                    "Data last verified {:.0} hours ago, beyond the {:.0} hour maximum",
                    provenance.age_hours, ages.max_age_hours
                ),
                "Re-verify against the primary source before use",
            );
        }

        if provenance.confidence_score < thresholds.min_classification_confidence {
            return VerificationNeed::needed(
                VerificationUrgency::Medium,
                format!(
                    "Confidence {:.2} is below the minimum of {:.2}",
                    provenance.confidence_score, thresholds.min_classification_confidence
                ),
                "Request expert review of this data",
            );
        }

        if record.expert_reviews.is_empty() && provenance.record_age_hours > ages.unreviewed_age_hours
        {
            return VerificationNeed::needed(
                VerificationUrgency::Low,
                format!(
                    "No expert review in the {:.0} hours since the record was created",
                    provenance.record_age_hours
                ),
                "Schedule a routine expert review",
            );
        }

        if !provenance.cross_source_validated
            && provenance.confidence_score < thresholds.single_source_confidence
        {
            return VerificationNeed::needed(
                VerificationUrgency::Medium,
                format!(
                    "Single-source data with confidence {:.2}",
                    provenance.confidence_score
                ),
                "Cross-validate against a second official source",
            );
        }

        VerificationNeed::not_needed()
    }
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = (to - from).num_milliseconds().max(0);
    millis as f64 / 3_600_000.0
}

/// `last_verified` plus the maximum age, saturating at the latest
/// representable time.
fn verification_due(last_verified: DateTime<Utc>, max_age_hours: f64) -> DateTime<Utc> {
    Duration::try_milliseconds((max_age_hours * 3_600_000.0) as i64)
        .and_then(|window| last_verified.checked_add_signed(window))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn distinct_source_types(record: &ProvenanceRecord) -> usize {
    std::iter::once(record.primary_source.as_str())
        .chain(record.verification_logs.iter().map(|l| l.source_type.as_str()))
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Net approval ratio, scaled more heavily when rejections dominate.
fn expert_adjustment(approvals: usize, rejections: usize) -> f64 {
    let total = approvals + rejections;
    if total == 0 {
        return 0.0;
    }

    let net = approvals as f64 - rejections as f64;
    let ratio = net / total as f64;

    if net > 0.0 {
        EXPERT_APPROVAL_SCALE * ratio
    } else if net < 0.0 {
        EXPERT_REJECTION_SCALE * ratio
    } else {
        0.0
    }
}

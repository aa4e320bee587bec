//! Trust summary aggregation.
//!
//! Reduces the scored results of a workflow into one report. Pure and
//! deterministic: the same results always produce the same summary, and
//! empty or undecodable input produces the failsafe summary rather than an
//! error.

use serde::{Deserialize, Serialize};

use crate::config::TrustConfig;
use crate::freshness::freshness_score;
use crate::types::ScoredResult;

/// Freshness assumed when no result reports an age.
const UNKNOWN_FRESHNESS: f64 = 0.5;
const EXPERT_BASELINE: f64 = 0.5;
const EXPERT_REVIEW_WEIGHT: f64 = 0.1;

/// Coarse confidence band of a summary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Medium,
    Low,
}

/// Aggregate trust report over a set of scored results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrustSummary {
    pub overall_trust_score: f64,
    pub confidence_level: ConfidenceLevel,
    pub data_freshness_score: f64,
    pub expert_validation_score: f64,
    pub source_reliability_score: f64,

    /// Distinct declared sources, in first-seen order
    pub data_sources_accessed: Vec<String>,

    pub recommendations: Vec<String>,
    pub results_evaluated: usize,
}

/// Builds trust summaries from scored results.
pub struct TrustSummaryAggregator<'a> {
    config: &'a TrustConfig,
}

impl<'a> TrustSummaryAggregator<'a> {
    pub fn new(config: &'a TrustConfig) -> Self {
        Self { config }
    }

    /// Summarise a list of scored results.
    pub fn generate_trust_summary(&self, results: &[ScoredResult]) -> TrustSummary {
        let scores: Vec<f64> = results
            .iter()
            .filter_map(|r| r.trust_score)
            .filter(|s| s.is_finite())
            .collect();

        let Some(mean_score) = mean(&scores) else {
            tracing::debug!(results = results.len(), "No usable trust scores, returning failsafe summary");
            return self.failsafe_summary();
        };

        let bounds = &self.config.bounds;
        let overall_trust_score = mean_score.max(bounds.min_value).min(bounds.max_value);

        let data_sources_accessed = distinct_sources(results);
        let confidence_level = self.confidence_level(overall_trust_score);

        let summary = TrustSummary {
            overall_trust_score,
            confidence_level,
            data_freshness_score: self.data_freshness(results),
            expert_validation_score: expert_validation(results),
            source_reliability_score: self.source_reliability(&data_sources_accessed),
            recommendations: self.recommendations(overall_trust_score),
            data_sources_accessed,
            results_evaluated: results.len(),
        };

        tracing::debug!(
            overall = summary.overall_trust_score,
            level = ?summary.confidence_level,
            results = summary.results_evaluated,
            "Generated trust summary"
        );

        summary
    }

    /// Summarise untyped input, e.g. a JSON body from the API layer.
    ///
    /// Anything that does not decode as a list of scored results yields the
    /// failsafe summary.
    pub fn generate_trust_summary_value(&self, value: &serde_json::Value) -> TrustSummary {
        match serde_json::from_value::<Vec<ScoredResult>>(value.clone()) {
            Ok(results) => self.generate_trust_summary(&results),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed trust summary input, returning failsafe summary");
                self.failsafe_summary()
            }
        }
    }

    /// The summary reported when nothing trustworthy can be said.
    pub fn failsafe_summary(&self) -> TrustSummary {
        let min = self.config.bounds.min_value;
        TrustSummary {
            overall_trust_score: min,
            confidence_level: ConfidenceLevel::Low,
            data_freshness_score: min,
            expert_validation_score: min,
            source_reliability_score: min,
            data_sources_accessed: vec![],
            recommendations: vec![],
            results_evaluated: 0,
        }
    }

    /// Map a score onto a confidence band.
    pub fn confidence_level(&self, score: f64) -> ConfidenceLevel {
        let t = &self.config.thresholds;
        if score >= t.very_high {
            ConfidenceLevel::VeryHigh
        } else if score >= t.warning {
            ConfidenceLevel::High
        } else if score >= t.critical {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    fn recommendations(&self, score: f64) -> Vec<String> {
        let t = &self.config.thresholds;
        let messages: &[&str] = if score < t.critical {
            &[
                "Immediate review by a licensed customs broker is required before relying on these results",
                "Re-verify classification and tariff rates against official government sources",
                "Do not file a certificate of origin based on this analysis alone",
            ]
        } else if score < t.warning {
            &[
                "Expert review is recommended before filing",
                "Cross-check tariff rates against a second official source",
            ]
        } else {
            &["Results meet professional confidence standards; retain this summary with your filing records"]
        };
        messages.iter().map(|m| m.to_string()).collect()
    }

    fn data_freshness(&self, results: &[ScoredResult]) -> f64 {
        let scores: Vec<f64> = results
            .iter()
            .filter_map(ScoredResult::age_hours)
            .filter(|age| age.is_finite())
            .map(|age| freshness_score(age, &self.config.data_age))
            .collect();
        mean(&scores).unwrap_or(UNKNOWN_FRESHNESS)
    }

    fn source_reliability(&self, sources: &[String]) -> f64 {
        let scores: Vec<f64> = sources
            .iter()
            .map(|s| self.config.sources.reliability(Some(s)))
            .collect();
        mean(&scores).unwrap_or_else(|| self.config.sources.reliability(None))
    }
}

fn expert_validation(results: &[ScoredResult]) -> f64 {
    let reviews: Vec<f64> = results
        .iter()
        .filter_map(ScoredResult::expert_reviews)
        .map(f64::from)
        .collect();
    let mean_reviews = mean(&reviews).unwrap_or(0.0);
    (EXPERT_BASELINE + mean_reviews * EXPERT_REVIEW_WEIGHT).min(1.0)
}

fn distinct_sources(results: &[ScoredResult]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for source in results.iter().filter_map(ScoredResult::declared_source) {
        if !sources.iter().any(|s| s == source) {
            sources.push(source.to_string());
        }
    }
    sources
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

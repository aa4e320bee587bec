//! Trust calculation engine.
//!
//! Turns one computed result plus its provenance into a single bounded
//! trust score. Scoring never fails from the caller's point of view:
//!
//! 1. **Missing data** (`success == false`, no provenance, no confidence)
//!    degrades to the configured floor, `max(min_value, 0.3)` by default.
//! 2. **Unexpected input** (no lookup at all, non-finite numbers, inverted
//!    bounds) is caught by the internal `Result` and yields exactly
//!    `min_value`, which is stricter than the missing-data path.
//!
//! The two paths are distinct on purpose and are tested separately.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TrustConfig;
use crate::freshness::freshness_bonus;
use crate::types::{
    normalize_confidence, ClassificationResult, ProvenanceLookup, ProvenanceSnapshot,
    SavingsResult, UsmcaResult,
};

const HIGH_CONTENT_PCT: f64 = 80.0;
const QUALIFYING_CONTENT_PCT: f64 = 70.0;
const HIGH_CONTENT_BONUS: f64 = 0.10;
const QUALIFYING_CONTENT_BONUS: f64 = 0.05;
const UNQUALIFIED_PENALTY: f64 = -0.10;

const VERIFIED_RATE_BONUS: f64 = 0.05;
const DATABASE_SOURCE_BONUS: f64 = 0.03;
const DATABASE_SOURCE: &str = "database_lookup";

/// Internal scoring failures. These never escape the engine.
#[derive(Error, Debug, PartialEq)]
pub enum ScoringError {
    #[error("No provenance lookup supplied")]
    MissingLookup,

    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    #[error("Invalid score bounds: min {min} > max {max}")]
    InvalidBounds { min: f64, max: f64 },
}

/// Per-call overrides of the configured scoring parameters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreOptions {
    #[serde(default)]
    pub min_value: Option<f64>,

    #[serde(default)]
    pub max_value: Option<f64>,

    #[serde(default)]
    pub classification_weight: Option<f64>,
}

/// Computes trust scores for classification, qualification and savings results.
pub struct TrustCalculator<'a> {
    config: &'a TrustConfig,
}

impl<'a> TrustCalculator<'a> {
    pub fn new(config: &'a TrustConfig) -> Self {
        Self { config }
    }

    /// Trust score of an HS classification.
    ///
    /// Blends provenance confidence with the top candidate's confidence
    /// (`classification_weight`, 0.4 by default), then adds the freshness
    /// and expert-review bonuses.
    pub fn calculate_trust_score(
        &self,
        lookup: Option<&ProvenanceLookup>,
        classification: &ClassificationResult,
        options: &ScoreOptions,
    ) -> f64 {
        let min = self.min_value(options);
        match self.try_trust_score(lookup, classification, options) {
            Ok(score) => {
                tracing::debug!(score, "Calculated classification trust score");
                score
            }
            Err(e) => {
                tracing::warn!(error = %e, floor = min, "Trust calculation failed, using minimum");
                min
            }
        }
    }

    /// Trust score of a USMCA qualification result.
    pub fn calculate_usmca_trust_score(
        &self,
        usmca: &UsmcaResult,
        rules_lookup: Option<&ProvenanceLookup>,
    ) -> f64 {
        let options = ScoreOptions::default();
        let min = self.min_value(&options);
        match self.try_usmca_score(usmca, rules_lookup, &options) {
            Ok(score) => {
                tracing::debug!(score, qualified = ?usmca.qualified, "Calculated USMCA trust score");
                score
            }
            Err(e) => {
                tracing::warn!(error = %e, floor = min, "USMCA trust calculation failed, using minimum");
                min
            }
        }
    }

    /// Trust score of a tariff savings computation.
    pub fn calculate_savings_trust_score(
        &self,
        savings: &SavingsResult,
        rates_lookup: Option<&ProvenanceLookup>,
    ) -> f64 {
        let options = ScoreOptions::default();
        let min = self.min_value(&options);
        match self.try_savings_score(savings, rates_lookup, &options) {
            Ok(score) => {
                tracing::debug!(score, rates_source = ?savings.rates_source, "Calculated savings trust score");
                score
            }
            Err(e) => {
                tracing::warn!(error = %e, floor = min, "Savings trust calculation failed, using minimum");
                min
            }
        }
    }

    fn try_trust_score(
        &self,
        lookup: Option<&ProvenanceLookup>,
        classification: &ClassificationResult,
        options: &ScoreOptions,
    ) -> Result<f64, ScoringError> {
        let (min, max) = self.bounds(options)?;
        let lookup = lookup.ok_or(ScoringError::MissingLookup)?;

        let Some((snapshot, confidence)) = usable_snapshot(lookup)? else {
            return Ok(self.missing_data_score(min, max));
        };

        let weight = finite(
            "classification_weight",
            options
                .classification_weight
                .unwrap_or(self.config.weights.classification_weight),
        )?;

        let blended = match classification.top_confidence() {
            Some(top) => {
                let top = finite("classification.confidence_score", top)?;
                confidence * (1.0 - weight) + top * weight
            }
            None => confidence,
        };

        let score = blended + self.freshness_adjustment(snapshot)? + self.expert_bonus(snapshot);
        Ok(bound(score, min, max))
    }

    fn try_usmca_score(
        &self,
        usmca: &UsmcaResult,
        rules_lookup: Option<&ProvenanceLookup>,
        options: &ScoreOptions,
    ) -> Result<f64, ScoringError> {
        let (min, max) = self.bounds(options)?;
        let lookup = rules_lookup.ok_or(ScoringError::MissingLookup)?;

        let Some((snapshot, confidence)) = usable_snapshot(lookup)? else {
            return Ok(self.missing_data_score(min, max));
        };

        let score = confidence
            + self.freshness_adjustment(snapshot)?
            + self.expert_bonus(snapshot)
            + qualification_adjustment(usmca)?;

        Ok(bound(score, min, max))
    }

    fn try_savings_score(
        &self,
        savings: &SavingsResult,
        rates_lookup: Option<&ProvenanceLookup>,
        options: &ScoreOptions,
    ) -> Result<f64, ScoringError> {
        let (min, max) = self.bounds(options)?;
        let lookup = rates_lookup.ok_or(ScoringError::MissingLookup)?;

        let Some((_, confidence)) = usable_snapshot(lookup)? else {
            return Ok(self.missing_data_score(min, max));
        };

        let weight = self.config.weights.savings_provenance_weight;
        let source_reliability = self
            .config
            .sources
            .reliability(savings.rates_source.as_deref());

        let mut score = confidence * weight + source_reliability * (1.0 - weight);

        if savings.mfn_rate_verified {
            score += VERIFIED_RATE_BONUS;
        }
        if savings.usmca_rate_verified {
            score += VERIFIED_RATE_BONUS;
        }
        if savings
            .rates_source
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(DATABASE_SOURCE))
        {
            score += DATABASE_SOURCE_BONUS;
        }

        Ok(bound(score, min, max))
    }

    /// Freshness adjustment for a snapshot; no age means no adjustment.
    fn freshness_adjustment(&self, snapshot: &ProvenanceSnapshot) -> Result<f64, ScoringError> {
        match snapshot.age_hours {
            Some(age) => Ok(freshness_bonus(
                finite("provenance.age_hours", age)?,
                &self.config.data_age,
            )),
            None => Ok(0.0),
        }
    }

    fn expert_bonus(&self, snapshot: &ProvenanceSnapshot) -> f64 {
        let reviews = snapshot.expert_reviews.unwrap_or(0) as f64;
        let weights = &self.config.weights;
        (reviews * weights.expert_review_bonus).min(weights.max_expert_bonus)
    }

    fn missing_data_score(&self, min: f64, max: f64) -> f64 {
        min.max(self.config.bounds.missing_provenance_floor).min(max)
    }

    fn min_value(&self, options: &ScoreOptions) -> f64 {
        options
            .min_value
            .filter(|v| v.is_finite())
            .unwrap_or(self.config.bounds.min_value)
    }

    fn bounds(&self, options: &ScoreOptions) -> Result<(f64, f64), ScoringError> {
        let min = finite(
            "min_value",
            options.min_value.unwrap_or(self.config.bounds.min_value),
        )?;
        let max = finite(
            "max_value",
            options.max_value.unwrap_or(self.config.bounds.max_value),
        )?;
        if min > max {
            return Err(ScoringError::InvalidBounds { min, max });
        }
        Ok((min, max))
    }
}

/// The snapshot and its confidence, or `None` when the lookup carries no data.
fn usable_snapshot(
    lookup: &ProvenanceLookup,
) -> Result<Option<(&ProvenanceSnapshot, f64)>, ScoringError> {
    let Some(snapshot) = lookup.snapshot() else {
        return Ok(None);
    };
    let Some(confidence) = snapshot.confidence_score else {
        return Ok(None);
    };
    let confidence = finite(
        "provenance.confidence_score",
        normalize_confidence(confidence),
    )?;
    Ok(Some((snapshot, confidence)))
}

fn qualification_adjustment(usmca: &UsmcaResult) -> Result<f64, ScoringError> {
    match usmca.qualified {
        Some(true) => {
            let Some(content) = usmca.north_american_content else {
                return Ok(0.0);
            };
            let content = finite("north_american_content", content)?;
            Ok(if content >= HIGH_CONTENT_PCT {
                HIGH_CONTENT_BONUS
            } else if content >= QUALIFYING_CONTENT_PCT {
                QUALIFYING_CONTENT_BONUS
            } else {
                0.0
            })
        }
        Some(false) => Ok(UNQUALIFIED_PENALTY),
        None => Ok(0.0),
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, ScoringError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScoringError::NonFinite(field))
    }
}

fn bound(score: f64, min: f64, max: f64) -> f64 {
    score.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(confidence: f64, age_hours: f64, expert_reviews: u32) -> ProvenanceLookup {
        ProvenanceLookup::found(ProvenanceSnapshot::new(confidence, age_hours, expert_reviews))
    }

    fn classification(confidence: f64) -> ClassificationResult {
        ClassificationResult {
            confidence_score: Some(confidence),
            ..Default::default()
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_missing_lookup_returns_exact_minimum() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let score = calc.calculate_trust_score(None, &ClassificationResult::default(), &ScoreOptions::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_unsuccessful_lookup_returns_floor() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let failed = ProvenanceLookup::unavailable();
        let score = calc.calculate_trust_score(Some(&failed), &ClassificationResult::default(), &ScoreOptions::default());
        assert_eq!(score, 0.3);
    }

    #[test]
    fn test_floor_respects_higher_minimum() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let options = ScoreOptions {
            min_value: Some(0.4),
            ..Default::default()
        };
        let failed = ProvenanceLookup::unavailable();
        assert_eq!(
            calc.calculate_trust_score(Some(&failed), &ClassificationResult::default(), &options),
            0.4
        );
        assert_eq!(
            calc.calculate_trust_score(None, &ClassificationResult::default(), &options),
            0.4
        );
    }

    #[test]
    fn test_success_without_provenance_returns_floor() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let lookup = ProvenanceLookup {
            success: true,
            provenance: None,
        };
        assert_eq!(
            calc.calculate_trust_score(Some(&lookup), &classification(0.9), &ScoreOptions::default()),
            0.3
        );
    }

    #[test]
    fn test_weighted_blend_with_bonuses() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        // 0.8 * 0.6 + 0.9 * 0.4 = 0.84; + 0.05 (recent) + 0.04 (2 reviews)
        let score = calc.calculate_trust_score(
            Some(&lookup(0.8, 48.0, 2)),
            &classification(0.9),
            &ScoreOptions::default(),
        );
        assert_close(score, 0.93);
    }

    #[test]
    fn test_expert_bonus_is_capped() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        // 0.5 * 0.6 + 0.5 * 0.4 = 0.5; +0.10 fresh; +0.10 capped bonus
        let score = calc.calculate_trust_score(
            Some(&lookup(0.5, 1.0, 20)),
            &classification(0.5),
            &ScoreOptions::default(),
        );
        assert_close(score, 0.7);
    }

    #[test]
    fn test_expired_data_is_penalised() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let score = calc.calculate_trust_score(
            Some(&lookup(0.7, 500.0, 0)),
            &classification(0.7),
            &ScoreOptions::default(),
        );
        assert_close(score, 0.5);
    }

    #[test]
    fn test_percentage_confidence_is_normalised() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let a = calc.calculate_trust_score(Some(&lookup(0.8, 48.0, 0)), &classification(90.0), &ScoreOptions::default());
        let b = calc.calculate_trust_score(Some(&lookup(0.8, 48.0, 0)), &classification(0.9), &ScoreOptions::default());
        assert_close(a, b);
    }

    #[test]
    fn test_no_classification_confidence_uses_provenance_alone() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let score = calc.calculate_trust_score(
            Some(&lookup(0.6, 48.0, 0)),
            &ClassificationResult::default(),
            &ScoreOptions::default(),
        );
        assert_close(score, 0.65);
    }

    #[test]
    fn test_custom_weight_and_bounds() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let options = ScoreOptions {
            min_value: None,
            max_value: Some(0.8),
            classification_weight: Some(1.0),
        };
        let score = calc.calculate_trust_score(Some(&lookup(0.1, 1.0, 0)), &classification(0.95), &options);
        assert_eq!(score, 0.8);
    }

    #[test]
    fn test_non_finite_input_returns_minimum() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let score = calc.calculate_trust_score(
            Some(&lookup(f64::NAN, 1.0, 0)),
            &classification(0.9),
            &ScoreOptions::default(),
        );
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_inverted_option_bounds_return_minimum() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let options = ScoreOptions {
            min_value: Some(0.6),
            max_value: Some(0.2),
            classification_weight: None,
        };
        let score = calc.calculate_trust_score(Some(&lookup(0.9, 1.0, 0)), &classification(0.9), &options);
        assert_eq!(score, 0.6);
    }

    #[test]
    fn test_usmca_high_content_bonus() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let usmca = UsmcaResult {
            qualified: Some(true),
            north_american_content: Some(85.0),
            ..Default::default()
        };
        // 0.7 + 0.05 (recent) + 0.10 (content)
        assert_close(calc.calculate_usmca_trust_score(&usmca, Some(&lookup(0.7, 48.0, 0))), 0.85);
    }

    #[test]
    fn test_usmca_content_bands() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let rules = lookup(0.7, 48.0, 0);
        let score_for = |content: f64| {
            calc.calculate_usmca_trust_score(
                &UsmcaResult {
                    qualified: Some(true),
                    north_american_content: Some(content),
                    ..Default::default()
                },
                Some(&rules),
            )
        };
        assert_close(score_for(80.0), 0.85);
        assert_close(score_for(70.0), 0.80);
        assert_close(score_for(65.0), 0.75);
    }

    #[test]
    fn test_usmca_unqualified_penalty() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let usmca = UsmcaResult {
            qualified: Some(false),
            north_american_content: Some(40.0),
            ..Default::default()
        };
        assert_close(calc.calculate_usmca_trust_score(&usmca, Some(&lookup(0.7, 48.0, 0))), 0.65);
    }

    #[test]
    fn test_usmca_paths_match_classification_paths() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let usmca = UsmcaResult::default();
        assert_eq!(calc.calculate_usmca_trust_score(&usmca, None), 0.0);
        assert_eq!(
            calc.calculate_usmca_trust_score(&usmca, Some(&ProvenanceLookup::unavailable())),
            0.3
        );
    }

    #[test]
    fn test_savings_blend_and_bonuses() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let savings = SavingsResult {
            rates_source: Some("CBP".to_string()),
            mfn_rate_verified: true,
            usmca_rate_verified: true,
            ..Default::default()
        };
        // 0.8 * 0.7 + 0.95 * 0.3 = 0.845; + 0.10 verified
        assert_close(calc.calculate_savings_trust_score(&savings, Some(&lookup(0.8, 1.0, 0))), 0.945);
    }

    #[test]
    fn test_savings_database_lookup_bonus() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        let savings = SavingsResult {
            rates_source: Some("database_lookup".to_string()),
            ..Default::default()
        };
        // 0.6 * 0.7 + 0.8 * 0.3 = 0.66; + 0.03
        assert_close(calc.calculate_savings_trust_score(&savings, Some(&lookup(0.6, 1.0, 0))), 0.69);
    }

    #[test]
    fn test_savings_without_source_uses_missing_reliability() {
        let config = TrustConfig::default();
        let calc = TrustCalculator::new(&config);
        // 0.6 * 0.7 + 0.3 * 0.3 = 0.51
        assert_close(
            calc.calculate_savings_trust_score(&SavingsResult::default(), Some(&lookup(0.6, 1.0, 0))),
            0.51,
        );
    }
}

//! Professional disclaimers attached to every trust report.

use std::collections::HashSet;

use crate::config::TrustConfig;
use crate::types::ScoredResult;

pub const GENERAL_DISCLAIMER: &str = "This analysis is provided for informational purposes and does not constitute legal or customs brokerage advice.";
pub const VERIFIED_DISCLAIMER: &str =
    "Classification and tariff data were verified against official government sources.";
pub const UNVERIFIED_DISCLAIMER: &str = "Some data could not be fully verified; consult a licensed customs broker before relying on these results.";
pub const IMPORTER_RESPONSIBILITY: &str = "The importer of record remains responsible for the accuracy of tariff classification and origin determinations.";
pub const BROKER_REVIEW: &str =
    "Review by a licensed customs broker is recommended before filing any certificate of origin.";

/// Build the ordered, de-duplicated disclaimer list for a set of results.
///
/// Order: general disclaimer, verified/unverified statement, staleness
/// warning (if any result is older than the stale threshold), then the two
/// closing statements.
pub fn generate_professional_disclaimer(
    config: &TrustConfig,
    results: &[ScoredResult],
) -> Vec<String> {
    let mut disclaimers = vec![GENERAL_DISCLAIMER.to_string()];

    let scores: Vec<f64> = results
        .iter()
        .filter_map(|r| r.trust_score)
        .filter(|s| s.is_finite())
        .collect();
    let mean_score = if scores.is_empty() {
        config.bounds.min_value
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    if mean_score >= config.thresholds.warning {
        disclaimers.push(VERIFIED_DISCLAIMER.to_string());
    } else {
        disclaimers.push(UNVERIFIED_DISCLAIMER.to_string());
    }

    let stale_hours = config.data_age.stale_hours;
    if results
        .iter()
        .filter_map(ScoredResult::age_hours)
        .any(|age| age > stale_hours)
    {
        disclaimers.push(format!(
            "Some data was last verified more than {:.0} hours ago and may not reflect current tariff schedules.",
            stale_hours
        ));
    }

    disclaimers.push(IMPORTER_RESPONSIBILITY.to_string());
    disclaimers.push(BROKER_REVIEW.to_string());

    dedup_preserving_order(disclaimers)
}

/// Remove repeated messages, keeping the first occurrence of each.
pub fn dedup_preserving_order(messages: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .filter(|m| seen.insert(m.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProvenanceSnapshot;

    #[test]
    fn test_verified_results() {
        let config = TrustConfig::default();
        let results = vec![ScoredResult::new("classification", 0.9)];
        let disclaimers = generate_professional_disclaimer(&config, &results);
        assert_eq!(
            disclaimers,
            vec![
                GENERAL_DISCLAIMER,
                VERIFIED_DISCLAIMER,
                IMPORTER_RESPONSIBILITY,
                BROKER_REVIEW
            ]
        );
    }

    #[test]
    fn test_unverified_and_stale_results() {
        let config = TrustConfig::default();
        let results = vec![ScoredResult::new("classification", 0.5)
            .with_provenance(ProvenanceSnapshot::new(0.5, 400.0, 0))];
        let disclaimers = generate_professional_disclaimer(&config, &results);
        assert_eq!(disclaimers.len(), 5);
        assert_eq!(disclaimers[0], GENERAL_DISCLAIMER);
        assert_eq!(disclaimers[1], UNVERIFIED_DISCLAIMER);
        assert!(disclaimers[2].contains("168 hours"));
    }

    #[test]
    fn test_empty_results_are_unverified() {
        let config = TrustConfig::default();
        let disclaimers = generate_professional_disclaimer(&config, &[]);
        assert_eq!(disclaimers[1], UNVERIFIED_DISCLAIMER);
        assert_eq!(disclaimers.len(), 4);
    }

    #[test]
    fn test_no_duplicates() {
        let config = TrustConfig::default();
        let results: Vec<ScoredResult> = (0..5)
            .map(|_| {
                ScoredResult::new("classification", 0.4)
                    .with_provenance(ProvenanceSnapshot::new(0.4, 500.0, 0))
            })
            .collect();
        let disclaimers = generate_professional_disclaimer(&config, &results);
        let unique: HashSet<&String> = disclaimers.iter().collect();
        assert_eq!(unique.len(), disclaimers.len());
    }

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        let messages = vec!["b", "a", "b", "c", "a"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dedup_preserving_order(messages), vec!["b", "a", "c"]);
    }
}

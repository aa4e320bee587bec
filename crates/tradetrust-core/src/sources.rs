//! Source reliability lookup and multi-source verification.
//!
//! Reliability is a fixed, ordered token table. A source identifier matches
//! the first token it contains (case-insensitive), so `CBP_HARMONIZED_TARIFF_SCHEDULE`
//! resolves to the `CBP` entry and `UN_COMTRADE` to `COMTRADE`.
//!
//! Unknown sources and missing sources are deliberately different: a named
//! source we do not recognise is still a source (0.70), while no source at
//! all is treated as unverified data (0.30).

use serde::{Deserialize, Serialize};

/// One entry of the reliability table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceReliability {
    /// Token matched as a case-insensitive substring of the source identifier
    pub token: String,

    /// Reliability in [0, 1]
    pub reliability: f64,
}

impl SourceReliability {
    pub fn new(token: impl Into<String>, reliability: f64) -> Self {
        Self {
            token: token.into(),
            reliability,
        }
    }
}

/// Ordered source reliability table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceReliabilityTable {
    /// Entries in match priority order
    pub entries: Vec<SourceReliability>,

    /// Reliability of a named source that matches no entry
    pub unknown_source: f64,

    /// Reliability when no source is declared at all
    pub missing_source: f64,
}

impl Default for SourceReliabilityTable {
    fn default() -> Self {
        Self {
            entries: vec![
                SourceReliability::new("CBP", 0.95),
                SourceReliability::new("CBSA", 0.90),
                SourceReliability::new("SAT", 0.90),
                SourceReliability::new("COMTRADE", 0.85),
                SourceReliability::new("WITS", 0.85),
                SourceReliability::new("database_lookup", 0.80),
                SourceReliability::new("emergency_fallback", 0.40),
            ],
            unknown_source: 0.70,
            missing_source: 0.30,
        }
    }
}

impl SourceReliabilityTable {
    /// Look up the reliability of a source identifier.
    pub fn reliability(&self, source: Option<&str>) -> f64 {
        let Some(source) = source else {
            return self.missing_source;
        };

        let needle = source.to_lowercase();
        self.entries
            .iter()
            .find(|entry| needle.contains(&entry.token.to_lowercase()))
            .map(|entry| entry.reliability)
            .unwrap_or(self.unknown_source)
    }

    /// Verify a set of sources against each other.
    ///
    /// `verified_threshold` is the configured source-agreement threshold and
    /// `partial_threshold` the lower bound for partial verification.
    pub fn verify(
        &self,
        sources: &[String],
        verified_threshold: f64,
        partial_threshold: f64,
    ) -> SourceVerification {
        if sources.is_empty() {
            return SourceVerification {
                sources: vec![],
                overall_reliability: 0.0,
                source_agreement: 0.0,
                verification_status: SourceVerificationStatus::Failed,
                total_sources: 0,
            };
        }

        let scored: Vec<SourceScore> = sources
            .iter()
            .map(|source| SourceScore {
                source: source.clone(),
                reliability: self.reliability(Some(source)),
            })
            .collect();

        let count = scored.len() as f64;
        let overall = scored.iter().map(|s| s.reliability).sum::<f64>() / count;

        let agreement = if scored.len() == 1 {
            1.0
        } else {
            let variance = scored
                .iter()
                .map(|s| (s.reliability - overall).powi(2))
                .sum::<f64>()
                / count;
            (1.0 - 2.0 * variance).max(0.0)
        };

        let status = if overall >= verified_threshold {
            SourceVerificationStatus::Verified
        } else if overall >= partial_threshold {
            SourceVerificationStatus::PartiallyVerified
        } else {
            SourceVerificationStatus::Failed
        };

        SourceVerification {
            total_sources: scored.len(),
            sources: scored,
            overall_reliability: overall,
            source_agreement: agreement,
            verification_status: status,
        }
    }
}

/// Reliability of a single verified source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceScore {
    pub source: String,
    pub reliability: f64,
}

/// Outcome of cross-checking several data sources.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceVerificationStatus {
    Verified,
    PartiallyVerified,
    Failed,
}

/// Result of `verify_data_sources`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceVerification {
    pub sources: Vec<SourceScore>,
    pub overall_reliability: f64,
    pub source_agreement: f64,
    pub verification_status: SourceVerificationStatus,
    pub total_sources: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SourceReliabilityTable {
        SourceReliabilityTable::default()
    }

    #[test]
    fn test_reliability_ordering() {
        let t = table();
        let cbp = t.reliability(Some("CBP"));
        let cbsa = t.reliability(Some("CBSA"));
        let comtrade = t.reliability(Some("UN_COMTRADE"));
        assert!(cbp > cbsa);
        assert!(cbsa > comtrade);
        assert!(comtrade > t.reliability(Some("database_lookup")));
        assert!(t.reliability(Some("database_lookup")) > t.reliability(Some("emergency_fallback")));
    }

    #[test]
    fn test_missing_and_unknown_sources_differ() {
        let t = table();
        assert_eq!(t.reliability(None), 0.3);
        assert_eq!(t.reliability(Some("UNKNOWN_X")), 0.7);
    }

    #[test]
    fn test_case_insensitive_substring_match() {
        let t = table();
        assert_eq!(t.reliability(Some("cbp_harmonized_tariff_schedule")), 0.95);
        assert_eq!(t.reliability(Some("Mexico SAT portal")), 0.90);
        assert_eq!(t.reliability(Some("World Bank WITS")), 0.85);
    }

    #[test]
    fn test_first_matching_token_wins() {
        let t = SourceReliabilityTable {
            entries: vec![
                SourceReliability::new("tariff", 0.6),
                SourceReliability::new("CBP", 0.95),
            ],
            ..table()
        };
        assert_eq!(t.reliability(Some("CBP tariff feed")), 0.6);
    }

    #[test]
    fn test_verify_empty_fails() {
        let result = table().verify(&[], 0.85, 0.7);
        assert_eq!(result.verification_status, SourceVerificationStatus::Failed);
        assert_eq!(result.total_sources, 0);
    }

    #[test]
    fn test_verify_single_source_full_agreement() {
        let result = table().verify(&["CBP".to_string()], 0.85, 0.7);
        assert_eq!(result.source_agreement, 1.0);
        assert_eq!(result.verification_status, SourceVerificationStatus::Verified);
    }

    #[test]
    fn test_verify_mixed_sources() {
        let sources = vec!["CBP".to_string(), "random blog".to_string()];
        let result = table().verify(&sources, 0.85, 0.7);

        // mean of 0.95 and 0.70
        assert!((result.overall_reliability - 0.825).abs() < 1e-9);
        // variance 0.015625 -> 1 - 0.03125
        assert!((result.source_agreement - 0.96875).abs() < 1e-9);
        assert_eq!(
            result.verification_status,
            SourceVerificationStatus::PartiallyVerified
        );
    }

    #[test]
    fn test_verify_unreliable_sources_fail() {
        let sources = vec!["emergency_fallback".to_string(), "scraped".to_string()];
        let result = table().verify(&sources, 0.85, 0.7);
        assert_eq!(result.verification_status, SourceVerificationStatus::Failed);
        assert_eq!(result.total_sources, 2);
    }
}

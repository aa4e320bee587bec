//! Data age scoring.
//!
//! Two distinct measures live here and are intentionally not unified:
//! - [`freshness_bonus`] is the four-band additive adjustment applied when
//!   scoring a single result or provenance record.
//! - [`freshness_score`] is the binary fresh/stale score averaged by the
//!   trust summary.

use crate::config::DataAgeBands;

pub const FRESH_BONUS: f64 = 0.10;
pub const RECENT_BONUS: f64 = 0.05;
pub const EXPIRED_PENALTY: f64 = -0.20;

/// Additive adjustment for data of the given age.
///
/// | age                    | adjustment |
/// |------------------------|------------|
/// | `<= fresh_hours`       | +0.10      |
/// | `<= stale_hours`       | +0.05      |
/// | `> max_age_hours`      | -0.20      |
/// | otherwise              | 0          |
pub fn freshness_bonus(age_hours: f64, bands: &DataAgeBands) -> f64 {
    if age_hours <= bands.fresh_hours {
        FRESH_BONUS
    } else if age_hours <= bands.stale_hours {
        RECENT_BONUS
    } else if age_hours > bands.max_age_hours {
        EXPIRED_PENALTY
    } else {
        0.0
    }
}

/// Binary freshness used by summaries: 1.0 when fresh, 0.5 otherwise.
pub fn freshness_score(age_hours: f64, bands: &DataAgeBands) -> f64 {
    if age_hours <= bands.fresh_hours {
        1.0
    } else {
        0.5
    }
}

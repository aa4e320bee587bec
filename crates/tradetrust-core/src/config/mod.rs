//! Trust configuration.
//!
//! One explicit configuration struct, validated against JSON Schema and
//! loaded once at startup. Every threshold, bound and source constant used
//! by the engine lives here.

mod parser;
mod schema;

pub use parser::{
    ConfigError, DataAgeBands, ExpertSettings, ScoreBounds, ScoreWeights, Thresholds,
    TrustConfig, MAX_DATA_AGE_HOURS,
};
pub use schema::validate_config_schema;

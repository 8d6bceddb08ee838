//! Session configuration, loaded from JSON.

use crate::error::ColonyError;
use colony_data::defines::defense;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Session-level settlement options.
///
/// These are the knobs a game setup screen exposes, not per-empire tech.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyConfig {
    /// Multiplier on research BC (1.0 = normal research speed)
    pub research_multiplier: f32,

    /// Multiplier on natural population growth
    pub growth_multiplier: f32,

    /// Whether capturing a settlement can leak technologies to the invader
    pub plunder_enabled: bool,

    /// Fraction of a scrapped missile base's cost refunded to the empire reserve
    pub scrap_refund_pct: f32,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            research_multiplier: 1.0,
            growth_multiplier: 1.0,
            plunder_enabled: true,
            scrap_refund_pct: defense::SCRAP_REFUND_PCT,
        }
    }
}

impl ColonyConfig {
    /// Loads a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ColonyError> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }
}

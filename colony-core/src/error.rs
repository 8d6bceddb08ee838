//! Error types for settlement processing.

use crate::external::{DesignId, PlanetId};
use thiserror::Error;

/// Errors raised by settlement processing.
///
/// Only [`ColonyError::InvariantViolation`] comes out of turn processing, and it
/// is fatal: it means the budget engine or a category broke the tick budget.
/// Ineligible player actions are not errors; they are silent no-ops.
#[derive(Error, Debug)]
pub enum ColonyError {
    #[error("Budget invariant violated on planet {colony}: allocations {allocations:?}")]
    InvariantViolation {
        colony: PlanetId,
        allocations: [i32; 5],
    },

    #[error("Unknown ship design {0}")]
    UnknownDesign(DesignId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

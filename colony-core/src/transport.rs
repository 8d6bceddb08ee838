//! Troop transports launched from or landing on a settlement.

use crate::external::{EmpireId, PlanetId};
use serde::{Deserialize, Serialize};

/// Combat characteristics of a transport, fixed at launch from the owner's tech.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransportCombat {
    /// Chance (0..1) that a unit slips past the gauntlet
    pub evasion_pct: f32,
    /// Rounds of missile-base and fleet fire a transport must survive
    pub gauntlet_rounds: u32,
    /// Damage needed to destroy one transport unit
    pub hit_points: f32,
    /// Added to every attacking ground combat roll
    pub combat_adj: i32,
}

impl Default for TransportCombat {
    fn default() -> Self {
        Self {
            evasion_pct: 0.0,
            gauntlet_rounds: 1,
            hit_points: 10.0,
            combat_adj: 0,
        }
    }
}

/// A population shipment, outbound from one settlement or arriving at another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    pub owner: EmpireId,
    pub origin: PlanetId,
    pub destination: PlanetId,
    pub size: u32,
    pub travel_turns: u32,
    pub combat: TransportCombat,
}

impl Transport {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Combat-transport evasion against a defender, halved by subspace interdiction.
    pub fn evasion_against(&self, interdiction: bool) -> f32 {
        let pct = self.combat.evasion_pct.clamp(0.0, 1.0);
        if interdiction {
            pct / colony_data::defines::invasion::INTERDICTION_EVASION_DIVISOR
        } else {
            pct
        }
    }
}

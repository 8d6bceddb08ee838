//! Missile-base records mounted on settlements.

use crate::external::{Empire, TechId, TechView};
use colony_data::defines::defense;
use colony_data::MissileBaseSpec;
use serde::{Deserialize, Serialize};

/// The missile a base fires during the gauntlet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissileBaseMissile {
    pub name: String,
    pub damage: f32,
    pub shots: u32,
}

impl MissileBaseMissile {
    /// Damage one base deals per gauntlet round.
    pub fn damage_per_round(&self) -> f32 {
        self.damage * self.shots as f32
    }
}

/// A missile-base technology as installed on a settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissileBaseComponent {
    pub tech: TechId,
    pub level: u32,
    pub base_cost: f32,
    pub missile: MissileBaseMissile,
}

impl MissileBaseComponent {
    /// Cost of one base for `empire`, after its miniaturization discount.
    pub fn cost(&self, empire: &dyn Empire) -> f32 {
        self.cost_with(empire.tech())
    }

    pub fn cost_with(&self, tech: &dyn TechView) -> f32 {
        self.base_cost * tech.miniaturization(self.level)
    }

    /// Total gauntlet damage of `bases` bases in one round.
    pub fn firepower(&self, bases: u32) -> f32 {
        bases as f32 * self.missile.damage_per_round()
    }

    pub fn same_tech(&self, other: &MissileBaseComponent) -> bool {
        self.tech == other.tech
    }
}

impl From<&MissileBaseSpec> for MissileBaseComponent {
    fn from(spec: &MissileBaseSpec) -> Self {
        Self {
            tech: spec.tech_id,
            level: spec.level,
            base_cost: spec.base_cost,
            missile: MissileBaseMissile {
                name: spec.name.to_string(),
                damage: spec.damage,
                shots: defense::SHOTS_PER_BASE,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SandboxTech;
    use colony_data::MISSILE_BASES;

    #[test]
    fn test_cost_scales_with_miniaturization() {
        let base = MissileBaseComponent::from(&MISSILE_BASES[0]);
        let mut tech = SandboxTech::default();
        assert_eq!(base.cost_with(&tech), 120.0);

        tech.miniaturization_per_level = 0.01;
        tech.tech_level = 11;
        // Ten levels past the base's own level: 10% cheaper
        assert!((base.cost_with(&tech) - 108.0).abs() < 1e-3);
    }

    #[test]
    fn test_firepower() {
        let base = MissileBaseComponent::from(&MISSILE_BASES[0]);
        // 3 shots of 4 damage per base
        assert_eq!(base.firepower(2), 24.0);
    }
}

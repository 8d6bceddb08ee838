//! Collaborator interfaces.
//!
//! The settlement core never owns an empire, a planet or the galaxy. It reaches
//! them through these traits, which the host game implements. Everything here
//! is read-mostly: the few mutating calls are the effects a settlement is
//! allowed to have on the outside world (reserve deposits, waste, terraforming,
//! ship launches, scans).

use crate::colony::Colony;
use crate::missile_base::MissileBaseComponent;
use crate::transport::TransportCombat;
use rand::RngCore;
use serde::{Deserialize, Serialize};

pub type EmpireId = u32;
pub type PlanetId = u32;
pub type StarId = u32;
pub type TechId = u32;
pub type DesignId = u32;

/// Planet environment class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    Hostile,
    Poor,
    Normal,
    Fertile,
    Gaia,
}

impl Environment {
    /// Multiplier on natural population growth.
    pub fn growth_adj(self) -> f32 {
        match self {
            Environment::Hostile => 0.5,
            Environment::Poor => 0.75,
            Environment::Normal => 1.0,
            Environment::Fertile => 1.5,
            Environment::Gaia => 2.0,
        }
    }
}

/// Diplomatic standing between two empires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Treaty {
    None,
    NonAggression,
    Alliance,
}

/// Racial traits that change settlement rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceTraits {
    pub name: String,
    /// Never pays for waste cleanup and grows at full rate on any world
    pub ignores_planetary_environment: bool,
    /// Robotic-control upgrades cost nothing
    pub ignores_factory_refit: bool,
    /// Multiplier on natural population growth
    pub growth_modifier: f32,
    /// Added to every defending ground combat roll
    pub ground_defense_bonus: i32,
}

impl Default for RaceTraits {
    fn default() -> Self {
        Self {
            name: "Human".to_string(),
            ignores_planetary_environment: false,
            ignores_factory_refit: false,
            growth_modifier: 1.0,
            ground_defense_bonus: 0,
        }
    }
}

/// A buildable ship design as the shipyard sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipDesign {
    pub id: DesignId,
    pub name: String,
    pub cost: f32,
    /// Obsolete designs can no longer be built
    pub active: bool,
}

/// Where newly built ships are sent instead of idling in orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RallyPoint {
    pub star: StarId,
    /// Owner of the destination system
    pub owner: EmpireId,
}

/// Technology state of one empire.
pub trait TechView {
    fn knows(&self, tech: TechId) -> bool;
    fn known_techs(&self) -> Vec<TechId>;

    fn worker_productivity(&self) -> f32;
    fn base_factory_cost(&self) -> f32;
    /// Cost of one new factory at the given robotic-control tier.
    fn factory_cost(&self, robot_controls: u32) -> f32;
    fn base_robot_controls(&self) -> u32;
    fn max_robot_controls(&self) -> u32;

    /// Waste generated per factory in use.
    fn factory_waste_rate(&self) -> f32;
    /// Waste units removed per BC spent on cleanup.
    fn waste_elimination(&self) -> f32;

    /// Size a planet can be terraformed above its base size.
    fn terraform_size_bonus(&self) -> f32;
    fn terraform_cost_per_size(&self) -> f32;
    fn atmosphere_terraform_cost(&self) -> f32;
    fn soil_enrichment_available(&self) -> bool;
    /// BC to grow one unit of population.
    fn population_cost(&self) -> f32;

    fn max_planetary_shield(&self) -> u32;
    fn best_missile_base(&self) -> MissileBaseComponent;
    /// Cost multiplier for a component of the given tech level.
    fn miniaturization(&self, level: u32) -> f32;

    fn subspace_interdiction(&self) -> bool;
    fn ground_combat_bonus(&self) -> i32;
    /// Combat profile this empire's transports launch with.
    fn transport_combat(&self) -> TransportCombat;
    fn stargate_cost(&self) -> f32;
}

/// The empire that owns a settlement.
pub trait Empire {
    fn id(&self) -> EmpireId;
    /// Whether the human player controls this empire.
    fn is_player(&self) -> bool;
    fn race(&self) -> &RaceTraits;
    fn tech(&self) -> &dyn TechView;

    /// Fraction of settlement production taken as tax into the reserve.
    fn tax_pct(&self) -> f32;
    /// Fraction of settlement production claimed by empire-wide upkeep.
    fn expense_pct(&self) -> f32;
    fn research_bonus_pct(&self) -> f32;

    fn total_reserve(&self) -> f32;
    /// Deposits into (or, when negative, draws from) the treasury reserve.
    fn add_reserve(&mut self, bc: f32);
    fn add_research_bc(&mut self, bc: f32);
    fn diverts_colony_excess_to_research(&self) -> bool;
    /// Cap on shipyard spending per settlement per turn, if any.
    fn max_ship_bc_permitted(&self) -> Option<f32>;

    fn treaty(&self, other: EmpireId) -> Treaty;

    fn ship_design(&self, id: DesignId) -> Option<ShipDesign>;
    fn record_ships_built(&mut self, design: DesignId, count: u32);
    fn deploy_ships(&mut self, star: StarId, design: DesignId, count: u32, rally: Option<StarId>);
    fn rally_point(&self, star: StarId) -> Option<RallyPoint>;
    fn has_stargate(&self, star: StarId) -> bool;
    fn build_stargate(&mut self, star: StarId);

    fn learn_tech(&mut self, tech: TechId);
}

/// The planet a settlement sits on.
pub trait Planet {
    fn id(&self) -> PlanetId;
    fn star(&self) -> StarId;

    fn base_size(&self) -> f32;
    fn current_size(&self) -> f32;
    /// Population supported once accumulated waste is accounted for.
    fn max_size(&self) -> f32;

    fn waste(&self) -> f32;
    fn max_waste(&self) -> f32;
    fn add_waste(&mut self, amount: f32);
    fn reset_waste(&mut self);
    fn remove_excess_waste(&mut self);

    fn environment(&self) -> Environment;
    fn production_adj(&self) -> f32;
    fn research_adj(&self) -> f32;
    fn in_nebula(&self) -> bool;

    fn can_colonize(&self, tech: &dyn TechView) -> bool;
    fn can_terraform_atmosphere(&self, tech: &dyn TechView) -> bool;
    fn terraform_atmosphere(&mut self);
    fn can_enrich_soil(&self, tech: &dyn TechView) -> bool;
    fn enrich_soil(&mut self);
    fn terraform_biosphere(&mut self, amount: f32);

    /// Abandoned factories of empires other than `owner`.
    fn num_alien_factories(&self, owner: EmpireId) -> u32;
    fn add_alien_factories(&mut self, empire: EmpireId, count: i32);
    fn random_alien_factory_empire(
        &self,
        owner: EmpireId,
        rng: &mut dyn RngCore,
    ) -> Option<EmpireId>;

    /// Returns the planet to an uncolonized state.
    fn abandon(&mut self);
}

/// Galaxy-wide state read during assessment and invasions.
pub trait Galaxy {
    fn hostile_fleets_orbiting(&self, star: StarId, owner: EmpireId) -> bool;
    /// Anti-ship firepower of fleets orbiting `star` that fight for `defender` against `attacker`.
    fn defending_firepower(&self, star: StarId, defender: EmpireId, attacker: EmpireId) -> f32;
    fn empires_with_fleets(&self, star: StarId) -> Vec<EmpireId>;
    fn refresh_scan(&mut self, empire: EmpireId, planet: PlanetId);

    fn colony_count(&self, empire: EmpireId) -> usize;
    fn transfer_colony(&mut self, planet: PlanetId, from: EmpireId, to: EmpireId);
    fn eliminate(&mut self, empire: EmpireId);
}

/// Automated allocation manager for AI or assisted settlements.
pub trait Governor {
    /// Called when the settlement's income went negative.
    fn lower_expenses(&mut self, colony: &mut Colony, income: f32);
    /// Called when assessment found goals that need a fresh allocation.
    fn set_colony_allocations(&mut self, colony: &mut Colony);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_adj_is_monotonic() {
        let envs = [
            Environment::Hostile,
            Environment::Poor,
            Environment::Normal,
            Environment::Fertile,
            Environment::Gaia,
        ];
        for pair in envs.windows(2) {
            assert!(pair[0].growth_adj() < pair[1].growth_adj());
        }
    }
}

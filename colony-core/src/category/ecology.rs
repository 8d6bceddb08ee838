//! Waste cleanup, terraforming and population growth.
//!
//! Funds are spent in a fixed order, each step taking what the previous one
//! left: industrial waste, hostile atmosphere, soil enrichment, biosphere
//! terraforming, then population purchased on top of natural growth.

use super::{ticks_for_bc, CategoryKind, SpendingCategory, TurnFunds};
use crate::colony::ColonyState;
use crate::context::{Surroundings, TurnEnv};
use crate::external::Empire;
use crate::observer::event_log::ColonyEvent;
use crate::observer::notify;
use crate::orders::OrderKind;
use colony_data::defines::ecology::SOIL_ENRICHMENT_COST;
use colony_data::defines::population as defines;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ecology {
    /// Progress toward terraforming a hostile atmosphere
    pub hostile_bc: f32,
    /// Progress toward the next soil enrichment
    pub soil_enrich_bc: f32,
    /// Waste removed last turn
    pub waste_cleaned: f32,
    /// Population bought last turn, on top of natural growth
    pub purchased_population: f32,
    #[serde(skip)]
    pending: PendingEcology,
}

#[derive(Debug, Clone, Default)]
struct PendingEcology {
    waste_cleaned: f32,
    atmosphere: bool,
    soil: bool,
    terraform_size: f32,
    purchased_population: f32,
    excess_bc: f32,
}

/// Natural population growth for one turn.
///
/// Logistic in the room left to grow, scaled by environment and race, with a
/// floor of [`defines::MIN_GROWTH`] while there is any room at all.
pub fn normal_pop_growth(population: f32, view: Surroundings<'_>) -> f32 {
    let max = view.planet.max_size();
    let room = max - population;
    if room <= 0.0 || max <= 0.0 {
        return 0.0;
    }
    let race = view.empire.race();
    let env_adj = if race.ignores_planetary_environment {
        1.0
    } else {
        view.planet.environment().growth_adj()
    };
    let growth = population
        * (1.0 - population / max)
        * defines::BASE_GROWTH_RATE
        * env_adj
        * race.growth_modifier
        * view.config.growth_multiplier;
    growth.max(defines::MIN_GROWTH).min(room)
}

/// Population lost when a settlement outgrows what its planet supports.
pub fn overpopulation_loss(population: f32, max_size: f32) -> f32 {
    let over = population - max_size;
    if over <= 0.0 || population <= 0.0 {
        return 0.0;
    }
    ((over / population) * defines::OVERPOPULATION_PENALTY * over).min(over)
}

impl Ecology {
    fn cleanup_cost(waste: f32, view: Surroundings<'_>) -> f32 {
        if view.empire.race().ignores_planetary_environment || waste <= 0.0 {
            return 0.0;
        }
        let rate = view.empire.tech().waste_elimination();
        if rate <= 0.0 {
            return 0.0;
        }
        waste / rate
    }

    fn terraform_target(view: Surroundings<'_>) -> f32 {
        view.planet.base_size() + view.empire.tech().terraform_size_bonus()
    }

    /// Ticks needed to clean the planet's waste plus `new_waste`.
    pub fn cleanup_allocation_needed(&self, new_waste: f32, income: f32, view: Surroundings<'_>) -> i32 {
        let cost = Self::cleanup_cost(view.planet.waste() + new_waste, view);
        ticks_for_bc(cost, income)
    }

    /// Ticks that would fund every outstanding ecology goal this turn.
    pub fn max_allocation_needed(
        &self,
        colony: &ColonyState,
        new_waste: f32,
        income: f32,
        view: Surroundings<'_>,
    ) -> i32 {
        let tech = view.empire.tech();
        let mut bc = Self::cleanup_cost(view.planet.waste() + new_waste, view);
        if view.planet.can_terraform_atmosphere(tech) {
            bc += (tech.atmosphere_terraform_cost() - self.hostile_bc).max(0.0);
        }
        if view.planet.can_enrich_soil(tech) {
            bc += (SOIL_ENRICHMENT_COST - self.soil_enrich_bc).max(0.0);
        }
        let size_needed = (Self::terraform_target(view) - view.planet.current_size()).max(0.0);
        bc += size_needed * tech.terraform_cost_per_size();
        let room = view.planet.max_size() + size_needed
            - colony.population
            - normal_pop_growth(colony.population, view);
        bc += room.max(0.0) * tech.population_cost();
        ticks_for_bc(bc, income)
    }

    pub fn terraform_completed(&self, view: Surroundings<'_>) -> bool {
        view.planet.current_size() >= Self::terraform_target(view)
    }

    pub fn population_growth_completed(&self, colony: &ColonyState, view: Surroundings<'_>) -> bool {
        colony.population >= view.planet.max_size()
    }
}

impl SpendingCategory for Ecology {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Ecology
    }

    fn next_turn(&mut self, colony: &ColonyState, funds: TurnFunds, env: &mut TurnEnv<'_>) {
        let view = env.view();
        let tech = view.empire.tech();
        self.pending = PendingEcology::default();
        let mut bc = self.total_bc(colony, funds, view);

        let waste = view.planet.waste();
        let cleanup = Self::cleanup_cost(waste, view).min(bc);
        if cleanup > 0.0 {
            bc -= cleanup;
            self.pending.waste_cleaned = (cleanup * tech.waste_elimination()).min(waste);
        }

        if bc > 0.0 && view.planet.can_terraform_atmosphere(tech) {
            let cost = tech.atmosphere_terraform_cost();
            let spend = (cost - self.hostile_bc).max(0.0).min(bc);
            self.hostile_bc += spend;
            bc -= spend;
            if self.hostile_bc >= cost {
                self.hostile_bc = 0.0;
                self.pending.atmosphere = true;
            }
        }

        if bc > 0.0 && view.planet.can_enrich_soil(tech) {
            let spend = (SOIL_ENRICHMENT_COST - self.soil_enrich_bc).max(0.0).min(bc);
            self.soil_enrich_bc += spend;
            bc -= spend;
            if self.soil_enrich_bc >= SOIL_ENRICHMENT_COST {
                self.soil_enrich_bc = 0.0;
                self.pending.soil = true;
            }
        }

        let size_needed = (Self::terraform_target(view) - view.planet.current_size()).max(0.0);
        let per_size = tech.terraform_cost_per_size();
        if bc > 0.0 && size_needed > 0.0 && per_size > 0.0 {
            let gained = (bc / per_size).min(size_needed);
            bc -= gained * per_size;
            self.pending.terraform_size = gained;
        }

        let max_size = view.planet.max_size() + self.pending.terraform_size;
        let room = max_size - colony.population - normal_pop_growth(colony.population, view);
        let pop_cost = tech.population_cost();
        if bc > 0.0 && room > 0.0 && pop_cost > 0.0 {
            let bought = (bc / pop_cost).min(room);
            bc -= bought * pop_cost;
            self.pending.purchased_population = bought;
        }

        self.pending.excess_bc = bc.max(0.0);
    }

    fn commit_turn(&mut self, colony: &mut ColonyState, env: &mut TurnEnv<'_>) {
        let pending = std::mem::take(&mut self.pending);

        if pending.waste_cleaned > 0.0 {
            if pending.waste_cleaned >= env.planet.waste() {
                env.planet.reset_waste();
            } else {
                env.planet.add_waste(-pending.waste_cleaned);
            }
        }
        self.waste_cleaned = pending.waste_cleaned;

        if pending.atmosphere {
            env.planet.terraform_atmosphere();
            notify(env.observer, ColonyEvent::AtmosphereTerraformed { planet: colony.planet });
        }
        if pending.soil {
            env.planet.enrich_soil();
            notify(env.observer, ColonyEvent::SoilEnriched { planet: colony.planet });
        }
        if pending.terraform_size > 0.0 {
            env.planet.terraform_biosphere(pending.terraform_size);
        }

        let natural = normal_pop_growth(colony.population, env.view());
        let max_size = env.planet.max_size();
        let mut population = colony.population + natural + pending.purchased_population;
        population -= overpopulation_loss(population, max_size);
        colony.population = population.max(0.0);
        self.purchased_population = pending.purchased_population;

        if pending.excess_bc > 0.0 {
            env.empire.add_reserve(pending.excess_bc);
        }
    }

    fn assess_turn(&mut self, colony: &mut ColonyState, view: Surroundings<'_>) -> Option<f32> {
        let tech = view.empire.tech();
        let mut leftover: Option<f32> = None;
        let mut complete = |colony: &mut ColonyState, order: OrderKind| {
            if let Some(amount) = colony.remove_order(order) {
                leftover = Some(leftover.map_or(amount, |l| l.max(amount)));
            }
        };
        if !view.planet.can_terraform_atmosphere(tech) {
            complete(colony, OrderKind::Atmosphere);
        }
        if !view.planet.can_enrich_soil(tech) {
            complete(colony, OrderKind::Soil);
        }
        if self.terraform_completed(view) {
            complete(colony, OrderKind::Terraform);
        }
        if self.population_growth_completed(colony, view) {
            complete(colony, OrderKind::Population);
        }
        leftover
    }

    fn is_completed(&self, colony: &ColonyState, view: Surroundings<'_>) -> bool {
        colony.population >= view.planet.max_size()
            && (view.empire.race().ignores_planetary_environment || view.planet.waste() <= 0.0)
    }

    fn captured_by(&mut self, _new_owner: &dyn Empire) {
        self.hostile_bc = 0.0;
        self.soil_enrich_bc = 0.0;
        self.pending = PendingEcology::default();
    }
}

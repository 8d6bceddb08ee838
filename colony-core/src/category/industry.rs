//! Factories and robotic controls.
//!
//! Each robotic-control tier lets every colonist run one more factory, so the
//! number of factories worth building is `planet size × tier`. Industry first
//! refits to a better tier once the current one is saturated, then salvages
//! abandoned alien factories, then builds new ones.

use super::{ticks_for_bc, CategoryKind, SpendingCategory, TurnFunds};
use crate::colony::ColonyState;
use crate::context::{Surroundings, TurnEnv};
use crate::external::{Empire, Planet};
use crate::observer::event_log::ColonyEvent;
use crate::observer::notify;
use crate::orders::OrderKind;
use colony_data::defines::industry as defines;
use serde::{Deserialize, Serialize};

/// Factories a planet can staff at a given robotic-control tier.
pub fn max_buildable_factories(planet: &dyn Planet, robot_controls: u32) -> u32 {
    (planet.current_size() * robot_controls as f32).floor().max(0.0) as u32
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Industry {
    pub factories: u32,
    pub previous_factories: u32,
    pub robot_controls: u32,
    /// Unspent BC carried to next turn
    pub industry_reserve_bc: f32,
    #[serde(skip)]
    pending: PendingIndustry,
}

/// Proposed progress, applied by `commit_turn`.
#[derive(Debug, Clone, Default)]
struct PendingIndustry {
    robot_controls: Option<u32>,
    alien_conversions: u32,
    new_factories: u32,
    excess_bc: f32,
}

impl Industry {
    pub fn new(owner: &dyn Empire) -> Self {
        Self {
            robot_controls: owner.tech().base_robot_controls(),
            ..Default::default()
        }
    }

    /// Factories actually worked by `population`.
    pub fn used_factories(&self, population: f32) -> u32 {
        let staffed = (population.max(0.0) * self.robot_controls as f32).floor() as u32;
        self.factories.min(staffed)
    }

    pub fn max_buildable(&self, planet: &dyn Planet) -> u32 {
        max_buildable_factories(planet, self.robot_controls)
    }

    pub fn clamp_robot_controls(&mut self, max: u32) {
        self.robot_controls = self.robot_controls.min(max);
    }

    fn refit_cost(&self, view: Surroundings<'_>) -> f32 {
        if view.empire.race().ignores_factory_refit {
            return 0.0;
        }
        let tech = view.empire.tech();
        self.max_buildable(view.planet) as f32 * tech.base_factory_cost() * defines::REFIT_COST_FACTOR
    }

    /// BC still needed to saturate the best robotic-control tier.
    pub fn bc_to_complete(&self, view: Surroundings<'_>) -> f32 {
        let tech = view.empire.tech();
        let mut needed = 0.0;
        let mut factories = self.factories;
        for rc in self.robot_controls..=tech.max_robot_controls() {
            if rc > self.robot_controls {
                needed += if view.empire.race().ignores_factory_refit {
                    0.0
                } else {
                    max_buildable_factories(view.planet, rc - 1) as f32
                        * tech.base_factory_cost()
                        * defines::REFIT_COST_FACTOR
                };
            }
            let target = max_buildable_factories(view.planet, rc);
            if target > factories {
                needed += (target - factories) as f32 * tech.factory_cost(rc);
                factories = target;
            }
        }
        (needed - self.industry_reserve_bc).max(0.0)
    }

    /// Ticks that would fund the remaining build-out in one turn.
    pub fn max_allocation_needed(&self, income: f32, view: Surroundings<'_>) -> i32 {
        ticks_for_bc(self.bc_to_complete(view), income)
    }

    fn fully_built(&self, view: Surroundings<'_>) -> bool {
        self.robot_controls >= view.empire.tech().max_robot_controls()
            && self.factories >= self.max_buildable(view.planet)
    }
}

impl SpendingCategory for Industry {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Industry
    }

    fn next_turn(&mut self, colony: &ColonyState, funds: TurnFunds, env: &mut TurnEnv<'_>) {
        let view = env.view();
        let tech = view.empire.tech();
        self.pending = PendingIndustry::default();

        let mut bc = self.total_bc(colony, funds, view) + self.industry_reserve_bc;
        self.industry_reserve_bc = 0.0;
        let mut robot_controls = self.robot_controls;
        let mut factories = self.factories;

        if robot_controls < tech.max_robot_controls()
            && factories >= max_buildable_factories(view.planet, robot_controls)
        {
            let cost = self.refit_cost(view);
            if bc < cost {
                self.industry_reserve_bc = bc;
                return;
            }
            bc -= cost;
            robot_controls += 1;
            self.pending.robot_controls = Some(robot_controls);
        }

        let max = max_buildable_factories(view.planet, robot_controls);

        let alien = view.planet.num_alien_factories(colony.owner);
        if alien > 0 && factories < max {
            let affordable = (bc / defines::ALIEN_FACTORY_CONVERSION_COST).floor() as u32;
            let converted = alien.min(max - factories).min(affordable);
            bc -= converted as f32 * defines::ALIEN_FACTORY_CONVERSION_COST;
            factories += converted;
            self.pending.alien_conversions = converted;
        }

        if factories < max {
            let cost = tech.factory_cost(robot_controls);
            let affordable = if cost > 0.0 {
                (bc / cost).floor() as u32
            } else {
                max - factories
            };
            let built = affordable.min(max - factories);
            bc -= built as f32 * cost.max(0.0);
            factories += built;
            self.pending.new_factories = built;
        }

        let complete = robot_controls >= tech.max_robot_controls() && factories >= max;
        if complete {
            self.pending.excess_bc = bc;
        } else {
            self.industry_reserve_bc = bc;
        }
    }

    fn commit_turn(&mut self, colony: &mut ColonyState, env: &mut TurnEnv<'_>) {
        let pending = std::mem::take(&mut self.pending);
        self.previous_factories = self.factories;

        let mut converted = 0;
        while converted < pending.alien_conversions {
            match env.planet.random_alien_factory_empire(colony.owner, &mut *env.rng) {
                Some(empire) => env.planet.add_alien_factories(empire, -1),
                None => break,
            }
            converted += 1;
        }
        self.factories += converted;
        let unconverted = pending.alien_conversions - converted;
        if unconverted > 0 {
            log::debug!(
                "Planet {}: {} alien factories gone before conversion, funds kept",
                colony.planet,
                unconverted
            );
            self.industry_reserve_bc += unconverted as f32 * defines::ALIEN_FACTORY_CONVERSION_COST;
        }
        self.factories += pending.new_factories;

        if let Some(robot_controls) = pending.robot_controls {
            self.robot_controls = robot_controls;
            notify(
                env.observer,
                ColonyEvent::RobotControlsUpgraded {
                    planet: colony.planet,
                    robot_controls,
                },
            );
        }

        if pending.excess_bc > 0.0 {
            if env.empire.diverts_colony_excess_to_research() {
                env.empire.add_research_bc(pending.excess_bc);
            } else {
                env.empire.add_reserve(pending.excess_bc);
            }
        }
    }

    fn assess_turn(&mut self, colony: &mut ColonyState, view: Surroundings<'_>) -> Option<f32> {
        if self.fully_built(view) {
            return colony.remove_order(OrderKind::Factories);
        }
        None
    }

    /// Saturated at the current tier, even if a better tier is known.
    fn is_completed(&self, _colony: &ColonyState, view: Surroundings<'_>) -> bool {
        self.factories >= self.max_buildable(view.planet)
    }

    fn captured_by(&mut self, new_owner: &dyn Empire) {
        self.industry_reserve_bc = 0.0;
        self.pending = PendingIndustry::default();
        self.clamp_robot_controls(new_owner.tech().max_robot_controls());
    }
}

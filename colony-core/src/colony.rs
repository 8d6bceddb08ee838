//! The settlement aggregate.

use crate::category::{
    Categories, CategoryKind, Defense, Ecology, Industry, Research, Shipyard,
};
use crate::context::Surroundings;
use crate::external::{Empire, EmpireId, Planet, PlanetId};
use crate::orders::OrderKind;
use crate::transport::Transport;
use colony_data::defines::budget::{DEFAULT_ALLOCATION, MAX_TICKS};
use colony_data::defines::population as defines;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything about a settlement except its spending categories.
///
/// Categories receive this explicitly when they need the shared budget,
/// population or orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColonyState {
    pub planet: PlanetId,
    pub owner: EmpireId,
    pub population: f32,
    pub previous_population: f32,
    pub rebels: i32,
    /// Loyal population held by rebels during a rebellion
    pub captives: f32,
    /// Ticks per category, indexed by [`CategoryKind::index`]
    pub(crate) allocation: [i32; 5],
    pub(crate) locked: [bool; 5],
    pub(crate) orders: BTreeMap<OrderKind, f32>,
    /// Treasury draw-down permitted this turn
    pub reserve_income_bc: f32,
    pub rebellion: bool,
    pub quarantined: bool,
    pub under_siege: bool,
    /// Outbound population shipment, created on first use
    pub transport: Option<Transport>,
    pub(crate) reallocation_required: bool,
}

impl ColonyState {
    fn new(planet: PlanetId, owner: EmpireId, population: f32) -> Self {
        Self {
            planet,
            owner,
            population,
            previous_population: population,
            rebels: 0,
            captives: 0.0,
            allocation: DEFAULT_ALLOCATION,
            locked: [false; 5],
            orders: BTreeMap::new(),
            reserve_income_bc: 0.0,
            rebellion: false,
            quarantined: false,
            under_siege: false,
            transport: None,
            reallocation_required: false,
        }
    }

    pub fn allocation(&self, kind: CategoryKind) -> i32 {
        self.allocation[kind.index()]
    }

    pub fn allocations(&self) -> [i32; 5] {
        self.allocation
    }

    /// Share of income (0..1) assigned to a category.
    pub fn pct(&self, kind: CategoryKind) -> f32 {
        self.allocation(kind) as f32 / MAX_TICKS as f32
    }

    pub fn total_ticks(&self) -> i32 {
        self.allocation.iter().sum()
    }

    pub fn is_locked(&self, kind: CategoryKind) -> bool {
        self.locked[kind.index()]
    }

    /// The share a lock pins a category to, or zero when unlocked.
    pub fn lock_pct(&self, kind: CategoryKind) -> f32 {
        if self.is_locked(kind) {
            self.pct(kind)
        } else {
            0.0
        }
    }

    /// Moves a category's allocation by `delta`, clamped to `[0, MAX_TICKS]`.
    /// Returns the ticks actually moved.
    pub fn adjust_value(&mut self, kind: CategoryKind, delta: i32) -> i32 {
        let slot = &mut self.allocation[kind.index()];
        let before = *slot;
        *slot = (before + delta).clamp(0, MAX_TICKS);
        *slot - before
    }

    pub fn order(&self, kind: OrderKind) -> Option<f32> {
        self.orders.get(&kind).copied()
    }

    pub fn orders(&self) -> impl Iterator<Item = (OrderKind, f32)> + '_ {
        self.orders.iter().map(|(k, v)| (*k, *v))
    }

    /// Largest pending order amount among those a category carries out.
    pub fn max_order_for(&self, kind: CategoryKind) -> f32 {
        OrderKind::for_category(kind)
            .iter()
            .filter_map(|o| self.order(*o))
            .fold(0.0, f32::max)
    }

    pub fn has_orders_for(&self, kind: CategoryKind) -> bool {
        OrderKind::for_category(kind)
            .iter()
            .any(|o| self.orders.contains_key(o))
    }

    pub fn remove_order(&mut self, kind: OrderKind) -> Option<f32> {
        self.orders.remove(&kind)
    }

    pub fn clear_orders_for(&mut self, kind: CategoryKind) {
        for order in OrderKind::for_category(kind) {
            self.orders.remove(order);
        }
    }

    pub fn reallocation_required(&self) -> bool {
        self.reallocation_required
    }
}

/// A settlement: one planet, one owner, five competing spending priorities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Colony {
    pub state: ColonyState,
    pub categories: Categories,
}

impl Colony {
    /// Founds an ordinary settlement.
    pub fn found(planet: &dyn Planet, owner: &dyn Empire) -> Self {
        Self::with_population(planet, owner, defines::FOUNDING_POPULATION)
    }

    /// Founds an empire's starting capital.
    pub fn found_capital(planet: &dyn Planet, owner: &dyn Empire) -> Self {
        Self::with_population(planet, owner, defines::CAPITAL_POPULATION)
    }

    fn with_population(planet: &dyn Planet, owner: &dyn Empire, population: f32) -> Self {
        Self {
            state: ColonyState::new(planet.id(), owner.id(), population),
            categories: Categories::new(owner),
        }
    }

    pub fn planet(&self) -> PlanetId {
        self.state.planet
    }

    pub fn owner(&self) -> EmpireId {
        self.state.owner
    }

    pub fn population(&self) -> f32 {
        self.state.population
    }

    pub fn set_population(&mut self, population: f32) {
        self.state.population = population.max(0.0);
    }

    pub fn in_rebellion(&self) -> bool {
        self.state.rebellion
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.population <= 0.0
    }

    pub fn shipyard(&self) -> &Shipyard {
        &self.categories.shipyard
    }

    pub fn shipyard_mut(&mut self) -> &mut Shipyard {
        &mut self.categories.shipyard
    }

    pub fn defense(&self) -> &Defense {
        &self.categories.defense
    }

    pub fn defense_mut(&mut self) -> &mut Defense {
        &mut self.categories.defense
    }

    pub fn industry(&self) -> &Industry {
        &self.categories.industry
    }

    pub fn industry_mut(&mut self) -> &mut Industry {
        &mut self.categories.industry
    }

    pub fn ecology(&self) -> &Ecology {
        &self.categories.ecology
    }

    pub fn ecology_mut(&mut self) -> &mut Ecology {
        &mut self.categories.ecology
    }

    pub fn research(&self) -> &Research {
        &self.categories.research
    }

    pub fn research_mut(&mut self) -> &mut Research {
        &mut self.categories.research
    }

    pub fn allocation(&self, kind: CategoryKind) -> i32 {
        self.state.allocation(kind)
    }

    pub fn allocations(&self) -> [i32; 5] {
        self.state.allocations()
    }

    pub fn order(&self, kind: OrderKind) -> Option<f32> {
        self.state.order(kind)
    }

    /// Gross production: workers plus factories in use, scaled by the planet.
    pub fn production(&self, view: Surroundings<'_>) -> f32 {
        let tech = view.empire.tech();
        let workers = self.state.population * tech.worker_productivity();
        let factories = self.categories.industry.used_factories(self.state.population);
        (workers + factories as f32) * view.planet.production_adj()
    }

    /// Production left to the settlement after tax and empire upkeep. May be negative.
    pub fn total_production_income(&self, view: Surroundings<'_>) -> f32 {
        let share = 1.0 - view.empire.tax_pct() - view.empire.expense_pct();
        self.production(view) * share
    }

    /// Reserve the settlement may actually draw this turn.
    pub fn max_reserve_income(&self, view: Surroundings<'_>) -> f32 {
        let available = view.empire.total_reserve().max(0.0);
        self.state.reserve_income_bc.clamp(0.0, available)
    }

    pub fn total_income(&self, view: Surroundings<'_>) -> f32 {
        self.total_production_income(view) + self.max_reserve_income(view)
    }

    /// Permits drawing `bc` from the treasury this turn.
    pub fn set_reserve_income(&mut self, bc: f32) {
        self.state.reserve_income_bc = bc.max(0.0);
    }

    /// Replaces the whole allocation, then clamps it into the budget.
    pub fn set_allocations(&mut self, allocation: [i32; 5]) {
        self.state.allocation = allocation;
        self.validate();
    }

    /// Repairs data that a malformed save or a random event can leave behind.
    pub fn validate_on_load(&mut self, planet: &mut dyn Planet, owner: &dyn Empire) {
        if self.state.population < 0.0 {
            log::warn!(
                "Planet {}: negative population {:.2} repaired to 0",
                self.state.planet,
                self.state.population
            );
            self.state.population = 0.0;
        }
        if self.state.rebels < 0 || self.state.rebels as f32 > self.state.population {
            log::warn!(
                "Planet {}: rebels {} outside population {:.2}",
                self.state.planet,
                self.state.rebels,
                self.state.population
            );
            self.state.rebels = self.state.rebels.clamp(0, self.state.population as i32);
        }
        if planet.waste() > planet.max_waste() {
            log::warn!(
                "Planet {}: waste {:.2} above capacity {:.2}",
                self.state.planet,
                planet.waste(),
                planet.max_waste()
            );
            planet.remove_excess_waste();
        }
        let before = self.state.allocation;
        self.validate();
        if before != self.state.allocation {
            log::warn!(
                "Planet {}: allocation {:?} clamped to {:?}",
                self.state.planet,
                before,
                self.state.allocation
            );
        }
        self.categories
            .industry
            .clamp_robot_controls(owner.tech().max_robot_controls());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SandboxEmpire, SandboxPlanet};

    #[test]
    fn test_found_seeds_population() {
        let empire = SandboxEmpire::new(1);
        let planet = SandboxPlanet::new(10, 50.0);

        let colony = Colony::found(&planet, &empire);
        assert_eq!(colony.population(), 2.0);
        assert_eq!(colony.owner(), 1);
        assert_eq!(colony.planet(), 10);
        assert!(colony.state.total_ticks() <= MAX_TICKS);

        let capital = Colony::found_capital(&planet, &empire);
        assert_eq!(capital.population(), 50.0);
    }

    #[test]
    fn test_adjust_value_clamps() {
        let empire = SandboxEmpire::new(1);
        let planet = SandboxPlanet::new(10, 50.0);
        let mut colony = Colony::found(&planet, &empire);
        colony.set_allocations([0, 0, 0, 10, 0]);

        assert_eq!(colony.state.adjust_value(CategoryKind::Ecology, -25), -10);
        assert_eq!(colony.allocation(CategoryKind::Ecology), 0);
        assert_eq!(colony.state.adjust_value(CategoryKind::Ship, 70), 50);
        assert_eq!(colony.allocation(CategoryKind::Ship), 50);
    }

    #[test]
    fn test_income_includes_permitted_reserve() {
        let mut empire = SandboxEmpire::new(1);
        empire.reserve = 30.0;
        let planet = SandboxPlanet::new(10, 50.0);
        let config = crate::ColonyConfig::default();
        let mut colony = Colony::found(&planet, &empire);
        colony.set_population(10.0);
        colony.industry_mut().factories = 20;
        colony.set_reserve_income(50.0);

        let view = Surroundings {
            empire: &empire,
            planet: &planet,
            config: &config,
        };
        // 10 pop * 0.5 + 20 factories (2 controls * 10 pop allows 20)
        assert_eq!(colony.production(view), 25.0);
        // Reserve draw is capped by what the treasury holds
        assert_eq!(colony.max_reserve_income(view), 30.0);
        assert_eq!(colony.total_income(view), 55.0);
    }

    #[test]
    fn test_validate_on_load_repairs() {
        let empire = SandboxEmpire::new(1);
        let mut planet = SandboxPlanet::new(10, 50.0);
        planet.waste = 80.0;
        planet.max_waste = 40.0;
        let mut colony = Colony::found(&planet, &empire);
        colony.state.population = -3.0;
        colony.state.allocation = [20, 20, 20, 20, -4];

        colony.validate_on_load(&mut planet, &empire);

        assert_eq!(colony.population(), 0.0);
        assert_eq!(planet.waste, 40.0);
        assert_eq!(colony.allocations(), [10, 0, 20, 20, 0]);
    }
}

//! Per-turn settlement processing: compute, commit, assess.
//!
//! `run_colony_turn` must run for every settlement before any settlement runs
//! `run_colony_assessment`. Running either twice in one game turn applies its
//! effects twice.

use crate::category::{CategoryKind, SpendingCategory, TurnFunds, COMMIT_SEQ, SPENDING_SEQ};
use crate::colony::Colony;
use crate::context::{Surroundings, TurnEnv};
use crate::error::ColonyError;
use colony_data::defines::budget::MAX_TICKS;
use tracing::instrument;

impl Colony {
    /// Waste this turn's working factories will produce.
    pub fn waste_generated(&self, view: Surroundings<'_>) -> f32 {
        if view.empire.race().ignores_planetary_environment {
            return 0.0;
        }
        let used = self.categories.industry.used_factories(self.state.population);
        used as f32 * view.empire.tech().factory_waste_rate()
    }

    pub fn next_turn(&mut self, env: &mut TurnEnv<'_>) -> Result<(), ColonyError> {
        run_colony_turn(self, env)
    }

    pub fn assess_turn(&mut self, env: &mut TurnEnv<'_>) {
        run_colony_assessment(self, env)
    }
}

/// Spends one turn of income and applies the results.
///
/// Returns [`ColonyError::InvariantViolation`] if the tick budget is broken
/// afterwards.
#[instrument(skip_all, name = "colony_turn")]
pub fn run_colony_turn(colony: &mut Colony, env: &mut TurnEnv<'_>) -> Result<(), ColonyError> {
    colony.state.previous_population = colony.state.population;
    colony.state.reallocation_required = false;

    if colony.state.rebellion {
        log::debug!("Planet {}: in rebellion, no spending", colony.state.planet);
        return Ok(());
    }

    let income = colony.total_income(env.view());
    if income < 0.0 {
        env.governor.lower_expenses(colony, income);
    }

    let view = env.view();
    let funds = TurnFunds {
        total_prod: colony.total_production_income(view),
        reserve: colony.max_reserve_income(view),
    };
    if funds.total() <= 0.0 && funds.reserve <= 0.0 {
        log::trace!("Planet {}: no income this turn", colony.state.planet);
        return Ok(());
    }
    let tax = colony.production(view) * view.empire.tax_pct();
    let waste = colony.waste_generated(view);

    if tax > 0.0 {
        env.empire.add_reserve(tax);
    }
    if waste > 0.0 {
        env.planet.add_waste(waste);
    }

    for kind in SPENDING_SEQ {
        colony
            .categories
            .get_mut(kind)
            .next_turn(&colony.state, funds, env);
    }

    let unallocated = colony.state.surplus().max(0);
    if unallocated > 0 {
        let banked = unallocated as f32 / MAX_TICKS as f32 * funds.total();
        if banked > 0.0 {
            env.empire.add_reserve(banked);
        }
    }

    for kind in COMMIT_SEQ {
        colony
            .categories
            .get_mut(kind)
            .commit_turn(&mut colony.state, env);
    }

    env.planet.remove_excess_waste();
    if funds.reserve > 0.0 {
        env.empire.add_reserve(-funds.reserve);
    }
    colony.state.reserve_income_bc = 0.0;

    check_budget(colony)
}

fn check_budget(colony: &Colony) -> Result<(), ColonyError> {
    let allocations = colony.state.allocations();
    let broken = allocations.iter().any(|a| *a < 0) || colony.state.total_ticks() > MAX_TICKS;
    if broken {
        log::error!(
            "Planet {}: budget invariant violated: ship={} defense={} industry={} ecology={} research={}",
            colony.state.planet,
            allocations[CategoryKind::Ship.index()],
            allocations[CategoryKind::Defense.index()],
            allocations[CategoryKind::Industry.index()],
            allocations[CategoryKind::Ecology.index()],
            allocations[CategoryKind::Research.index()],
        );
        return Err(ColonyError::InvariantViolation {
            colony: colony.state.planet,
            allocations,
        });
    }
    Ok(())
}

/// Reconciles goals after every settlement has run its turn.
///
/// Completed orders cascade down the follow-up chain, ecology drops back to
/// what it can still spend, and the governor is asked for a
/// fresh allocation when anything changed.
#[instrument(skip_all, name = "colony_assess")]
pub fn run_colony_assessment(colony: &mut Colony, env: &mut TurnEnv<'_>) {
    let star = env.planet.star();
    colony.state.under_siege = env.galaxy.hostile_fleets_orbiting(star, colony.state.owner);

    let view = env.view();
    for kind in CategoryKind::ALL {
        let leftover = colony
            .categories
            .get_mut(kind)
            .assess_turn(&mut colony.state, view);
        if let Some(amount) = leftover {
            colony.state.reallocation_required = true;
            if let Some(next) = colony.add_follow_up_spending_order(amount, view) {
                log::debug!(
                    "Planet {}: {:?} goal met, follow-up order {:?}",
                    colony.state.planet,
                    kind,
                    next
                );
            }
        }
    }

    trim_ecology_spending(colony, view);

    if colony.state.reallocation_required {
        env.governor.set_colony_allocations(colony);
    }
}

/// Caps ecology at what it can use: its cleanup floor once its goals are met,
/// otherwise the ticks that would fund every outstanding goal this turn.
fn trim_ecology_spending(colony: &mut Colony, view: Surroundings<'_>) {
    let kind = CategoryKind::Ecology;
    if colony.state.is_locked(kind) || colony.state.has_orders_for(kind) {
        return;
    }
    let income = colony.total_income(view);
    let new_waste = colony.waste_generated(view);
    let ecology = &colony.categories.ecology;
    let ceiling = if ecology.is_completed(&colony.state, view) {
        ecology.cleanup_allocation_needed(new_waste, income, view)
    } else {
        ecology.max_allocation_needed(&colony.state, new_waste, income, view)
    };
    let current = colony.state.allocation(kind);
    if current > ceiling {
        log::debug!(
            "Planet {}: ecology lowered from {} to {} ticks",
            colony.state.planet,
            current,
            ceiling
        );
        colony.state.adjust_value(kind, ceiling - current);
        colony.redistribute_reduced_eco_spending(view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderKind;
    use crate::testing::{ColonyBuilder, Sandbox};

    #[test]
    fn test_rebellion_skips_spending() {
        let mut sandbox = Sandbox::new();
        let mut colony = ColonyBuilder::new()
            .population(10.0)
            .allocation([0, 0, 50, 0, 0])
            .build_in(&sandbox);
        colony.state.rebellion = true;

        colony.next_turn(&mut sandbox.env()).unwrap();

        assert_eq!(colony.industry().factories, 0);
        assert_eq!(colony.population(), 10.0);
    }

    #[test]
    fn test_negative_income_asks_governor() {
        let mut sandbox = Sandbox::new();
        sandbox.empire.expense_pct = 1.5;
        let mut colony = ColonyBuilder::new().population(10.0).build_in(&sandbox);

        colony.next_turn(&mut sandbox.env()).unwrap();

        assert_eq!(sandbox.governor.lowered, 1);
    }

    #[test]
    fn test_unallocated_ticks_are_banked() {
        let mut sandbox = Sandbox::new();
        sandbox.empire.reserve = 0.0;
        let mut colony = ColonyBuilder::new()
            .population(10.0)
            .allocation([0, 0, 0, 0, 25])
            .build_in(&sandbox);

        colony.next_turn(&mut sandbox.env()).unwrap();

        // Half of 5 BC never reached a category
        assert!((sandbox.empire.reserve - 2.5).abs() < 1e-3);
        assert!((sandbox.empire.research_bc - 2.5).abs() < 1e-3);
    }

    #[test]
    fn test_reserve_draw_is_debited() {
        let mut sandbox = Sandbox::new();
        sandbox.empire.reserve = 40.0;
        let mut colony = ColonyBuilder::new()
            .population(10.0)
            .allocation([0, 0, 0, 0, 50])
            .build_in(&sandbox);
        colony.set_reserve_income(25.0);

        colony.next_turn(&mut sandbox.env()).unwrap();

        assert!((sandbox.empire.reserve - 15.0).abs() < 1e-3);
        assert!((sandbox.empire.research_bc - 30.0).abs() < 1e-3);
        assert_eq!(colony.state.reserve_income_bc, 0.0);
    }

    #[test]
    fn test_factories_generate_waste() {
        let mut sandbox = Sandbox::new();
        sandbox.empire.tech.factory_waste_rate = 0.5;
        let mut colony = ColonyBuilder::new()
            .population(10.0)
            .factories(20)
            .allocation([0, 0, 0, 0, 50])
            .build_in(&sandbox);

        colony.next_turn(&mut sandbox.env()).unwrap();

        assert!((sandbox.planet.waste - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_broken_budget_is_fatal() {
        let mut sandbox = Sandbox::new();
        let mut colony = ColonyBuilder::new().population(10.0).build_in(&sandbox);
        colony.state.allocation = [20, 20, 20, 20, -1];

        let err = colony.next_turn(&mut sandbox.env()).unwrap_err();

        assert!(matches!(err, ColonyError::InvariantViolation { .. }));
    }

    #[test]
    fn test_assess_detects_siege() {
        let mut sandbox = Sandbox::new();
        sandbox.galaxy.hostile_stars.push(sandbox.planet.star);
        let mut colony = ColonyBuilder::new().build_in(&sandbox);

        colony.assess_turn(&mut sandbox.env());

        assert!(colony.state.under_siege);
    }

    #[test]
    fn test_completed_order_cascades() {
        let mut sandbox = Sandbox::new();
        sandbox.planet.base_size = 20.0;
        sandbox.planet.current_size = 20.0;
        sandbox.empire.tech.max_planetary_shield = 0;
        let mut colony = ColonyBuilder::new()
            .population(5.0)
            .allocation([0, 0, 30, 10, 10])
            .build_in(&sandbox);
        colony.add_colony_order(OrderKind::Shield, 0.2);

        colony.assess_turn(&mut sandbox.env());

        // No shields to build: the order moves to the next unmet goal
        assert_eq!(colony.order(OrderKind::Shield), None);
        assert_eq!(colony.order(OrderKind::Factories), Some(0.2));
        assert_eq!(sandbox.governor.reallocations, 1);
    }

    #[test]
    fn test_finished_ecology_drops_to_floor() {
        let mut sandbox = Sandbox::new();
        sandbox.planet.base_size = 20.0;
        sandbox.planet.current_size = 20.0;
        sandbox.planet.waste = 0.0;
        let mut colony = ColonyBuilder::new()
            .population(20.0)
            .allocation([0, 0, 10, 30, 10])
            .build_in(&sandbox);

        colony.assess_turn(&mut sandbox.env());

        assert_eq!(colony.allocation(CategoryKind::Ecology), 0);
        // Industry is incomplete and takes the freed ticks first
        assert!(colony.allocation(CategoryKind::Industry) > 10);
        assert_eq!(colony.state.total_ticks(), MAX_TICKS);
    }

    #[test]
    fn test_negative_income_never_becomes_debt() {
        let mut sandbox = Sandbox::new();
        sandbox.empire.expense_pct = 1.5;
        sandbox.empire.reserve = 100.0;
        sandbox.empire.tech.max_planetary_shield = 5;
        let mut colony = ColonyBuilder::new()
            .population(40.0)
            .allocation([0, 25, 25, 0, 0])
            .build_in(&sandbox);
        colony.set_reserve_income(5.0);

        // 20 production at -50% share plus a 5 BC draw: -5 BC in total
        colony.next_turn(&mut sandbox.env()).unwrap();

        assert_eq!(sandbox.governor.lowered, 1);
        assert_eq!(colony.industry().industry_reserve_bc, 0.0);
        assert_eq!(colony.defense().shield_bc, 0.0);
        assert_eq!(colony.shipyard().ship_bc, 0.0);
        assert_eq!(colony.industry().factories, 0);
    }

    #[test]
    fn test_unfinished_ecology_is_capped_at_what_it_can_use() {
        let mut sandbox = Sandbox::new();
        sandbox.empire.tech.population_cost = 1.0;
        let mut colony = ColonyBuilder::new()
            .population(90.0)
            .allocation([0, 0, 0, 40, 10])
            .build_in(&sandbox);
        let view = sandbox.view();
        let needed = colony.ecology().max_allocation_needed(
            &colony.state,
            colony.waste_generated(view),
            colony.total_income(view),
            view,
        );
        assert!(!colony.ecology().is_completed(&colony.state, view));
        assert!(needed < 40);

        colony.assess_turn(&mut sandbox.env());

        assert_eq!(colony.allocation(CategoryKind::Ecology), needed);
        assert_eq!(colony.state.total_ticks(), MAX_TICKS);
    }
}

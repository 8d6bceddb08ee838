//! Tick budget engine.
//!
//! A settlement's income is split into [`MAX_TICKS`] ticks. Every edit to one
//! category's share is followed by a redistribution pass so the ticks still add
//! up: surplus is offered to the other categories in [`CLEANUP_SEQ`] order,
//! deficits are taken back in the same order. Locked categories are never
//! touched, and a category giving up ticks never drops below the floor its
//! lock or pending orders require.
//!
//! When every other category is locked, whatever cannot be moved elsewhere is
//! pushed back onto the category that triggered the edit. If that category
//! cannot absorb it either, the remaining ticks stay unallocated and their
//! income is banked to the empire reserve at the end of the turn. The budget is
//! never left over-allocated.

use crate::category::{CategoryKind, SpendingCategory, CLEANUP_SEQ, VALIDATION_SEQ};
use crate::colony::{Colony, ColonyState};
use crate::context::Surroundings;
use crate::orders::{OrderKind, FOLLOW_UP_CHAIN};
use colony_data::defines::budget::MAX_TICKS;

/// Smallest allocation a category may be reduced to by redistribution.
fn floor_ticks(colony: &Colony, kind: CategoryKind) -> i32 {
    let ordered = colony.categories.get(kind).ordered_value(&colony.state);
    ((ordered * MAX_TICKS as f32).ceil() as i32).clamp(0, MAX_TICKS)
}

impl ColonyState {
    /// Ticks not assigned to any category. Negative when over-allocated.
    pub fn surplus(&self) -> i32 {
        MAX_TICKS - self.total_ticks()
    }

    /// Player-adjustable: not locked and not in rebellion.
    pub fn can_adjust(&self, kind: CategoryKind) -> bool {
        !self.is_locked(kind) && !self.rebellion
    }

    /// Clamps allocations into the budget, serving [`VALIDATION_SEQ`] in order.
    /// Applying it twice changes nothing.
    pub fn validate(&mut self) {
        let mut remaining = MAX_TICKS;
        for kind in VALIDATION_SEQ {
            let slot = &mut self.allocation[kind.index()];
            *slot = (*slot).clamp(0, remaining);
            remaining -= *slot;
        }
    }
}

impl Colony {
    pub fn can_adjust(&self, kind: CategoryKind) -> bool {
        self.state.can_adjust(kind)
    }

    pub fn is_locked(&self, kind: CategoryKind) -> bool {
        self.state.is_locked(kind)
    }

    pub fn set_locked(&mut self, kind: CategoryKind, locked: bool) {
        self.state.locked[kind.index()] = locked;
    }

    pub fn validate(&mut self) {
        self.state.validate();
    }

    /// Player or AI edit of one category. Returns the net ticks the category
    /// gained (or lost) once the rest of the budget has been rebalanced.
    ///
    /// Ineligible edits (locked category, settlement in rebellion) are a no-op.
    pub fn adjust_allocation(&mut self, kind: CategoryKind, delta: i32) -> i32 {
        if !self.can_adjust(kind) {
            return 0;
        }
        let before = self.state.allocation(kind);
        if self.state.adjust_value(kind, delta) == 0 {
            return 0;
        }
        self.realign_spending(kind);
        self.state.allocation(kind) - before
    }

    /// Rebalances after a user-driven change to `trigger`. Any residual the
    /// other categories could not take is pushed back onto `trigger`, and its
    /// follow-up orders are cleared.
    pub fn realign_spending(&mut self, trigger: CategoryKind) {
        if self.spread_surplus(Some(trigger)) != 0 {
            self.state.clear_orders_for(trigger);
        }
        self.settle_residual(trigger);
    }

    /// Same as [`Colony::realign_spending`] but leaves orders in place.
    /// Used when the change itself came from an order.
    fn rebalance(&mut self, trigger: CategoryKind) {
        self.spread_surplus(Some(trigger));
        self.settle_residual(trigger);
    }

    /// Offers the current surplus (or deficit) to every unlocked category in
    /// [`CLEANUP_SEQ`] except `skip`. Returns the residual.
    fn spread_surplus(&mut self, skip: Option<CategoryKind>) -> i32 {
        let mut surplus = self.state.surplus();
        for kind in CLEANUP_SEQ {
            if surplus == 0 {
                break;
            }
            if Some(kind) == skip || self.state.is_locked(kind) {
                continue;
            }
            let delta = if surplus < 0 {
                let available = self.state.allocation(kind) - floor_ticks(self, kind);
                surplus.max(-available.max(0))
            } else {
                surplus
            };
            surplus -= self.state.adjust_value(kind, delta);
        }
        surplus
    }

    fn settle_residual(&mut self, trigger: CategoryKind) {
        let residual = self.state.surplus();
        if residual != 0 {
            self.state.adjust_value(trigger, residual);
        }
        if self.state.surplus() < 0 {
            log::warn!(
                "Planet {}: allocation {:?} still over budget after realign, clamping",
                self.state.planet,
                self.state.allocation
            );
            self.state.validate();
        }
    }

    /// Hands ticks freed from ecology to the categories most likely to use them:
    /// an incomplete industry first, then an active shipyard, then everyone else.
    pub fn redistribute_reduced_eco_spending(&mut self, view: Surroundings<'_>) {
        let income = self.total_income(view);

        if !self.state.is_locked(CategoryKind::Industry)
            && !self.categories.industry.is_completed(&self.state, view)
        {
            let needed = self.categories.industry.max_allocation_needed(income, view);
            let want = (needed - self.state.allocation(CategoryKind::Industry)).max(0);
            let give = want.min(self.state.surplus().max(0));
            self.state.adjust_value(CategoryKind::Industry, give);
        }

        if self.state.surplus() > 0
            && !self.state.is_locked(CategoryKind::Ship)
            && self.categories.shipyard.is_building()
        {
            let give = self.state.surplus();
            self.state.adjust_value(CategoryKind::Ship, give);
        }

        if self.state.surplus() > 0 {
            self.spread_surplus(Some(CategoryKind::Ecology));
        }
    }

    /// Zeroes every unlocked category.
    pub fn clear_spending(&mut self) {
        for kind in CategoryKind::ALL {
            if !self.state.is_locked(kind) {
                let current = self.state.allocation(kind);
                self.state.adjust_value(kind, -current);
            }
        }
    }

    /// Records an order of intensity `amount` (0..1) and raises the owning
    /// category to at least that share of the budget.
    pub fn add_colony_order(&mut self, order: OrderKind, amount: f32) {
        let Some(kind) = order.category() else {
            return;
        };
        let amount = amount.clamp(0.0, 1.0);
        let existing = self.state.order(order).unwrap_or(0.0);
        self.state.orders.insert(order, existing.max(amount));

        if self.state.is_locked(kind) {
            return;
        }
        let target = floor_ticks(self, kind);
        let current = self.state.allocation(kind);
        if target > current {
            self.state.adjust_value(kind, target - current);
            self.rebalance(kind);
        }
    }

    /// Re-issues leftover order intensity on the first unmet goal of the
    /// follow-up chain. Returns the order that received it, if any.
    pub fn add_follow_up_spending_order(
        &mut self,
        amount: f32,
        view: Surroundings<'_>,
    ) -> Option<OrderKind> {
        if amount <= 0.0 {
            return None;
        }
        let step = FOLLOW_UP_CHAIN
            .iter()
            .find(|step| !self.order_goal_met(step.order, view))?;
        self.add_colony_order(step.order, amount / step.divisor);
        Some(step.order)
    }

    fn order_goal_met(&self, order: OrderKind, view: Surroundings<'_>) -> bool {
        let state = &self.state;
        match order {
            OrderKind::Terraform => self.categories.ecology.terraform_completed(view),
            OrderKind::Factories => self.categories.industry.is_completed(state, view),
            OrderKind::Population => self.categories.ecology.population_growth_completed(state, view),
            OrderKind::Shield => self.categories.defense.shield_completed(view),
            OrderKind::Bases => self.categories.defense.bases_completed(view),
            OrderKind::Atmosphere => !view.planet.can_terraform_atmosphere(view.empire.tech()),
            OrderKind::Soil => !view.planet.can_enrich_soil(view.empire.tech()),
            OrderKind::None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::BuildTarget;
    use crate::external::ShipDesign;
    use crate::testing::{ColonyBuilder, Sandbox};
    use proptest::prelude::*;

    fn kind_strategy() -> impl Strategy<Value = CategoryKind> {
        (0usize..5).prop_map(|i| CategoryKind::ALL[i])
    }

    #[test]
    fn test_locked_everywhere_rejects_increment() {
        let mut colony = ColonyBuilder::new().allocation([10, 10, 10, 10, 10]).build();
        for kind in [
            CategoryKind::Ship,
            CategoryKind::Defense,
            CategoryKind::Industry,
            CategoryKind::Research,
        ] {
            colony.set_locked(kind, true);
        }

        let moved = colony.adjust_allocation(CategoryKind::Ecology, 10);

        assert_eq!(moved, 0);
        assert_eq!(colony.allocations(), [10, 10, 10, 10, 10]);
    }

    #[test]
    fn test_increment_takes_from_research_first() {
        let mut colony = ColonyBuilder::new().allocation([10, 10, 10, 10, 10]).build();

        let moved = colony.adjust_allocation(CategoryKind::Industry, 15);

        assert_eq!(moved, 15);
        assert_eq!(colony.allocations(), [5, 10, 25, 10, 0]);
    }

    #[test]
    fn test_decrement_goes_to_research() {
        let mut colony = ColonyBuilder::new().allocation([10, 10, 10, 10, 10]).build();

        colony.adjust_allocation(CategoryKind::Ship, -4);

        assert_eq!(colony.allocations(), [6, 10, 10, 10, 14]);
    }

    #[test]
    fn test_locked_category_cannot_be_adjusted() {
        let mut colony = ColonyBuilder::new().allocation([10, 10, 10, 10, 10]).build();
        colony.set_locked(CategoryKind::Defense, true);

        assert_eq!(colony.adjust_allocation(CategoryKind::Defense, 5), 0);
        assert_eq!(colony.allocation(CategoryKind::Defense), 10);
    }

    #[test]
    fn test_rebellion_blocks_adjustment() {
        let mut colony = ColonyBuilder::new().allocation([10, 10, 10, 10, 10]).build();
        colony.state.rebellion = true;

        assert_eq!(colony.adjust_allocation(CategoryKind::Research, -5), 0);
        assert_eq!(colony.allocations(), [10, 10, 10, 10, 10]);
    }

    #[test]
    fn test_order_floor_survives_redistribution() {
        let mut colony = ColonyBuilder::new().allocation([10, 10, 10, 10, 10]).build();
        colony.add_colony_order(OrderKind::Shield, 0.4);
        assert_eq!(colony.allocation(CategoryKind::Defense), 20);
        assert_eq!(colony.state.total_ticks(), 50);

        // Industry wants everything; defense keeps its ordered 20 ticks
        colony.adjust_allocation(CategoryKind::Industry, 50);
        assert_eq!(colony.allocation(CategoryKind::Defense), 20);
        assert_eq!(colony.allocation(CategoryKind::Industry), 30);
        assert_eq!(colony.state.total_ticks(), 50);
    }

    #[test]
    fn test_user_override_clears_trigger_orders() {
        let mut colony = ColonyBuilder::new().allocation([0, 0, 0, 50, 0]).build();
        colony.set_locked(CategoryKind::Ecology, true);
        colony.state.orders.insert(OrderKind::Factories, 0.2);

        // Nothing else can give up ticks, so the raise bounces back
        colony.adjust_allocation(CategoryKind::Industry, 10);

        assert_eq!(colony.allocation(CategoryKind::Industry), 0);
        assert_eq!(colony.order(OrderKind::Factories), None);
    }

    #[test]
    fn test_clear_spending_respects_locks() {
        let mut colony = ColonyBuilder::new().allocation([10, 10, 10, 10, 10]).build();
        colony.set_locked(CategoryKind::Ecology, true);

        colony.clear_spending();

        assert_eq!(colony.allocations(), [0, 0, 0, 10, 0]);
    }

    #[test]
    fn test_validate_serves_ecology_first() {
        let mut colony = ColonyBuilder::new().build();
        colony.state.allocation = [30, 30, 30, 30, 30];

        colony.validate();

        assert_eq!(colony.allocations(), [0, 0, 20, 30, 0]);
    }

    #[test]
    fn test_freed_eco_ticks_go_to_active_shipyard() {
        let mut sandbox = Sandbox::new();
        sandbox.empire.designs.push(ShipDesign {
            id: 1,
            name: "Scout".into(),
            cost: 10.0,
            active: true,
        });
        let build = |sandbox: &Sandbox| {
            let mut colony = ColonyBuilder::new()
                .population(10.0)
                .allocation([0, 0, 0, 10, 0])
                .build_in(sandbox);
            colony.set_locked(CategoryKind::Industry, true);
            colony
        };

        let mut idle = build(&sandbox);
        idle.redistribute_reduced_eco_spending(sandbox.view());
        assert_eq!(idle.allocations(), [0, 0, 0, 10, 40]);

        let mut building = build(&sandbox);
        building
            .shipyard_mut()
            .set_build_target(BuildTarget::Ship(1), &sandbox.empire)
            .unwrap();
        building.redistribute_reduced_eco_spending(sandbox.view());
        assert_eq!(building.allocations(), [40, 0, 0, 10, 0]);
    }

    #[test]
    fn test_follow_up_reaches_bases_at_a_fifth() {
        let sandbox = Sandbox::new();
        let mut colony = ColonyBuilder::new()
            .population(100.0)
            .factories(200)
            .allocation([0, 0, 30, 10, 10])
            .build_in(&sandbox);
        colony.defense_mut().set_max_bases(3);

        // Terraform, factories, population and shield are all done already
        let order = colony.add_follow_up_spending_order(0.5, sandbox.view());

        assert_eq!(order, Some(OrderKind::Bases));
        let amount = colony.order(OrderKind::Bases).unwrap();
        assert!((amount - 0.1).abs() < 1e-6);
        assert_eq!(colony.allocations(), [0, 5, 30, 10, 5]);
    }

    proptest! {
        #[test]
        fn prop_validate_is_idempotent(alloc in prop::array::uniform5(-20i32..80)) {
            let mut colony = ColonyBuilder::new().build();
            colony.state.allocation = alloc;
            colony.validate();
            let once = colony.allocations();
            colony.validate();
            prop_assert_eq!(once, colony.allocations());
            prop_assert!(once.iter().all(|a| (0..=MAX_TICKS).contains(a)));
            prop_assert!(once.iter().sum::<i32>() <= MAX_TICKS);
        }

        #[test]
        fn prop_edits_keep_budget(
            start in prop::array::uniform5(0i32..=10),
            locks in prop::array::uniform5(any::<bool>()),
            edits in prop::collection::vec((kind_strategy(), -50i32..=50), 1..20),
        ) {
            let mut colony = ColonyBuilder::new().allocation(start).build();
            for (kind, locked) in CategoryKind::ALL.iter().zip(locks) {
                colony.set_locked(*kind, locked);
            }
            for (kind, delta) in edits {
                colony.adjust_allocation(kind, delta);
                let alloc = colony.allocations();
                prop_assert!(alloc.iter().all(|a| (0..=MAX_TICKS).contains(a)));
                prop_assert!(alloc.iter().sum::<i32>() <= MAX_TICKS);
            }
        }

        #[test]
        fn prop_realign_conserves_full_budget(
            kind in kind_strategy(),
            delta in -50i32..=50,
        ) {
            let mut colony = ColonyBuilder::new().allocation([10, 10, 10, 10, 10]).build();
            colony.adjust_allocation(kind, delta);
            prop_assert_eq!(colony.state.total_ticks(), MAX_TICKS);
        }

        #[test]
        fn prop_locked_categories_never_move(
            locked in kind_strategy(),
            kind in kind_strategy(),
            delta in -50i32..=50,
        ) {
            let mut colony = ColonyBuilder::new().allocation([10, 10, 10, 10, 10]).build();
            colony.set_locked(locked, true);
            colony.adjust_allocation(kind, delta);
            prop_assert_eq!(colony.allocation(locked), 10);
        }
    }
}

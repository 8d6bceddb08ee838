//! The five spending categories and their shared contract.
//!
//! Each category owns its own production state and simulates one turn of
//! spending. The budget itself (ticks, locks, orders) lives on
//! [`ColonyState`]; categories read it through an explicit parameter rather
//! than holding a pointer back to their settlement.

pub mod defense;
pub mod ecology;
pub mod industry;
pub mod research;
pub mod shipyard;

pub use defense::Defense;
pub use ecology::Ecology;
pub use industry::Industry;
pub use research::{Research, ResearchProject};
pub use shipyard::{BuildTarget, Shipyard};

use crate::colony::ColonyState;
use crate::context::{Surroundings, TurnEnv};
use crate::external::Empire;
use colony_data::defines::budget::MAX_TICKS;
use serde::{Deserialize, Serialize};

/// Spending category identity. The discriminant is the index into the
/// settlement's allocation and lock arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryKind {
    Ship = 0,
    Defense = 1,
    Industry = 2,
    Ecology = 3,
    Research = 4,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 5] = [
        CategoryKind::Ship,
        CategoryKind::Defense,
        CategoryKind::Industry,
        CategoryKind::Ecology,
        CategoryKind::Research,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Order in which categories spend during `next_turn`.
pub const SPENDING_SEQ: [CategoryKind; 5] = [
    CategoryKind::Ship,
    CategoryKind::Defense,
    CategoryKind::Industry,
    CategoryKind::Ecology,
    CategoryKind::Research,
];

/// Order in which categories apply their results. Shipyard commits inline.
pub const COMMIT_SEQ: [CategoryKind; 4] = [
    CategoryKind::Defense,
    CategoryKind::Industry,
    CategoryKind::Ecology,
    CategoryKind::Research,
];

/// Order in which surplus ticks are offered to (or taken from) categories.
/// Research absorbs first, ecology last.
pub const CLEANUP_SEQ: [CategoryKind; 5] = [
    CategoryKind::Research,
    CategoryKind::Ship,
    CategoryKind::Defense,
    CategoryKind::Industry,
    CategoryKind::Ecology,
];

/// Order in which `validate` hands out the tick budget. Ecology is served
/// first so clamping never starves waste cleanup.
pub const VALIDATION_SEQ: [CategoryKind; 5] = [
    CategoryKind::Ecology,
    CategoryKind::Industry,
    CategoryKind::Ship,
    CategoryKind::Defense,
    CategoryKind::Research,
];

/// Income available to the categories this turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnFunds {
    /// Production income after tax and upkeep
    pub total_prod: f32,
    /// Reserve draw permitted this turn
    pub reserve: f32,
}

impl TurnFunds {
    pub fn total(&self) -> f32 {
        self.total_prod + self.reserve
    }
}

/// Ticks needed to spend `bc` out of `income`, rounded up and capped at the budget.
pub fn ticks_for_bc(bc: f32, income: f32) -> i32 {
    if bc <= 0.0 {
        return 0;
    }
    if income <= 0.0 {
        return MAX_TICKS;
    }
    let ticks = (bc / income * MAX_TICKS as f32).ceil();
    (ticks as i32).clamp(0, MAX_TICKS)
}

/// Capability contract shared by every spending category.
pub trait SpendingCategory {
    fn kind(&self) -> CategoryKind;

    /// BC this category receives this turn. Never negative: a shortfall is
    /// the governor's problem, not carried as debt.
    fn total_bc(&self, colony: &ColonyState, funds: TurnFunds, _view: Surroundings<'_>) -> f32 {
        (colony.pct(self.kind()) * funds.total()).max(0.0)
    }

    /// Computes this turn's proposed progress without applying it.
    fn next_turn(&mut self, colony: &ColonyState, funds: TurnFunds, env: &mut TurnEnv<'_>);

    /// Applies the progress proposed by `next_turn`.
    fn commit_turn(&mut self, _colony: &mut ColonyState, _env: &mut TurnEnv<'_>) {}

    /// Removes orders this category satisfied. Returns the leftover order
    /// intensity to hand to the follow-up chain.
    fn assess_turn(&mut self, _colony: &mut ColonyState, _view: Surroundings<'_>) -> Option<f32> {
        None
    }

    fn is_completed(&self, colony: &ColonyState, view: Surroundings<'_>) -> bool;

    /// Minimum share (0..1) of the budget this category must keep: its locked
    /// share, or the strongest pending order it carries out.
    fn ordered_value(&self, colony: &ColonyState) -> f32 {
        let kind = self.kind();
        colony.lock_pct(kind).max(colony.max_order_for(kind))
    }

    /// Resets progress that does not survive a change of owner.
    fn captured_by(&mut self, new_owner: &dyn Empire);
}

/// The five categories of one settlement, one instance per kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Categories {
    pub shipyard: Shipyard,
    pub defense: Defense,
    pub industry: Industry,
    pub ecology: Ecology,
    pub research: Research,
}

impl Categories {
    pub fn new(owner: &dyn Empire) -> Self {
        Self {
            shipyard: Shipyard::default(),
            defense: Defense::new(owner),
            industry: Industry::new(owner),
            ecology: Ecology::default(),
            research: Research::default(),
        }
    }

    pub fn get(&self, kind: CategoryKind) -> &dyn SpendingCategory {
        match kind {
            CategoryKind::Ship => &self.shipyard,
            CategoryKind::Defense => &self.defense,
            CategoryKind::Industry => &self.industry,
            CategoryKind::Ecology => &self.ecology,
            CategoryKind::Research => &self.research,
        }
    }

    pub fn get_mut(&mut self, kind: CategoryKind) -> &mut dyn SpendingCategory {
        match kind {
            CategoryKind::Ship => &mut self.shipyard,
            CategoryKind::Defense => &mut self.defense,
            CategoryKind::Industry => &mut self.industry,
            CategoryKind::Ecology => &mut self.ecology,
            CategoryKind::Research => &mut self.research,
        }
    }
}

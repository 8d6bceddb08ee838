//! Game mechanic constants (defines).
//!
//! Values are the fixed tuning numbers of the settlement economy. Anything that
//! varies with technology comes from the owning empire's tech view instead.

/// Budget constants
pub mod budget {
    /// Ticks representing 100% of a settlement's income
    pub const MAX_TICKS: i32 = 50;

    /// Ticks per category (ship, defense, industry, ecology, research) for a new settlement
    pub const DEFAULT_ALLOCATION: [i32; 5] = [0, 0, 30, 10, 10];
}

/// Population constants
pub mod population {
    /// Population of a freshly founded settlement
    pub const FOUNDING_POPULATION: f32 = 2.0;

    /// Population of an empire's starting capital
    pub const CAPITAL_POPULATION: f32 = 50.0;

    /// Base logistic growth rate per turn
    pub const BASE_GROWTH_RATE: f32 = 0.1;

    /// Minimum natural growth whenever there is room to grow
    pub const MIN_GROWTH: f32 = 0.1;

    /// Scale of the overpopulation penalty after waste accumulation
    pub const OVERPOPULATION_PENALTY: f32 = 0.1;

    /// Largest share of the population one transport may carry
    pub const MAX_TRANSPORT_SHARE: f32 = 0.5;
}

/// Industry constants
pub mod industry {
    /// BC to take over one abandoned alien factory
    pub const ALIEN_FACTORY_CONVERSION_COST: f32 = 5.0;

    /// Fraction of the base factory cost charged per factory to refit robotic controls
    pub const REFIT_COST_FACTOR: f32 = 0.5;
}

/// Ecology constants
pub mod ecology {
    /// BC for one soil enrichment increment
    pub const SOIL_ENRICHMENT_COST: f32 = 150.0;
}

/// Defense constants
pub mod defense {
    /// BC per planetary shield level
    pub const SHIELD_COST_PER_LEVEL: f32 = 100.0;

    /// Fraction of a scrapped base's cost returned to the empire reserve
    pub const SCRAP_REFUND_PCT: f32 = 0.25;

    /// Missile volleys each base fires per gauntlet round
    pub const SHOTS_PER_BASE: u32 = 3;
}

/// Follow-up order constants
pub mod orders {
    /// Missile-base follow-up orders are issued at this fraction of the leftover intensity
    pub const BASES_FOLLOW_UP_DIVISOR: f32 = 5.0;
}

/// Invasion constants
pub mod invasion {
    /// Sides of the ground combat die
    pub const GROUND_COMBAT_ROLL: i32 = 100;

    /// Chance per factory that an invader learns one unknown technology
    pub const PLUNDER_CHANCE_PER_FACTORY: f64 = 0.02;

    /// Maximum technologies plundered in one capture
    pub const MAX_PLUNDERED_TECHS: usize = 6;

    /// Divisor applied to combat-transport evasion against subspace interdiction
    pub const INTERDICTION_EVASION_DIVISOR: f32 = 2.0;
}

//! # Settlement Economy Core
//!
//! Per-settlement economic simulation for a turn-based space strategy game.
//! Each turn a settlement's income is split into 50 budget *ticks* across five
//! spending categories, and each category turns its share into concrete
//! progress: factories, missile bases and shields, terraforming and
//! population, ships and stargates, research.
//!
//! ## Turn Lifecycle
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  next_turn   │────▶│ commit_turn  │────▶│ assess_turn  │
//! │  (compute)   │     │ (apply)      │     │ (reconcile)  │
//! └──────────────┘     └──────────────┘     └──────┬───────┘
//!                                                  │
//!                      ┌──────────────┐     ┌──────▼───────┐
//!                      │   Governor   │◀────│ follow-up    │
//!                      │ (reallocate) │     │ orders       │
//!                      └──────────────┘     └──────────────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Colony`] | The settlement aggregate: population, budget, the five categories |
//! | [`CategoryKind`] | Closed set of spending categories, stable array index |
//! | [`SpendingCategory`] | Capability contract every category implements |
//! | [`OrderKind`] | Closed set of follow-up spending orders |
//! | [`TurnEnv`] / [`InvasionEnv`] | Collaborators a turn or an invasion needs |
//! | [`ColonyObserver`] | Receives notifications ([`ColonyEvent`]) |
//!
//! Collaborators outside this crate (empire, planet, galaxy, governor) are
//! reached only through the traits in [`external`].

pub mod allocation;
pub mod category;
pub mod colony;
pub mod config;
pub mod context;
pub mod error;
pub mod external;
pub mod missile_base;
pub mod observer;
pub mod orders;
pub mod systems;
pub mod testing;
pub mod transport;

pub use category::{
    BuildTarget, CategoryKind, Defense, Ecology, Industry, Research, ResearchProject, Shipyard,
    SpendingCategory, TurnFunds,
};
pub use colony::{Colony, ColonyState};
pub use config::ColonyConfig;
pub use context::{DefenderProfile, InvasionEnv, Surroundings, TurnEnv};
pub use error::ColonyError;
pub use external::{
    DesignId, EmpireId, Empire, Environment, Galaxy, Governor, Planet, PlanetId, RaceTraits,
    RallyPoint, ShipDesign, StarId, TechId, TechView, Treaty,
};
pub use missile_base::{MissileBaseComponent, MissileBaseMissile};
pub use observer::event_log::{ColonyEvent, EventLogObserver};
pub use observer::{ColonyObserver, ObserverError};
pub use orders::OrderKind;
pub use systems::invasion::InvasionOutcome;
pub use transport::{Transport, TransportCombat};

//! Borrowed collaborators handed to turn processing and invasions.

use crate::config::ColonyConfig;
use crate::external::{Empire, EmpireId, Galaxy, Governor, Planet, TechId};
use crate::observer::ColonyObserver;
use rand::RngCore;

/// Read-only view of a settlement's surroundings.
#[derive(Clone, Copy)]
pub struct Surroundings<'a> {
    pub empire: &'a dyn Empire,
    pub planet: &'a dyn Planet,
    pub config: &'a ColonyConfig,
}

/// Everything one settlement's turn may read or affect.
pub struct TurnEnv<'a> {
    pub empire: &'a mut dyn Empire,
    pub planet: &'a mut dyn Planet,
    pub galaxy: &'a mut dyn Galaxy,
    pub governor: &'a mut dyn Governor,
    pub config: &'a ColonyConfig,
    pub observer: &'a mut dyn ColonyObserver,
    pub rng: &'a mut dyn RngCore,
}

impl<'a> TurnEnv<'a> {
    pub fn view(&self) -> Surroundings<'_> {
        Surroundings {
            empire: &*self.empire,
            planet: &*self.planet,
            config: self.config,
        }
    }
}

/// What an invasion needs to know about the defending empire.
///
/// Captured up front so the attacker can be borrowed mutably even when it is
/// the same empire (loyalists landing to put down a rebellion).
#[derive(Debug, Clone)]
pub struct DefenderProfile {
    pub empire: EmpireId,
    pub is_player: bool,
    pub subspace_interdiction: bool,
    /// Tech bonus plus racial bonus on defending ground rolls
    pub ground_bonus: i32,
    pub known_techs: Vec<TechId>,
}

impl DefenderProfile {
    pub fn of(empire: &dyn Empire) -> Self {
        let tech = empire.tech();
        Self {
            empire: empire.id(),
            is_player: empire.is_player(),
            subspace_interdiction: tech.subspace_interdiction(),
            ground_bonus: tech.ground_combat_bonus() + empire.race().ground_defense_bonus,
            known_techs: tech.known_techs(),
        }
    }
}

/// Everything an invasion of one settlement may read or affect.
pub struct InvasionEnv<'a> {
    pub defender: DefenderProfile,
    pub attacker: &'a mut dyn Empire,
    pub planet: &'a mut dyn Planet,
    pub galaxy: &'a mut dyn Galaxy,
    pub config: &'a ColonyConfig,
    pub observer: &'a mut dyn ColonyObserver,
    pub rng: &'a mut dyn RngCore,
}

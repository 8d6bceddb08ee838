//! In-memory collaborators for tests and the sandbox runner.
//!
//! Every field is public so a test can set up exactly the situation it needs.

use crate::colony::Colony;
use crate::config::ColonyConfig;
use crate::context::{DefenderProfile, InvasionEnv, Surroundings, TurnEnv};
use crate::external::{
    DesignId, Empire, EmpireId, Environment, Galaxy, Governor, Planet, PlanetId, RaceTraits,
    RallyPoint, ShipDesign, StarId, TechId, TechView, Treaty,
};
use crate::missile_base::MissileBaseComponent;
use crate::observer::event_log::ColonyEvent;
use crate::transport::TransportCombat;
use colony_data::defines::population::FOUNDING_POPULATION;
use colony_data::MISSILE_BASES;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct SandboxTech {
    pub known: Vec<TechId>,
    pub worker_productivity: f32,
    pub base_factory_cost: f32,
    pub base_robot_controls: u32,
    pub max_robot_controls: u32,
    pub factory_waste_rate: f32,
    pub waste_elimination: f32,
    pub terraform_size_bonus: f32,
    pub terraform_cost_per_size: f32,
    pub atmosphere_terraform_cost: f32,
    pub soil_enrichment_available: bool,
    pub population_cost: f32,
    pub max_planetary_shield: u32,
    pub best_missile_base: MissileBaseComponent,
    /// Discount per tech level a component is behind the empire
    pub miniaturization_per_level: f32,
    pub tech_level: u32,
    pub subspace_interdiction: bool,
    pub ground_combat_bonus: i32,
    pub transport_combat: TransportCombat,
    pub stargate_cost: f32,
}

impl Default for SandboxTech {
    fn default() -> Self {
        Self {
            known: Vec::new(),
            worker_productivity: 0.5,
            base_factory_cost: 10.0,
            base_robot_controls: 2,
            max_robot_controls: 2,
            factory_waste_rate: 0.0,
            waste_elimination: 1.0,
            terraform_size_bonus: 0.0,
            terraform_cost_per_size: 50.0,
            atmosphere_terraform_cost: 200.0,
            soil_enrichment_available: false,
            population_cost: 20.0,
            max_planetary_shield: 0,
            best_missile_base: MissileBaseComponent::from(&MISSILE_BASES[0]),
            miniaturization_per_level: 0.0,
            tech_level: 1,
            subspace_interdiction: false,
            ground_combat_bonus: 0,
            transport_combat: TransportCombat::default(),
            stargate_cost: 3_000.0,
        }
    }
}

impl TechView for SandboxTech {
    fn knows(&self, tech: TechId) -> bool {
        self.known.contains(&tech)
    }

    fn known_techs(&self) -> Vec<TechId> {
        self.known.clone()
    }

    fn worker_productivity(&self) -> f32 {
        self.worker_productivity
    }

    fn base_factory_cost(&self) -> f32 {
        self.base_factory_cost
    }

    fn factory_cost(&self, _robot_controls: u32) -> f32 {
        self.base_factory_cost
    }

    fn base_robot_controls(&self) -> u32 {
        self.base_robot_controls
    }

    fn max_robot_controls(&self) -> u32 {
        self.max_robot_controls
    }

    fn factory_waste_rate(&self) -> f32 {
        self.factory_waste_rate
    }

    fn waste_elimination(&self) -> f32 {
        self.waste_elimination
    }

    fn terraform_size_bonus(&self) -> f32 {
        self.terraform_size_bonus
    }

    fn terraform_cost_per_size(&self) -> f32 {
        self.terraform_cost_per_size
    }

    fn atmosphere_terraform_cost(&self) -> f32 {
        self.atmosphere_terraform_cost
    }

    fn soil_enrichment_available(&self) -> bool {
        self.soil_enrichment_available
    }

    fn population_cost(&self) -> f32 {
        self.population_cost
    }

    fn max_planetary_shield(&self) -> u32 {
        self.max_planetary_shield
    }

    fn best_missile_base(&self) -> MissileBaseComponent {
        self.best_missile_base.clone()
    }

    fn miniaturization(&self, level: u32) -> f32 {
        let behind = self.tech_level.saturating_sub(level) as f32;
        (1.0 - self.miniaturization_per_level * behind).max(0.0)
    }

    fn subspace_interdiction(&self) -> bool {
        self.subspace_interdiction
    }

    fn ground_combat_bonus(&self) -> i32 {
        self.ground_combat_bonus
    }

    fn transport_combat(&self) -> TransportCombat {
        self.transport_combat
    }

    fn stargate_cost(&self) -> f32 {
        self.stargate_cost
    }
}

#[derive(Debug, Clone)]
pub struct SandboxEmpire {
    pub id: EmpireId,
    pub player: bool,
    pub race: RaceTraits,
    pub tech: SandboxTech,
    pub tax_pct: f32,
    pub expense_pct: f32,
    pub research_bonus_pct: f32,
    pub reserve: f32,
    /// Research BC received from settlements
    pub research_bc: f32,
    pub divert_excess: bool,
    pub max_ship_bc: Option<f32>,
    pub allies: Vec<EmpireId>,
    pub designs: Vec<ShipDesign>,
    pub ships_built: Vec<(DesignId, u32)>,
    pub deployed: Vec<(StarId, DesignId, u32, Option<StarId>)>,
    pub rally: Option<RallyPoint>,
    pub stargates: Vec<StarId>,
    pub learned: Vec<TechId>,
}

impl SandboxEmpire {
    pub fn new(id: EmpireId) -> Self {
        Self {
            id,
            player: false,
            race: RaceTraits::default(),
            tech: SandboxTech::default(),
            tax_pct: 0.0,
            expense_pct: 0.0,
            research_bonus_pct: 0.0,
            reserve: 0.0,
            research_bc: 0.0,
            divert_excess: false,
            max_ship_bc: None,
            allies: Vec::new(),
            designs: Vec::new(),
            ships_built: Vec::new(),
            deployed: Vec::new(),
            rally: None,
            stargates: Vec::new(),
            learned: Vec::new(),
        }
    }
}

impl Empire for SandboxEmpire {
    fn id(&self) -> EmpireId {
        self.id
    }

    fn is_player(&self) -> bool {
        self.player
    }

    fn race(&self) -> &RaceTraits {
        &self.race
    }

    fn tech(&self) -> &dyn TechView {
        &self.tech
    }

    fn tax_pct(&self) -> f32 {
        self.tax_pct
    }

    fn expense_pct(&self) -> f32 {
        self.expense_pct
    }

    fn research_bonus_pct(&self) -> f32 {
        self.research_bonus_pct
    }

    fn total_reserve(&self) -> f32 {
        self.reserve
    }

    fn add_reserve(&mut self, bc: f32) {
        self.reserve += bc;
    }

    fn add_research_bc(&mut self, bc: f32) {
        self.research_bc += bc;
    }

    fn diverts_colony_excess_to_research(&self) -> bool {
        self.divert_excess
    }

    fn max_ship_bc_permitted(&self) -> Option<f32> {
        self.max_ship_bc
    }

    fn treaty(&self, other: EmpireId) -> Treaty {
        if self.allies.contains(&other) {
            Treaty::Alliance
        } else {
            Treaty::None
        }
    }

    fn ship_design(&self, id: DesignId) -> Option<ShipDesign> {
        self.designs.iter().find(|d| d.id == id).cloned()
    }

    fn record_ships_built(&mut self, design: DesignId, count: u32) {
        self.ships_built.push((design, count));
    }

    fn deploy_ships(&mut self, star: StarId, design: DesignId, count: u32, rally: Option<StarId>) {
        self.deployed.push((star, design, count, rally));
    }

    fn rally_point(&self, _star: StarId) -> Option<RallyPoint> {
        self.rally
    }

    fn has_stargate(&self, star: StarId) -> bool {
        self.stargates.contains(&star)
    }

    fn build_stargate(&mut self, star: StarId) {
        self.stargates.push(star);
    }

    fn learn_tech(&mut self, tech: TechId) {
        self.learned.push(tech);
        if !self.tech.known.contains(&tech) {
            self.tech.known.push(tech);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SandboxPlanet {
    pub id: PlanetId,
    pub star: StarId,
    pub base_size: f32,
    pub current_size: f32,
    pub waste: f32,
    pub max_waste: f32,
    pub environment: Environment,
    pub production_adj: f32,
    pub research_adj: f32,
    pub nebula: bool,
    pub colonizable: bool,
    pub atmosphere_terraformable: bool,
    pub soil_enrichable: bool,
    /// Abandoned factories by the empire that built them
    pub alien_factories: BTreeMap<EmpireId, u32>,
    pub abandoned: bool,
}

impl SandboxPlanet {
    pub fn new(id: PlanetId, size: f32) -> Self {
        Self {
            id,
            star: 5,
            base_size: size,
            current_size: size,
            waste: 0.0,
            max_waste: size,
            environment: Environment::Normal,
            production_adj: 1.0,
            research_adj: 1.0,
            nebula: false,
            colonizable: true,
            atmosphere_terraformable: false,
            soil_enrichable: false,
            alien_factories: BTreeMap::new(),
            abandoned: false,
        }
    }
}

impl Planet for SandboxPlanet {
    fn id(&self) -> PlanetId {
        self.id
    }

    fn star(&self) -> StarId {
        self.star
    }

    fn base_size(&self) -> f32 {
        self.base_size
    }

    fn current_size(&self) -> f32 {
        self.current_size
    }

    /// Every unit of waste crowds out one unit of population.
    fn max_size(&self) -> f32 {
        (self.current_size - self.waste).max(0.0)
    }

    fn waste(&self) -> f32 {
        self.waste
    }

    fn max_waste(&self) -> f32 {
        self.max_waste
    }

    fn add_waste(&mut self, amount: f32) {
        self.waste = (self.waste + amount).max(0.0);
    }

    fn reset_waste(&mut self) {
        self.waste = 0.0;
    }

    fn remove_excess_waste(&mut self) {
        self.waste = self.waste.min(self.max_waste);
    }

    fn environment(&self) -> Environment {
        self.environment
    }

    fn production_adj(&self) -> f32 {
        self.production_adj
    }

    fn research_adj(&self) -> f32 {
        self.research_adj
    }

    fn in_nebula(&self) -> bool {
        self.nebula
    }

    fn can_colonize(&self, _tech: &dyn TechView) -> bool {
        self.colonizable
    }

    fn can_terraform_atmosphere(&self, _tech: &dyn TechView) -> bool {
        self.atmosphere_terraformable
    }

    fn terraform_atmosphere(&mut self) {
        self.atmosphere_terraformable = false;
        if self.environment == Environment::Hostile {
            self.environment = Environment::Poor;
        }
    }

    fn can_enrich_soil(&self, tech: &dyn TechView) -> bool {
        self.soil_enrichable && tech.soil_enrichment_available()
    }

    fn enrich_soil(&mut self) {
        self.soil_enrichable = false;
        self.environment = match self.environment {
            Environment::Normal => Environment::Fertile,
            Environment::Fertile => Environment::Gaia,
            other => other,
        };
    }

    fn terraform_biosphere(&mut self, amount: f32) {
        self.current_size += amount;
    }

    fn num_alien_factories(&self, owner: EmpireId) -> u32 {
        self.alien_factories
            .iter()
            .filter(|(empire, _)| **empire != owner)
            .map(|(_, count)| *count)
            .sum()
    }

    fn add_alien_factories(&mut self, empire: EmpireId, count: i32) {
        let entry = self.alien_factories.entry(empire).or_insert(0);
        *entry = (*entry as i64 + count as i64).max(0) as u32;
        if *entry == 0 {
            self.alien_factories.remove(&empire);
        }
    }

    fn random_alien_factory_empire(&self, owner: EmpireId, rng: &mut dyn RngCore) -> Option<EmpireId> {
        let candidates: Vec<EmpireId> = self
            .alien_factories
            .iter()
            .filter(|(empire, count)| **empire != owner && **count > 0)
            .map(|(empire, _)| *empire)
            .collect();
        candidates.choose(rng).copied()
    }

    fn abandon(&mut self) {
        self.abandoned = true;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SandboxGalaxy {
    /// Stars with hostile fleets in orbit
    pub hostile_stars: Vec<StarId>,
    pub defending_firepower: f32,
    pub fleets: Vec<EmpireId>,
    pub scans: Vec<(EmpireId, PlanetId)>,
    pub colonies: BTreeMap<EmpireId, usize>,
    pub eliminated: Vec<EmpireId>,
}

impl Galaxy for SandboxGalaxy {
    fn hostile_fleets_orbiting(&self, star: StarId, _owner: EmpireId) -> bool {
        self.hostile_stars.contains(&star)
    }

    fn defending_firepower(&self, _star: StarId, _defender: EmpireId, _attacker: EmpireId) -> f32 {
        self.defending_firepower
    }

    fn empires_with_fleets(&self, _star: StarId) -> Vec<EmpireId> {
        self.fleets.clone()
    }

    fn refresh_scan(&mut self, empire: EmpireId, planet: PlanetId) {
        self.scans.push((empire, planet));
    }

    fn colony_count(&self, empire: EmpireId) -> usize {
        self.colonies.get(&empire).copied().unwrap_or(0)
    }

    fn transfer_colony(&mut self, _planet: PlanetId, from: EmpireId, to: EmpireId) {
        let lost = self.colonies.entry(from).or_insert(0);
        *lost = lost.saturating_sub(1);
        *self.colonies.entry(to).or_insert(0) += 1;
    }

    fn eliminate(&mut self, empire: EmpireId) {
        self.eliminated.push(empire);
    }
}

/// Governor that counts its calls and optionally applies a fixed plan.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGovernor {
    pub lowered: u32,
    pub reallocations: u32,
    pub plan: Option<[i32; 5]>,
}

impl Governor for ScriptedGovernor {
    fn lower_expenses(&mut self, _colony: &mut Colony, _income: f32) {
        self.lowered += 1;
    }

    fn set_colony_allocations(&mut self, colony: &mut Colony) {
        self.reallocations += 1;
        if let Some(plan) = self.plan {
            colony.set_allocations(plan);
        }
    }
}

/// One settlement's whole world: its owner, planet, galaxy and governor.
pub struct Sandbox {
    pub empire: SandboxEmpire,
    pub planet: SandboxPlanet,
    pub galaxy: SandboxGalaxy,
    pub governor: ScriptedGovernor,
    pub config: ColonyConfig,
    pub events: Vec<ColonyEvent>,
    pub rng: StdRng,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::with_seed(0x5eed)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            empire: SandboxEmpire::new(1),
            planet: SandboxPlanet::new(10, 100.0),
            galaxy: SandboxGalaxy::default(),
            governor: ScriptedGovernor::default(),
            config: ColonyConfig::default(),
            events: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn view(&self) -> Surroundings<'_> {
        Surroundings {
            empire: &self.empire,
            planet: &self.planet,
            config: &self.config,
        }
    }

    pub fn env(&mut self) -> TurnEnv<'_> {
        TurnEnv {
            empire: &mut self.empire,
            planet: &mut self.planet,
            galaxy: &mut self.galaxy,
            governor: &mut self.governor,
            config: &self.config,
            observer: &mut self.events,
            rng: &mut self.rng,
        }
    }

    /// Invasion of this sandbox's settlement by `attacker`.
    pub fn invasion_env<'a>(&'a mut self, attacker: &'a mut dyn Empire) -> InvasionEnv<'a> {
        InvasionEnv {
            defender: DefenderProfile::of(&self.empire),
            attacker,
            planet: &mut self.planet,
            galaxy: &mut self.galaxy,
            config: &self.config,
            observer: &mut self.events,
            rng: &mut self.rng,
        }
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ColonyBuilder {
    population: f32,
    allocation: Option<[i32; 5]>,
    factories: u32,
}

impl ColonyBuilder {
    pub fn new() -> Self {
        Self {
            population: FOUNDING_POPULATION,
            allocation: None,
            factories: 0,
        }
    }

    pub fn population(mut self, population: f32) -> Self {
        self.population = population;
        self
    }

    pub fn allocation(mut self, allocation: [i32; 5]) -> Self {
        self.allocation = Some(allocation);
        self
    }

    pub fn factories(mut self, factories: u32) -> Self {
        self.factories = factories;
        self
    }

    /// Builds against the default sandbox (empire 1, planet 10).
    pub fn build(self) -> Colony {
        self.build_in(&Sandbox::new())
    }

    pub fn build_in(self, sandbox: &Sandbox) -> Colony {
        let mut colony = Colony::found(&sandbox.planet, &sandbox.empire);
        colony.state.population = self.population;
        colony.state.previous_population = self.population;
        if let Some(allocation) = self.allocation {
            colony.state.allocation = allocation;
        }
        colony.categories.industry.factories = self.factories;
        colony
    }
}

impl Default for ColonyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let colony = ColonyBuilder::default()
            .population(12.0)
            .allocation([5, 5, 20, 10, 10])
            .factories(7)
            .build();

        assert_eq!(colony.population(), 12.0);
        assert_eq!(colony.allocations(), [5, 5, 20, 10, 10]);
        assert_eq!(colony.industry().factories, 7);
        assert_eq!(colony.owner(), 1);
        assert_eq!(colony.planet(), 10);
    }

    #[test]
    fn test_alien_factory_bookkeeping() {
        let mut planet = SandboxPlanet::new(1, 10.0);
        planet.add_alien_factories(3, 4);
        planet.add_alien_factories(1, 2);
        assert_eq!(planet.num_alien_factories(1), 4);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(planet.random_alien_factory_empire(1, &mut rng), Some(3));

        planet.add_alien_factories(3, -10);
        assert_eq!(planet.num_alien_factories(1), 0);
        assert_eq!(planet.random_alien_factory_empire(1, &mut rng), None);
    }
}

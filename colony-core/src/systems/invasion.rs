//! Hostile transports landing on a settlement.
//!
//! A transport arriving at a loyal settlement runs the gauntlet (missile bases
//! plus defending fleets), then whatever lands fights the garrison one unit at
//! a time. A settlement in rebellion is defended by its rebels instead, and a
//! transport from the settlement's own empire lands to put the rebellion down.
//!
//! # Ground combat
//!
//! Each exchange rolls `0..100` plus a bonus for both sides. The lower roll
//! loses one unit; ties go to the defender.

use crate::category::CategoryKind;
use crate::colony::Colony;
use crate::context::InvasionEnv;
use crate::external::TechId;
use crate::observer::event_log::ColonyEvent;
use crate::observer::notify;
use crate::transport::Transport;
use colony_data::defines::invasion as defines;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// How an invasion ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InvasionOutcome {
    /// No attacker survived. `landed` units reached the ground.
    Repelled { landed: u32 },
    /// The attacker took the settlement.
    Captured {
        landed: u32,
        survivors: u32,
        plundered: Vec<TechId>,
    },
    /// Loyal troops defeated the rebels.
    RebellionQuelled { survivors: u32 },
}

/// Units of a transport after the gauntlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GauntletResult {
    /// Slipped past the defenders untouched
    pub evaded: u32,
    pub destroyed: u32,
    pub landed: u32,
}

/// Fires the gauntlet at a transport.
///
/// Evading units are rolled first. The rest take `firepower` damage per round
/// for the transport's gauntlet rounds, losing one unit per full `hit_points`.
pub fn run_gauntlet(
    transport: &Transport,
    firepower: f32,
    interdiction: bool,
    rng: &mut dyn RngCore,
) -> GauntletResult {
    let evasion = transport.evasion_against(interdiction);
    let evaded = if evasion > 0.0 {
        (0..transport.size).filter(|_| rng.gen::<f32>() < evasion).count() as u32
    } else {
        0
    };
    let exposed = transport.size - evaded;

    let mut destroyed = 0u32;
    let hit_points = transport.combat.hit_points;
    if firepower > 0.0 && hit_points > 0.0 {
        let per_round = (firepower / hit_points).floor() as u32;
        for _ in 0..transport.combat.gauntlet_rounds {
            if destroyed >= exposed {
                break;
            }
            destroyed = (destroyed + per_round).min(exposed);
        }
    }

    GauntletResult {
        evaded,
        destroyed,
        landed: transport.size - destroyed,
    }
}

/// Fights unit-by-unit until one side is gone. Returns the survivors of each side.
pub fn ground_combat(
    mut attackers: u32,
    mut defenders: u32,
    attack_bonus: i32,
    defend_bonus: i32,
    rng: &mut dyn RngCore,
) -> (u32, u32) {
    while attackers > 0 && defenders > 0 {
        let attack = rng.gen_range(0..defines::GROUND_COMBAT_ROLL) + attack_bonus;
        let defend = rng.gen_range(0..defines::GROUND_COMBAT_ROLL) + defend_bonus;
        if attack > defend {
            defenders -= 1;
        } else {
            attackers -= 1;
        }
    }
    (attackers, defenders)
}

/// Resolves a transport landing on `colony`.
#[instrument(skip_all, name = "invasion")]
pub fn resolve_invasion(
    colony: &mut Colony,
    transport: Transport,
    env: &mut InvasionEnv<'_>,
) -> InvasionOutcome {
    if transport.is_empty() {
        return InvasionOutcome::Repelled { landed: 0 };
    }
    if colony.state.rebellion {
        resist_with_rebels(colony, transport, env)
    } else {
        resist_with_garrison(colony, transport, env)
    }
}

fn resist_with_rebels(
    colony: &mut Colony,
    transport: Transport,
    env: &mut InvasionEnv<'_>,
) -> InvasionOutcome {
    let rebels = colony.state.rebels.max(0) as u32;
    colony.state.captives = (colony.state.population - rebels as f32).max(0.0);

    let (attackers, rebels_left) = ground_combat(
        transport.size,
        rebels,
        transport.combat.combat_adj,
        env.defender.ground_bonus,
        &mut *env.rng,
    );
    colony.state.population -= (rebels - rebels_left) as f32;
    colony.state.rebels = rebels_left as i32;

    if attackers == 0 {
        repelled(colony, &transport, transport.size, env)
    } else if transport.owner == colony.state.owner {
        colony.state.rebellion = false;
        colony.state.rebels = 0;
        colony.state.captives = 0.0;
        colony.state.population += attackers as f32;
        log::info!("Planet {}: rebellion quelled", colony.state.planet);
        notify(
            env.observer,
            ColonyEvent::RebellionQuelled {
                planet: colony.state.planet,
            },
        );
        InvasionOutcome::RebellionQuelled {
            survivors: attackers,
        }
    } else {
        let plundered = capture_colony(colony, attackers, env);
        InvasionOutcome::Captured {
            landed: transport.size,
            survivors: attackers,
            plundered,
        }
    }
}

fn resist_with_garrison(
    colony: &mut Colony,
    transport: Transport,
    env: &mut InvasionEnv<'_>,
) -> InvasionOutcome {
    let star = env.planet.star();
    let firepower = colony.defense().firepower()
        + env
            .galaxy
            .defending_firepower(star, env.defender.empire, transport.owner);
    let gauntlet = run_gauntlet(
        &transport,
        firepower,
        env.defender.subspace_interdiction,
        &mut *env.rng,
    );
    log::debug!(
        "Planet {}: transport of {} ran the gauntlet ({} evaded, {} destroyed)",
        colony.state.planet,
        transport.size,
        gauntlet.evaded,
        gauntlet.destroyed
    );
    if gauntlet.landed == 0 {
        return repelled(colony, &transport, 0, env);
    }

    let defenders = colony.state.population.max(0.0).floor() as u32;
    let (attackers, defenders_left) = ground_combat(
        gauntlet.landed,
        defenders,
        transport.combat.combat_adj,
        env.defender.ground_bonus,
        &mut *env.rng,
    );
    colony.state.population = (colony.state.population - (defenders - defenders_left) as f32).max(0.0);

    if attackers == 0 {
        return repelled(colony, &transport, gauntlet.landed, env);
    }
    let plundered = capture_colony(colony, attackers, env);
    InvasionOutcome::Captured {
        landed: gauntlet.landed,
        survivors: attackers,
        plundered,
    }
}

fn repelled(
    colony: &mut Colony,
    transport: &Transport,
    landed: u32,
    env: &mut InvasionEnv<'_>,
) -> InvasionOutcome {
    notify(
        env.observer,
        ColonyEvent::TransportDestroyed {
            planet: colony.state.planet,
            attacker: transport.owner,
            size: transport.size,
        },
    );
    if colony.state.population <= 0.0 {
        super::migration::destroy_colony(colony, &mut *env.planet, &mut *env.observer);
    }
    InvasionOutcome::Repelled { landed }
}

/// Technologies the attacker learns from the captured factories.
fn plunder(factories: u32, env: &mut InvasionEnv<'_>) -> Vec<TechId> {
    let tech = env.attacker.tech();
    let unknown: Vec<TechId> = env
        .defender
        .known_techs
        .iter()
        .copied()
        .filter(|t| !tech.knows(*t))
        .collect();
    if unknown.is_empty() {
        return Vec::new();
    }

    let limit = defines::MAX_PLUNDERED_TECHS.min(unknown.len());
    let mut count = 0;
    for _ in 0..factories {
        if count >= limit {
            break;
        }
        if env.rng.gen_bool(defines::PLUNDER_CHANCE_PER_FACTORY) {
            count += 1;
        }
    }
    unknown
        .choose_multiple(&mut *env.rng, count)
        .copied()
        .collect()
}

/// Hands the settlement to the attacker, with `survivors` as its new population.
/// Returns the technologies plundered in the process.
pub fn capture_colony(colony: &mut Colony, survivors: u32, env: &mut InvasionEnv<'_>) -> Vec<TechId> {
    let planet = colony.state.planet;
    let from = colony.state.owner;
    let to = env.attacker.id();

    if env.attacker.is_player() {
        colony.state.allocation = [0; 5];
    }

    let plundered = if env.config.plunder_enabled {
        plunder(colony.industry().factories, env)
    } else {
        Vec::new()
    };
    for tech in &plundered {
        env.attacker.learn_tech(*tech);
    }

    for kind in CategoryKind::ALL {
        colony.categories.get_mut(kind).captured_by(&*env.attacker);
    }

    let state = &mut colony.state;
    state.owner = to;
    state.population = survivors as f32;
    state.previous_population = state.population;
    state.rebels = 0;
    state.captives = 0.0;
    state.rebellion = false;
    state.reserve_income_bc = 0.0;
    state.transport = None;
    state.orders.clear();
    state.locked = [false; 5];
    state.under_siege = false;

    let star = env.planet.star();
    for empire in env.galaxy.empires_with_fleets(star) {
        env.galaxy.refresh_scan(empire, planet);
    }
    env.galaxy.transfer_colony(planet, from, to);

    log::info!("Planet {} captured by empire {} from {}", planet, to, from);
    notify(
        env.observer,
        ColonyEvent::ColonyCaptured {
            planet,
            from,
            to,
            plundered: plundered.clone(),
        },
    );

    if env.galaxy.colony_count(from) == 0 {
        log::info!("Empire {} has no settlements left", from);
        env.galaxy.eliminate(from);
        notify(env.observer, ColonyEvent::EmpireEliminated { empire: from });
    }

    plundered
}

impl Colony {
    pub fn resolve_invasion(&mut self, transport: Transport, env: &mut InvasionEnv<'_>) -> InvasionOutcome {
        resolve_invasion(self, transport, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::Galaxy;
    use crate::testing::{ColonyBuilder, Sandbox, SandboxEmpire};
    use crate::transport::TransportCombat;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn transport(owner: u32, size: u32) -> Transport {
        Transport {
            owner,
            origin: 99,
            destination: 10,
            size,
            travel_turns: 1,
            combat: TransportCombat::default(),
        }
    }

    #[test]
    fn test_undefended_gauntlet_loses_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = run_gauntlet(&transport(2, 5), 0.0, false, &mut rng);
        assert_eq!(
            result,
            GauntletResult {
                evaded: 0,
                destroyed: 0,
                landed: 5
            }
        );
    }

    #[test]
    fn test_gauntlet_damage_per_round() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut t = transport(2, 10);
        t.combat.gauntlet_rounds = 2;
        // 25 damage against 10 hit points: two units per round
        let result = run_gauntlet(&t, 25.0, false, &mut rng);
        assert_eq!(result.destroyed, 4);
        assert_eq!(result.landed, 6);
    }

    #[test]
    fn test_full_evasion_bypasses_gauntlet() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut t = transport(2, 8);
        t.combat.evasion_pct = 1.0;
        let result = run_gauntlet(&t, 1_000.0, false, &mut rng);
        assert_eq!(result.evaded, 8);
        assert_eq!(result.landed, 8);
    }

    #[test]
    fn test_ground_combat_ends_with_one_side_gone() {
        let mut rng = StdRng::seed_from_u64(11);
        let (a, d) = ground_combat(10, 10, 0, 0, &mut rng);
        assert!(a == 0 || d == 0);
        assert!(a <= 10 && d <= 10);

        // A defender bonus above the die can never lose
        let (a, d) = ground_combat(10, 1, 0, 100, &mut rng);
        assert_eq!((a, d), (0, 1));
    }

    #[test]
    fn test_undefended_transport_reaches_ground_combat() {
        let mut sandbox = Sandbox::new();
        let mut colony = ColonyBuilder::new().population(3.0).build_in(&sandbox);
        let mut attacker = SandboxEmpire::new(2);

        let outcome = colony.resolve_invasion(transport(2, 5), &mut sandbox.invasion_env(&mut attacker));

        match outcome {
            InvasionOutcome::Repelled { landed } => assert_eq!(landed, 5),
            InvasionOutcome::Captured { landed, .. } => assert_eq!(landed, 5),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_wiped_out_transport_notifies() {
        let mut sandbox = Sandbox::new();
        sandbox.galaxy.defending_firepower = 1_000.0;
        let mut colony = ColonyBuilder::new().population(3.0).build_in(&sandbox);
        let mut attacker = SandboxEmpire::new(2);

        let outcome = colony.resolve_invasion(transport(2, 5), &mut sandbox.invasion_env(&mut attacker));

        assert_eq!(outcome, InvasionOutcome::Repelled { landed: 0 });
        assert_eq!(colony.owner(), 1);
        assert!(sandbox
            .events
            .iter()
            .any(|e| matches!(e, ColonyEvent::TransportDestroyed { size: 5, .. })));
    }

    #[test]
    fn test_capture_by_player_resets_settlement() {
        let mut sandbox = Sandbox::new();
        sandbox.galaxy.colonies.insert(1, 2);
        let mut colony = ColonyBuilder::new()
            .population(8.0)
            .allocation([10, 10, 10, 10, 10])
            .build_in(&sandbox);
        colony.state.rebels = 3;
        colony.state.rebellion = true;
        colony.set_reserve_income(40.0);
        colony.set_locked(CategoryKind::Defense, true);
        let mut attacker = SandboxEmpire::new(2);
        attacker.player = true;

        capture_colony(&mut colony, 4, &mut sandbox.invasion_env(&mut attacker));

        assert_eq!(colony.allocations(), [0; 5]);
        assert_eq!(colony.state.rebels, 0);
        assert!(!colony.state.rebellion);
        assert_eq!(colony.state.reserve_income_bc, 0.0);
        assert!(!colony.is_locked(CategoryKind::Defense));
        assert_eq!(colony.owner(), 2);
        assert_eq!(colony.population(), 4.0);
        assert_eq!(sandbox.galaxy.colony_count(1), 1);
        assert!(sandbox.galaxy.eliminated.is_empty());
    }

    #[test]
    fn test_capture_by_ai_keeps_allocation() {
        let mut sandbox = Sandbox::new();
        let mut colony = ColonyBuilder::new()
            .allocation([10, 10, 10, 10, 10])
            .build_in(&sandbox);
        colony.state.rebels = 2;
        colony.set_reserve_income(40.0);
        let mut attacker = SandboxEmpire::new(2);

        capture_colony(&mut colony, 4, &mut sandbox.invasion_env(&mut attacker));

        assert_eq!(colony.allocations(), [10, 10, 10, 10, 10]);
        assert_eq!(colony.state.rebels, 0);
        assert_eq!(colony.state.reserve_income_bc, 0.0);
    }

    #[test]
    fn test_last_colony_eliminates_empire() {
        let mut sandbox = Sandbox::new();
        sandbox.galaxy.colonies.insert(1, 1);
        let mut colony = ColonyBuilder::new().build_in(&sandbox);
        let mut attacker = SandboxEmpire::new(2);

        capture_colony(&mut colony, 4, &mut sandbox.invasion_env(&mut attacker));

        assert_eq!(sandbox.galaxy.eliminated, vec![1]);
        assert!(sandbox
            .events
            .iter()
            .any(|e| matches!(e, ColonyEvent::EmpireEliminated { empire: 1 })));
    }

    #[test]
    fn test_plunder_takes_only_unknown_techs() {
        let mut sandbox = Sandbox::new();
        sandbox.empire.tech.known = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let mut colony = ColonyBuilder::new().factories(5_000).build_in(&sandbox);
        let mut attacker = SandboxEmpire::new(2);
        attacker.tech.known = vec![1, 2];

        let plundered = capture_colony(&mut colony, 4, &mut sandbox.invasion_env(&mut attacker));

        // 5000 factories at 2% each all but guarantee the cap
        assert_eq!(plundered.len(), 6);
        assert!(plundered.iter().all(|t| *t > 2));
        let mut unique = plundered.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), plundered.len());
        assert_eq!(attacker.learned.len(), 6);
    }

    #[test]
    fn test_loyal_transport_quells_rebellion() {
        let mut sandbox = Sandbox::new();
        let mut colony = ColonyBuilder::new().population(10.0).build_in(&sandbox);
        colony.state.rebellion = true;
        colony.state.rebels = 1;
        let mut loyalists = SandboxEmpire::new(1);
        let mut t = transport(1, 20);
        // The lone rebel cannot out-roll a +100 landing force
        t.combat.combat_adj = 100;

        let outcome = colony.resolve_invasion(t, &mut sandbox.invasion_env(&mut loyalists));

        assert_eq!(outcome, InvasionOutcome::RebellionQuelled { survivors: 20 });
        assert!(!colony.in_rebellion());
        assert_eq!(colony.owner(), 1);
        assert_eq!(colony.population(), 29.0);
    }

    #[test]
    fn test_foreign_transport_takes_rebel_colony() {
        let mut sandbox = Sandbox::new();
        let mut colony = ColonyBuilder::new().population(10.0).build_in(&sandbox);
        colony.state.rebellion = true;
        colony.state.rebels = 1;
        let mut attacker = SandboxEmpire::new(2);
        let mut t = transport(2, 20);
        t.combat.combat_adj = 100;

        let outcome = colony.resolve_invasion(t, &mut sandbox.invasion_env(&mut attacker));

        assert_eq!(
            outcome,
            InvasionOutcome::Captured {
                landed: 20,
                survivors: 20,
                plundered: vec![]
            }
        );
        assert_eq!(colony.owner(), 2);
        assert_eq!(colony.population(), 20.0);
        assert!(!colony.in_rebellion());
    }

    #[test]
    fn test_rebels_repel_landing() {
        let mut sandbox = Sandbox::new();
        let mut colony = ColonyBuilder::new().population(10.0).build_in(&sandbox);
        colony.state.rebellion = true;
        colony.state.rebels = 5;
        let mut attacker = SandboxEmpire::new(2);
        let mut t = transport(2, 3);
        // Never beats even the lowest defending roll
        t.combat.combat_adj = -100;

        let outcome = colony.resolve_invasion(t, &mut sandbox.invasion_env(&mut attacker));

        assert_eq!(outcome, InvasionOutcome::Repelled { landed: 3 });
        assert!(colony.in_rebellion());
        assert_eq!(colony.state.rebels, 5);
        assert_eq!(colony.state.captives, 5.0);
        assert_eq!(colony.owner(), 1);
        assert_eq!(colony.population(), 10.0);
        assert!(sandbox
            .events
            .iter()
            .any(|e| matches!(e, ColonyEvent::TransportDestroyed { size: 3, .. })));
    }
}

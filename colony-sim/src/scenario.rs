use anyhow::Context;
use colony_core::testing::{Sandbox, SandboxEmpire};
use colony_core::{
    BuildTarget, CategoryKind, Colony, ColonyConfig, MissileBaseComponent, OrderKind, ShipDesign,
    Transport,
};
use colony_data::{missile_bases, MISSILE_BASES};

/// Design id of the scout every scenario empire can build.
pub const SCOUT: u32 = 1;

/// A fresh capital on a mid-sized world, with a modest tech base.
pub fn capital_scenario(seed: u64, config: ColonyConfig) -> anyhow::Result<(Sandbox, Colony)> {
    let mut sandbox = Sandbox::with_seed(seed);
    sandbox.config = config;

    sandbox.planet.base_size = 80.0;
    sandbox.planet.current_size = 60.0;
    sandbox.planet.max_waste = 80.0;

    let tech = &mut sandbox.empire.tech;
    tech.max_robot_controls = 4;
    tech.factory_waste_rate = 0.25;
    tech.waste_elimination = 2.0;
    tech.terraform_size_bonus = 10.0;
    tech.max_planetary_shield = 5;
    let hyper_v = missile_bases::by_tech(101).context("missile base 101 missing from catalog")?;
    tech.best_missile_base = MissileBaseComponent::from(hyper_v);
    tech.known = MISSILE_BASES.iter().take(2).map(|b| b.tech_id).collect();

    sandbox.empire.tax_pct = 0.1;
    sandbox.empire.reserve = 200.0;
    sandbox.empire.designs.push(ShipDesign {
        id: SCOUT,
        name: "Scout".to_string(),
        cost: 40.0,
        active: true,
    });
    sandbox.galaxy.colonies.insert(sandbox.empire.id, 1);

    let mut colony = Colony::found_capital(&sandbox.planet, &sandbox.empire);
    colony.defense_mut().set_max_bases(4);
    colony
        .shipyard_mut()
        .set_build_target(BuildTarget::Ship(SCOUT), &sandbox.empire)?;
    colony.add_colony_order(OrderKind::Shield, 0.2);
    colony.adjust_allocation(CategoryKind::Ship, 5);

    Ok((sandbox, colony))
}

/// A hostile empire landing `size` units on the colony.
pub fn raiders(size: u32, destination: u32) -> (SandboxEmpire, Transport) {
    let empire = SandboxEmpire::new(2);
    let transport = Transport {
        owner: empire.id,
        origin: 0,
        destination,
        size,
        travel_turns: 0,
        combat: empire.tech.transport_combat,
    };
    (empire, transport)
}

//! Ship and stargate construction.
//!
//! Ships and stargates draw from disjoint funding pools. Switching the build
//! target parks unspent BC in the old pool's reserve, and the new target picks
//! up whatever its own reserve holds.

use super::{CategoryKind, SpendingCategory, TurnFunds};
use crate::colony::ColonyState;
use crate::context::{Surroundings, TurnEnv};
use crate::error::ColonyError;
use crate::external::{DesignId, Empire, PlanetId, StarId, Treaty};
use crate::observer::event_log::ColonyEvent;
use crate::observer::notify;
use serde::{Deserialize, Serialize};

/// What the shipyard is currently working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildTarget {
    #[default]
    None,
    Ship(DesignId),
    Stargate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shipyard {
    pub design: BuildTarget,
    pub previous_design: BuildTarget,
    /// Progress toward the next unit of the current ship design
    pub ship_bc: f32,
    pub stargate_bc: f32,
    pub ship_reserve_bc: f32,
    pub stargate_reserve_bc: f32,
}

impl Shipyard {
    pub fn is_building(&self) -> bool {
        self.design != BuildTarget::None
    }

    /// Selects what to build. Ship designs must be known to `empire`.
    pub fn set_build_target(&mut self, target: BuildTarget, empire: &dyn Empire) -> Result<(), ColonyError> {
        if target == self.design {
            return Ok(());
        }
        if let BuildTarget::Ship(id) = target {
            if empire.ship_design(id).is_none() {
                return Err(ColonyError::UnknownDesign(id));
            }
        }
        self.park_funds();
        match target {
            BuildTarget::Ship(_) => self.ship_bc += std::mem::take(&mut self.ship_reserve_bc),
            BuildTarget::Stargate => self.stargate_bc += std::mem::take(&mut self.stargate_reserve_bc),
            BuildTarget::None => {}
        }
        self.previous_design = self.design;
        self.design = target;
        Ok(())
    }

    fn park_funds(&mut self) {
        match self.design {
            BuildTarget::Ship(_) => self.ship_reserve_bc += std::mem::take(&mut self.ship_bc),
            BuildTarget::Stargate => self.stargate_reserve_bc += std::mem::take(&mut self.stargate_bc),
            BuildTarget::None => {}
        }
    }

    fn finish_target(&mut self) {
        self.park_funds();
        self.previous_design = self.design;
        self.design = BuildTarget::None;
    }

    /// Rally star for new ships, if the owner routes them and may enter it.
    fn rally_star(empire: &dyn Empire, star: StarId) -> Option<StarId> {
        let rally = empire.rally_point(star)?;
        let allowed = rally.owner == empire.id() || empire.treaty(rally.owner) == Treaty::Alliance;
        allowed.then_some(rally.star)
    }

    fn build_ships(&mut self, planet: PlanetId, star: StarId, id: DesignId, bc: f32, env: &mut TurnEnv<'_>) {
        let Some(design) = env.empire.ship_design(id) else {
            log::warn!("Planet {}: unknown ship design {}, funds donated to reserve", planet, id);
            env.empire.add_reserve(bc + std::mem::take(&mut self.ship_bc));
            self.finish_target();
            return;
        };
        if !design.active {
            log::debug!("Planet {}: design '{}' is obsolete, funds donated", planet, design.name);
            env.empire.add_reserve(bc + std::mem::take(&mut self.ship_bc));
            return;
        }

        self.ship_bc += bc;
        if design.cost <= 0.0 {
            return;
        }
        let count = (self.ship_bc / design.cost).floor() as u32;
        if count == 0 {
            return;
        }
        self.ship_bc -= count as f32 * design.cost;

        env.empire.record_ships_built(id, count);
        let rally = Self::rally_star(&*env.empire, star);
        env.empire.deploy_ships(star, id, count, rally);
        notify(
            env.observer,
            ColonyEvent::ShipsBuilt {
                planet,
                design: id,
                count,
                rally,
            },
        );
    }

    fn build_stargate(&mut self, planet: PlanetId, star: StarId, bc: f32, env: &mut TurnEnv<'_>) {
        if env.empire.has_stargate(star) {
            env.empire.add_reserve(bc + std::mem::take(&mut self.stargate_bc));
            self.finish_target();
            return;
        }
        self.stargate_bc += bc;
        let cost = env.empire.tech().stargate_cost();
        if self.stargate_bc < cost {
            return;
        }
        self.stargate_bc -= cost;
        env.empire.build_stargate(star);
        notify(env.observer, ColonyEvent::StargateBuilt { planet });
        self.finish_target();
    }
}

impl SpendingCategory for Shipyard {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Ship
    }

    fn next_turn(&mut self, colony: &ColonyState, funds: TurnFunds, env: &mut TurnEnv<'_>) {
        let mut bc = self.total_bc(colony, funds, env.view());
        if let Some(cap) = env.empire.max_ship_bc_permitted() {
            let cap = cap.max(0.0);
            if bc > cap {
                env.empire.add_reserve(bc - cap);
                bc = cap;
            }
        }

        let star = env.planet.star();
        match self.design {
            BuildTarget::None => {
                if bc > 0.0 {
                    env.empire.add_reserve(bc);
                }
            }
            BuildTarget::Ship(id) => self.build_ships(colony.planet, star, id, bc, env),
            BuildTarget::Stargate => self.build_stargate(colony.planet, star, bc, env),
        }
    }

    fn is_completed(&self, _colony: &ColonyState, _view: Surroundings<'_>) -> bool {
        !self.is_building()
    }

    fn captured_by(&mut self, _new_owner: &dyn Empire) {
        *self = Shipyard::default();
    }
}

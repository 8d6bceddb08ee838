//! Planetary shields and missile bases.

use super::{CategoryKind, SpendingCategory, TurnFunds};
use crate::colony::ColonyState;
use crate::context::{Surroundings, TurnEnv};
use crate::external::Empire;
use crate::missile_base::MissileBaseComponent;
use crate::observer::event_log::ColonyEvent;
use crate::observer::notify;
use crate::orders::OrderKind;
use colony_data::defines::defense as defines;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defense {
    pub bases: u32,
    /// Target base count set by the player or AI
    pub max_bases: u32,
    pub shield: u32,
    /// Missile-base technology the existing bases are built with
    pub missile_base: MissileBaseComponent,
    /// Progress toward refitting every base to the best technology
    pub base_upgrade_bc: f32,
    /// Progress toward the next shield level
    pub shield_bc: f32,
    /// Unspent BC carried to next turn
    pub defense_reserve_bc: f32,
    #[serde(skip)]
    pending: PendingDefense,
}

#[derive(Debug, Clone, Default)]
struct PendingDefense {
    shield_levels: u32,
    upgrade: Option<MissileBaseComponent>,
    new_bases: u32,
    scrapped: u32,
    refund: f32,
    excess_bc: f32,
}

impl Defense {
    pub fn new(owner: &dyn Empire) -> Self {
        Self {
            bases: 0,
            max_bases: 0,
            shield: 0,
            missile_base: owner.tech().best_missile_base(),
            base_upgrade_bc: 0.0,
            shield_bc: 0.0,
            defense_reserve_bc: 0.0,
            pending: PendingDefense::default(),
        }
    }

    pub fn set_max_bases(&mut self, max_bases: u32) {
        self.max_bases = max_bases;
    }

    /// Highest shield the planet can carry. Nebulae block shields entirely.
    pub fn max_shield(view: Surroundings<'_>) -> u32 {
        if view.planet.in_nebula() {
            0
        } else {
            view.empire.tech().max_planetary_shield()
        }
    }

    pub fn shield_completed(&self, view: Surroundings<'_>) -> bool {
        self.shield >= Self::max_shield(view)
    }

    pub fn has_best_missile_base(&self, view: Surroundings<'_>) -> bool {
        self.missile_base.same_tech(&view.empire.tech().best_missile_base())
    }

    pub fn bases_completed(&self, view: Surroundings<'_>) -> bool {
        self.has_best_missile_base(view) && self.bases >= self.max_bases
    }

    /// Gauntlet firepower of the settlement's bases per round.
    pub fn firepower(&self) -> f32 {
        self.missile_base.firepower(self.bases)
    }
}

impl SpendingCategory for Defense {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Defense
    }

    fn next_turn(&mut self, colony: &ColonyState, funds: TurnFunds, env: &mut TurnEnv<'_>) {
        let view = env.view();
        self.pending = PendingDefense::default();
        let mut bc = self.total_bc(colony, funds, view) + self.defense_reserve_bc;
        self.defense_reserve_bc = 0.0;

        // Scrapping costs nothing, so it never waits on shields or refits
        if self.bases > self.max_bases {
            let scrapped = self.bases - self.max_bases;
            self.pending.scrapped = scrapped;
            self.pending.refund =
                scrapped as f32 * self.missile_base.cost(view.empire) * view.config.scrap_refund_pct;
        }
        let bases = self.bases - self.pending.scrapped;

        let max_shield = Self::max_shield(view);
        if self.shield < max_shield {
            let available = bc + self.shield_bc;
            let levels = ((available / defines::SHIELD_COST_PER_LEVEL).floor() as u32)
                .min(max_shield - self.shield);
            self.pending.shield_levels = levels;
            let left = available - levels as f32 * defines::SHIELD_COST_PER_LEVEL;
            self.shield_bc = 0.0;
            if self.shield + levels < max_shield {
                self.shield_bc = left;
                return;
            }
            bc = left;
        }

        let best = view.empire.tech().best_missile_base();
        let mut installed = self.missile_base.clone();
        if !installed.same_tech(&best) {
            if bases == 0 {
                installed = best.clone();
                self.pending.upgrade = Some(best.clone());
            } else {
                let delta = (best.cost(view.empire) - installed.cost(view.empire)).max(0.0)
                    * bases as f32;
                self.base_upgrade_bc += bc;
                if self.base_upgrade_bc < delta {
                    return;
                }
                bc = self.base_upgrade_bc - delta;
                self.base_upgrade_bc = 0.0;
                installed = best.clone();
                self.pending.upgrade = Some(best.clone());
            }
        }

        if bases < self.max_bases {
            let cost = installed.cost(view.empire);
            let affordable = if cost > 0.0 {
                (bc / cost).floor() as u32
            } else {
                self.max_bases - bases
            };
            let built = affordable.min(self.max_bases - bases);
            bc -= built as f32 * cost.max(0.0);
            self.pending.new_bases = built;
        }

        let bases_done = bases + self.pending.new_bases >= self.max_bases;
        if bases_done && installed.same_tech(&best) {
            self.pending.excess_bc = bc;
        } else {
            self.defense_reserve_bc = bc;
        }
    }

    fn commit_turn(&mut self, colony: &mut ColonyState, env: &mut TurnEnv<'_>) {
        let pending = std::mem::take(&mut self.pending);
        self.shield += pending.shield_levels;

        if pending.scrapped > 0 {
            self.bases -= pending.scrapped.min(self.bases);
            env.empire.add_reserve(pending.refund);
            notify(
                env.observer,
                ColonyEvent::MissileBasesScrapped {
                    planet: colony.planet,
                    count: pending.scrapped,
                    refund: pending.refund,
                },
            );
        }

        if let Some(best) = pending.upgrade {
            self.missile_base = best;
            if self.bases > 0 {
                notify(
                    env.observer,
                    ColonyEvent::MissileBasesUpgraded {
                        planet: colony.planet,
                        tech: self.missile_base.tech,
                        bases: self.bases,
                    },
                );
            }
        }
        self.bases += pending.new_bases;

        if pending.excess_bc > 0.0 {
            env.empire.add_reserve(pending.excess_bc);
        }
    }

    fn assess_turn(&mut self, colony: &mut ColonyState, view: Surroundings<'_>) -> Option<f32> {
        let shield = self
            .shield_completed(view)
            .then(|| colony.remove_order(OrderKind::Shield))
            .flatten();
        let bases = self
            .bases_completed(view)
            .then(|| colony.remove_order(OrderKind::Bases))
            .flatten();
        match (shield, bases) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    fn is_completed(&self, _colony: &ColonyState, view: Surroundings<'_>) -> bool {
        self.has_best_missile_base(view) && self.bases >= self.max_bases && self.shield_completed(view)
    }

    fn captured_by(&mut self, _new_owner: &dyn Empire) {
        self.base_upgrade_bc = 0.0;
        self.shield_bc = 0.0;
        self.defense_reserve_bc = 0.0;
        self.pending = PendingDefense::default();
    }
}

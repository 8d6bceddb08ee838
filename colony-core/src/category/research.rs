//! Research spending: funds the settlement's own project first, then the empire pool.

use super::{CategoryKind, SpendingCategory, TurnFunds};
use crate::colony::ColonyState;
use crate::context::{Surroundings, TurnEnv};
use crate::external::Empire;
use crate::observer::event_log::ColonyEvent;
use crate::observer::notify;
use serde::{Deserialize, Serialize};

/// A research goal funded by one settlement before the empire pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchProject {
    pub name: String,
    pub remaining_bc: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Research {
    pub project: Option<ResearchProject>,
    #[serde(skip)]
    pending_bc: f32,
}

impl Research {
    pub fn assign_project(&mut self, name: impl Into<String>, cost_bc: f32) {
        self.project = Some(ResearchProject {
            name: name.into(),
            remaining_bc: cost_bc.max(0.0),
        });
    }
}

impl SpendingCategory for Research {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Research
    }

    /// Research output, after planet, empire and session modifiers.
    fn total_bc(&self, colony: &ColonyState, funds: TurnFunds, view: Surroundings<'_>) -> f32 {
        (colony.pct(CategoryKind::Research)
            * funds.total()
            * view.planet.research_adj()
            * (1.0 + view.empire.research_bonus_pct())
            * view.config.research_multiplier)
            .max(0.0)
    }

    fn next_turn(&mut self, colony: &ColonyState, funds: TurnFunds, env: &mut TurnEnv<'_>) {
        self.pending_bc = self.total_bc(colony, funds, env.view());
    }

    fn commit_turn(&mut self, colony: &mut ColonyState, env: &mut TurnEnv<'_>) {
        let mut bc = std::mem::take(&mut self.pending_bc);

        if let Some(project) = self.project.as_mut() {
            let spent = bc.min(project.remaining_bc);
            project.remaining_bc -= spent;
            bc -= spent;
            if project.remaining_bc <= 0.0 {
                if let Some(done) = self.project.take() {
                    notify(
                        env.observer,
                        ColonyEvent::ResearchProjectCompleted {
                            planet: colony.planet,
                            project: done.name,
                        },
                    );
                }
            }
        }

        if bc > 0.0 {
            env.empire.add_research_bc(bc);
        }
    }

    /// Research never runs out of things to fund.
    fn is_completed(&self, _colony: &ColonyState, _view: Surroundings<'_>) -> bool {
        false
    }

    fn captured_by(&mut self, _new_owner: &dyn Empire) {
        self.project = None;
        self.pending_bc = 0.0;
    }
}

//! Population transports between friendly settlements, and abandonment.

use crate::colony::Colony;
use crate::external::{Empire, Planet, PlanetId, TechView};
use crate::observer::event_log::ColonyEvent;
use crate::observer::{notify, ColonyObserver};
use crate::transport::Transport;
use colony_data::defines::population::MAX_TRANSPORT_SHARE;

impl Colony {
    /// Largest transport this settlement may launch right now.
    pub fn max_transport_size(&self) -> u32 {
        (self.state.population.max(0.0) * MAX_TRANSPORT_SHARE).floor() as u32
    }

    /// Settlements in rebellion or under quarantine cannot ship population.
    pub fn can_transport(&self) -> bool {
        !self.state.rebellion && !self.state.quarantined && self.max_transport_size() > 0
    }

    /// Queues `size` units for `destination`, replacing any earlier request.
    /// Ineligible requests are ignored. Returns the size actually scheduled.
    pub fn schedule_transport(
        &mut self,
        destination: PlanetId,
        size: u32,
        travel_turns: u32,
        owner: &dyn Empire,
    ) -> u32 {
        if !self.can_transport() || destination == self.state.planet {
            return 0;
        }
        let size = size.min(self.max_transport_size());
        let origin = self.state.planet;
        let transport = self.state.transport.get_or_insert_with(|| Transport {
            owner: owner.id(),
            origin,
            destination,
            size: 0,
            travel_turns,
            combat: owner.tech().transport_combat(),
        });
        transport.destination = destination;
        transport.size = size;
        transport.travel_turns = travel_turns;
        size
    }

    pub fn cancel_transport(&mut self) {
        self.state.transport = None;
    }

    /// Loads the scheduled transport, removing its passengers from the settlement.
    pub fn launch_transport(&mut self) -> Option<Transport> {
        launch_transport(self)
    }

    pub fn accept_transport(&mut self, transport: &Transport, sender: &dyn TechView, planet: &dyn Planet) -> f32 {
        accept_transport(self, transport, sender, planet)
    }

    /// Leaves the planet. Factories stay behind for the next settler.
    pub fn abandon(&mut self, planet: &mut dyn Planet, observer: &mut dyn ColonyObserver) {
        destroy_colony(self, planet, observer);
    }
}

pub fn launch_transport(colony: &mut Colony) -> Option<Transport> {
    if !colony.can_transport() {
        return None;
    }
    let mut transport = colony.state.transport.take()?;
    transport.size = transport.size.min(colony.max_transport_size());
    if transport.is_empty() {
        return None;
    }
    colony.state.population -= transport.size as f32;
    log::debug!(
        "Planet {}: launched {} population toward planet {}",
        colony.state.planet,
        transport.size,
        transport.destination
    );
    Some(transport)
}

/// Lands a friendly transport. Returns the population added, which is zero
/// when the sender cannot live on this planet.
pub fn accept_transport(
    colony: &mut Colony,
    transport: &Transport,
    sender: &dyn TechView,
    planet: &dyn Planet,
) -> f32 {
    if !planet.can_colonize(sender) {
        return 0.0;
    }
    let room = (planet.max_size() - colony.state.population).max(0.0);
    let landed = (transport.size as f32).min(room);
    colony.state.population += landed;
    landed
}

/// Returns the planet to an uncolonized state.
pub fn destroy_colony(colony: &mut Colony, planet: &mut dyn Planet, observer: &mut dyn ColonyObserver) {
    let owner = colony.state.owner;
    let factories = std::mem::take(&mut colony.categories.industry.factories);
    if factories > 0 {
        planet.add_alien_factories(owner, factories as i32);
    }
    colony.state.population = 0.0;
    colony.state.transport = None;
    planet.abandon();
    log::info!("Planet {}: settlement destroyed", colony.state.planet);
    notify(
        observer,
        ColonyEvent::ColonyDestroyed {
            planet: colony.state.planet,
            owner,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ColonyBuilder, Sandbox};

    #[test]
    fn test_transport_share_is_capped() {
        let sandbox = Sandbox::new();
        let mut colony = ColonyBuilder::new().population(11.0).build_in(&sandbox);

        let scheduled = colony.schedule_transport(20, 50, 3, &sandbox.empire);
        assert_eq!(scheduled, 5);

        let transport = colony.launch_transport().unwrap();
        assert_eq!(transport.size, 5);
        assert_eq!(transport.origin, colony.planet());
        assert_eq!(colony.population(), 6.0);
        assert!(colony.state.transport.is_none());
    }

    #[test]
    fn test_rebellion_blocks_transport() {
        let sandbox = Sandbox::new();
        let mut colony = ColonyBuilder::new().population(20.0).build_in(&sandbox);
        colony.state.rebellion = true;

        assert!(!colony.can_transport());
        assert_eq!(colony.schedule_transport(20, 5, 3, &sandbox.empire), 0);
        assert!(colony.launch_transport().is_none());
    }

    #[test]
    fn test_accept_respects_room_and_colonization() {
        let mut sandbox = Sandbox::new();
        sandbox.planet.current_size = 12.0;
        let mut colony = ColonyBuilder::new().population(10.0).build_in(&sandbox);
        let arriving = Transport {
            owner: 1,
            origin: 3,
            destination: colony.planet(),
            size: 5,
            travel_turns: 0,
            combat: Default::default(),
        };

        let landed = colony.accept_transport(&arriving, &sandbox.empire.tech, &sandbox.planet);
        assert_eq!(landed, 2.0);
        assert_eq!(colony.population(), 12.0);

        sandbox.planet.colonizable = false;
        assert_eq!(colony.accept_transport(&arriving, &sandbox.empire.tech, &sandbox.planet), 0.0);
    }

    #[test]
    fn test_abandon_leaves_factories() {
        let mut sandbox = Sandbox::new();
        let mut colony = ColonyBuilder::new().factories(12).build_in(&sandbox);

        colony.abandon(&mut sandbox.planet, &mut sandbox.events);

        assert!(colony.is_destroyed());
        assert!(sandbox.planet.abandoned);
        assert_eq!(sandbox.planet.alien_factories.get(&1), Some(&12));
        assert_eq!(
            sandbox.events,
            vec![ColonyEvent::ColonyDestroyed { planet: 10, owner: 1 }]
        );
    }
}

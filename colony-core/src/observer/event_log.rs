//! Settlement events and a JSONL event-log observer.
//!
//! # Current Events
//!
//! - `robot_controls_upgraded` - Industry raised its robotic-control tier
//! - `ships_built` / `stargate_built` - Shipyard output
//! - `missile_bases_upgraded` / `missile_bases_scrapped` - Defense changes
//! - `atmosphere_terraformed` / `soil_enriched` - Ecology milestones
//! - `research_project_completed` - Local research project finished
//! - `transport_destroyed` - An invading transport was wiped out
//! - `colony_captured` - Settlement changed hands
//! - `rebellion_quelled` - Loyal troops ended a rebellion
//! - `colony_destroyed` - Population reached zero; planet abandoned
//! - `empire_eliminated` - The losing empire owns no settlements

use super::{ColonyObserver, ObserverError};
use crate::external::{DesignId, EmpireId, PlanetId, TechId};
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Notable outcomes of settlement processing.
///
/// Uses serde's tag format for clean JSONL output:
/// ```json
/// {"type":"ships_built","planet":4,"design":2,"count":1}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColonyEvent {
    RobotControlsUpgraded {
        planet: PlanetId,
        robot_controls: u32,
    },

    ShipsBuilt {
        planet: PlanetId,
        design: DesignId,
        count: u32,
        /// Star the ships were sent to, if a rally point applied
        rally: Option<u32>,
    },

    StargateBuilt {
        planet: PlanetId,
    },

    MissileBasesUpgraded {
        planet: PlanetId,
        tech: TechId,
        bases: u32,
    },

    MissileBasesScrapped {
        planet: PlanetId,
        count: u32,
        refund: f32,
    },

    AtmosphereTerraformed {
        planet: PlanetId,
    },

    SoilEnriched {
        planet: PlanetId,
    },

    ResearchProjectCompleted {
        planet: PlanetId,
        project: String,
    },

    /// Every unit of an invading transport died before taking the planet.
    TransportDestroyed {
        planet: PlanetId,
        attacker: EmpireId,
        /// Units that arrived in orbit
        size: u32,
    },

    ColonyCaptured {
        planet: PlanetId,
        from: EmpireId,
        to: EmpireId,
        /// Technologies the invader learned from the captured factories
        plundered: Vec<TechId>,
    },

    RebellionQuelled {
        planet: PlanetId,
    },

    ColonyDestroyed {
        planet: PlanetId,
        owner: EmpireId,
    },

    EmpireEliminated {
        empire: EmpireId,
    },
}

/// Observer that writes each event as one JSON line.
///
/// # Example
///
/// ```ignore
/// let mut observer = EventLogObserver::file("events.jsonl")?;
/// ```
pub struct EventLogObserver<W: Write> {
    writer: W,
    written: u64,
}

impl EventLogObserver<BufWriter<std::fs::File>> {
    /// Create observer writing to a file.
    pub fn file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> EventLogObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of events written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<(), ObserverError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ColonyObserver for EventLogObserver<W> {
    fn on_event(&mut self, event: &ColonyEvent) -> Result<(), ObserverError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "event_log"
    }
}

use anyhow::{Context, Result};
use colony_core::{CategoryKind, ColonyConfig, ColonyObserver, EventLogObserver};
use clap::Parser;

mod scenario;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a single settlement through a number of turns", long_about = None)]
struct Args {
    /// Number of turns to run
    #[arg(short, long, default_value_t = 10)]
    turns: u32,

    /// RNG seed
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Session config (JSON); missing fields take their defaults
    #[arg(long)]
    config: Option<String>,

    /// Write events as JSON lines to this file
    #[arg(long)]
    events: Option<String>,

    /// Turn on which raiders land (1-based)
    #[arg(long)]
    invasion_turn: Option<u32>,

    /// Units in the raiding transport
    #[arg(long, default_value_t = 20)]
    invasion_size: u32,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    let config = match &args.config {
        Some(path) => ColonyConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => ColonyConfig::default(),
    };

    let mut event_log = match &args.events {
        Some(path) => Some(
            EventLogObserver::file(path).with_context(|| format!("failed to create {}", path))?,
        ),
        None => None,
    };

    log::info!("Starting colony-sim (seed {})", args.seed);
    let (mut sandbox, mut colony) = scenario::capital_scenario(args.seed, config)?;

    for turn in 1..=args.turns {
        if args.invasion_turn == Some(turn) {
            let (mut attacker, transport) = scenario::raiders(args.invasion_size, colony.planet());
            let outcome = colony.resolve_invasion(transport, &mut sandbox.invasion_env(&mut attacker));
            log::info!("Turn {} | invasion: {:?}", turn, outcome);
            if colony.is_destroyed() || colony.owner() != sandbox.empire.id {
                log::info!("Colony lost on turn {}", turn);
                flush_events(&mut sandbox.events, event_log.as_mut())?;
                break;
            }
        }

        colony.next_turn(&mut sandbox.env())?;
        colony.assess_turn(&mut sandbox.env());

        log::info!(
            "Turn {} | Pop: {:.1} | Factories: {} (rc {}) | Bases: {} | Shield: {} | Waste: {:.1} | Reserve: {:.1} | Alloc: {:?}",
            turn,
            colony.population(),
            colony.industry().factories,
            colony.industry().robot_controls,
            colony.defense().bases,
            colony.defense().shield,
            sandbox.planet.waste,
            sandbox.empire.reserve,
            colony.allocations(),
        );
        log::debug!(
            "Turn {} | ecology {} ticks, research BC total {:.1}",
            turn,
            colony.allocation(CategoryKind::Ecology),
            sandbox.empire.research_bc
        );

        flush_events(&mut sandbox.events, event_log.as_mut())?;
    }

    if let Some(observer) = event_log.as_mut() {
        observer.flush()?;
        log::info!("Wrote {} events", observer.written());
    }
    log::info!("Simulation finished");

    Ok(())
}

/// Moves recorded events into the event log, if one is open.
fn flush_events<W: std::io::Write>(
    events: &mut Vec<colony_core::ColonyEvent>,
    log: Option<&mut EventLogObserver<W>>,
) -> Result<()> {
    let drained: Vec<_> = std::mem::take(events);
    if let Some(observer) = log {
        for event in &drained {
            observer.on_event(event)?;
        }
    }
    Ok(())
}

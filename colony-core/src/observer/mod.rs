//! Notifications raised by settlement processing.
//!
//! Gameplay outcomes that the player should hear about (a transport wiped
//! out, a settlement captured) are not errors. They are emitted as
//! [`ColonyEvent`]s to a [`ColonyObserver`], which the host wires to its alert
//! panel, a log file, or a test recorder.
//!
//! # Example
//!
//! ```ignore
//! let mut events: Vec<ColonyEvent> = Vec::new();
//! let mut env = TurnEnv { observer: &mut events, .. };
//! colony.next_turn(&mut env)?;
//! ```

pub mod event_log;

use event_log::ColonyEvent;
use thiserror::Error;

/// Errors that can occur while delivering a notification.
#[derive(Error, Debug)]
pub enum ObserverError {
    /// I/O error (e.g., writing the event log)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error (JSON output)
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Receiver of settlement notifications.
///
/// Errors returned from `on_event` are logged but never interrupt a turn.
pub trait ColonyObserver {
    fn on_event(&mut self, event: &ColonyEvent) -> Result<(), ObserverError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "observer"
    }
}

/// Records every event in memory.
impl ColonyObserver for Vec<ColonyEvent> {
    fn on_event(&mut self, event: &ColonyEvent) -> Result<(), ObserverError> {
        self.push(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recorder"
    }
}

/// Delivers `event`, logging instead of failing if the observer errors.
pub(crate) fn notify(observer: &mut dyn ColonyObserver, event: ColonyEvent) {
    if let Err(e) = observer.on_event(&event) {
        log::warn!("Observer '{}' failed to record event: {}", observer.name(), e);
    }
}

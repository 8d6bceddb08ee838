//! Settlement processing systems.

pub mod invasion;
pub mod migration;
pub mod turn;

pub use invasion::{resolve_invasion, InvasionOutcome};
pub use migration::{accept_transport, launch_transport};
pub use turn::{run_colony_assessment, run_colony_turn};

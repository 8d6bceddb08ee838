//! Static game data for the settlement economy.
//!
//! Nothing here simulates anything: [`defines`] holds the tuning constants the
//! turn systems read, and [`missile_bases`] is the catalog of defensive missile
//! technologies a settlement can mount.

pub mod defines;
pub mod missile_bases;

pub use missile_bases::{MissileBaseSpec, MISSILE_BASES};

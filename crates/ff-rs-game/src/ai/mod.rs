//! Mob AI: state machine, stepping and straight-line movement.

pub mod mob;
pub mod pathfinding;
pub mod system;

pub use mob::{Mob, MobState};
pub use system::mob_step;

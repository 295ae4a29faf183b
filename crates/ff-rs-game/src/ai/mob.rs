//! Per-mob AI state.

use crate::content::MobStats;
use crate::player::SessionId;

/// Mob behaviour state.
///
/// `Combat` is the only state with a target, and a mob at zero health is
/// always `Dead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobState {
    Inactive,
    Roaming,
    Combat,
    Retreat,
    Dead,
}

/// Hostile NPC extension: stats, spawn anchor and AI timers (ms timestamps).
#[derive(Debug, Clone)]
pub struct Mob {
    pub state: MobState,
    pub stats: MobStats,
    pub spawn_x: i32,
    pub spawn_y: i32,
    pub spawn_z: i32,
    pub target: Option<SessionId>,
    /// Next attack (Combat) or next aggro scan (Roaming); 0 means "now".
    pub next_attack: u64,
    pub next_movement: u64,
    pub killed_time: u64,
    pub despawned: bool,
}

impl Mob {
    pub fn new(stats: MobStats, x: i32, y: i32, z: i32) -> Self {
        Self {
            state: MobState::Roaming,
            stats,
            spawn_x: x,
            spawn_y: y,
            spawn_z: z,
            target: None,
            next_attack: 0,
            next_movement: 0,
            killed_time: 0,
            despawned: false,
        }
    }

    pub fn max_hp(&self) -> i32 {
        self.stats.max_hp
    }

    /// Lock onto `target` and enter combat.
    pub fn engage(&mut self, target: SessionId, now: u64) {
        self.target = Some(target);
        self.state = MobState::Combat;
        self.next_movement = now;
        self.next_attack = 0;
    }

    /// Drop the target and head back to the spawn point.
    pub fn retreat(&mut self) {
        self.target = None;
        self.state = MobState::Retreat;
    }

    /// Attack and aggro delays in ms.
    pub fn delay_ms(&self) -> u64 {
        tenths_to_ms(self.stats.delay_time)
    }

    /// Pause between idle wander steps: ten attack delays.
    pub fn roam_delay_ms(&self) -> u64 {
        self.delay_ms() * 10
    }

    pub fn initial_delay_ms(&self) -> u64 {
        tenths_to_ms(self.stats.initial_time)
    }

    pub fn regen_delay_ms(&self) -> u64 {
        tenths_to_ms(self.stats.regen_time)
    }
}

fn tenths_to_ms(tenths: i32) -> u64 {
    u64::try_from(tenths).unwrap_or(0) * 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_mob_roams_without_target() {
        let mob = Mob::new(MobStats::default(), 1, 2, 3);
        assert_eq!(mob.state, MobState::Roaming);
        assert!(mob.target.is_none());
        assert_eq!((mob.spawn_x, mob.spawn_y, mob.spawn_z), (1, 2, 3));
    }

    #[test]
    fn engage_then_retreat_clears_target() {
        let mut mob = Mob::new(MobStats::default(), 0, 0, 0);
        mob.next_attack = 99;
        mob.engage(SessionId(4), 1_000);
        assert_eq!(mob.state, MobState::Combat);
        assert_eq!(mob.target, Some(SessionId(4)));
        assert_eq!(mob.next_attack, 0);
        assert_eq!(mob.next_movement, 1_000);
        mob.retreat();
        assert_eq!(mob.state, MobState::Retreat);
        assert!(mob.target.is_none());
    }

    #[test]
    fn delays_are_tenths_of_seconds() {
        let stats = MobStats {
            delay_time: 15,
            initial_time: 5,
            regen_time: -3,
            ..MobStats::default()
        };
        let mob = Mob::new(stats, 0, 0, 0);
        assert_eq!(mob.delay_ms(), 1_500);
        assert_eq!(mob.roam_delay_ms(), 15_000);
        assert_eq!(mob.initial_delay_ms(), 500);
        assert_eq!(mob.regen_delay_ms(), 0);
    }
}

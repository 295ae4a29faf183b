//! Periodic timers driving the simulation.
//!
//! Each timer fires at most once per poll. A timer that fell behind fires
//! once and is rescheduled one interval after `now`, so missed periods are
//! skipped instead of replayed.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Default intervals in ms.
pub const MOB_STEP_INTERVAL: u64 = 200;
pub const PLAYER_TICK_INTERVAL: u64 = 4000;
pub const BUFF_SWEEP_INTERVAL: u64 = 1000;

/// The periodic jobs of a shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Mob AI pass over every mob.
    MobStep,
    /// Player regeneration, hazard damage and nano stamina.
    PlayerTick,
    /// Timed-buff expiry and egg respawn.
    BuffSweep,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Scheduled {
    due: u64,
    seq: usize,
    kind: TimerKind,
}

/// Registry of periodic timers, polled by the owning loop.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    queue: BinaryHeap<Reverse<Scheduled>>,
    intervals: Vec<u64>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard shard timers with the given intervals (ms).
    pub fn with_intervals(mob_step: u64, player_tick: u64, buff_sweep: u64) -> Self {
        let mut timers = Self::new();
        timers.register(TimerKind::MobStep, mob_step);
        timers.register(TimerKind::PlayerTick, player_tick);
        timers.register(TimerKind::BuffSweep, buff_sweep);
        timers
    }

    /// Register a timer that first fires on the next poll.
    pub fn register(&mut self, kind: TimerKind, interval_ms: u64) {
        let seq = self.intervals.len();
        self.intervals.push(interval_ms.max(1));
        self.queue.push(Reverse(Scheduled { due: 0, seq, kind }));
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Timers due at `now`, in due order then registration order.
    pub fn poll(&mut self, now: u64) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        while let Some(Reverse(next)) = self.queue.peek() {
            if next.due > now {
                break;
            }
            let Some(Reverse(mut timer)) = self.queue.pop() else {
                break;
            };
            fired.push(timer.kind);
            timer.due = now + self.intervals[timer.seq];
            self.queue.push(Reverse(timer));
        }
        fired
    }

    /// Earliest upcoming deadline.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(t)| t.due)
    }
}

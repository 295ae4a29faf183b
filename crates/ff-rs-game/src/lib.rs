//! Shard simulation: spatial index, NPC registry, mob AI, combat and buffs.
//!
//! All mutable state lives in a single [`world::World`] owned by the caller
//! and mutated from one logical thread. Outbound packets are queued in the
//! world's [`interest::Outbox`] and drained by the network layer.

pub mod ai;
pub mod buff;
pub mod chunk;
pub mod combat;
pub mod content;
pub mod egg;
pub mod interest;
pub mod npc;
pub mod player;
pub mod registry;
pub mod scheduler;
pub mod warp;
pub mod world;

#[cfg(test)]
pub(crate) mod testutil;

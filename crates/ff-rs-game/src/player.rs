//! Connected players and their persisted records.

use std::fmt;

use ff_rs_proto::types::{ItemBase, Nano, PcAppearance};
use serde::{Deserialize, Serialize};

use crate::chunk::{ChunkPos, ViewSet};

/// Opaque handle for one client connection. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

pub const INVENTORY_SLOTS: usize = 50;
pub const NANO_SLOTS: usize = 3;
pub const MAX_NANO_STAMINA: i16 = 150;

/// Maximum health for a player level.
pub const fn pc_max_health(level: i32) -> i32 {
    925 + 75 * level
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NanoSlot {
    pub id: i16,
    pub skill_id: i16,
    pub stamina: i16,
}

impl From<NanoSlot> for Nano {
    fn from(slot: NanoSlot) -> Self {
        Nano {
            id: slot.id,
            skill_id: slot.skill_id,
            stamina: slot.stamina,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub item_type: i16,
    pub id: i16,
    pub opt: i32,
    #[serde(default)]
    pub time_limit: i32,
}

impl From<InventoryItem> for ItemBase {
    fn from(item: InventoryItem) -> Self {
        ItemBase {
            item_type: item.item_type,
            id: item.id,
            opt: item.opt,
            time_limit: item.time_limit,
        }
    }
}

/// Saved character state, keyed by the login serial key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: i32,
    pub serial_key: i64,
    pub name: String,
    pub account_level: i32,
    pub level: i32,
    pub hp: i32,
    pub money: i32,
    pub fusion_matter: i32,
    pub battery_w: i32,
    pub battery_n: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub angle: i32,
    #[serde(default)]
    pub instance: u64,
    #[serde(default)]
    pub nanos: [NanoSlot; NANO_SLOTS],
    #[serde(default)]
    pub inventory: Vec<Option<InventoryItem>>,
    #[serde(default)]
    pub saved_at: u64,
}

impl PlayerRecord {
    /// Fresh level-1 character at the default start point.
    pub fn new(id: i32, serial_key: i64) -> Self {
        Self {
            id,
            serial_key,
            name: format!("Player{id}"),
            account_level: 99,
            level: 1,
            hp: pc_max_health(1),
            money: 0,
            fusion_matter: 0,
            battery_w: 0,
            battery_n: 0,
            x: 632_032,
            y: 187_177,
            z: -5_500,
            angle: 0,
            instance: 0,
            nanos: [NanoSlot::default(); NANO_SLOTS],
            inventory: vec![None; INVENTORY_SLOTS],
            saved_at: 0,
        }
    }
}

/// A player currently connected to this shard.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: i32,
    pub serial_key: i64,
    pub name: String,
    pub account_level: i32,
    pub level: i32,
    pub hp: i32,
    pub money: i32,
    pub fusion_matter: i32,
    pub battery_w: i32,
    pub battery_n: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub angle: i32,
    pub instance: u64,
    /// Home chunk; `None` until first placed.
    pub chunk: Option<ChunkPos>,
    pub viewable: ViewSet,
    pub condition_flags: i32,
    /// Bits granted by group or self buffs that survive timed-buff expiry.
    pub self_condition_flags: i32,
    pub in_combat: bool,
    pub dot_damage: bool,
    pub nanos: [NanoSlot; NANO_SLOTS],
    /// Index into `nanos` of the active nano.
    pub active_nano: Option<usize>,
    pub inventory: Vec<Option<InventoryItem>>,
    pub last_heartbeat: u64,
}

impl Player {
    pub fn from_record(record: PlayerRecord) -> Self {
        let mut inventory = record.inventory;
        inventory.resize(INVENTORY_SLOTS, None);
        let hp = record.hp.clamp(0, pc_max_health(record.level));
        Self {
            id: record.id,
            serial_key: record.serial_key,
            name: record.name,
            account_level: record.account_level,
            level: record.level,
            hp,
            money: record.money,
            fusion_matter: record.fusion_matter,
            battery_w: record.battery_w,
            battery_n: record.battery_n,
            x: record.x,
            y: record.y,
            z: record.z,
            angle: record.angle,
            instance: record.instance,
            chunk: None,
            viewable: ViewSet::new(),
            condition_flags: 0,
            self_condition_flags: 0,
            in_combat: false,
            dot_damage: false,
            nanos: record.nanos,
            active_nano: None,
            inventory,
            last_heartbeat: 0,
        }
    }

    pub fn to_record(&self, saved_at: u64) -> PlayerRecord {
        PlayerRecord {
            id: self.id,
            serial_key: self.serial_key,
            name: self.name.clone(),
            account_level: self.account_level,
            level: self.level,
            hp: self.hp,
            money: self.money,
            fusion_matter: self.fusion_matter,
            battery_w: self.battery_w,
            battery_n: self.battery_n,
            x: self.x,
            y: self.y,
            z: self.z,
            angle: self.angle,
            instance: self.instance,
            nanos: self.nanos,
            inventory: self.inventory.clone(),
            saved_at,
        }
    }

    pub fn max_hp(&self) -> i32 {
        pc_max_health(self.level)
    }

    /// Apply a health delta, clamped to `[0, max]`. Returns the new health.
    pub fn adjust_hp(&mut self, delta: i32) -> i32 {
        self.hp = self.hp.saturating_add(delta).clamp(0, self.max_hp());
        self.hp
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    pub fn first_free_slot(&self) -> Option<usize> {
        self.inventory.iter().position(Option::is_none)
    }

    pub fn appearance(&self) -> PcAppearance {
        PcAppearance {
            pc_id: self.id,
            x: self.x,
            y: self.y,
            z: self.z,
            angle: self.angle,
            hp: self.hp,
            level: self.level,
            condition_bit_flag: self.condition_flags,
        }
    }

    pub fn nano_packets(&self) -> [Nano; NANO_SLOTS] {
        self.nanos.map(Nano::from)
    }

    /// The active nano's slot, or an empty one.
    pub fn active_nano_packet(&self) -> Nano {
        self.active_nano
            .and_then(|slot| self.nanos.get(slot))
            .map_or_else(Nano::default, |n| Nano::from(*n))
    }
}

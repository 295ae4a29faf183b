//! Static content tables: NPC templates, placements, eggs and drops.
//!
//! Loaded once at startup from a JSON document and shared read-only.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// Templates with this team are hostile mobs.
pub const TEAM_MOB: i32 = 2;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid content JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Combat and movement tuning for a mob type.
///
/// `delay_time`, `initial_time` and `regen_time` are in tenths of a second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MobStats {
    pub max_hp: i32,
    pub level: i32,
    pub sight_range: i32,
    pub attack_range: i32,
    pub combat_range: i32,
    pub idle_range: i32,
    pub run_speed: i32,
    pub walk_speed: i32,
    /// Health delta applied to the target per attack (negative).
    pub power: i32,
    pub delay_time: i32,
    pub initial_time: i32,
    pub regen_time: i32,
    pub drop_type: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NpcTemplate {
    pub type_id: i32,
    #[serde(default)]
    pub team: i32,
    #[serde(default)]
    pub barker_type: i32,
    #[serde(flatten)]
    pub stats: MobStats,
}

impl NpcTemplate {
    pub fn is_mob(&self) -> bool {
        self.team == TEAM_MOB
    }
}

/// Persistent NPC placement, summoned at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct NpcSpawn {
    pub type_id: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(default)]
    pub angle: i32,
    #[serde(default)]
    pub instance: u64,
}

/// Egg behaviour; `duration` and `regen` are in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct EggType {
    pub type_id: i32,
    #[serde(default)]
    pub drop_crate_id: i32,
    #[serde(default)]
    pub effect_id: i32,
    #[serde(default)]
    pub duration: i32,
    #[serde(default)]
    pub regen: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EggSpawn {
    pub type_id: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(default)]
    pub instance: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Damage,
    Heal,
    Buff,
}

/// What an egg does to the player who picks it up.
#[derive(Debug, Clone, Deserialize)]
pub struct EggEffect {
    pub skill_id: i32,
    pub kind: EffectKind,
    /// Condition bit set for the egg's duration (0 for none).
    #[serde(default)]
    pub bit_flag: i32,
    #[serde(default)]
    pub time_buff_id: i32,
    /// Per-mille of the player's maximum health (damage and heal only).
    #[serde(default)]
    pub intensity: i32,
    #[serde(default)]
    pub skill_type: i32,
}

/// Destination of a warp NPC.
///
/// A private warp puts each player into their own copy of the map.
#[derive(Debug, Clone, Deserialize)]
pub struct Warp {
    pub warp_id: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(default)]
    pub instance: u64,
    #[serde(default)]
    pub private: bool,
}

/// Kill reward for a mob drop type. `drop_chance` is a percentage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MobDrop {
    pub taros: i32,
    pub fusion_matter: i32,
    pub drop_chance: i32,
    pub crate_ids: Vec<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentFile {
    npcs: Vec<NpcTemplate>,
    spawns: Vec<NpcSpawn>,
    egg_types: Vec<EggType>,
    egg_spawns: Vec<EggSpawn>,
    egg_effects: Vec<EggEffect>,
    mob_drops: BTreeMap<i32, MobDrop>,
    warps: Vec<Warp>,
}

/// All content, indexed for lookup.
#[derive(Debug, Clone, Default)]
pub struct ContentTables {
    pub npcs: BTreeMap<i32, NpcTemplate>,
    pub spawns: Vec<NpcSpawn>,
    pub egg_types: BTreeMap<i32, EggType>,
    pub egg_spawns: Vec<EggSpawn>,
    pub egg_effects: BTreeMap<i32, EggEffect>,
    pub mob_drops: BTreeMap<i32, MobDrop>,
    pub warps: BTreeMap<i32, Warp>,
}

impl ContentTables {
    /// Read and index a content file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tables = Self::from_json(&text)?;
        info!(
            "Loaded content from {}: {} NPC types, {} spawns, {} egg types, {} egg spawns",
            path.display(),
            tables.npcs.len(),
            tables.spawns.len(),
            tables.egg_types.len(),
            tables.egg_spawns.len()
        );
        Ok(tables)
    }

    pub fn from_json(text: &str) -> Result<Self, ContentError> {
        let file: ContentFile = serde_json::from_str(text)?;
        let mut tables = Self {
            spawns: file.spawns,
            egg_spawns: file.egg_spawns,
            mob_drops: file.mob_drops,
            ..Self::default()
        };
        for npc in file.npcs {
            if let Some(old) = tables.npcs.insert(npc.type_id, npc) {
                warn!("Duplicate NPC template {}, keeping the later one", old.type_id);
            }
        }
        for egg in file.egg_types {
            tables.egg_types.insert(egg.type_id, egg);
        }
        for effect in file.egg_effects {
            tables.egg_effects.insert(effect.skill_id, effect);
        }
        for warp in file.warps {
            tables.warps.insert(warp.warp_id, warp);
        }
        Ok(tables)
    }

    pub fn npc(&self, type_id: i32) -> Option<&NpcTemplate> {
        self.npcs.get(&type_id)
    }

    pub fn egg_type(&self, type_id: i32) -> Option<&EggType> {
        self.egg_types.get(&type_id)
    }

    pub fn egg_effect(&self, skill_id: i32) -> Option<&EggEffect> {
        self.egg_effects.get(&skill_id)
    }

    pub fn warp(&self, warp_id: i32) -> Option<&Warp> {
        self.warps.get(&warp_id)
    }

    /// Time-buff id of the effect that sets `bit_flag`, or 0.
    pub fn time_buff_for_flag(&self, bit_flag: i32) -> i32 {
        self.egg_effects
            .values()
            .find(|e| e.bit_flag == bit_flag)
            .map_or(0, |e| e.time_buff_id)
    }

    /// Reward for a drop type; unknown types give nothing.
    pub fn mob_drop(&self, drop_type: i32) -> MobDrop {
        self.mob_drops.get(&drop_type).cloned().unwrap_or_default()
    }
}

//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::content::ContentTables;
use crate::player::{Player, PlayerRecord, SessionId};
use crate::world::{SimSettings, World};

pub const NPC_PLAIN: i32 = 1;
/// 400 hp melee mob: sight 1500, attack 300, leash 3000, idle 500.
pub const NPC_RAT: i32 = 2;
/// Like the rat but always drops crate [`HOARD_CRATE`].
pub const NPC_HOARDER: i32 = 3;
pub const HOARD_CRATE: i32 = 77;

pub const EGG_HEAL: i32 = 10;
pub const EGG_DAMAGE: i32 = 11;
pub const EGG_SPEED: i32 = 12;
pub const SPEED_CRATE: i32 = 55;

const CONTENT: &str = r#"{
    "npcs": [
        { "type_id": 1, "team": 1, "barker_type": 4 },
        { "type_id": 2, "team": 2, "max_hp": 400, "level": 1, "sight_range": 1500,
          "attack_range": 300, "combat_range": 3000, "idle_range": 500,
          "run_speed": 600, "walk_speed": 300, "power": -100,
          "delay_time": 20, "initial_time": 5, "regen_time": 100, "drop_type": 1 },
        { "type_id": 3, "team": 2, "max_hp": 400, "level": 1, "sight_range": 1500,
          "attack_range": 300, "combat_range": 3000, "idle_range": 500,
          "run_speed": 600, "walk_speed": 300, "power": -100,
          "delay_time": 20, "initial_time": 5, "regen_time": 100, "drop_type": 2 }
    ],
    "spawns": [
        { "type_id": 1, "x": 1000, "y": 1000, "z": 0, "angle": 90 },
        { "type_id": 2, "x": 2000, "y": 2000, "z": 0 }
    ],
    "egg_types": [
        { "type_id": 10, "effect_id": 100, "regen": 30 },
        { "type_id": 11, "effect_id": 101, "duration": 10, "regen": 30 },
        { "type_id": 12, "effect_id": 102, "duration": 20, "regen": 30, "drop_crate_id": 55 }
    ],
    "egg_spawns": [
        { "type_id": 10, "x": 3000, "y": 3000, "z": 0 }
    ],
    "egg_effects": [
        { "skill_id": 100, "kind": "heal", "intensity": 200, "skill_type": 2 },
        { "skill_id": 101, "kind": "damage", "intensity": 100, "bit_flag": 65536,
          "time_buff_id": 17, "skill_type": 1 },
        { "skill_id": 102, "kind": "buff", "bit_flag": 1, "time_buff_id": 1, "skill_type": 3 }
    ],
    "mob_drops": {
        "1": { "taros": 10, "fusion_matter": 20 },
        "2": { "taros": 5, "fusion_matter": 5, "drop_chance": 100, "crate_ids": [77] }
    }
}"#;

pub fn test_content() -> Arc<ContentTables> {
    Arc::new(ContentTables::from_json(CONTENT).expect("test content parses"))
}

pub fn test_world() -> World {
    World::with_seed(test_content(), SimSettings::default(), 7)
}

/// Add a level-1 player with id `pc_id` and place them in the overworld.
pub fn add_player(world: &mut World, pc_id: i32, x: i32, y: i32) -> SessionId {
    let session = SessionId(pc_id as u64);
    let player = Player::from_record(PlayerRecord::new(pc_id, i64::from(pc_id)));
    world.add_player(session, player);
    place_player(world, session, x, y);
    session
}

pub fn place_player(world: &mut World, session: SessionId, x: i32, y: i32) {
    world.update_player_position(session, x, y, 0, 0, 0);
}

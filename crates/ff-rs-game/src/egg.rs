//! Eggs: pickup effects, drop crates and respawn.

use ff_rs_proto::packets::{NpcSkillHit, RepRewardItem, RepShinyPickupSucc};
use ff_rs_proto::types::{time_buff, ItemReward, SkillResult};
use tracing::{debug, warn};

use crate::content::EffectKind;
use crate::npc::{NpcId, NPC_BASE_HP};
use crate::player::{InventoryItem, SessionId};
use crate::world::World;

/// Item type of mob/egg drop crates.
pub const ITEM_TYPE_CRATE: i16 = 9;

/// Inventory location code for the main bag.
const LOCATION_INVENTORY: i32 = 1;

/// Narrow a content id to a 16-bit wire field, or log why it cannot be.
fn wire_id(id: i32, what: &str) -> Option<i16> {
    match i16::try_from(id) {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("{what} {id} does not fit a 16-bit wire field");
            None
        }
    }
}

/// Egg extension state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Egg {
    pub dead: bool,
    /// ms timestamp at which a dead egg may respawn.
    pub dead_until: u64,
}

impl World {
    /// Apply an egg effect to a player and record any timed condition bit.
    ///
    /// Returns false when the player or effect is unknown, or the effect's
    /// skill id cannot be sent.
    pub fn egg_buff_player(
        &mut self,
        session: SessionId,
        effect_id: i32,
        egg_id: NpcId,
        duration_secs: i32,
        now: u64,
    ) -> bool {
        let Some(effect) = self.content.egg_effect(effect_id).cloned() else {
            warn!("Unknown egg effect {effect_id}");
            return false;
        };
        let Some(skill_id) = wire_id(effect.skill_id, "Egg skill") else {
            return false;
        };
        let Some(player) = self.players.get_mut(&session) else {
            return false;
        };

        let amount = player.max_hp() * effect.intensity / 1000;
        let result = match effect.kind {
            EffectKind::Damage => {
                let hp = player.adjust_hp(-amount);
                SkillResult::Damage {
                    id: player.id,
                    damage: amount,
                    hp,
                }
            }
            EffectKind::Heal => {
                let hp = player.adjust_hp(amount);
                SkillResult::Heal {
                    id: player.id,
                    heal: amount,
                    hp,
                }
            }
            EffectKind::Buff => SkillResult::Buff {
                id: player.id,
                condition_bit_flag: player.condition_flags | effect.bit_flag,
            },
        };

        if effect.bit_flag != 0 {
            let duration_ms = u64::try_from(duration_secs).unwrap_or(0) * 1000;
            self.apply_timed_buff(session, effect.bit_flag, now + duration_ms);
        }

        let packet = NpcSkillHit {
            npc_id: egg_id.0,
            skill_id,
            skill_type: effect.skill_type,
            result,
        };
        self.outbox.send(session, packet);
        self.send_to_viewable_player(session, packet);
        true
    }

    /// Handle a player touching an egg.
    pub fn egg_pickup(&mut self, session: SessionId, egg_id: NpcId, now: u64) {
        if !self.players.contains_key(&session) {
            return;
        }
        let Some(npc) = self.npcs.get(egg_id) else {
            warn!("{session} picked up unknown egg {egg_id}");
            return;
        };
        let Some(egg) = npc.egg() else {
            warn!("{session} picked up {egg_id}, which is not an egg");
            return;
        };
        if egg.dead {
            warn!("{session} picked up dead egg {egg_id}");
            return;
        }
        let (type_id, summoned) = (npc.type_id, npc.summoned);
        let Some(egg_type) = self.content.egg_type(type_id).cloned() else {
            warn!("Egg {egg_id} has unknown egg type {type_id}");
            return;
        };

        if egg_type.effect_id != 0
            && self.egg_buff_player(session, egg_type.effect_id, egg_id, egg_type.duration, now)
        {
            let skill_id = wire_id(egg_type.effect_id, "Egg effect").unwrap_or_default();
            let cstb = match self.content.egg_effect(egg_type.effect_id) {
                Some(effect) if effect.kind == EffectKind::Damage => time_buff::INFECTION,
                Some(effect) => effect.time_buff_id,
                None => time_buff::NONE,
            };
            self.outbox.send(
                session,
                RepShinyPickupSucc {
                    skill_id,
                    cstb,
                },
            );
        }

        if egg_type.drop_crate_id > 0 {
            self.give_crate(session, egg_type.drop_crate_id);
        }

        if summoned {
            self.destroy_npc(egg_id);
            return;
        }
        // Dead eggs stay registered in their chunks, only hidden from clients.
        if let Some(packet) = self.npcs.get(egg_id).map(|npc| npc.disappear_packet()) {
            self.send_to_viewable_npc(egg_id, packet);
        }
        if let Some(npc) = self.npcs.get_mut(egg_id) {
            npc.hp = 0;
            if let Some(egg) = npc.egg_mut() {
                egg.dead = true;
                egg.dead_until = now + u64::try_from(egg_type.regen).unwrap_or(0) * 1000;
            }
        }
    }

    /// Respawn dead eggs whose timer has run out, in populated regions only.
    pub fn egg_step(&mut self, now: u64) {
        for id in self.npcs.egg_ids() {
            let Some(npc) = self.npcs.get(id) else {
                continue;
            };
            let due = npc.egg().is_some_and(|egg| egg.dead && egg.dead_until <= now);
            if !due || !self.chunks.in_populated_chunks(&npc.viewable) {
                continue;
            }
            let Some(npc) = self.npcs.get_mut(id) else {
                continue;
            };
            npc.hp = NPC_BASE_HP;
            if let Some(egg) = npc.egg_mut() {
                egg.dead = false;
            }
            let packet = npc.appear_packet();
            debug!("Egg {id} respawned");
            self.send_to_viewable_npc(id, packet);
        }
    }

    /// Put a crate into the first free slot. Returns false if the bag is full.
    pub fn give_crate(&mut self, session: SessionId, crate_id: i32) -> bool {
        let Some(id) = wire_id(crate_id, "Crate") else {
            return false;
        };
        let Some(player) = self.players.get_mut(&session) else {
            return false;
        };
        let Some(slot) = player.first_free_slot() else {
            debug!("{session} has no room for crate {crate_id}");
            return false;
        };
        let item = InventoryItem {
            item_type: ITEM_TYPE_CRATE,
            id,
            opt: 1,
            time_limit: 0,
        };
        player.inventory[slot] = Some(item);
        let reward = RepRewardItem {
            money: player.money,
            fusion_matter: player.fusion_matter,
            battery_n: player.battery_n,
            battery_w: player.battery_w,
            fatigue: 100,
            fatigue_level: 1,
            items: vec![ItemReward {
                item: item.into(),
                slot_num: slot as i32,
                location: LOCATION_INVENTORY,
            }],
        };
        self.outbox.send(session, reward);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::content::ContentTables;
    use crate::testutil::{
        add_player, place_player, test_world, EGG_DAMAGE, EGG_HEAL, EGG_SPEED, SPEED_CRATE,
    };
    use crate::world::SimSettings;
    use ff_rs_proto::packets::ServerPacket;
    use ff_rs_proto::types::condition;

    fn egg(world: &World, id: NpcId) -> &Egg {
        world.npcs.get(id).unwrap().egg().unwrap()
    }

    #[test]
    fn heal_egg_heals_and_hides() {
        let mut world = test_world();
        let id = world.spawn_egg(500, 500, 0, 0, EGG_HEAL, false).unwrap();
        let s = add_player(&mut world, 1, 100, 100);
        let onlooker = add_player(&mut world, 2, 200, 200);
        world.player_mut(s).unwrap().hp = 500;
        world.outbox.drain();

        world.egg_pickup(s, id, 1_000);
        assert_eq!(world.player(s).unwrap().hp, 700);
        assert!(egg(&world, id).dead);
        assert_eq!(egg(&world, id).dead_until, 31_000);
        assert!(world.npcs.contains(id));

        let mine = world.outbox.packets_for(s);
        assert!(mine.iter().any(|p| matches!(
            p,
            ServerPacket::NpcSkillHit(NpcSkillHit {
                result: SkillResult::Heal { heal: 200, hp: 700, .. },
                ..
            })
        )));
        assert!(mine
            .iter()
            .any(|p| matches!(p, ServerPacket::ShinyPickupSucc(r) if r.skill_id == 100)));
        assert!(mine
            .iter()
            .any(|p| matches!(p, ServerPacket::ShinyExit(e) if e.shiny_id == id.0)));
        assert!(world
            .outbox
            .packets_for(onlooker)
            .iter()
            .any(|p| matches!(p, ServerPacket::NpcSkillHit(_))));
    }

    #[test]
    fn damage_egg_infects_for_its_duration() {
        let mut world = test_world();
        let id = world.spawn_egg(500, 500, 0, 0, EGG_DAMAGE, false).unwrap();
        let s = add_player(&mut world, 1, 100, 100);
        world.outbox.drain();

        world.egg_pickup(s, id, 1_000);
        let player = world.player(s).unwrap();
        assert_eq!(player.hp, 900);
        assert_ne!(player.condition_flags & condition::INFECTION, 0);
        assert_eq!(world.buffs.expiry(s, condition::INFECTION), Some(11_000));
        assert!(world.outbox.packets_for(s).iter().any(|p| matches!(
            p,
            ServerPacket::ShinyPickupSucc(r) if r.cstb == time_buff::INFECTION
        )));

        world.sweep_buffs(11_000);
        assert_eq!(world.player(s).unwrap().condition_flags & condition::INFECTION, 0);
    }

    #[test]
    fn buff_egg_grants_flag_and_crate() {
        let mut world = test_world();
        let id = world.spawn_egg(500, 500, 0, 0, EGG_SPEED, false).unwrap();
        let s = add_player(&mut world, 1, 100, 100);

        world.egg_pickup(s, id, 1_000);
        let player = world.player(s).unwrap();
        assert_ne!(player.condition_flags & condition::UP_MOVE_SPEED, 0);
        let item = player.inventory[0].unwrap();
        assert_eq!((item.item_type, item.id), (ITEM_TYPE_CRATE, SPEED_CRATE as i16));
        assert_eq!(world.buffs.expiry(s, condition::UP_MOVE_SPEED), Some(21_000));
    }

    #[test]
    fn dead_or_bogus_eggs_are_ignored() {
        let mut world = test_world();
        let id = world.spawn_egg(500, 500, 0, 0, EGG_HEAL, false).unwrap();
        let plain = world.spawn_npc(600, 600, 0, 0, crate::testutil::NPC_PLAIN, true).unwrap();
        let s = add_player(&mut world, 1, 100, 100);
        world.player_mut(s).unwrap().hp = 100;
        world.egg_pickup(s, id, 1_000);
        world.outbox.drain();

        world.egg_pickup(s, id, 2_000);
        world.egg_pickup(s, plain, 2_000);
        world.egg_pickup(s, NpcId(9_999), 2_000);
        assert_eq!(world.player(s).unwrap().hp, 300);
        assert!(world.outbox.is_empty());
    }

    #[test]
    fn summoned_egg_is_consumed() {
        let mut world = test_world();
        let id = world.spawn_egg(500, 500, 0, 0, EGG_HEAL, true).unwrap();
        let s = add_player(&mut world, 1, 100, 100);

        world.egg_pickup(s, id, 1_000);
        assert!(!world.npcs.contains(id));
        assert!(world.npcs.egg_ids().is_empty());
    }

    #[test]
    fn egg_respawns_after_regen_when_observed() {
        let mut world = test_world();
        let id = world.spawn_egg(500, 500, 0, 0, EGG_HEAL, false).unwrap();
        let s = add_player(&mut world, 1, 100, 100);
        world.egg_pickup(s, id, 1_000);

        world.egg_step(30_999);
        assert!(egg(&world, id).dead);

        // Nobody nearby: stays dead past its timer.
        place_player(&mut world, s, 10 * 6400, 100);
        world.egg_step(31_000);
        assert!(egg(&world, id).dead);

        place_player(&mut world, s, 100, 100);
        assert!(!world
            .outbox
            .packets_for(s)
            .iter()
            .any(|p| matches!(p, ServerPacket::ShinyEnter(_))));
        world.outbox.drain();
        world.egg_step(31_000);
        assert!(!egg(&world, id).dead);
        assert_eq!(world.npcs.get(id).unwrap().hp, NPC_BASE_HP);
        assert!(matches!(
            world.outbox.packets_for(s)[..],
            [ServerPacket::ShinyEnter(_)]
        ));
    }

    #[test]
    fn ids_too_wide_for_the_wire_are_refused() {
        let content = ContentTables::from_json(
            r#"{
                "egg_types": [ { "type_id": 20, "effect_id": 40000, "regen": 30 } ],
                "egg_effects": [
                    { "skill_id": 40000, "kind": "heal", "intensity": 200, "skill_type": 2 }
                ]
            }"#,
        )
        .unwrap();
        let mut world = World::with_seed(Arc::new(content), SimSettings::default(), 7);
        let s = add_player(&mut world, 1, 100, 100);
        world.player_mut(s).unwrap().hp = 500;
        let id = world.spawn_egg(500, 500, 0, 0, 20, false).unwrap();
        world.outbox.drain();

        assert!(!world.egg_buff_player(s, 40_000, id, 0, 1_000));
        assert!(!world.give_crate(s, 70_000));
        let player = world.player(s).unwrap();
        assert_eq!(player.hp, 500);
        assert_eq!(player.first_free_slot(), Some(0));
        assert!(world.outbox.is_empty());
    }
}

//! Combat resolution and player upkeep.

use ff_rs_proto::codec::{validate_out_var_packet, FixedSize};
use ff_rs_proto::packets::{
    CharTimeBuffTimeTick, NpcAttackPcs, PcAttackNpcs, PcRegen, RepPcAttackNpcsSucc,
    RepPcRegenSucc, RepPcTick, RepRewardItem,
};
use ff_rs_proto::types::{condition, time_buff, AttackResult, DotDamage};
use rand::Rng;
use tracing::{debug, warn};

use crate::ai::mob::MobState;
use crate::npc::{Npc, NpcId, NpcKind};
use crate::player::{SessionId, MAX_NANO_STAMINA, NANO_SLOTS};
use crate::world::{World, WorldEvent};

/// Damage of a player melee hit.
pub const PC_ATTACK_DAMAGE: i32 = 150;
/// Out-of-combat regeneration per player tick.
pub const PC_REGEN_AMOUNT: i32 = 200;
/// Damage per player tick while standing in a hazard.
pub const HAZARD_DAMAGE: i32 = 150;
/// Nano stamina drained (active) or regained (idle) per player tick.
pub const NANO_STAMINA_STEP: i16 = 3;

impl World {
    /// Resolve a player's melee attack against a list of mobs.
    ///
    /// The whole request is dropped, with no state change, if the response
    /// would not fit a packet or any id is not a mob.
    pub fn pc_attack_npcs(&mut self, session: SessionId, npc_ids: &[i32], now: u64) -> bool {
        let Some(player) = self.players.get(&session) else {
            return false;
        };
        let pc_id = player.id;
        if !validate_out_var_packet(PcAttackNpcs::BASE_SIZE, npc_ids.len(), AttackResult::SIZE) {
            warn!("{session} attacked {} targets, response too large", npc_ids.len());
            return false;
        }
        let targets: Vec<NpcId> = npc_ids.iter().map(|&id| NpcId(id)).collect();
        if let Some(bad) = targets
            .iter()
            .find(|id| self.npcs.get(**id).and_then(Npc::mob).is_none())
        {
            warn!("{session} attacked {bad}, which is not a mob");
            return false;
        }

        let mut results = Vec::with_capacity(targets.len());
        for id in targets {
            let damage = self.hit_mob(session, id, PC_ATTACK_DAMAGE, now);
            let hp = self.npcs.get(id).map_or(0, |npc| npc.hp);
            results.push(AttackResult {
                id: id.0,
                damage,
                hp,
                hit_flag: AttackResult::HIT_NORMAL,
            });
        }

        self.outbox.send(
            session,
            RepPcAttackNpcsSucc {
                results: results.clone(),
            },
        );
        self.send_to_viewable_player(session, PcAttackNpcs { pc_id, results });
        true
    }

    /// Apply `damage` to a mob. Returns the damage dealt, 0 if the mob
    /// cannot be hit in its current state.
    pub fn hit_mob(&mut self, attacker: SessionId, id: NpcId, damage: i32, now: u64) -> i32 {
        let Some(Npc {
            hp,
            condition_flags,
            kind: NpcKind::Mob(mob),
            ..
        }) = self.npcs.get_mut(id)
        else {
            return 0;
        };
        if !matches!(mob.state, MobState::Roaming | MobState::Combat) {
            return 0;
        }
        if mob.state == MobState::Roaming {
            mob.engage(attacker, now);
        }
        *hp = hp.saturating_sub(damage).max(0);
        *condition_flags &= !condition::MEZ;
        if *hp <= 0 {
            self.kill_mob(attacker, id, now);
        }
        damage
    }

    /// Put a mob into `Dead`, reward the killer and notify mission tracking.
    pub fn kill_mob(&mut self, killer: SessionId, id: NpcId, now: u64) {
        let Some(Npc {
            hp,
            condition_flags,
            type_id,
            kind: NpcKind::Mob(mob),
            ..
        }) = self.npcs.get_mut(id)
        else {
            return;
        };
        mob.state = MobState::Dead;
        mob.target = None;
        mob.killed_time = now;
        mob.despawned = false;
        *hp = 0;
        *condition_flags = 0;
        let (drop_type, npc_type) = (mob.stats.drop_type, *type_id);
        debug!("{id} killed by {killer}");

        self.give_reward(killer, drop_type);
        self.push_event(WorldEvent::MobKilled { killer, npc_type });
    }

    /// Grant the kill reward of `drop_type`, possibly with a crate.
    pub fn give_reward(&mut self, session: SessionId, drop_type: i32) {
        let drop = self.content.mob_drop(drop_type);
        let roll = self.rng.gen_range(0..100);
        let crate_id = (roll < drop.drop_chance && !drop.crate_ids.is_empty())
            .then(|| drop.crate_ids[self.rng.gen_range(0..drop.crate_ids.len())]);

        let Some(player) = self.players.get_mut(&session) else {
            return;
        };
        player.money = player.money.saturating_add(drop.taros);
        player.fusion_matter = player.fusion_matter.saturating_add(drop.fusion_matter);

        if let Some(crate_id) = crate_id {
            if self.give_crate(session, crate_id) {
                return;
            }
        }
        let Some(player) = self.players.get(&session) else {
            return;
        };
        let reward = RepRewardItem {
            money: player.money,
            fusion_matter: player.fusion_matter,
            battery_n: player.battery_n,
            battery_w: player.battery_w,
            fatigue: 100,
            fatigue_level: 1,
            items: Vec::new(),
        };
        self.outbox.send(session, reward);
    }

    /// A mob in range strikes its target.
    pub fn npc_attack_pc(&mut self, id: NpcId) {
        let Some((target, power, instance)) = self.npcs.get(id).and_then(|npc| {
            let mob = npc.mob()?;
            Some((mob.target?, mob.stats.power, npc.instance))
        }) else {
            return;
        };
        let Some(player) = self
            .players
            .get_mut(&target)
            .filter(|p| p.instance == instance)
        else {
            return;
        };
        let hp = player.adjust_hp(power);
        let packet = NpcAttackPcs {
            npc_id: id.0,
            results: vec![AttackResult {
                id: player.id,
                damage: -power,
                hp,
                hit_flag: AttackResult::HIT_NORMAL,
            }],
        };
        self.outbox.send(target, packet.clone());
        self.send_to_viewable_player(target, packet);

        if hp <= 0 {
            if let Some(mob) = self.npcs.get_mut(id).and_then(Npc::mob_mut) {
                mob.retreat();
            }
        }
    }

    /// Environmental damage; broadcast like any other health change.
    pub fn deal_goo_damage(&mut self, session: SessionId, amount: i32) {
        let Some(player) = self.players.get_mut(&session) else {
            return;
        };
        let hp = player.adjust_hp(-amount);
        let packet = CharTimeBuffTimeTick {
            ect: 1,
            id: player.id,
            tb_id: time_buff::INFECTION,
            dot: DotDamage {
                ect: 1,
                id: player.id,
                damage: amount,
                hp,
                stamina: player.active_nano_packet().stamina,
            },
        };
        self.outbox.send(session, packet);
        self.send_to_viewable_player(session, packet);
    }

    /// Periodic upkeep: regeneration, hazard damage and nano stamina.
    pub fn player_tick(&mut self, _now: u64) {
        let sessions: Vec<SessionId> = self.players.keys().copied().collect();
        for session in sessions {
            let Some(player) = self.players.get_mut(&session) else {
                continue;
            };
            if player.is_dead() {
                continue;
            }
            let mut changed = false;
            if !player.in_combat && player.hp < player.max_hp() {
                player.adjust_hp(PC_REGEN_AMOUNT);
                changed = true;
            }
            for slot in 0..NANO_SLOTS {
                let active = player.active_nano == Some(slot);
                let nano = &mut player.nanos[slot];
                if nano.id == 0 {
                    continue;
                }
                if active {
                    nano.stamina -= NANO_STAMINA_STEP;
                    if nano.stamina < 0 {
                        nano.stamina = 0;
                        player.active_nano = None;
                    }
                    changed = true;
                } else if nano.stamina < MAX_NANO_STAMINA {
                    nano.stamina = (nano.stamina + NANO_STAMINA_STEP).min(MAX_NANO_STAMINA);
                    changed = true;
                }
            }
            let dot = player.dot_damage;

            if dot {
                self.deal_goo_damage(session, HAZARD_DAMAGE);
            }
            if changed {
                self.send_player_status(session);
            }
        }
    }

    /// Own tick packet to the player, regen snapshot to onlookers.
    fn send_player_status(&mut self, session: SessionId) {
        let Some(player) = self.players.get(&session) else {
            return;
        };
        let tick = RepPcTick {
            hp: player.hp,
            battery_n: player.battery_n,
            nanos: player.nano_packets(),
        };
        let regen = PcRegen {
            pc_id: player.id,
            x: player.x,
            y: player.y,
            z: player.z,
            hp: player.hp,
            angle: player.angle,
            condition_bit_flag: player.condition_flags,
            nano: player.active_nano_packet(),
        };
        self.outbox.send(session, tick);
        self.send_to_viewable_player(session, regen);
    }

    /// Bring a dead player back at full health where they stand.
    pub fn revive_player(&mut self, session: SessionId) -> bool {
        let Some(player) = self.players.get_mut(&session) else {
            return false;
        };
        if !player.is_dead() {
            debug!("{session} asked to revive while alive");
            return false;
        }
        player.hp = player.max_hp();
        player.in_combat = false;
        player.dot_damage = false;
        let succ = RepPcRegenSucc {
            x: player.x,
            y: player.y,
            z: player.z,
            hp: player.hp,
            fusion_matter: player.fusion_matter,
            nanos: player.nano_packets(),
        };
        let regen = PcRegen {
            pc_id: player.id,
            x: player.x,
            y: player.y,
            z: player.z,
            hp: player.hp,
            angle: player.angle,
            condition_bit_flag: player.condition_flags,
            nano: player.active_nano_packet(),
        };
        self.outbox.send(session, succ);
        self.send_to_viewable_player(session, regen);
        true
    }

    pub fn set_in_combat(&mut self, session: SessionId, in_combat: bool) {
        if let Some(player) = self.players.get_mut(&session) {
            player.in_combat = in_combat;
        }
    }

    pub fn set_dot_damage(&mut self, session: SessionId, enabled: bool) {
        if let Some(player) = self.players.get_mut(&session) {
            player.dot_damage = enabled;
        }
    }
}

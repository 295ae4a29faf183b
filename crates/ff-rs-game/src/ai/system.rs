//! Mob AI tick: one pass over every mob, dispatched by state.

use ff_rs_proto::types::condition;
use rand::Rng;
use tracing::debug;

use super::mob::{Mob, MobState};
use super::pathfinding::{distance_xy, lerp};
use crate::npc::{Npc, NpcId};
use crate::world::World;

/// Time a corpse stays visible before clients are told it is gone.
pub const DESPAWN_DELAY_MS: u64 = 2_000;

/// Step every mob once.
///
/// Iterates a snapshot of mob ids; mobs destroyed during the pass are only
/// queued, and removed after it completes.
pub fn mob_step(world: &mut World, now: u64) {
    for id in world.npcs.mob_ids() {
        step_mob(world, id, now);
    }
    world.flush_removals();
}

fn step_mob(world: &mut World, id: NpcId, now: u64) {
    let Some(npc) = world.npcs.get(id) else {
        return;
    };
    let Some(mob) = npc.mob() else {
        return;
    };
    let state = mob.state;

    // Nobody around to see it
    if !world.chunks.in_populated_chunks(&npc.viewable) {
        return;
    }
    // Dead mobs keep stepping so they still respawn
    if !world.settings.simulate_mobs && state != MobState::Dead {
        return;
    }
    let disabled = npc.condition_flags & (condition::STUN | condition::MEZ) != 0;
    if disabled && matches!(state, MobState::Roaming | MobState::Combat) {
        return;
    }

    match state {
        MobState::Inactive => {}
        MobState::Roaming => roaming_step(world, id, now),
        MobState::Combat => combat_step(world, id, now),
        MobState::Retreat => retreat_step(world, id),
        MobState::Dead => dead_step(world, id, now),
    }
}

fn mob_mut(world: &mut World, id: NpcId) -> Option<&mut Mob> {
    world.npcs.get_mut(id).and_then(Npc::mob_mut)
}

/// Snared mobs move at half speed.
fn effective_speed(speed: i32, condition_flags: i32) -> i32 {
    if condition_flags & condition::DN_MOVE_SPEED != 0 {
        speed / 2
    } else {
        speed
    }
}

/// Move one interpolation step toward `(tx, ty)` and broadcast it.
fn step_towards(world: &mut World, id: NpcId, tx: i32, ty: i32, speed: i32) {
    let Some(npc) = world.npcs.get(id) else {
        return;
    };
    let (x, y) = lerp(npc.x, npc.y, tx, ty, speed);
    if (x, y) == (npc.x, npc.y) {
        return;
    }
    let (z, instance, angle) = (npc.z, npc.instance, npc.angle);
    world.update_npc_position(id, x, y, z, instance, angle);
    if let Some(packet) = world.npcs.get(id).map(|npc| npc.move_packet(speed)) {
        world.send_to_viewable_npc(id, packet);
    }
}

fn roaming_step(world: &mut World, id: NpcId, now: u64) {
    let Some(npc) = world.npcs.get(id) else {
        return;
    };
    let Some(mob) = npc.mob() else {
        return;
    };
    let (x, y, home, flags) = (npc.x, npc.y, npc.chunk, npc.condition_flags);
    let (stats, delay, roam_delay) = (mob.stats, mob.delay_ms(), mob.roam_delay_ms());
    let (spawn_x, spawn_y) = (mob.spawn_x, mob.spawn_y);
    let scan_due = mob.next_attack == 0 || now >= mob.next_attack;
    let move_due = now >= mob.next_movement;

    // Aggro: home chunk only, first live player in sight wins
    if scan_due {
        let target = home.and_then(|pos| {
            world.chunks.players_in(pos).find(|session| {
                world.players.get(session).is_some_and(|p| {
                    !p.is_dead() && distance_xy(x, y, p.x, p.y) <= stats.sight_range
                })
            })
        });
        let Some(mob) = mob_mut(world, id) else {
            return;
        };
        mob.next_attack = now + delay;
        if let Some(target) = target {
            mob.engage(target, now);
            debug!("{id} aggroed on {target}");
            return;
        }
    }

    if stats.idle_range <= 0 || !move_due {
        return;
    }
    let half = roam_delay / 2;
    let jitter = if half > 0 {
        world.rng.gen_range(0..half)
    } else {
        0
    };
    let spread = stats.idle_range / 2;
    let tx = spawn_x + world.rng.gen_range(-spread..=spread);
    let ty = spawn_y + world.rng.gen_range(-spread..=spread);
    if let Some(mob) = mob_mut(world, id) {
        mob.next_movement = now + half + jitter;
    }
    step_towards(world, id, tx, ty, effective_speed(stats.walk_speed, flags));
}

fn combat_step(world: &mut World, id: NpcId, now: u64) {
    let Some(npc) = world.npcs.get(id) else {
        return;
    };
    let Some(mob) = npc.mob() else {
        return;
    };
    let (x, y, flags, instance) = (npc.x, npc.y, npc.condition_flags, npc.instance);
    // Gone, dead or warped into another instance
    let target = mob.target.and_then(|session| {
        world
            .players
            .get(&session)
            .filter(|p| !p.is_dead() && p.instance == instance)
            .map(|p| (p.x, p.y))
    });
    let Some((px, py)) = target else {
        if let Some(mob) = mob_mut(world, id) {
            mob.retreat();
        }
        return;
    };
    let (stats, chase_delay) = (mob.stats, mob.delay_ms());
    let (spawn_x, spawn_y) = (mob.spawn_x, mob.spawn_y);
    let attack_delay = if mob.next_attack == 0 {
        Some(mob.initial_delay_ms())
    } else if now >= mob.next_attack {
        Some(mob.delay_ms())
    } else {
        None
    };
    let move_due = now >= mob.next_movement;

    if distance_xy(x, y, px, py) <= stats.attack_range {
        if let Some(delay) = attack_delay {
            if let Some(mob) = mob_mut(world, id) {
                mob.next_attack = now + delay;
            }
            world.npc_attack_pc(id);
        }
    } else if move_due {
        if let Some(mob) = mob_mut(world, id) {
            mob.next_movement = now + chase_delay;
        }
        step_towards(world, id, px, py, effective_speed(stats.run_speed, flags));
    }

    // Leash: the target has dragged us too far from spawn
    let Some(mob) = mob_mut(world, id) else {
        return;
    };
    if mob.state == MobState::Combat
        && distance_xy(px, py, spawn_x, spawn_y) >= stats.combat_range
    {
        mob.retreat();
        debug!("{id} leashed back to spawn");
    }
}

fn retreat_step(world: &mut World, id: NpcId) {
    let Some(npc) = world.npcs.get(id) else {
        return;
    };
    let Some(mob) = npc.mob() else {
        return;
    };
    let (spawn_x, spawn_y) = (mob.spawn_x, mob.spawn_y);
    let stats = mob.stats;

    if distance_xy(npc.x, npc.y, spawn_x, spawn_y) > stats.idle_range {
        step_towards(world, id, spawn_x, spawn_y, stats.run_speed);
        return;
    }

    let Some(npc) = world.npcs.get_mut(id) else {
        return;
    };
    npc.hp = stats.max_hp;
    npc.condition_flags = 0;
    if let Some(mob) = npc.mob_mut() {
        mob.state = MobState::Roaming;
        mob.killed_time = 0;
        mob.next_attack = 0;
    }
}

fn dead_step(world: &mut World, id: NpcId, now: u64) {
    let Some(npc) = world.npcs.get(id) else {
        return;
    };
    let Some(mob) = npc.mob() else {
        return;
    };
    let summoned = npc.summoned;
    let killed_time = mob.killed_time;
    let elapsed = now.saturating_sub(killed_time);
    let regen_delay = mob.regen_delay_ms();
    let mut despawned = mob.despawned;

    if killed_time != 0 && !despawned && elapsed > DESPAWN_DELAY_MS {
        let packet = npc.disappear_packet();
        if let Some(mob) = mob_mut(world, id) {
            mob.despawned = true;
        }
        despawned = true;
        world.send_to_viewable_npc(id, packet);
    }

    if summoned {
        if despawned {
            world.queue_removal(id);
        }
        return;
    }
    if killed_time != 0 && elapsed < regen_delay {
        return;
    }

    let Some(npc) = world.npcs.get_mut(id) else {
        return;
    };
    let Some(max_hp) = npc.mob().map(Mob::max_hp) else {
        return;
    };
    npc.hp = max_hp;
    npc.condition_flags = 0;
    if let Some(mob) = npc.mob_mut() {
        mob.state = MobState::Roaming;
        mob.target = None;
        mob.killed_time = 0;
        mob.despawned = false;
        mob.next_attack = 0;
        mob.next_movement = 0;
    }
    let packet = npc.appear_packet();
    debug!("{id} respawned");
    world.send_to_viewable_npc(id, packet);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::SessionId;
    use crate::testutil::{add_player, place_player, test_world, NPC_RAT};
    use crate::world::WorldEvent;
    use ff_rs_proto::packets::ServerPacket;

    fn state(world: &World, id: NpcId) -> MobState {
        world.npcs.get(id).unwrap().mob().unwrap().state
    }

    #[test]
    fn aggro_within_one_scan() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        let s = add_player(&mut world, 1, 1500, 500);

        mob_step(&mut world, 1_000);
        assert_eq!(state(&world, id), MobState::Combat);
        assert_eq!(world.npcs.get(id).unwrap().mob().unwrap().target, Some(s));
    }

    #[test]
    fn no_aggro_out_of_sight() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        add_player(&mut world, 1, 4000, 500);

        for step in 0..20 {
            mob_step(&mut world, 1_000 + step * 200);
        }
        assert_eq!(state(&world, id), MobState::Roaming);
        let npc = world.npcs.get(id).unwrap();
        assert!((250..=750).contains(&npc.x), "idle roam stays near spawn");
    }

    #[test]
    fn dead_players_are_ignored() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        let s = add_player(&mut world, 1, 600, 500);
        world.player_mut(s).unwrap().hp = 0;

        mob_step(&mut world, 1_000);
        assert_eq!(state(&world, id), MobState::Roaming);
    }

    #[test]
    fn unpopulated_mobs_do_not_step() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        add_player(&mut world, 1, 5 * 6400, 500);

        for step in 0..10 {
            mob_step(&mut world, 1_000 + step * 1_000);
        }
        let npc = world.npcs.get(id).unwrap();
        assert_eq!((npc.x, npc.y), (500, 500));
    }

    #[test]
    fn stunned_mob_skips_aggro() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        world.npcs.get_mut(id).unwrap().condition_flags = condition::STUN;
        add_player(&mut world, 1, 600, 500);

        mob_step(&mut world, 1_000);
        assert_eq!(state(&world, id), MobState::Roaming);
    }

    #[test]
    fn simulation_switch_freezes_live_mobs_only() {
        let mut world = test_world();
        world.settings.simulate_mobs = false;
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        let s = add_player(&mut world, 1, 600, 500);

        mob_step(&mut world, 1_000);
        assert_eq!(state(&world, id), MobState::Roaming);

        for _ in 0..3 {
            world.hit_mob(s, id, 150, 2_000);
        }
        assert_eq!(state(&world, id), MobState::Dead);
        mob_step(&mut world, 2_000 + 10_000);
        assert_eq!(state(&world, id), MobState::Roaming);
    }

    #[test]
    fn attacks_on_initial_then_regular_delay() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        let s = add_player(&mut world, 1, 600, 500);

        mob_step(&mut world, 1_000);
        assert_eq!(state(&world, id), MobState::Combat);
        world.outbox.drain();

        mob_step(&mut world, 1_200);
        assert_eq!(world.player(s).unwrap().hp, 900);
        assert!(world
            .outbox
            .packets_for(s)
            .iter()
            .any(|p| matches!(p, ServerPacket::NpcAttackPcs(a) if a.npc_id == id.0)));

        // Initial delay is 500 ms, then 2000 ms between attacks.
        mob_step(&mut world, 1_600);
        assert_eq!(world.player(s).unwrap().hp, 900);
        mob_step(&mut world, 1_700);
        assert_eq!(world.player(s).unwrap().hp, 800);
        mob_step(&mut world, 3_000);
        assert_eq!(world.player(s).unwrap().hp, 800);
        mob_step(&mut world, 3_700);
        assert_eq!(world.player(s).unwrap().hp, 700);
    }

    #[test]
    fn killing_the_target_sends_mob_home() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        let s = add_player(&mut world, 1, 600, 500);
        mob_step(&mut world, 1_000);
        world.player_mut(s).unwrap().hp = 50;

        mob_step(&mut world, 1_200);
        assert_eq!(world.player(s).unwrap().hp, 0);
        assert_eq!(state(&world, id), MobState::Retreat);
        assert!(world.npcs.get(id).unwrap().mob().unwrap().target.is_none());
    }

    #[test]
    fn target_leaving_the_instance_ends_combat() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, false).unwrap();
        let s = add_player(&mut world, 1, 600, 500);
        // Out of sight, but keeps the mob's region populated.
        add_player(&mut world, 2, 4000, 500);
        mob_step(&mut world, 1_000);
        assert_eq!(world.npcs.get(id).unwrap().mob().unwrap().target, Some(s));

        world.update_player_position(s, 600, 500, 0, 1 << 32, 0);
        world.outbox.drain();
        mob_step(&mut world, 1_200);
        assert_eq!(state(&world, id), MobState::Retreat);
        assert!(world.npcs.get(id).unwrap().mob().unwrap().target.is_none());

        for step in 0..20 {
            mob_step(&mut world, 1_400 + step * 200);
        }
        assert_eq!(world.player(s).unwrap().hp, 1000);
        assert!(!world
            .outbox
            .packets_for(s)
            .iter()
            .any(|p| matches!(p, ServerPacket::NpcAttackPcs(_))));
    }

    #[test]
    fn aggro_picks_the_lowest_session_in_sight() {
        for _ in 0..8 {
            let mut world = test_world();
            let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
            for pc_id in [6, 3, 5, 2, 4] {
                add_player(&mut world, pc_id, 600 + pc_id * 10, 500);
            }
            mob_step(&mut world, 1_000);
            let target = world.npcs.get(id).unwrap().mob().unwrap().target;
            assert_eq!(target, Some(SessionId(2)));
        }
    }

    #[test]
    fn melee_kill_and_respawn() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        let s = add_player(&mut world, 1, 4000, 500);
        world.outbox.drain();

        assert_eq!(world.hit_mob(s, id, 150, 1_000), 150);
        assert_eq!(state(&world, id), MobState::Combat);
        world.hit_mob(s, id, 150, 1_000);
        assert_eq!(state(&world, id), MobState::Combat);
        assert_eq!(world.npcs.get(id).unwrap().hp, 100);
        world.hit_mob(s, id, 150, 1_000);
        assert_eq!(state(&world, id), MobState::Dead);
        assert_eq!(world.hit_mob(s, id, 150, 1_000), 0, "corpses take no damage");
        assert_eq!(
            world.drain_events(),
            vec![WorldEvent::MobKilled {
                killer: s,
                npc_type: NPC_RAT
            }]
        );
        let player = world.player(s).unwrap();
        assert_eq!((player.money, player.fusion_matter), (10, 20));

        // Corpse disappears after the despawn delay but stays allocated.
        mob_step(&mut world, 3_001);
        assert!(world.npcs.get(id).unwrap().mob().unwrap().despawned);
        assert!(world
            .outbox
            .packets_for(s)
            .iter()
            .any(|p| matches!(p, ServerPacket::NpcExit(e) if e.npc_id == id.0)));

        mob_step(&mut world, 10_999);
        assert_eq!(state(&world, id), MobState::Dead);
        mob_step(&mut world, 11_000);
        assert_eq!(state(&world, id), MobState::Roaming);
        assert_eq!(world.npcs.get(id).unwrap().hp, 400);
        assert!(world
            .outbox
            .packets_for(s)
            .iter()
            .any(|p| matches!(p, ServerPacket::NpcNew(n) if n.appearance.npc_id == id.0)));
    }

    #[test]
    fn summoned_mob_is_deallocated_after_despawn() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, false).unwrap();
        let s = add_player(&mut world, 1, 4000, 500);
        for _ in 0..3 {
            world.hit_mob(s, id, 150, 1_000);
        }
        world.outbox.drain();

        mob_step(&mut world, 2_000);
        assert!(world.npcs.contains(id));
        mob_step(&mut world, 3_001);
        assert!(!world.npcs.contains(id));
        assert!(world.npcs.mob_ids().is_empty());
        let exits = world
            .outbox
            .packets_for(s)
            .iter()
            .filter(|p| matches!(p, ServerPacket::NpcExit(_)))
            .count();
        assert_eq!(exits, 1);
    }

    #[test]
    fn leash_and_retreat() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        let s = add_player(&mut world, 1, 1000, 500);
        mob_step(&mut world, 1_000);
        assert_eq!(state(&world, id), MobState::Combat);
        world.npcs.get_mut(id).unwrap().condition_flags = condition::DN_MOVE_SPEED;

        place_player(&mut world, s, 4000, 500);
        mob_step(&mut world, 1_200);
        assert_eq!(state(&world, id), MobState::Retreat);
        assert!(world.npcs.get(id).unwrap().mob().unwrap().target.is_none());

        let mut now = 1_400;
        while state(&world, id) == MobState::Retreat && now < 10_000 {
            mob_step(&mut world, now);
            now += 200;
        }
        let npc = world.npcs.get(id).unwrap();
        assert_eq!(npc.mob().unwrap().state, MobState::Roaming);
        assert!(distance_xy(npc.x, npc.y, 500, 500) <= 500);
        assert_eq!(npc.condition_flags, 0);
        assert_eq!(npc.hp, 400);
    }

    #[test]
    fn damaged_mob_eventually_recovers() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        // Observer keeps the region populated without drawing aggro.
        add_player(&mut world, 1, 5000, 5000);
        {
            let npc = world.npcs.get_mut(id).unwrap();
            npc.hp = 10;
            let mob = npc.mob_mut().unwrap();
            mob.state = MobState::Retreat;
        }
        world.update_npc_position(id, 3000, 3000, 0, 0, 0);

        let mut now = 1_000;
        while state(&world, id) != MobState::Roaming && now < 60_000 {
            mob_step(&mut world, now);
            now += 200;
        }
        assert_eq!(state(&world, id), MobState::Roaming);
        assert_eq!(world.npcs.get(id).unwrap().hp, 400);
    }

    #[test]
    fn chase_and_roam_follow_the_mob_delay() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        let s = add_player(&mut world, 1, 1500, 500);
        mob_step(&mut world, 1_000);
        assert_eq!(state(&world, id), MobState::Combat);

        // One chase step per delay_time (2 s).
        mob_step(&mut world, 1_000);
        let first = world.npcs.get(id).unwrap().x;
        assert!(first > 500);
        mob_step(&mut world, 2_999);
        assert_eq!(world.npcs.get(id).unwrap().x, first);
        mob_step(&mut world, 3_000);
        assert!(world.npcs.get(id).unwrap().x > first);

        // Idle wandering waits between half and all of ten delays.
        world.remove_player(s);
        add_player(&mut world, 2, 5000, 5000);
        let mob = world.npcs.get_mut(id).unwrap().mob_mut().unwrap();
        mob.state = MobState::Roaming;
        mob.target = None;
        mob.next_movement = 0;
        mob_step(&mut world, 10_000);
        let next = world.npcs.get(id).unwrap().mob().unwrap().next_movement;
        assert!((20_000..30_000).contains(&next), "next roam at {next}");
    }

    #[test]
    fn snare_halves_speed() {
        assert_eq!(effective_speed(600, 0), 600);
        assert_eq!(effective_speed(600, condition::DN_MOVE_SPEED), 300);
    }
}

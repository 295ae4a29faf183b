//! The shard world: all simulation state, owned in one place.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::buff::BuffTable;
use crate::chunk::{ChunkIndex, ChunkPos, INSTANCE_OVERWORLD};
use crate::content::ContentTables;
use crate::interest::Outbox;
use crate::npc::{NpcClass, NpcId};
use crate::player::{Player, SessionId};
use crate::registry::EntityRegistry;
use crate::scheduler::TimerKind;

/// Runtime switches.
#[derive(Debug, Clone)]
pub struct SimSettings {
    /// When off, only dead mobs keep stepping (so they still respawn).
    pub simulate_mobs: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            simulate_mobs: true,
        }
    }
}

/// Notifications for collaborators outside the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    MobKilled { killer: SessionId, npc_type: i32 },
}

/// Map number of an instance (its lower 32 bits).
pub fn map_num(instance: u64) -> u64 {
    instance & 0xFFFF_FFFF
}

pub struct World {
    pub chunks: ChunkIndex,
    pub npcs: EntityRegistry,
    pub players: BTreeMap<SessionId, Player>,
    pub buffs: BuffTable,
    pub outbox: Outbox,
    pub content: Arc<ContentTables>,
    pub settings: SimSettings,
    pub(crate) rng: StdRng,
    events: Vec<WorldEvent>,
    pending_removals: Vec<NpcId>,
}

impl World {
    pub fn new(content: Arc<ContentTables>, settings: SimSettings) -> Self {
        Self::with_rng(content, settings, StdRng::from_entropy())
    }

    /// World with deterministic randomness.
    pub fn with_seed(content: Arc<ContentTables>, settings: SimSettings, seed: u64) -> Self {
        Self::with_rng(content, settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(content: Arc<ContentTables>, settings: SimSettings, rng: StdRng) -> Self {
        Self {
            chunks: ChunkIndex::new(),
            npcs: EntityRegistry::new(),
            players: BTreeMap::new(),
            buffs: BuffTable::default(),
            outbox: Outbox::default(),
            content,
            settings,
            rng,
            events: Vec::new(),
            pending_removals: Vec::new(),
        }
    }

    /// Summon and place every NPC and egg listed in the content tables.
    /// Returns `(npcs, eggs)` placed.
    pub fn populate(&mut self) -> (usize, usize) {
        let content = Arc::clone(&self.content);
        let mut npcs = 0;
        for spawn in &content.spawns {
            let Some(id) =
                self.spawn_npc(spawn.x, spawn.y, spawn.z, spawn.instance, spawn.type_id, true)
            else {
                continue;
            };
            if let Some(npc) = self.npcs.get_mut(id) {
                npc.angle = spawn.angle;
            }
            npcs += 1;
        }
        let mut eggs = 0;
        for egg in &content.egg_spawns {
            if self
                .spawn_egg(egg.x, egg.y, egg.z, egg.instance, egg.type_id, false)
                .is_some()
            {
                eggs += 1;
            }
        }
        info!("Populated world with {npcs} NPCs ({} mobs) and {eggs} eggs", self.npcs.mob_count());
        (npcs, eggs)
    }

    pub fn player(&self, session: SessionId) -> Option<&Player> {
        self.players.get(&session)
    }

    pub fn player_mut(&mut self, session: SessionId) -> Option<&mut Player> {
        self.players.get_mut(&session)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Session currently controlling player `pc_id`.
    pub fn session_of(&self, pc_id: i32) -> Option<SessionId> {
        self.players
            .iter()
            .find(|(_, p)| p.id == pc_id)
            .map(|(s, _)| *s)
    }

    /// Register a player; it stays invisible until first positioned.
    pub fn add_player(&mut self, session: SessionId, player: Player) {
        self.players.insert(session, player);
    }

    /// Take a player out of the world entirely.
    ///
    /// Viewers first, then home chunk, then timed buffs, then the instance.
    pub fn remove_player(&mut self, session: SessionId) -> Option<Player> {
        let (chunk, instance) = {
            let player = self.players.get(&session)?;
            (player.chunk, player.instance)
        };
        self.update_player_chunk(session, chunk, None);
        self.buffs.remove_session(session);
        let player = self.players.remove(&session);
        self.destroy_instance_if_empty(instance);
        player
    }

    /// Set a player's position; transfers chunks when the home chunk changes.
    pub fn update_player_position(
        &mut self,
        session: SessionId,
        x: i32,
        y: i32,
        z: i32,
        instance: u64,
        angle: i32,
    ) {
        if instance != INSTANCE_OVERWORLD && !self.chunks.instance_exists(instance) {
            self.create_instance(instance);
        }
        let Some(player) = self.players.get_mut(&session) else {
            return;
        };
        let old_instance = player.instance;
        player.x = x;
        player.y = y;
        player.z = z;
        player.angle = angle;
        player.instance = instance;
        let from = player.chunk;
        let to = Some(ChunkPos::at(x, y, instance));
        if from != to {
            self.update_player_chunk(session, from, to);
        }
        if old_instance != instance {
            self.destroy_instance_if_empty(old_instance);
        }
    }

    /// Copy the base map's persistent NPCs and eggs into a fresh instance.
    ///
    /// No-op when the instance already has chunks.
    pub fn create_instance(&mut self, instance: u64) {
        if instance == INSTANCE_OVERWORLD || self.chunks.instance_exists(instance) {
            return;
        }
        let base = map_num(instance);
        let templates: Vec<_> = self
            .npcs
            .iter()
            .filter(|n| n.instance == base && !n.summoned)
            .map(|n| (n.class(), n.type_id, n.x, n.y, n.z, n.angle))
            .collect();
        let mut copied = 0;
        for (class, type_id, x, y, z, angle) in templates {
            let id = match class {
                NpcClass::Egg => self.spawn_egg(x, y, z, instance, type_id, false),
                _ => self.spawn_npc(x, y, z, instance, type_id, true),
            };
            if let Some(id) = id {
                if let Some(npc) = self.npcs.get_mut(id) {
                    npc.angle = angle;
                }
                copied += 1;
            }
        }
        info!("Created instance {instance:#x} with {copied} NPCs from map {base}");
    }

    /// Tear down a non-overworld instance once no player is homed in it.
    pub fn destroy_instance_if_empty(&mut self, instance: u64) {
        if instance == INSTANCE_OVERWORLD || self.chunks.instance_populated(instance) {
            return;
        }
        let doomed: Vec<NpcId> = self
            .npcs
            .iter()
            .filter(|n| n.instance == instance)
            .map(|n| n.id)
            .collect();
        if doomed.is_empty() && !self.chunks.instance_exists(instance) {
            return;
        }
        for id in &doomed {
            self.destroy_npc(*id);
        }
        self.chunks.remove_instance(instance);
        info!("Destroyed empty instance {instance:#x} ({} NPCs)", doomed.len());
    }

    pub fn push_event(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Defer destruction until the current iteration pass is over.
    pub(crate) fn queue_removal(&mut self, id: NpcId) {
        self.pending_removals.push(id);
    }

    pub fn flush_removals(&mut self) {
        for id in std::mem::take(&mut self.pending_removals) {
            self.destroy_npc(id);
        }
    }

    /// Run one periodic job.
    pub fn run_timer(&mut self, kind: TimerKind, now: u64) {
        debug!("Timer {kind:?} at {now}");
        match kind {
            TimerKind::MobStep => crate::ai::mob_step(self, now),
            TimerKind::PlayerTick => self.player_tick(now),
            TimerKind::BuffSweep => {
                self.sweep_buffs(now);
                self.egg_step(now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{add_player, place_player, test_world, EGG_HEAL, NPC_PLAIN, NPC_RAT};
    use ff_rs_proto::packets::{PcExit as PcExitPkt, ServerPacket};

    #[test]
    fn placing_a_player_registers_exact_view() {
        let mut world = test_world();
        let s = add_player(&mut world, 1, 100, 100);
        let home = ChunkPos::at(100, 100, 0);
        assert_eq!(world.player(s).unwrap().chunk, Some(home));
        assert_eq!(world.chunks.viewed_by_player(s), home.viewable());
        assert!(world.chunks.players_in(home).any(|p| p == s));
    }

    #[test]
    fn chunk_transfer_is_exact() {
        let mut world = test_world();
        let s = add_player(&mut world, 1, 100, 100);
        let transfer = world.update_player_chunk(
            s,
            Some(ChunkPos::new(0, 0, 0)),
            Some(ChunkPos::new(1, 1, 0)),
        );
        assert_eq!(transfer.entered.len(), 5);
        assert_eq!(transfer.exited.len(), 5);
        assert_eq!(
            world.chunks.viewed_by_player(s),
            ChunkPos::new(1, 1, 0).viewable()
        );
        assert!(!world.chunks.players_in(ChunkPos::new(0, 0, 0)).any(|p| p == s));
    }

    #[test]
    fn players_see_each_other_on_entry_and_exit() {
        let mut world = test_world();
        let a = add_player(&mut world, 1, 100, 100);
        let b = add_player(&mut world, 2, 200, 200);
        assert!(world
            .outbox
            .packets_for(a)
            .iter()
            .any(|p| matches!(p, ServerPacket::PcNew(n) if n.appearance.pc_id == 2)));
        assert!(world
            .outbox
            .packets_for(b)
            .iter()
            .any(|p| matches!(p, ServerPacket::PcNew(n) if n.appearance.pc_id == 1)));
        world.outbox.drain();

        // Two chunks away: out of each other's view.
        place_player(&mut world, b, 2 * 6400 + 100, 100);
        assert!(matches!(
            world.outbox.packets_for(a)[..],
            [ServerPacket::PcExit(PcExitPkt { pc_id: 2 })]
        ));
        assert!(matches!(
            world.outbox.packets_for(b)[..],
            [ServerPacket::PcExit(PcExitPkt { pc_id: 1 })]
        ));
    }

    #[test]
    fn entering_view_shows_npcs() {
        let mut world = test_world();
        let npc = world.spawn_npc(3 * 6400, 0, 0, 0, NPC_PLAIN, true).unwrap();
        let s = add_player(&mut world, 1, 100, 100);
        assert!(world.outbox.packets_for(s).is_empty());
        place_player(&mut world, s, 2 * 6400 + 10, 10);
        assert!(world
            .outbox
            .packets_for(s)
            .iter()
            .any(|p| matches!(p, ServerPacket::NpcNew(n) if n.appearance.npc_id == npc.0)));
    }

    #[test]
    fn removing_player_cleans_up() {
        let mut world = test_world();
        let s = add_player(&mut world, 1, 100, 100);
        let other = add_player(&mut world, 2, 150, 150);
        world.apply_timed_buff(s, 0x80, 10_000);
        world.outbox.drain();

        let player = world.remove_player(s).unwrap();
        assert_eq!(player.id, 1);
        assert!(world.player(s).is_none());
        assert!(world.chunks.viewed_by_player(s).is_empty());
        assert!(world.buffs.is_empty());
        assert!(matches!(
            world.outbox.packets_for(other)[..],
            [ServerPacket::PcExit(_)]
        ));
        assert!(world.remove_player(s).is_none());
    }

    #[test]
    fn instance_created_on_entry_and_destroyed_when_empty() {
        let mut world = test_world();
        world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        world.spawn_egg(600, 600, 0, 0, EGG_HEAL, false).unwrap();
        world.spawn_npc(700, 700, 0, 0, NPC_RAT, false).unwrap();
        let s = add_player(&mut world, 1, 100, 100);
        let instance = 1u64 << 32;

        world.update_player_position(s, 100, 100, 0, instance, 0);
        let copies: Vec<_> = world.npcs.iter().filter(|n| n.instance == instance).collect();
        assert_eq!(copies.len(), 2, "summoned NPCs are not copied");
        assert!(world.chunks.instance_populated(instance));

        world.update_player_position(s, 100, 100, 0, 0, 0);
        assert!(!world.chunks.instance_exists(instance));
        assert!(world.npcs.iter().all(|n| n.instance != instance));
    }

    #[test]
    fn overworld_is_never_destroyed() {
        let mut world = test_world();
        let id = world.spawn_npc(500, 500, 0, 0, NPC_RAT, true).unwrap();
        world.destroy_instance_if_empty(0);
        assert!(world.npcs.contains(id));
    }

    #[test]
    fn populate_places_content_spawns() {
        let mut world = test_world();
        let (npcs, eggs) = world.populate();
        assert_eq!(npcs, 2);
        assert_eq!(eggs, 1);
        assert_eq!(world.npcs.mob_count(), 1);
        assert!(world.npcs.iter().all(|n| n.chunk.is_some() && !n.summoned));
    }

    #[test]
    fn deferred_removal_runs_on_flush() {
        let mut world = test_world();
        let id = world.spawn_npc(0, 0, 0, 0, NPC_PLAIN, false).unwrap();
        world.queue_removal(id);
        assert!(world.npcs.contains(id));
        world.flush_removals();
        assert!(!world.npcs.contains(id));
        world.flush_removals();
    }
}

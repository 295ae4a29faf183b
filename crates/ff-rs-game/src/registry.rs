//! Entity registry: NPC ids, summoning, destruction and positioning.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::ai::mob::Mob;
use crate::ai::pathfinding::distance_xyz;
use crate::chunk::{ChunkPos, ViewSet};
use crate::egg::Egg;
use crate::npc::{Npc, NpcId, NpcKind};
use crate::world::World;

/// Owns every NPC, keyed by id, plus the mob and egg subsets.
#[derive(Debug)]
pub struct EntityRegistry {
    npcs: BTreeMap<NpcId, Npc>,
    mobs: BTreeSet<NpcId>,
    eggs: BTreeSet<NpcId>,
    next_id: i32,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Registry whose first allocated id is `first_id`.
    pub fn starting_at(first_id: i32) -> Self {
        Self {
            npcs: BTreeMap::new(),
            mobs: BTreeSet::new(),
            eggs: BTreeSet::new(),
            next_id: first_id.max(1),
        }
    }

    /// Hand out the next id. Ids are never reused.
    ///
    /// # Panics
    ///
    /// Panics when the id space is exhausted.
    pub fn allocate_id(&mut self) -> NpcId {
        assert!(self.next_id < i32::MAX, "NPC id space exhausted");
        let id = NpcId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, npc: Npc) {
        match npc.kind {
            NpcKind::Mob(_) => {
                self.mobs.insert(npc.id);
            }
            NpcKind::Egg(_) => {
                self.eggs.insert(npc.id);
            }
            NpcKind::Plain => {}
        }
        self.npcs.insert(npc.id, npc);
    }

    pub fn remove(&mut self, id: NpcId) -> Option<Npc> {
        self.mobs.remove(&id);
        self.eggs.remove(&id);
        self.npcs.remove(&id)
    }

    pub fn get(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.get(&id)
    }

    pub fn get_mut(&mut self, id: NpcId) -> Option<&mut Npc> {
        self.npcs.get_mut(&id)
    }

    pub fn contains(&self, id: NpcId) -> bool {
        self.npcs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.values()
    }

    /// Snapshot of mob ids, safe to iterate while mutating the registry.
    pub fn mob_ids(&self) -> Vec<NpcId> {
        self.mobs.iter().copied().collect()
    }

    pub fn egg_ids(&self) -> Vec<NpcId> {
        self.eggs.iter().copied().collect()
    }

    pub fn mob_count(&self) -> usize {
        self.mobs.len()
    }
}

impl World {
    /// Create an NPC of `type_id` without placing it in the chunk index.
    ///
    /// Mob templates produce a mob; anything else a plain NPC. NPCs that do
    /// not respawn are treated as summoned and deallocated after death.
    pub fn summon_npc(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        instance: u64,
        type_id: i32,
        respawns: bool,
    ) -> Option<NpcId> {
        let Some(template) = self.content.npc(type_id) else {
            warn!("Cannot summon unknown NPC type {type_id}");
            return None;
        };
        let (is_mob, stats, barker_type) = (template.is_mob(), template.stats, template.barker_type);

        let id = self.npcs.allocate_id();
        let mut npc = Npc::new(id, type_id, x, y, z, instance);
        npc.summoned = !respawns;
        npc.barker_type = barker_type;
        if is_mob {
            npc.hp = stats.max_hp;
            npc.kind = NpcKind::Mob(Box::new(Mob::new(stats, x, y, z)));
        }
        self.npcs.insert(npc);
        Some(id)
    }

    /// Create an egg without placing it.
    pub fn summon_egg(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        instance: u64,
        type_id: i32,
        summoned: bool,
    ) -> Option<NpcId> {
        if self.content.egg_type(type_id).is_none() {
            warn!("Cannot summon unknown egg type {type_id}");
            return None;
        }
        let id = self.npcs.allocate_id();
        let mut npc = Npc::new(id, type_id, x, y, z, instance);
        npc.summoned = summoned;
        npc.kind = NpcKind::Egg(Egg::default());
        self.npcs.insert(npc);
        Some(id)
    }

    /// Summon and place an NPC in one go.
    pub fn spawn_npc(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        instance: u64,
        type_id: i32,
        respawns: bool,
    ) -> Option<NpcId> {
        let id = self.summon_npc(x, y, z, instance, type_id, respawns)?;
        self.update_npc_position(id, x, y, z, instance, 0);
        Some(id)
    }

    /// Summon and place an egg in one go.
    pub fn spawn_egg(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        instance: u64,
        type_id: i32,
        summoned: bool,
    ) -> Option<NpcId> {
        let id = self.summon_egg(x, y, z, instance, type_id, summoned)?;
        self.update_npc_position(id, x, y, z, instance, 0);
        Some(id)
    }

    /// Remove an NPC from every chunk it touches and drop it.
    ///
    /// Unknown ids are logged and ignored, so destroying twice is harmless.
    pub fn destroy_npc(&mut self, id: NpcId) -> bool {
        let Some(npc) = self.npcs.get(id) else {
            warn!("destroy_npc: {id} does not exist");
            return false;
        };
        let (home, view, summoned) = (npc.chunk, npc.viewable.clone(), npc.summoned);

        if let Some(home) = home {
            self.chunks.untrack_npc(home, id);
        }
        self.remove_npc_from_chunks(&view, id);
        self.npcs.remove(id);
        if summoned {
            info!("Deallocated summoned {id}");
        } else {
            debug!("Destroyed {id}");
        }
        true
    }

    /// Set position and angle; transfers chunks when the home chunk changes.
    ///
    /// This is the only way NPC positions change.
    pub fn update_npc_position(
        &mut self,
        id: NpcId,
        x: i32,
        y: i32,
        z: i32,
        instance: u64,
        angle: i32,
    ) {
        let Some(npc) = self.npcs.get_mut(id) else {
            warn!("update_npc_position: {id} does not exist");
            return;
        };
        npc.x = x;
        npc.y = y;
        npc.z = z;
        npc.angle = angle;
        npc.instance = instance;
        let from = npc.chunk;
        let to = Some(ChunkPos::at(x, y, instance));
        if from != to {
            self.update_npc_chunk(id, from, to);
        }
    }

    /// Closest NPC to `(x, y, z)` homed in `view`; the first one found wins
    /// ties.
    pub fn get_nearest_npc(&self, view: &ViewSet, x: i32, y: i32, z: i32) -> Option<NpcId> {
        let mut best: Option<(NpcId, i32)> = None;
        for pos in view {
            for id in self.chunks.npcs_in(*pos) {
                let Some(npc) = self.npcs.get(id) else {
                    continue;
                };
                let dist = distance_xyz((x, y, z), (npc.x, npc.y, npc.z));
                if best.map_or(true, |(_, d)| dist < d) {
                    best = Some((id, dist));
                }
            }
        }
        best.map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mob::MobState;
    use crate::npc::NpcClass;
    use crate::testutil::{add_player, test_world, EGG_HEAL, NPC_PLAIN, NPC_RAT};
    use ff_rs_proto::packets::ServerPacket;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let mut world = test_world();
        let a = world.summon_npc(0, 0, 0, 0, NPC_PLAIN, true).unwrap();
        let b = world.summon_npc(0, 0, 0, 0, NPC_RAT, true).unwrap();
        assert!(b.0 > a.0);
        world.destroy_npc(a);
        let c = world.summon_npc(0, 0, 0, 0, NPC_PLAIN, true).unwrap();
        assert!(c.0 > b.0);
    }

    #[test]
    #[should_panic(expected = "NPC id space exhausted")]
    fn id_exhaustion_is_fatal() {
        let mut registry = EntityRegistry::starting_at(i32::MAX - 1);
        registry.allocate_id();
        registry.allocate_id();
    }

    #[test]
    fn summon_selects_class_from_team() {
        let mut world = test_world();
        let plain = world.summon_npc(0, 0, 0, 0, NPC_PLAIN, true).unwrap();
        let mob = world.summon_npc(10, 20, 30, 0, NPC_RAT, false).unwrap();
        assert_eq!(world.npcs.get(plain).unwrap().class(), NpcClass::Plain);
        assert_eq!(world.npcs.get(plain).unwrap().hp, 400);

        let npc = world.npcs.get(mob).unwrap();
        assert_eq!(npc.class(), NpcClass::Mob);
        assert!(npc.summoned);
        assert_eq!(npc.hp, 400);
        let m = npc.mob().unwrap();
        assert_eq!(m.state, MobState::Roaming);
        assert_eq!((m.spawn_x, m.spawn_y, m.spawn_z), (10, 20, 30));
        assert_eq!(world.npcs.mob_ids(), vec![mob]);
    }

    #[test]
    fn summon_does_not_place() {
        let mut world = test_world();
        let id = world.summon_npc(0, 0, 0, 0, NPC_RAT, true).unwrap();
        assert!(world.npcs.get(id).unwrap().chunk.is_none());
        assert!(world.chunks.is_empty());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut world = test_world();
        assert!(world.summon_npc(0, 0, 0, 0, 99_999, true).is_none());
        assert!(world.summon_egg(0, 0, 0, 0, 99_999, true).is_none());
        assert!(world.npcs.is_empty());
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut world = test_world();
        let viewer = add_player(&mut world, 1, 100, 100);
        let id = world.spawn_npc(200, 200, 0, 0, NPC_RAT, false).unwrap();
        world.outbox.drain();

        assert!(world.destroy_npc(id));
        assert!(!world.npcs.contains(id));
        assert!(world.npcs.mob_ids().is_empty());
        assert!(world.chunks.viewed_by_npc(id).is_empty());
        let home = ChunkPos::at(200, 200, 0);
        assert!(!world.chunks.npcs_in(home).any(|n| n == id));
        assert!(matches!(
            world.outbox.packets_for(viewer)[..],
            [ServerPacket::NpcExit(_)]
        ));

        let before = world.outbox.len();
        assert!(!world.destroy_npc(id));
        assert_eq!(world.outbox.len(), before);
    }

    #[test]
    fn placement_registers_exact_viewable_set() {
        let mut world = test_world();
        let id = world.spawn_npc(7000, -100, 0, 0, NPC_PLAIN, true).unwrap();
        let home = ChunkPos::at(7000, -100, 0);
        assert_eq!(home, ChunkPos::new(1, -1, 0));
        let npc = world.npcs.get(id).unwrap();
        assert_eq!(npc.chunk, Some(home));
        assert_eq!(world.chunks.viewed_by_npc(id), home.viewable());
        assert!(world.chunks.npcs_in(home).any(|n| n == id));
    }

    #[test]
    fn moving_within_a_chunk_keeps_registration() {
        let mut world = test_world();
        let id = world.spawn_npc(100, 100, 0, 0, NPC_PLAIN, true).unwrap();
        world.update_npc_position(id, 200, 300, 5, 0, 90);
        let npc = world.npcs.get(id).unwrap();
        assert_eq!((npc.x, npc.y, npc.z, npc.angle), (200, 300, 5, 90));
        assert_eq!(npc.chunk, Some(ChunkPos::new(0, 0, 0)));
    }

    #[test]
    fn crossing_a_chunk_notifies_only_the_edges() {
        let mut world = test_world();
        let id = world.spawn_npc(100, 100, 0, 0, NPC_PLAIN, true).unwrap();
        let entered = add_player(&mut world, 1, 2 * 6400 + 100, 100);
        let exited = add_player(&mut world, 2, -6400 + 100, 100);
        let kept = add_player(&mut world, 3, 100, 6400 + 100);
        world.outbox.drain();

        world.update_npc_position(id, 6400 + 100, 100, 0, 0, 0);
        assert_eq!(world.npcs.get(id).unwrap().chunk, Some(ChunkPos::new(1, 0, 0)));

        let count = |world: &World, s, appear: bool| {
            world
                .outbox
                .packets_for(s)
                .iter()
                .filter(|p| match p {
                    ServerPacket::NpcNew(n) => appear && n.appearance.npc_id == id.0,
                    ServerPacket::NpcExit(n) => !appear && n.npc_id == id.0,
                    _ => false,
                })
                .count()
        };
        assert_eq!((count(&world, entered, true), count(&world, entered, false)), (1, 0));
        assert_eq!((count(&world, exited, true), count(&world, exited, false)), (0, 1));
        assert_eq!((count(&world, kept, true), count(&world, kept, false)), (0, 0));
        assert_eq!(world.outbox.len(), 2);
    }

    #[test]
    fn nearest_npc_first_wins_ties() {
        let mut world = test_world();
        let near = world.spawn_npc(100, 0, 0, 0, NPC_PLAIN, true).unwrap();
        world.spawn_npc(500, 0, 0, 0, NPC_PLAIN, true).unwrap();
        let view = ChunkPos::new(0, 0, 0).viewable();
        assert_eq!(world.get_nearest_npc(&view, 0, 0, 0), Some(near));

        // Same distance, same chunk: the lower id is scanned first.
        world.spawn_npc(0, 100, 0, 0, NPC_PLAIN, true).unwrap();
        assert_eq!(world.get_nearest_npc(&view, 0, 0, 0), Some(near));

        // Chunks are scanned in order, so an equally near NPC in (-1, 0) wins.
        let west = world.spawn_npc(-100, 0, 0, 0, NPC_PLAIN, true).unwrap();
        assert_eq!(world.get_nearest_npc(&view, 0, 0, 0), Some(west));
        assert_eq!(world.get_nearest_npc(&ChunkPos::new(50, 50, 0).viewable(), 0, 0, 0), None);
    }

    #[test]
    fn egg_is_tracked_in_egg_set() {
        let mut world = test_world();
        let id = world.spawn_egg(0, 0, 0, 0, EGG_HEAL, false).unwrap();
        assert_eq!(world.npcs.egg_ids(), vec![id]);
        assert_eq!(world.npcs.get(id).unwrap().class(), NpcClass::Egg);
    }
}

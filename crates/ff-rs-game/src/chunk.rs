//! Spatial chunk index.
//!
//! The plane of each instance is cut into square cells of [`CHUNK_SIZE`]
//! world units. A chunk records two things:
//!
//! - its home occupants: players and NPCs whose position lies inside it;
//! - its viewers: players and NPCs whose viewable set contains it.
//!
//! Chunks are created on first use and dropped as soon as all four sets are
//! empty, so an unpopulated region costs nothing.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::npc::NpcId;
use crate::player::SessionId;

/// Side length of a chunk in world units.
pub const CHUNK_SIZE: i32 = 6400;

/// Neighbourhood radius in chunks; 1 gives a 3x3 viewable set.
pub const VIEW_RADIUS: i32 = 1;

/// The shared, non-instanced world.
pub const INSTANCE_OVERWORLD: u64 = 0;

/// Chunk coordinates within an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub instance: u64,
}

/// A set of chunks, in a stable order.
pub type ViewSet = BTreeSet<ChunkPos>;

impl ChunkPos {
    pub const fn new(x: i32, y: i32, instance: u64) -> Self {
        Self { x, y, instance }
    }

    /// Chunk containing world coordinates `(x, y)`.
    pub fn at(x: i32, y: i32, instance: u64) -> Self {
        Self {
            x: x.div_euclid(CHUNK_SIZE),
            y: y.div_euclid(CHUNK_SIZE),
            instance,
        }
    }

    /// This chunk and its neighbours within [`VIEW_RADIUS`], same instance.
    pub fn viewable(self) -> ViewSet {
        let mut set = ViewSet::new();
        for dx in -VIEW_RADIUS..=VIEW_RADIUS {
            for dy in -VIEW_RADIUS..=VIEW_RADIUS {
                set.insert(Self::new(
                    self.x.saturating_add(dx),
                    self.y.saturating_add(dy),
                    self.instance,
                ));
            }
        }
        set
    }
}

/// Viewable set for an optional home chunk; empty when unplaced.
pub fn viewable_chunks(pos: Option<ChunkPos>) -> ViewSet {
    pos.map(ChunkPos::viewable).unwrap_or_default()
}

/// Difference between the viewable sets before and after a move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkTransfer {
    /// Chunks newly in view.
    pub entered: ViewSet,
    /// Chunks no longer in view.
    pub exited: ViewSet,
    /// The full viewable set at the destination.
    pub view: ViewSet,
}

impl ChunkTransfer {
    pub fn between(from: Option<ChunkPos>, to: Option<ChunkPos>) -> Self {
        let old = viewable_chunks(from);
        let view = viewable_chunks(to);
        Self {
            entered: view.difference(&old).copied().collect(),
            exited: old.difference(&view).copied().collect(),
            view,
        }
    }
}

#[derive(Debug, Default)]
pub struct Chunk {
    pub players: BTreeSet<SessionId>,
    pub npcs: BTreeSet<NpcId>,
    pub viewing_players: BTreeSet<SessionId>,
    pub viewing_npcs: BTreeSet<NpcId>,
}

impl Chunk {
    fn is_empty(&self) -> bool {
        self.players.is_empty()
            && self.npcs.is_empty()
            && self.viewing_players.is_empty()
            && self.viewing_npcs.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ChunkIndex {
    chunks: BTreeMap<ChunkPos, Chunk>,
}

impl ChunkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunk_exists(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    pub fn get(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    /// Players homed in `pos`.
    pub fn players_in(&self, pos: ChunkPos) -> impl Iterator<Item = SessionId> + '_ {
        self.chunks
            .get(&pos)
            .into_iter()
            .flat_map(|c| c.players.iter().copied())
    }

    /// NPCs homed in `pos`.
    pub fn npcs_in(&self, pos: ChunkPos) -> impl Iterator<Item = NpcId> + '_ {
        self.chunks
            .get(&pos)
            .into_iter()
            .flat_map(|c| c.npcs.iter().copied())
    }

    /// Players homed anywhere in `view`.
    pub fn players_in_view<'a>(
        &'a self,
        view: &'a ViewSet,
    ) -> impl Iterator<Item = SessionId> + 'a {
        view.iter().flat_map(move |pos| self.players_in(*pos))
    }

    /// True when any chunk of `view` has a player in it.
    pub fn in_populated_chunks(&self, view: &ViewSet) -> bool {
        view.iter().any(|pos| {
            self.chunks
                .get(pos)
                .is_some_and(|c| !c.players.is_empty())
        })
    }

    pub fn track_player(&mut self, pos: ChunkPos, session: SessionId) {
        self.chunks.entry(pos).or_default().players.insert(session);
    }

    pub fn untrack_player(&mut self, pos: ChunkPos, session: SessionId) -> bool {
        let removed = self
            .chunks
            .get_mut(&pos)
            .is_some_and(|c| c.players.remove(&session));
        if !removed {
            warn!("untrack_player: {session} is not homed in {pos:?}");
        }
        self.prune(pos);
        removed
    }

    pub fn track_npc(&mut self, pos: ChunkPos, id: NpcId) {
        self.chunks.entry(pos).or_default().npcs.insert(id);
    }

    pub fn untrack_npc(&mut self, pos: ChunkPos, id: NpcId) -> bool {
        let removed = self
            .chunks
            .get_mut(&pos)
            .is_some_and(|c| c.npcs.remove(&id));
        if !removed {
            warn!("untrack_npc: {id} is not homed in {pos:?}");
        }
        self.prune(pos);
        removed
    }

    pub fn add_player_viewer(&mut self, pos: ChunkPos, session: SessionId) {
        self.chunks
            .entry(pos)
            .or_default()
            .viewing_players
            .insert(session);
    }

    pub fn remove_player_viewer(&mut self, pos: ChunkPos, session: SessionId) {
        if let Some(chunk) = self.chunks.get_mut(&pos) {
            chunk.viewing_players.remove(&session);
        }
        self.prune(pos);
    }

    pub fn add_npc_viewer(&mut self, pos: ChunkPos, id: NpcId) {
        self.chunks.entry(pos).or_default().viewing_npcs.insert(id);
    }

    pub fn remove_npc_viewer(&mut self, pos: ChunkPos, id: NpcId) {
        if let Some(chunk) = self.chunks.get_mut(&pos) {
            chunk.viewing_npcs.remove(&id);
        }
        self.prune(pos);
    }

    /// Chunks in which `session` is registered as a viewer.
    pub fn viewed_by_player(&self, session: SessionId) -> ViewSet {
        self.chunks
            .iter()
            .filter(|(_, c)| c.viewing_players.contains(&session))
            .map(|(pos, _)| *pos)
            .collect()
    }

    /// Chunks in which NPC `id` is registered as a viewer.
    pub fn viewed_by_npc(&self, id: NpcId) -> ViewSet {
        self.chunks
            .iter()
            .filter(|(_, c)| c.viewing_npcs.contains(&id))
            .map(|(pos, _)| *pos)
            .collect()
    }

    pub fn instance_exists(&self, instance: u64) -> bool {
        self.chunks.keys().any(|pos| pos.instance == instance)
    }

    /// True when a player is homed anywhere in `instance`.
    pub fn instance_populated(&self, instance: u64) -> bool {
        self.chunks
            .iter()
            .any(|(pos, c)| pos.instance == instance && !c.players.is_empty())
    }

    /// Drop every remaining chunk of `instance`. Returns how many were removed.
    pub fn remove_instance(&mut self, instance: u64) -> usize {
        let before = self.chunks.len();
        self.chunks.retain(|pos, _| pos.instance != instance);
        before - self.chunks.len()
    }

    fn prune(&mut self, pos: ChunkPos) {
        if self.chunks.get(&pos).is_some_and(Chunk::is_empty) {
            self.chunks.remove(&pos);
        }
    }
}

//! Interest management: who hears about what.
//!
//! Every outbound packet goes through the [`Outbox`]. Visibility changes are
//! derived from chunk transfers: when an occupant's viewable set changes, the
//! occupants of chunks leaving view get a disappear notification and the
//! occupants of chunks entering view get an appear notification.

use ff_rs_proto::packets::{PcExit, PcNew, ServerPacket};

use crate::chunk::{ChunkPos, ChunkTransfer, ViewSet};
use crate::npc::NpcId;
use crate::player::SessionId;
use crate::world::World;

/// A packet addressed to one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub to: SessionId,
    pub packet: ServerPacket,
}

/// Outbound queue drained by the network layer after each event or tick.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Vec<Envelope>,
}

impl Outbox {
    pub fn send(&mut self, to: SessionId, packet: impl Into<ServerPacket>) {
        self.queue.push(Envelope {
            to,
            packet: packet.into(),
        });
    }

    pub fn drain(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.queue)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Envelope> {
        self.queue.iter()
    }

    /// Queued packets for one session, oldest first.
    pub fn packets_for(&self, to: SessionId) -> Vec<&ServerPacket> {
        self.queue
            .iter()
            .filter(|e| e.to == to)
            .map(|e| &e.packet)
            .collect()
    }
}

impl World {
    /// Send to every player homed in the NPC's viewable chunks.
    pub fn send_to_viewable_npc(&mut self, id: NpcId, packet: impl Into<ServerPacket>) {
        let Some(npc) = self.npcs.get(id) else {
            return;
        };
        let packet = packet.into();
        for session in self.chunks.players_in_view(&npc.viewable) {
            self.outbox.send(session, packet.clone());
        }
    }

    /// Send to every player homed in the player's viewable chunks, except the
    /// player itself.
    pub fn send_to_viewable_player(&mut self, session: SessionId, packet: impl Into<ServerPacket>) {
        let Some(player) = self.players.get(&session) else {
            return;
        };
        let packet = packet.into();
        for other in self.chunks.players_in_view(&player.viewable) {
            if other != session {
                self.outbox.send(other, packet.clone());
            }
        }
    }

    /// Register `session` as a viewer of `view` and exchange appearances with
    /// everything homed there.
    pub fn add_player_to_chunks(&mut self, view: &ViewSet, session: SessionId) {
        let Self {
            chunks,
            players,
            npcs,
            outbox,
            ..
        } = self;
        let Some(me) = players.get(&session) else {
            return;
        };
        let my_appearance = PcNew {
            appearance: me.appearance(),
        };
        for pos in view {
            chunks.add_player_viewer(*pos, session);
            for other in chunks.players_in(*pos) {
                if other == session {
                    continue;
                }
                if let Some(them) = players.get(&other) {
                    outbox.send(other, my_appearance);
                    outbox.send(
                        session,
                        PcNew {
                            appearance: them.appearance(),
                        },
                    );
                }
            }
            for id in chunks.npcs_in(*pos) {
                if let Some(npc) = npcs.get(id).filter(|n| n.is_visible()) {
                    outbox.send(session, npc.appear_packet());
                }
            }
        }
    }

    /// Unregister `session` as a viewer of `view` and retract appearances.
    pub fn remove_player_from_chunks(&mut self, view: &ViewSet, session: SessionId) {
        let Self {
            chunks,
            players,
            npcs,
            outbox,
            ..
        } = self;
        let Some(me) = players.get(&session) else {
            return;
        };
        for pos in view {
            for other in chunks.players_in(*pos) {
                if other == session {
                    continue;
                }
                if let Some(them) = players.get(&other) {
                    outbox.send(other, PcExit { pc_id: me.id });
                    outbox.send(session, PcExit { pc_id: them.id });
                }
            }
            for id in chunks.npcs_in(*pos) {
                if let Some(npc) = npcs.get(id).filter(|n| n.is_visible()) {
                    outbox.send(session, npc.disappear_packet());
                }
            }
            chunks.remove_player_viewer(*pos, session);
        }
    }

    /// Register NPC `id` as a viewer of `view` and show it to players there.
    pub fn add_npc_to_chunks(&mut self, view: &ViewSet, id: NpcId) {
        let Self {
            chunks,
            npcs,
            outbox,
            ..
        } = self;
        let Some(npc) = npcs.get(id) else {
            return;
        };
        let packet = npc.is_visible().then(|| npc.appear_packet());
        for pos in view {
            chunks.add_npc_viewer(*pos, id);
            if let Some(packet) = &packet {
                for session in chunks.players_in(*pos) {
                    outbox.send(session, packet.clone());
                }
            }
        }
    }

    /// Unregister NPC `id` as a viewer of `view` and hide it from players
    /// there.
    pub fn remove_npc_from_chunks(&mut self, view: &ViewSet, id: NpcId) {
        let Self {
            chunks,
            npcs,
            outbox,
            ..
        } = self;
        let Some(npc) = npcs.get(id) else {
            return;
        };
        let packet = npc.is_visible().then(|| npc.disappear_packet());
        for pos in view {
            if let Some(packet) = &packet {
                for session in chunks.players_in(*pos) {
                    outbox.send(session, packet.clone());
                }
            }
            chunks.remove_npc_viewer(*pos, id);
        }
    }

    /// Move a player's home chunk and update visibility on both sides.
    ///
    /// `None` means "not placed": `from = None` is first placement and
    /// `to = None` is removal from the world.
    pub fn update_player_chunk(
        &mut self,
        session: SessionId,
        from: Option<ChunkPos>,
        to: Option<ChunkPos>,
    ) -> ChunkTransfer {
        if from == to {
            return ChunkTransfer::default();
        }
        let transfer = ChunkTransfer::between(from, to);
        self.remove_player_from_chunks(&transfer.exited, session);
        self.add_player_to_chunks(&transfer.entered, session);

        if let Some(from) = from {
            self.chunks.untrack_player(from, session);
        }
        if let Some(to) = to {
            self.chunks.track_player(to, session);
        }
        if let Some(player) = self.players.get_mut(&session) {
            player.chunk = to;
            player.viewable = transfer.view.clone();
        }
        transfer
    }

    /// Move an NPC's home chunk and update visibility on both sides.
    pub fn update_npc_chunk(
        &mut self,
        id: NpcId,
        from: Option<ChunkPos>,
        to: Option<ChunkPos>,
    ) -> ChunkTransfer {
        if from == to {
            return ChunkTransfer::default();
        }
        let transfer = ChunkTransfer::between(from, to);
        self.remove_npc_from_chunks(&transfer.exited, id);
        self.add_npc_to_chunks(&transfer.entered, id);

        if let Some(from) = from {
            self.chunks.untrack_npc(from, id);
        }
        if let Some(to) = to {
            self.chunks.track_npc(to, id);
        }
        if let Some(npc) = self.npcs.get_mut(id) {
            npc.chunk = to;
            npc.viewable = transfer.view.clone();
        }
        transfer
    }
}

use super::*;

use ff_rs_game::npc::NpcId;
use ff_rs_proto::packets::{ReqNpcSummon, ReqNpcUnsummon, ReqPcWarpUseNpc, ReqShinyPickup};

/// Most NPCs one summon request may create.
const MAX_SUMMON_COUNT: i16 = 100;

impl ConnectionHandler {
    fn is_gm(&self, session: SessionId) -> bool {
        self.world
            .player(session)
            .is_some_and(|p| p.account_level <= self.config.permissions.gm_account_level)
    }

    /// GM only: summon NPCs at the caller's position. They never respawn.
    pub(super) fn handle_npc_summon(&mut self, session: SessionId, req: ReqNpcSummon) {
        if !self.is_gm(session) {
            warn!("{session} tried to summon without permission");
            return;
        }
        if req.npc_count > MAX_SUMMON_COUNT {
            warn!("{session} tried to summon {} NPCs", req.npc_count);
            return;
        }
        if self.world.content.npc(req.npc_type).is_none() {
            warn!("{session} tried to summon unknown NPC type {}", req.npc_type);
            return;
        }
        let Some((x, y, z, instance)) = self
            .world
            .player(session)
            .map(|p| (p.x, p.y, p.z, p.instance))
        else {
            return;
        };
        for _ in 0..req.npc_count {
            self.world
                .spawn_npc(x, y, z, instance, req.npc_type, false);
        }
        info!(
            "{session} summoned {} of NPC type {}",
            req.npc_count.max(0),
            req.npc_type
        );
    }

    /// GM only: destroy any NPC by id.
    pub(super) fn handle_npc_unsummon(&mut self, session: SessionId, req: ReqNpcUnsummon) {
        if !self.is_gm(session) {
            warn!("{session} tried to unsummon without permission");
            return;
        }
        self.world.destroy_npc(NpcId(req.npc_id));
    }

    pub(super) fn handle_shiny_pickup(&mut self, session: SessionId, req: ReqShinyPickup, now: u64) {
        self.world.egg_pickup(session, NpcId(req.shiny_id), now);
    }

    pub(super) fn handle_warp_use_npc(&mut self, session: SessionId, req: ReqPcWarpUseNpc) {
        if self.world.player(session).and_then(|p| p.chunk).is_none() {
            warn!("{session} tried to warp before loading");
            return;
        }
        if self.world.warp_player(session, req.warp_id) {
            debug!("{session} used warp {} at NPC {}", req.warp_id, req.npc_id);
        }
    }
}

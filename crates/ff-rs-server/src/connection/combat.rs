use super::*;

use ff_rs_proto::packets::{ReqDotDamageOnOff, ReqPcAttackNpcs};

impl ConnectionHandler {
    pub(super) fn handle_attack_npcs(&mut self, session: SessionId, req: ReqPcAttackNpcs, now: u64) {
        if !self.world.pc_attack_npcs(session, &req.npc_ids, now) {
            debug!("{session}: attack on {:?} rejected", req.npc_ids);
        }
    }

    pub(super) fn handle_combat_toggle(&mut self, session: SessionId, in_combat: bool) {
        self.world.set_in_combat(session, in_combat);
    }

    pub(super) fn handle_dot_damage(&mut self, session: SessionId, req: ReqDotDamageOnOff) {
        self.world.set_dot_damage(session, req.flag != 0);
    }
}

use super::*;

use ff_rs_proto::packets::{PcMove, PcStop, ReqPcMove, ReqPcStop};

impl ConnectionHandler {
    pub(super) fn handle_move(&mut self, session: SessionId, req: ReqPcMove) {
        let Some(player) = self.world.player(session) else {
            return;
        };
        if player.chunk.is_none() {
            return;
        }
        let (pc_id, instance) = (player.id, player.instance);
        self.world
            .update_player_position(session, req.x, req.y, req.z, instance, req.angle);
        self.world.send_to_viewable_player(
            session,
            PcMove {
                pc_id,
                x: req.x,
                y: req.y,
                z: req.z,
                angle: req.angle,
                speed: req.speed,
                vx: req.vx,
                vy: req.vy,
                vz: req.vz,
                key_value: req.key_value,
                cli_time: req.cli_time,
                svr_time: server_time(),
            },
        );
    }

    /// Like a move, but the angle is kept.
    pub(super) fn handle_stop(&mut self, session: SessionId, req: ReqPcStop) {
        let Some(player) = self.world.player(session) else {
            return;
        };
        if player.chunk.is_none() {
            return;
        }
        let (pc_id, instance, angle) = (player.id, player.instance, player.angle);
        self.world
            .update_player_position(session, req.x, req.y, req.z, instance, angle);
        self.world.send_to_viewable_player(
            session,
            PcStop {
                pc_id,
                x: req.x,
                y: req.y,
                z: req.z,
                cli_time: req.cli_time,
                svr_time: server_time(),
            },
        );
    }
}

use super::*;

use ff_rs_game::player::Player;
use ff_rs_proto::packets::{
    RepPcEnterSucc, RepPcExitDuplicate, RepPcExitSucc, RepPcLoadingCompleteSucc, ReqPcEnter,
    ReqPcExit, ReqPcLoadingComplete, ReqPcRegen,
};

/// Exit code acknowledging a client-requested exit.
const EXIT_CODE_REQ_BY_PC: i32 = 1;

impl ConnectionHandler {
    pub(super) fn handle_enter(&mut self, session: SessionId, req: ReqPcEnter, now: u64) {
        if self.world.player(session).is_some() {
            warn!("{session} tried to enter twice");
            return;
        }
        if self.world.player_count() >= self.config.server.max_players as usize {
            warn!("Server full, refusing {session}");
            self.pending_close.push(session);
            return;
        }

        // The same character logged in elsewhere: save and drop that session
        // before loading the record.
        let duplicate = self
            .world
            .players
            .iter()
            .find(|(_, p)| p.serial_key == req.serial_key)
            .map(|(s, _)| *s);
        if let Some(old) = duplicate {
            info!("Kicking {old}: duplicate login from {session}");
            self.world
                .outbox
                .send(old, RepPcExitDuplicate { error_code: 0 });
            self.kick(old);
        }

        let record = match self.store.load(req.serial_key) {
            Some(record) => record,
            None => {
                let record = self.store.create(req.serial_key);
                if let Err(e) = self.store.save(&record) {
                    warn!("Failed to save new player {}: {e}", record.id);
                }
                record
            }
        };

        let mut player = Player::from_record(record);
        player.last_heartbeat = now;
        let reply = RepPcEnterSucc {
            id: player.id,
            server_time: server_time(),
            account_level: player.account_level,
            hp: player.hp,
            level: player.level,
            money: player.money,
            fusion_matter: player.fusion_matter,
            x: player.x,
            y: player.y,
            z: player.z,
            angle: player.angle,
            battery_n: player.battery_n,
            battery_w: player.battery_w,
        };
        let (name, pc_id) = (player.name.clone(), player.id);
        self.world.add_player(session, player);
        self.world.outbox.send(session, reply);
        info!(
            "{name} ({pc_id}) joined ({} online)",
            self.world.player_count()
        );
    }

    /// The client finished loading: place the player in the world.
    pub(super) fn handle_loading_complete(&mut self, session: SessionId, req: ReqPcLoadingComplete) {
        let Some(player) = self.world.player(session) else {
            return;
        };
        if player.id != req.pc_id {
            warn!("{session} finished loading for pc {} but owns {}", req.pc_id, player.id);
            return;
        }
        if player.chunk.is_some() {
            debug!("{session} sent a second loading-complete");
            return;
        }
        let (x, y, z, instance, angle) = (player.x, player.y, player.z, player.instance, player.angle);
        self.world
            .update_player_position(session, x, y, z, instance, angle);
        self.world
            .outbox
            .send(session, RepPcLoadingCompleteSucc { pc_id: req.pc_id });
    }

    pub(super) fn handle_exit(&mut self, session: SessionId, req: ReqPcExit) {
        self.world.outbox.send(
            session,
            RepPcExitSucc {
                id: req.id,
                exit_code: EXIT_CODE_REQ_BY_PC,
            },
        );
        self.kick(session);
    }

    pub(super) fn handle_live_check(&mut self, session: SessionId, now: u64) {
        if let Some(player) = self.world.player_mut(session) {
            player.last_heartbeat = now;
        }
    }

    /// Revive in place. Other revive kinds are not distinguished.
    pub(super) fn handle_regen(&mut self, session: SessionId, req: ReqPcRegen) {
        if !self.world.revive_player(session) {
            debug!("{session} asked to revive (type {}) while alive", req.regen_type);
        }
    }
}

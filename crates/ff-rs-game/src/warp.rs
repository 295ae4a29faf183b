//! Warps: teleporting players between the overworld and instances.

use ff_rs_proto::packets::{InstanceMapInfo, RepPcGotoSucc, RepPcWarpUseNpcSucc};
use tracing::{debug, warn};

use crate::chunk::INSTANCE_OVERWORLD;
use crate::content::Warp;
use crate::player::SessionId;
use crate::world::{map_num, World};

/// Instance id a warp leads to for the player `pc_id`.
///
/// Private warps carry the owner in the upper 32 bits.
pub fn warp_instance(warp: &Warp, pc_id: i32) -> u64 {
    if warp.private && warp.instance != INSTANCE_OVERWORLD {
        map_num(warp.instance) | (u64::from(pc_id as u32) << 32)
    } else {
        warp.instance
    }
}

impl World {
    /// Teleport a player, reloading everything they can see.
    ///
    /// Entering a fresh instance creates it; leaving the last player out of
    /// one destroys it.
    pub fn send_player_to(&mut self, session: SessionId, x: i32, y: i32, z: i32, instance: u64) {
        let Some(player) = self.players.get(&session) else {
            return;
        };
        let (chunk, angle, money) = (player.chunk, player.angle, player.money);

        if instance == INSTANCE_OVERWORLD {
            self.outbox
                .send(session, RepPcWarpUseNpcSucc { x, y, z, money });
        } else {
            // Lower half always fits; the owner half stays server-side.
            let map = map_num(instance) as i32;
            self.outbox.send(session, InstanceMapInfo { map_num: map });
        }
        self.outbox.send(session, RepPcGotoSucc { x, y, z });

        // Detach first so the destination is sent in full even when the
        // home chunk does not change.
        self.update_player_chunk(session, chunk, None);
        self.update_player_position(session, x, y, z, instance, angle);
    }

    /// Use a warp from the content tables. Returns false for unknown warps.
    pub fn warp_player(&mut self, session: SessionId, warp_id: i32) -> bool {
        let Some(warp) = self.content.warp(warp_id).cloned() else {
            warn!("Unknown warp {warp_id}");
            return false;
        };
        let Some(pc_id) = self.players.get(&session).map(|p| p.id) else {
            return false;
        };
        let instance = warp_instance(&warp, pc_id);
        debug!("Player {pc_id} warps via {warp_id} to instance {instance:#x}");
        self.send_player_to(session, warp.x, warp.y, warp.z, instance);
        true
    }
}

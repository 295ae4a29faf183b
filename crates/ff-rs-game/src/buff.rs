//! Timed condition buffs keyed by (session, condition bit).

use std::collections::BTreeMap;

use ff_rs_proto::packets::{CharTimeBuffTimeOut, PcBuffUpdate};
use tracing::debug;

use crate::player::SessionId;
use crate::world::World;

/// Expiry timestamps (ms) of active timed buffs.
#[derive(Debug, Default)]
pub struct BuffTable {
    expiries: BTreeMap<(SessionId, i32), u64>,
}

impl BuffTable {
    /// Record or refresh a buff; a later application overwrites the expiry.
    pub fn insert(&mut self, session: SessionId, bit_flag: i32, expires_at: u64) {
        self.expiries.insert((session, bit_flag), expires_at);
    }

    pub fn expiry(&self, session: SessionId, bit_flag: i32) -> Option<u64> {
        self.expiries.get(&(session, bit_flag)).copied()
    }

    /// Remove and return every buff that has expired by `now`.
    pub fn take_expired(&mut self, now: u64) -> Vec<(SessionId, i32)> {
        let expired: Vec<_> = self
            .expiries
            .iter()
            .filter(|(_, &until)| until <= now)
            .map(|(key, _)| *key)
            .collect();
        for key in &expired {
            self.expiries.remove(key);
        }
        expired
    }

    pub fn remove_session(&mut self, session: SessionId) {
        self.expiries.retain(|(s, _), _| *s != session);
    }

    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}

impl World {
    /// Set `bit_flag` on the player and schedule its removal.
    pub fn apply_timed_buff(&mut self, session: SessionId, bit_flag: i32, expires_at: u64) {
        let Some(player) = self.players.get_mut(&session) else {
            return;
        };
        player.condition_flags |= bit_flag;
        self.buffs.insert(session, bit_flag, expires_at);
    }

    /// Clear every expired buff and tell the player and onlookers.
    pub fn sweep_buffs(&mut self, now: u64) {
        for (session, bit_flag) in self.buffs.take_expired(now) {
            let Some(player) = self.players.get_mut(&session) else {
                debug!("Dropping expired buff {bit_flag:#x} of departed {session}");
                continue;
            };
            player.condition_flags &= !bit_flag;
            player.condition_flags |= player.self_condition_flags;
            let (pc_id, flags) = (player.id, player.condition_flags);

            self.outbox.send(
                session,
                PcBuffUpdate {
                    cstb: self.content.time_buff_for_flag(bit_flag),
                    tbu: PcBuffUpdate::UPDATE_DEL,
                    tbt: PcBuffUpdate::SOURCE_EGG,
                    condition_bit_flag: flags,
                },
            );
            self.send_to_viewable_player(
                session,
                CharTimeBuffTimeOut {
                    ect: 1,
                    id: pc_id,
                    condition_bit_flag: flags,
                },
            );
        }
    }
}

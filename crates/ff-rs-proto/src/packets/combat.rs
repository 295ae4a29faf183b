//! Combat: player attacks, mob attacks, damage ticks and regeneration.

use bytes::{Buf, BufMut};

use crate::codec::{
    ensure_remaining, validate_in_var_packet, FixedSize, ProtoDecode, ProtoEncode,
};
use crate::error::ProtoError;
use crate::types::{AttackResult, DotDamage, Nano};

/// Client → Server. Melee attack against a list of mobs.
///
/// Layout: `i32` count followed by `count` `i32` NPC ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqPcAttackNpcs {
    pub npc_ids: Vec<i32>,
}

impl ReqPcAttackNpcs {
    pub const BASE_SIZE: usize = 4;
    pub const ID_SIZE: usize = 4;

    /// Decode the whole payload, rejecting any declared count that does not
    /// account for exactly the bytes received.
    pub fn decode_payload(payload: &[u8]) -> Result<Self, ProtoError> {
        let mut buf = payload;
        ensure_remaining(&buf, Self::BASE_SIZE)?;
        let raw_count = buf.get_i32_le();
        let count = usize::try_from(raw_count).map_err(|_| ProtoError::NegativeCount(raw_count))?;
        if !validate_in_var_packet(Self::BASE_SIZE, count, Self::ID_SIZE, payload.len()) {
            return Err(ProtoError::VarSizeMismatch {
                base: Self::BASE_SIZE,
                count,
                stride: Self::ID_SIZE,
                got: payload.len(),
            });
        }
        let npc_ids = (0..count).map(|_| buf.get_i32_le()).collect();
        Ok(Self { npc_ids })
    }
}

impl ProtoEncode for ReqPcAttackNpcs {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.npc_ids.len() as i32);
        for id in &self.npc_ids {
            buf.put_i32_le(*id);
        }
    }
}

/// Client → Server. Player entered combat stance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqPcCombatBegin {
    pub temp_value: i32,
}

impl FixedSize for ReqPcCombatBegin {
    const SIZE: usize = 4;
}

impl ProtoDecode for ReqPcCombatBegin {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            temp_value: buf.get_i32_le(),
        })
    }
}

/// Client → Server. Player left combat stance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqPcCombatEnd {
    pub temp_value: i32,
}

impl FixedSize for ReqPcCombatEnd {
    const SIZE: usize = 4;
}

impl ProtoDecode for ReqPcCombatEnd {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            temp_value: buf.get_i32_le(),
        })
    }
}

/// Client → Server. Player entered (`flag != 0`) or left a damaging area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqDotDamageOnOff {
    pub flag: i32,
}

impl FixedSize for ReqDotDamageOnOff {
    const SIZE: usize = 4;
}

impl ProtoDecode for ReqDotDamageOnOff {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            flag: buf.get_i32_le(),
        })
    }
}

fn put_results(buf: &mut impl BufMut, results: &[AttackResult]) {
    buf.put_i32_le(results.len() as i32);
    for result in results {
        result.proto_encode(buf);
    }
}

/// Server → Client. Results of the attacker's own hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepPcAttackNpcsSucc {
    pub results: Vec<AttackResult>,
}

impl RepPcAttackNpcsSucc {
    pub const BASE_SIZE: usize = 4;
}

impl ProtoEncode for RepPcAttackNpcsSucc {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        put_results(buf, &self.results);
    }
}

/// Server → Client. Another player's hits, relayed to onlookers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcAttackNpcs {
    pub pc_id: i32,
    pub results: Vec<AttackResult>,
}

impl PcAttackNpcs {
    pub const BASE_SIZE: usize = 8;
}

impl ProtoEncode for PcAttackNpcs {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.pc_id);
        put_results(buf, &self.results);
    }
}

/// Server → Client. A mob hit one or more players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcAttackPcs {
    pub npc_id: i32,
    pub results: Vec<AttackResult>,
}

impl ProtoEncode for NpcAttackPcs {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.npc_id);
        put_results(buf, &self.results);
    }
}

/// Server → Client. Periodic damage tick (hazard areas).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharTimeBuffTimeTick {
    pub ect: i32,
    pub id: i32,
    pub tb_id: i32,
    pub dot: DotDamage,
}

impl ProtoEncode for CharTimeBuffTimeTick {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.ect);
        buf.put_i32_le(self.id);
        buf.put_i32_le(self.tb_id);
        self.dot.proto_encode(buf);
    }
}

/// Server → Client. The player's own regenerated health and nano stamina.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepPcTick {
    pub hp: i32,
    pub battery_n: i32,
    pub nanos: [Nano; 3],
}

impl ProtoEncode for RepPcTick {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.hp);
        buf.put_i32_le(self.battery_n);
        for nano in &self.nanos {
            nano.proto_encode(buf);
        }
    }
}

/// Server → Client. Another player's health/state snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcRegen {
    pub pc_id: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub hp: i32,
    pub angle: i32,
    pub condition_bit_flag: i32,
    pub nano: Nano,
}

impl ProtoEncode for PcRegen {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.pc_id);
        buf.put_i32_le(self.x);
        buf.put_i32_le(self.y);
        buf.put_i32_le(self.z);
        buf.put_i32_le(self.hp);
        buf.put_i32_le(self.angle);
        buf.put_i32_le(self.condition_bit_flag);
        self.nano.proto_encode(buf);
    }
}

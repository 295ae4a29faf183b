//! Timed status effects and skill hits.

use bytes::BufMut;

use crate::codec::ProtoEncode;
use crate::types::SkillResult;

/// Server → Client. One of the player's own timed buffs changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcBuffUpdate {
    /// Time-buff id (see [`crate::types::time_buff`]).
    pub cstb: i32,
    /// Update kind.
    pub tbu: i32,
    /// Buff source.
    pub tbt: i32,
    pub condition_bit_flag: i32,
}

impl PcBuffUpdate {
    pub const UPDATE_ADD: i32 = 1;
    pub const UPDATE_DEL: i32 = 2;
    pub const SOURCE_NANO: i32 = 1;
    pub const SOURCE_EGG: i32 = 3;
}

impl ProtoEncode for PcBuffUpdate {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.cstb);
        buf.put_i32_le(self.tbu);
        buf.put_i32_le(self.tbt);
        buf.put_i32_le(self.condition_bit_flag);
    }
}

/// Server → Client. A character's timed buff ran out, as seen by onlookers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharTimeBuffTimeOut {
    pub ect: i32,
    pub id: i32,
    pub condition_bit_flag: i32,
}

impl ProtoEncode for CharTimeBuffTimeOut {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.ect);
        buf.put_i32_le(self.id);
        buf.put_i32_le(self.condition_bit_flag);
    }
}

/// Server → Client. A skill (egg effect) landed on a single target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpcSkillHit {
    pub npc_id: i32,
    pub skill_id: i16,
    pub skill_type: i32,
    pub result: SkillResult,
}

impl ProtoEncode for NpcSkillHit {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.npc_id);
        buf.put_i16_le(self.skill_id);
        buf.put_i32_le(self.skill_type);
        buf.put_i32_le(1);
        self.result.proto_encode(buf);
    }
}

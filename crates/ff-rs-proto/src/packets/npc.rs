//! NPC management and egg pickup requests.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, FixedSize, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Client → Server. GM request to spawn NPCs at the caller's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqNpcSummon {
    pub npc_type: i32,
    pub npc_count: i16,
}

impl FixedSize for ReqNpcSummon {
    const SIZE: usize = 6;
}

impl ProtoDecode for ReqNpcSummon {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            npc_type: buf.get_i32_le(),
            npc_count: buf.get_i16_le(),
        })
    }
}

impl ProtoEncode for ReqNpcSummon {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.npc_type);
        buf.put_i16_le(self.npc_count);
    }
}

/// Client → Server. GM request to remove an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqNpcUnsummon {
    pub npc_id: i32,
}

impl FixedSize for ReqNpcUnsummon {
    const SIZE: usize = 4;
}

impl ProtoDecode for ReqNpcUnsummon {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            npc_id: buf.get_i32_le(),
        })
    }
}

/// Client → Server. Player touched an egg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqShinyPickup {
    pub shiny_id: i32,
}

impl FixedSize for ReqShinyPickup {
    const SIZE: usize = 4;
}

impl ProtoDecode for ReqShinyPickup {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            shiny_id: buf.get_i32_le(),
        })
    }
}

impl ProtoEncode for ReqShinyPickup {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.shiny_id);
    }
}

/// Server → Client. Egg effect applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepShinyPickupSucc {
    pub skill_id: i16,
    /// Time-buff id shown to the player, if the effect is a timed buff.
    pub cstb: i32,
}

impl ProtoEncode for RepShinyPickupSucc {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16_le(self.skill_id);
        buf.put_i32_le(self.cstb);
    }
}

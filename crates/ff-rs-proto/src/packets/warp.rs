//! Warps between the overworld and instances.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, FixedSize, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Client → Server. Player asked a warp NPC to send them somewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqPcWarpUseNpc {
    pub npc_id: i32,
    pub warp_id: i32,
}

impl FixedSize for ReqPcWarpUseNpc {
    const SIZE: usize = 8;
}

impl ProtoDecode for ReqPcWarpUseNpc {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            npc_id: buf.get_i32_le(),
            warp_id: buf.get_i32_le(),
        })
    }
}

impl ProtoEncode for ReqPcWarpUseNpc {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.npc_id);
        buf.put_i32_le(self.warp_id);
    }
}

/// Server → Client. Arrived back in the overworld; clears the client's
/// instance flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepPcWarpUseNpcSucc {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub money: i32,
}

impl ProtoEncode for RepPcWarpUseNpcSucc {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.x);
        buf.put_i32_le(self.y);
        buf.put_i32_le(self.z);
        buf.put_i32_le(self.money);
    }
}

/// Server → Client. Entering an instance of map `map_num`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceMapInfo {
    pub map_num: i32,
}

impl ProtoEncode for InstanceMapInfo {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.map_num);
    }
}

/// Server → Client. Teleport destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepPcGotoSucc {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ProtoEncode for RepPcGotoSucc {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.x);
        buf.put_i32_le(self.y);
        buf.put_i32_le(self.z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_fixed, encode_to_vec};

    #[test]
    fn warp_request_layout() {
        let mut bytes = 7i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&3i32.to_le_bytes());
        let pkt: ReqPcWarpUseNpc = decode_fixed(&bytes).unwrap();
        assert_eq!(
            pkt,
            ReqPcWarpUseNpc {
                npc_id: 7,
                warp_id: 3
            }
        );
        assert!(decode_fixed::<ReqPcWarpUseNpc>(&bytes[..4]).is_err());
    }

    #[test]
    fn warp_success_is_sixteen_bytes() {
        let pkt = RepPcWarpUseNpcSucc {
            x: 1,
            y: 2,
            z: 3,
            money: 400,
        };
        let bytes = encode_to_vec(&pkt);
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[12..], &400i32.to_le_bytes());
    }
}

//! Session lifecycle: enter, loading complete, exit, heartbeat, revive.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, FixedSize, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::Nano;

/// Client → Server. First packet on a shard connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqPcEnter {
    /// Key handed out by the login service; identifies the stored character.
    pub serial_key: i64,
    pub temp_value: i32,
}

impl FixedSize for ReqPcEnter {
    const SIZE: usize = 12;
}

impl ProtoDecode for ReqPcEnter {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            serial_key: buf.get_i64_le(),
            temp_value: buf.get_i32_le(),
        })
    }
}

impl ProtoEncode for ReqPcEnter {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i64_le(self.serial_key);
        buf.put_i32_le(self.temp_value);
    }
}

/// Client → Server. Client finished loading and is ready to be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqPcLoadingComplete {
    pub pc_id: i32,
}

impl FixedSize for ReqPcLoadingComplete {
    const SIZE: usize = 4;
}

impl ProtoDecode for ReqPcLoadingComplete {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            pc_id: buf.get_i32_le(),
        })
    }
}

/// Client → Server. Graceful logout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqPcExit {
    pub id: i32,
}

impl FixedSize for ReqPcExit {
    const SIZE: usize = 4;
}

impl ProtoDecode for ReqPcExit {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            id: buf.get_i32_le(),
        })
    }
}

/// Client → Server. Heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqLiveCheck {
    pub temp_value: i32,
}

impl FixedSize for ReqLiveCheck {
    const SIZE: usize = 4;
}

impl ProtoDecode for ReqLiveCheck {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            temp_value: buf.get_i32_le(),
        })
    }
}

/// Client → Server. Revive after death.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqPcRegen {
    pub regen_type: i32,
}

impl FixedSize for ReqPcRegen {
    const SIZE: usize = 4;
}

impl ProtoDecode for ReqPcRegen {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            regen_type: buf.get_i32_le(),
        })
    }
}

/// Server → Client. Character state sent once the session is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepPcEnterSucc {
    pub id: i32,
    pub server_time: u64,
    pub account_level: i32,
    pub hp: i32,
    pub level: i32,
    pub money: i32,
    pub fusion_matter: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub angle: i32,
    pub battery_n: i32,
    pub battery_w: i32,
}

impl ProtoEncode for RepPcEnterSucc {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.id);
        buf.put_u64_le(self.server_time);
        buf.put_i32_le(self.account_level);
        buf.put_i32_le(self.hp);
        buf.put_i32_le(self.level);
        buf.put_i32_le(self.money);
        buf.put_i32_le(self.fusion_matter);
        buf.put_i32_le(self.x);
        buf.put_i32_le(self.y);
        buf.put_i32_le(self.z);
        buf.put_i32_le(self.angle);
        buf.put_i32_le(self.battery_n);
        buf.put_i32_le(self.battery_w);
    }
}

/// Server → Client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepPcLoadingCompleteSucc {
    pub pc_id: i32,
}

impl ProtoEncode for RepPcLoadingCompleteSucc {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.pc_id);
    }
}

/// Server → Client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepPcExitSucc {
    pub id: i32,
    pub exit_code: i32,
}

impl ProtoEncode for RepPcExitSucc {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.id);
        buf.put_i32_le(self.exit_code);
    }
}

/// Server → Client. Sent to a session displaced by a second login of the
/// same character, right before it is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepPcExitDuplicate {
    pub error_code: i32,
}

impl ProtoEncode for RepPcExitDuplicate {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.error_code);
    }
}

/// Server → Client. Confirms a revive with the restored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepPcRegenSucc {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub hp: i32,
    pub fusion_matter: i32,
    pub nanos: [Nano; 3],
}

impl ProtoEncode for RepPcRegenSucc {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.x);
        buf.put_i32_le(self.y);
        buf.put_i32_le(self.z);
        buf.put_i32_le(self.hp);
        buf.put_i32_le(self.fusion_matter);
        for nano in &self.nanos {
            nano.proto_encode(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_fixed, encode_to_vec};

    #[test]
    fn enter_request_decodes() {
        let pkt = ReqPcEnter {
            serial_key: 0x1122_3344_5566,
            temp_value: 9,
        };
        let bytes = encode_to_vec(&pkt);
        assert_eq!(bytes.len(), ReqPcEnter::SIZE);
        let decoded: ReqPcEnter = decode_fixed(&bytes).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn enter_request_wrong_size_rejected() {
        let bytes = [0u8; 13];
        assert!(matches!(
            decode_fixed::<ReqPcEnter>(&bytes),
            Err(ProtoError::SizeMismatch {
                expected: 12,
                got: 13
            })
        ));
    }

    #[test]
    fn enter_succ_length() {
        let pkt = RepPcEnterSucc {
            id: 1,
            server_time: 0,
            account_level: 99,
            hp: 1000,
            level: 1,
            money: 0,
            fusion_matter: 0,
            x: 0,
            y: 0,
            z: 0,
            angle: 0,
            battery_n: 0,
            battery_w: 0,
        };
        assert_eq!(encode_to_vec(&pkt).len(), 56);
    }
}

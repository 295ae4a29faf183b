//! Movement and visibility: positions, appear and disappear notifications.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, FixedSize, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{NpcAppearance, PcAppearance, ShinyAppearance};

/// Client → Server. Player moved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReqPcMove {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub angle: i32,
    pub speed: i32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub key_value: u8,
    pub cli_time: u64,
}

impl FixedSize for ReqPcMove {
    const SIZE: usize = 41;
}

impl ProtoDecode for ReqPcMove {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            x: buf.get_i32_le(),
            y: buf.get_i32_le(),
            z: buf.get_i32_le(),
            angle: buf.get_i32_le(),
            speed: buf.get_i32_le(),
            vx: buf.get_f32_le(),
            vy: buf.get_f32_le(),
            vz: buf.get_f32_le(),
            key_value: buf.get_u8(),
            cli_time: buf.get_u64_le(),
        })
    }
}

impl ProtoEncode for ReqPcMove {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.x);
        buf.put_i32_le(self.y);
        buf.put_i32_le(self.z);
        buf.put_i32_le(self.angle);
        buf.put_i32_le(self.speed);
        buf.put_f32_le(self.vx);
        buf.put_f32_le(self.vy);
        buf.put_f32_le(self.vz);
        buf.put_u8(self.key_value);
        buf.put_u64_le(self.cli_time);
    }
}

/// Client → Server. Player stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqPcStop {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub cli_time: u64,
}

impl FixedSize for ReqPcStop {
    const SIZE: usize = 20;
}

impl ProtoDecode for ReqPcStop {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            x: buf.get_i32_le(),
            y: buf.get_i32_le(),
            z: buf.get_i32_le(),
            cli_time: buf.get_u64_le(),
        })
    }
}

/// Server → Client. Another player entered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcNew {
    pub appearance: PcAppearance,
}

impl ProtoEncode for PcNew {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.appearance.proto_encode(buf);
    }
}

/// Server → Client. Another player left view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcExit {
    pub pc_id: i32,
}

impl ProtoEncode for PcExit {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.pc_id);
    }
}

/// Server → Client. Relayed movement of another player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcMove {
    pub pc_id: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub angle: i32,
    pub speed: i32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub key_value: u8,
    pub cli_time: u64,
    pub svr_time: u64,
}

impl ProtoEncode for PcMove {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.pc_id);
        buf.put_i32_le(self.x);
        buf.put_i32_le(self.y);
        buf.put_i32_le(self.z);
        buf.put_i32_le(self.angle);
        buf.put_i32_le(self.speed);
        buf.put_f32_le(self.vx);
        buf.put_f32_le(self.vy);
        buf.put_f32_le(self.vz);
        buf.put_u8(self.key_value);
        buf.put_u64_le(self.cli_time);
        buf.put_u64_le(self.svr_time);
    }
}

/// Server → Client. Relayed stop of another player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcStop {
    pub pc_id: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub cli_time: u64,
    pub svr_time: u64,
}

impl ProtoEncode for PcStop {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.pc_id);
        buf.put_i32_le(self.x);
        buf.put_i32_le(self.y);
        buf.put_i32_le(self.z);
        buf.put_u64_le(self.cli_time);
        buf.put_u64_le(self.svr_time);
    }
}

/// Server → Client. NPC entered view (or respawned).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpcNew {
    pub appearance: NpcAppearance,
}

impl ProtoEncode for NpcNew {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.appearance.proto_encode(buf);
    }
}

/// Server → Client. NPC left view (or despawned).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpcExit {
    pub npc_id: i32,
}

impl ProtoEncode for NpcExit {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.npc_id);
    }
}

/// Server → Client. NPC walks toward a point at the given speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpcMove {
    pub npc_id: i32,
    pub to_x: i32,
    pub to_y: i32,
    pub to_z: i32,
    pub speed: i32,
}

impl ProtoEncode for NpcMove {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.npc_id);
        buf.put_i32_le(self.to_x);
        buf.put_i32_le(self.to_y);
        buf.put_i32_le(self.to_z);
        buf.put_i32_le(self.speed);
    }
}

/// Server → Client. Egg entered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShinyEnter {
    pub appearance: ShinyAppearance,
}

impl ProtoEncode for ShinyEnter {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.appearance.proto_encode(buf);
    }
}

/// Server → Client. Egg left view or was picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShinyExit {
    pub shiny_id: i32,
}

impl ProtoEncode for ShinyExit {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.shiny_id);
    }
}

//! Shared records embedded in shard packets.
//!
//! Every record is little-endian with no padding between fields.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, FixedSize, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Character status bits carried in `condition_bit_flag` fields.
pub mod condition {
    pub const UP_MOVE_SPEED: i32 = 0x1;
    pub const UP_SWIM_SPEED: i32 = 0x2;
    pub const UP_JUMP_HEIGHT: i32 = 0x4;
    pub const UP_STEALTH: i32 = 0x8;
    pub const PHOENIX: i32 = 0x10;
    pub const PROTECT_BATTERY: i32 = 0x20;
    pub const PROTECT_INFECTION: i32 = 0x40;
    /// Snare: halves movement speed.
    pub const DN_MOVE_SPEED: i32 = 0x80;
    pub const DN_ATTACK_SPEED: i32 = 0x100;
    pub const STUN: i32 = 0x200;
    pub const MEZ: i32 = 0x400;
    pub const KNOCKDOWN: i32 = 0x800;
    pub const MINIMAP_ENEMY: i32 = 0x1000;
    pub const MINIMAP_TREASURE: i32 = 0x2000;
    pub const REWARD_BLOB: i32 = 0x4000;
    pub const REWARD_CASH: i32 = 0x8000;
    pub const INFECTION: i32 = 0x10000;
    pub const FREEDOM: i32 = 0x20000;
    pub const INVULNERABLE: i32 = 0x80000;
    pub const HEAL: i32 = 0x800000;
}

/// Time-buff identifiers used by buff update and time-out packets.
pub mod time_buff {
    pub const NONE: i32 = 0;
    pub const UP_MOVE_SPEED: i32 = 1;
    pub const UP_SWIM_SPEED: i32 = 2;
    pub const UP_JUMP_HEIGHT: i32 = 3;
    pub const UP_STEALTH: i32 = 4;
    pub const PHOENIX: i32 = 5;
    pub const PROTECT_BATTERY: i32 = 6;
    pub const PROTECT_INFECTION: i32 = 7;
    pub const DN_MOVE_SPEED: i32 = 8;
    pub const DN_ATTACK_SPEED: i32 = 9;
    pub const STUN: i32 = 10;
    pub const MEZ: i32 = 11;
    pub const KNOCKDOWN: i32 = 12;
    pub const MINIMAP_ENEMY: i32 = 13;
    pub const MINIMAP_TREASURE: i32 = 14;
    pub const REWARD_BLOB: i32 = 15;
    pub const REWARD_CASH: i32 = 16;
    pub const INFECTION: i32 = 17;
}

// ---------------------------------------------------------------------------
// Appearances
// ---------------------------------------------------------------------------

/// Everything a client needs to draw an NPC or mob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NpcAppearance {
    pub npc_id: i32,
    pub npc_type: i32,
    pub hp: i32,
    pub condition_bit_flag: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub angle: i32,
    pub barker_type: i32,
}

impl FixedSize for NpcAppearance {
    const SIZE: usize = 36;
}

impl ProtoEncode for NpcAppearance {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.npc_id);
        buf.put_i32_le(self.npc_type);
        buf.put_i32_le(self.hp);
        buf.put_i32_le(self.condition_bit_flag);
        buf.put_i32_le(self.x);
        buf.put_i32_le(self.y);
        buf.put_i32_le(self.z);
        buf.put_i32_le(self.angle);
        buf.put_i32_le(self.barker_type);
    }
}

impl ProtoDecode for NpcAppearance {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            npc_id: buf.get_i32_le(),
            npc_type: buf.get_i32_le(),
            hp: buf.get_i32_le(),
            condition_bit_flag: buf.get_i32_le(),
            x: buf.get_i32_le(),
            y: buf.get_i32_le(),
            z: buf.get_i32_le(),
            angle: buf.get_i32_le(),
            barker_type: buf.get_i32_le(),
        })
    }
}

/// A pickup-able egg ("shiny").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShinyAppearance {
    pub shiny_id: i32,
    pub shiny_type: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl FixedSize for ShinyAppearance {
    const SIZE: usize = 20;
}

impl ProtoEncode for ShinyAppearance {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.shiny_id);
        buf.put_i32_le(self.shiny_type);
        buf.put_i32_le(self.x);
        buf.put_i32_le(self.y);
        buf.put_i32_le(self.z);
    }
}

/// Another player as seen by a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PcAppearance {
    pub pc_id: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub angle: i32,
    pub hp: i32,
    pub level: i32,
    pub condition_bit_flag: i32,
}

impl FixedSize for PcAppearance {
    const SIZE: usize = 32;
}

impl ProtoEncode for PcAppearance {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.pc_id);
        buf.put_i32_le(self.x);
        buf.put_i32_le(self.y);
        buf.put_i32_le(self.z);
        buf.put_i32_le(self.angle);
        buf.put_i32_le(self.hp);
        buf.put_i32_le(self.level);
        buf.put_i32_le(self.condition_bit_flag);
    }
}

impl ProtoDecode for PcAppearance {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            pc_id: buf.get_i32_le(),
            x: buf.get_i32_le(),
            y: buf.get_i32_le(),
            z: buf.get_i32_le(),
            angle: buf.get_i32_le(),
            hp: buf.get_i32_le(),
            level: buf.get_i32_le(),
            condition_bit_flag: buf.get_i32_le(),
        })
    }
}

// ---------------------------------------------------------------------------
// Combat records
// ---------------------------------------------------------------------------

/// Outcome of one hit against one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttackResult {
    pub id: i32,
    pub damage: i32,
    pub hp: i32,
    pub hit_flag: i8,
}

impl AttackResult {
    /// Plain hit, no critical or dodge.
    pub const HIT_NORMAL: i8 = 2;
}

impl FixedSize for AttackResult {
    const SIZE: usize = 13;
}

impl ProtoEncode for AttackResult {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.id);
        buf.put_i32_le(self.damage);
        buf.put_i32_le(self.hp);
        buf.put_i8(self.hit_flag);
    }
}

impl ProtoDecode for AttackResult {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(&*buf, Self::SIZE)?;
        Ok(Self {
            id: buf.get_i32_le(),
            damage: buf.get_i32_le(),
            hp: buf.get_i32_le(),
            hit_flag: buf.get_i8(),
        })
    }
}

/// Damage-over-time tick applied to a character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DotDamage {
    /// Entity class tag (1 = player).
    pub ect: i32,
    pub id: i32,
    pub damage: i32,
    pub hp: i32,
    pub stamina: i16,
}

impl FixedSize for DotDamage {
    const SIZE: usize = 18;
}

impl ProtoEncode for DotDamage {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.ect);
        buf.put_i32_le(self.id);
        buf.put_i32_le(self.damage);
        buf.put_i32_le(self.hp);
        buf.put_i16_le(self.stamina);
    }
}

/// Per-target result of a skill (egg effects use one target).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillResult {
    Damage { id: i32, damage: i32, hp: i32 },
    Heal { id: i32, heal: i32, hp: i32 },
    Buff { id: i32, condition_bit_flag: i32 },
}

impl SkillResult {
    fn tag(&self) -> u8 {
        match self {
            Self::Damage { .. } => 0,
            Self::Heal { .. } => 1,
            Self::Buff { .. } => 2,
        }
    }
}

impl ProtoEncode for SkillResult {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.tag());
        match *self {
            Self::Damage { id, damage, hp } => {
                buf.put_i32_le(id);
                buf.put_i32_le(damage);
                buf.put_i32_le(hp);
            }
            Self::Heal { id, heal, hp } => {
                buf.put_i32_le(id);
                buf.put_i32_le(heal);
                buf.put_i32_le(hp);
            }
            Self::Buff {
                id,
                condition_bit_flag,
            } => {
                buf.put_i32_le(id);
                buf.put_i32_le(condition_bit_flag);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Player records
// ---------------------------------------------------------------------------

/// Nano companion slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nano {
    pub id: i16,
    pub skill_id: i16,
    pub stamina: i16,
}

impl FixedSize for Nano {
    const SIZE: usize = 6;
}

impl ProtoEncode for Nano {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16_le(self.id);
        buf.put_i16_le(self.skill_id);
        buf.put_i16_le(self.stamina);
    }
}

/// Inventory item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemBase {
    pub item_type: i16,
    pub id: i16,
    pub opt: i32,
    pub time_limit: i32,
}

impl FixedSize for ItemBase {
    const SIZE: usize = 12;
}

impl ProtoEncode for ItemBase {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16_le(self.item_type);
        buf.put_i16_le(self.id);
        buf.put_i32_le(self.opt);
        buf.put_i32_le(self.time_limit);
    }
}

/// Item granted into a specific inventory slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemReward {
    pub item: ItemBase,
    pub slot_num: i32,
    pub location: i32,
}

impl FixedSize for ItemReward {
    const SIZE: usize = ItemBase::SIZE + 8;
}

impl ProtoEncode for ItemReward {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.item.proto_encode(buf);
        buf.put_i32_le(self.slot_num);
        buf.put_i32_le(self.location);
    }
}

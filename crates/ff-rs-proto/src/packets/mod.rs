//! Shard packet definitions.
//!
//! Inbound packets are collected in [`ClientPacket`], outbound ones in
//! [`ServerPacket`]. Fixed-size inbound packets are rejected unless the
//! payload length matches their layout exactly.

pub mod buff;
pub mod combat;
pub mod movement;
pub mod npc;
pub mod reward;
pub mod session;
pub mod warp;

pub use buff::{CharTimeBuffTimeOut, NpcSkillHit, PcBuffUpdate};
pub use combat::{
    CharTimeBuffTimeTick, NpcAttackPcs, PcAttackNpcs, PcRegen, RepPcAttackNpcsSucc, RepPcTick,
    ReqDotDamageOnOff, ReqPcAttackNpcs, ReqPcCombatBegin, ReqPcCombatEnd,
};
pub use movement::{
    NpcExit, NpcMove, NpcNew, PcExit, PcMove, PcNew, PcStop, ReqPcMove, ReqPcStop, ShinyEnter,
    ShinyExit,
};
pub use npc::{ReqNpcSummon, ReqNpcUnsummon, ReqShinyPickup, RepShinyPickupSucc};
pub use reward::RepRewardItem;
pub use session::{
    RepPcEnterSucc, RepPcExitDuplicate, RepPcExitSucc, RepPcLoadingCompleteSucc, RepPcRegenSucc,
    ReqLiveCheck, ReqPcEnter, ReqPcExit, ReqPcLoadingComplete, ReqPcRegen,
};
pub use warp::{InstanceMapInfo, RepPcGotoSucc, RepPcWarpUseNpcSucc, ReqPcWarpUseNpc};

use bytes::{BufMut, Bytes};

use crate::codec::{decode_fixed, encode_frame, ProtoEncode};
use crate::error::ProtoError;

/// Packet type IDs. Client requests live in `0x13xx_xxxx`, server packets in
/// `0x31xx_xxxx`.
pub mod id {
    pub const REQ_PC_ENTER: u32 = 0x1300_0001;
    pub const REQ_PC_EXIT: u32 = 0x1300_0002;
    pub const REQ_PC_MOVE: u32 = 0x1300_0003;
    pub const REQ_PC_STOP: u32 = 0x1300_0004;
    pub const REQ_PC_LOADING_COMPLETE: u32 = 0x1300_0005;
    pub const REQ_LIVE_CHECK: u32 = 0x1300_0006;
    pub const REQ_PC_REGEN: u32 = 0x1300_0007;
    pub const REQ_PC_ATTACK_NPCS: u32 = 0x1300_0010;
    pub const REQ_PC_COMBAT_BEGIN: u32 = 0x1300_0011;
    pub const REQ_PC_COMBAT_END: u32 = 0x1300_0012;
    pub const REQ_DOT_DAMAGE_ONOFF: u32 = 0x1300_0013;
    pub const REQ_NPC_SUMMON: u32 = 0x1300_0020;
    pub const REQ_NPC_UNSUMMON: u32 = 0x1300_0021;
    pub const REQ_SHINY_PICKUP: u32 = 0x1300_0030;
    pub const REQ_PC_WARP_USE_NPC: u32 = 0x1300_0040;

    pub const REP_PC_ENTER_SUCC: u32 = 0x3100_0001;
    pub const REP_PC_EXIT_SUCC: u32 = 0x3100_0002;
    pub const REP_PC_LOADING_COMPLETE_SUCC: u32 = 0x3100_0003;
    pub const REP_PC_REGEN_SUCC: u32 = 0x3100_0004;
    pub const REP_PC_EXIT_DUPLICATE: u32 = 0x3100_0005;
    pub const PC_NEW: u32 = 0x3100_0010;
    pub const PC_EXIT: u32 = 0x3100_0011;
    pub const PC_MOVE: u32 = 0x3100_0012;
    pub const PC_STOP: u32 = 0x3100_0013;
    pub const PC_REGEN: u32 = 0x3100_0014;
    pub const NPC_NEW: u32 = 0x3100_0020;
    pub const NPC_EXIT: u32 = 0x3100_0021;
    pub const NPC_MOVE: u32 = 0x3100_0022;
    pub const SHINY_ENTER: u32 = 0x3100_0023;
    pub const SHINY_EXIT: u32 = 0x3100_0024;
    pub const REP_PC_ATTACK_NPCS_SUCC: u32 = 0x3100_0030;
    pub const PC_ATTACK_NPCS: u32 = 0x3100_0031;
    pub const NPC_ATTACK_PCS: u32 = 0x3100_0032;
    pub const CHAR_TIME_BUFF_TIME_TICK: u32 = 0x3100_0033;
    pub const REP_PC_TICK: u32 = 0x3100_0034;
    pub const REP_REWARD_ITEM: u32 = 0x3100_0040;
    pub const PC_BUFF_UPDATE: u32 = 0x3100_0050;
    pub const CHAR_TIME_BUFF_TIME_OUT: u32 = 0x3100_0051;
    pub const NPC_SKILL_HIT: u32 = 0x3100_0052;
    pub const REP_SHINY_PICKUP_SUCC: u32 = 0x3100_0053;
    pub const REP_PC_WARP_USE_NPC_SUCC: u32 = 0x3100_0060;
    pub const INSTANCE_MAP_INFO: u32 = 0x3100_0061;
    pub const REP_PC_GOTO_SUCC: u32 = 0x3100_0062;
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientPacket {
    PcEnter(ReqPcEnter),
    PcExit(ReqPcExit),
    PcMove(ReqPcMove),
    PcStop(ReqPcStop),
    PcLoadingComplete(ReqPcLoadingComplete),
    LiveCheck(ReqLiveCheck),
    PcRegen(ReqPcRegen),
    PcAttackNpcs(ReqPcAttackNpcs),
    PcCombatBegin(ReqPcCombatBegin),
    PcCombatEnd(ReqPcCombatEnd),
    DotDamageOnOff(ReqDotDamageOnOff),
    NpcSummon(ReqNpcSummon),
    NpcUnsummon(ReqNpcUnsummon),
    ShinyPickup(ReqShinyPickup),
    PcWarpUseNpc(ReqPcWarpUseNpc),
}

impl ClientPacket {
    /// Decode a request payload by packet type, validating its size.
    pub fn decode(packet_type: u32, payload: &[u8]) -> Result<Self, ProtoError> {
        Ok(match packet_type {
            id::REQ_PC_ENTER => Self::PcEnter(decode_fixed(payload)?),
            id::REQ_PC_EXIT => Self::PcExit(decode_fixed(payload)?),
            id::REQ_PC_MOVE => Self::PcMove(decode_fixed(payload)?),
            id::REQ_PC_STOP => Self::PcStop(decode_fixed(payload)?),
            id::REQ_PC_LOADING_COMPLETE => Self::PcLoadingComplete(decode_fixed(payload)?),
            id::REQ_LIVE_CHECK => Self::LiveCheck(decode_fixed(payload)?),
            id::REQ_PC_REGEN => Self::PcRegen(decode_fixed(payload)?),
            id::REQ_PC_ATTACK_NPCS => Self::PcAttackNpcs(ReqPcAttackNpcs::decode_payload(payload)?),
            id::REQ_PC_COMBAT_BEGIN => Self::PcCombatBegin(decode_fixed(payload)?),
            id::REQ_PC_COMBAT_END => Self::PcCombatEnd(decode_fixed(payload)?),
            id::REQ_DOT_DAMAGE_ONOFF => Self::DotDamageOnOff(decode_fixed(payload)?),
            id::REQ_NPC_SUMMON => Self::NpcSummon(decode_fixed(payload)?),
            id::REQ_NPC_UNSUMMON => Self::NpcUnsummon(decode_fixed(payload)?),
            id::REQ_SHINY_PICKUP => Self::ShinyPickup(decode_fixed(payload)?),
            id::REQ_PC_WARP_USE_NPC => Self::PcWarpUseNpc(decode_fixed(payload)?),
            other => return Err(ProtoError::UnknownPacketId(other)),
        })
    }
}

macro_rules! server_packets {
    ($($variant:ident($ty:ty) => $id:path),* $(,)?) => {
        /// An outbound packet, tagged with its type ID when framed.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ServerPacket {
            $($variant($ty),)*
        }

        impl ServerPacket {
            /// Packet type ID written into the frame header.
            pub fn packet_id(&self) -> u32 {
                match self {
                    $(Self::$variant(_) => $id,)*
                }
            }

            /// Encode as a complete length-prefixed frame.
            pub fn to_frame(&self) -> Result<Bytes, ProtoError> {
                encode_frame(self.packet_id(), self)
            }
        }

        impl ProtoEncode for ServerPacket {
            fn proto_encode(&self, buf: &mut impl BufMut) {
                match self {
                    $(Self::$variant(pkt) => pkt.proto_encode(buf),)*
                }
            }
        }

        $(
            impl From<$ty> for ServerPacket {
                fn from(pkt: $ty) -> Self {
                    Self::$variant(pkt)
                }
            }
        )*
    };
}

server_packets! {
    PcEnterSucc(RepPcEnterSucc) => id::REP_PC_ENTER_SUCC,
    PcExitSucc(RepPcExitSucc) => id::REP_PC_EXIT_SUCC,
    PcLoadingCompleteSucc(RepPcLoadingCompleteSucc) => id::REP_PC_LOADING_COMPLETE_SUCC,
    PcRegenSucc(RepPcRegenSucc) => id::REP_PC_REGEN_SUCC,
    PcExitDuplicate(RepPcExitDuplicate) => id::REP_PC_EXIT_DUPLICATE,
    PcNew(PcNew) => id::PC_NEW,
    PcExit(PcExit) => id::PC_EXIT,
    PcMove(PcMove) => id::PC_MOVE,
    PcStop(PcStop) => id::PC_STOP,
    PcRegen(PcRegen) => id::PC_REGEN,
    NpcNew(NpcNew) => id::NPC_NEW,
    NpcExit(NpcExit) => id::NPC_EXIT,
    NpcMove(NpcMove) => id::NPC_MOVE,
    ShinyEnter(ShinyEnter) => id::SHINY_ENTER,
    ShinyExit(ShinyExit) => id::SHINY_EXIT,
    PcAttackNpcsSucc(RepPcAttackNpcsSucc) => id::REP_PC_ATTACK_NPCS_SUCC,
    PcAttackNpcs(PcAttackNpcs) => id::PC_ATTACK_NPCS,
    NpcAttackPcs(NpcAttackPcs) => id::NPC_ATTACK_PCS,
    CharTimeBuffTimeTick(CharTimeBuffTimeTick) => id::CHAR_TIME_BUFF_TIME_TICK,
    PcTick(RepPcTick) => id::REP_PC_TICK,
    RewardItem(RepRewardItem) => id::REP_REWARD_ITEM,
    PcBuffUpdate(PcBuffUpdate) => id::PC_BUFF_UPDATE,
    CharTimeBuffTimeOut(CharTimeBuffTimeOut) => id::CHAR_TIME_BUFF_TIME_OUT,
    NpcSkillHit(NpcSkillHit) => id::NPC_SKILL_HIT,
    ShinyPickupSucc(RepShinyPickupSucc) => id::REP_SHINY_PICKUP_SUCC,
    PcWarpUseNpcSucc(RepPcWarpUseNpcSucc) => id::REP_PC_WARP_USE_NPC_SUCC,
    InstanceMapInfo(InstanceMapInfo) => id::INSTANCE_MAP_INFO,
    PcGotoSucc(RepPcGotoSucc) => id::REP_PC_GOTO_SUCC,
}

//! NPC records: plain NPCs, mobs and eggs share one base.

use std::fmt;

use ff_rs_proto::packets::{NpcExit, NpcMove, NpcNew, ServerPacket, ShinyEnter, ShinyExit};
use ff_rs_proto::types::{NpcAppearance, ShinyAppearance};

use crate::ai::mob::{Mob, MobState};
use crate::chunk::{ChunkPos, ViewSet};
use crate::egg::Egg;

/// Registry-assigned NPC id. Positive and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NpcId(pub i32);

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "npc#{}", self.0)
    }
}

/// Health given to NPCs that are not mobs.
pub const NPC_BASE_HP: i32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcClass {
    Plain,
    Mob,
    Egg,
}

#[derive(Debug, Clone)]
pub enum NpcKind {
    Plain,
    Mob(Box<Mob>),
    Egg(Egg),
}

#[derive(Debug, Clone)]
pub struct Npc {
    pub id: NpcId,
    pub type_id: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub angle: i32,
    pub instance: u64,
    /// Home chunk; `None` until first placed.
    pub chunk: Option<ChunkPos>,
    pub viewable: ViewSet,
    pub hp: i32,
    pub condition_flags: i32,
    pub barker_type: i32,
    /// Created at runtime rather than from world content; never respawns.
    pub summoned: bool,
    pub kind: NpcKind,
}

impl Npc {
    pub fn new(id: NpcId, type_id: i32, x: i32, y: i32, z: i32, instance: u64) -> Self {
        Self {
            id,
            type_id,
            x,
            y,
            z,
            angle: 0,
            instance,
            chunk: None,
            viewable: ViewSet::new(),
            hp: NPC_BASE_HP,
            condition_flags: 0,
            barker_type: 0,
            summoned: false,
            kind: NpcKind::Plain,
        }
    }

    pub fn class(&self) -> NpcClass {
        match self.kind {
            NpcKind::Plain => NpcClass::Plain,
            NpcKind::Mob(_) => NpcClass::Mob,
            NpcKind::Egg(_) => NpcClass::Egg,
        }
    }

    pub fn mob(&self) -> Option<&Mob> {
        match &self.kind {
            NpcKind::Mob(mob) => Some(&**mob),
            _ => None,
        }
    }

    pub fn mob_mut(&mut self) -> Option<&mut Mob> {
        match &mut self.kind {
            NpcKind::Mob(mob) => Some(&mut **mob),
            _ => None,
        }
    }

    pub fn egg(&self) -> Option<&Egg> {
        match &self.kind {
            NpcKind::Egg(egg) => Some(egg),
            _ => None,
        }
    }

    pub fn egg_mut(&mut self) -> Option<&mut Egg> {
        match &mut self.kind {
            NpcKind::Egg(egg) => Some(egg),
            _ => None,
        }
    }

    /// Whether clients should currently be able to see this NPC.
    pub fn is_visible(&self) -> bool {
        match &self.kind {
            NpcKind::Plain => true,
            NpcKind::Mob(mob) => !(mob.state == MobState::Dead && mob.despawned),
            NpcKind::Egg(egg) => !egg.dead,
        }
    }

    pub fn appearance(&self) -> NpcAppearance {
        NpcAppearance {
            npc_id: self.id.0,
            npc_type: self.type_id,
            hp: self.hp,
            condition_bit_flag: self.condition_flags,
            x: self.x,
            y: self.y,
            z: self.z,
            angle: self.angle,
            barker_type: self.barker_type,
        }
    }

    pub fn appear_packet(&self) -> ServerPacket {
        match self.kind {
            NpcKind::Egg(_) => ShinyEnter {
                appearance: ShinyAppearance {
                    shiny_id: self.id.0,
                    shiny_type: self.type_id,
                    x: self.x,
                    y: self.y,
                    z: self.z,
                },
            }
            .into(),
            _ => NpcNew {
                appearance: self.appearance(),
            }
            .into(),
        }
    }

    pub fn disappear_packet(&self) -> ServerPacket {
        match self.kind {
            NpcKind::Egg(_) => ShinyExit { shiny_id: self.id.0 }.into(),
            _ => NpcExit { npc_id: self.id.0 }.into(),
        }
    }

    pub fn move_packet(&self, speed: i32) -> ServerPacket {
        NpcMove {
            npc_id: self.id.0,
            to_x: self.x,
            to_y: self.y,
            to_z: self.z,
            speed,
        }
        .into()
    }
}

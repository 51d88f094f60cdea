//! Room and sector spatial model.
//!
//! The animation core only *consumes* this structure: it looks up which room
//! and sector a position falls in, checks room overlap when deciding whether
//! to re-register an entity, and reads sector hazard/climb/material flags.
//! Geometry construction belongs to the level loader.

use bevy_ecs::prelude::{Entity, Resource};
use glam::Vec3;
use serde::{Deserialize, Serialize};

pub type RoomId = u32;

/// Sector address: owning room plus index into that room's sector list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectorId {
    pub room: RoomId,
    pub index: usize,
}

/// Engine data revision; a few footstep sounds are gated on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EngineVersion {
    Three,
    #[default]
    Four,
    Five,
}

/// Floor material driving footstep sound selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorMaterial {
    Mud,
    Snow,
    Sand,
    Gravel,
    Ice,
    Water,
    Stone,
    Wood,
    Metal,
    Marble,
    Grass,
    Concrete,
    OldWood,
    OldMetal,
}

/// Per-sector flag bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorFlags(pub u16);

impl SectorFlags {
    pub const CLIMB_NORTH: SectorFlags = SectorFlags(0x0001);
    pub const CLIMB_EAST: SectorFlags = SectorFlags(0x0002);
    pub const CLIMB_SOUTH: SectorFlags = SectorFlags(0x0004);
    pub const CLIMB_WEST: SectorFlags = SectorFlags(0x0008);
    pub const CLIMB_CEILING: SectorFlags = SectorFlags(0x0010);
    /// Instant-death zone for entities travelling through a medium.
    pub const DEATH: SectorFlags = SectorFlags(0x0020);

    pub const CLIMB_ANY_WALL: SectorFlags = SectorFlags(0x000F);

    pub fn contains(self, other: SectorFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// One floor cell of a room. `above`/`below` chain vertically stacked
/// sectors across rooms for ceiling-climb resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sector {
    pub owner_room: RoomId,
    /// XY footprint, world units.
    pub min: [f32; 2],
    pub max: [f32; 2],
    pub material: SectorMaterial,
    #[serde(default)]
    pub flags: SectorFlags,
    #[serde(default)]
    pub trigger_index: Option<u32>,
    #[serde(default)]
    pub above: Option<SectorId>,
    #[serde(default)]
    pub below: Option<SectorId>,
}

impl Sector {
    fn contains_xy(&self, pos: Vec3) -> bool {
        pos.x >= self.min[0] && pos.x < self.max[0] && pos.y >= self.min[1] && pos.y < self.max[1]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Z slab of the room, world units.
    pub z_min: f32,
    pub z_max: f32,
    /// Rooms sharing open portals with this one; an entity crossing into an
    /// overlapped room keeps its old registration.
    #[serde(default)]
    pub overlaps: Vec<RoomId>,
    #[serde(default)]
    pub quicksand: bool,
    #[serde(default)]
    pub sectors: Vec<Sector>,
    /// Entities registered in this room. Runtime only.
    #[serde(skip)]
    pub entities: Vec<Entity>,
}

impl Room {
    fn contains(&self, pos: Vec3) -> bool {
        pos.z >= self.z_min
            && pos.z < self.z_max
            && self.sectors.iter().any(|s| s.contains_xy(pos))
    }
}

/// The world's room graph plus the data revision.
#[derive(Resource, Debug, Default)]
pub struct WorldMap {
    pub rooms: Vec<Room>,
    pub version: EngineVersion,
}

impl WorldMap {
    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.id == id)
    }

    /// Find the room containing `pos`, preferring the hinted room and its
    /// overlap neighbourhood before falling back to a full scan.
    pub fn find_room(&self, pos: Vec3, hint: Option<RoomId>) -> Option<RoomId> {
        if let Some(hint_id) = hint {
            if let Some(room) = self.room(hint_id) {
                if room.contains(pos) {
                    return Some(hint_id);
                }
                for &nid in &room.overlaps {
                    if self.room(nid).is_some_and(|r| r.contains(pos)) {
                        return Some(nid);
                    }
                }
            }
        }
        self.rooms.iter().find(|r| r.contains(pos)).map(|r| r.id)
    }

    /// Sector of `room` under `pos`, by XY footprint.
    pub fn sector_at(&self, room: RoomId, pos: Vec3) -> Option<SectorId> {
        let r = self.room(room)?;
        r.sectors
            .iter()
            .position(|s| s.contains_xy(pos))
            .map(|index| SectorId { room, index })
    }

    pub fn sector(&self, id: SectorId) -> Option<&Sector> {
        self.room(id.room)?.sectors.get(id.index)
    }

    pub fn rooms_overlap(&self, a: RoomId, b: RoomId) -> bool {
        self.room(a)
            .map(|r| r.overlaps.contains(&b))
            .unwrap_or(false)
            || self
                .room(b)
                .map(|r| r.overlaps.contains(&a))
                .unwrap_or(false)
    }

    pub fn add_entity(&mut self, room: RoomId, entity: Entity) {
        if let Some(r) = self.room_mut(room) {
            if !r.entities.contains(&entity) {
                r.entities.push(entity);
            }
        }
    }

    pub fn remove_entity(&mut self, room: RoomId, entity: Entity) {
        if let Some(r) = self.room_mut(room) {
            r.entities.retain(|&e| e != entity);
        }
    }

    /// Whether any sector in the vertical chain starting at `id` (walking
    /// `above` links, then `below` links if nothing was found) is
    /// ceiling-climbable.
    pub fn ceiling_climbable(&self, id: SectorId) -> bool {
        let mut cursor = Some(id);
        while let Some(sid) = cursor {
            let Some(sector) = self.sector(sid) else { break };
            if sector.flags.contains(SectorFlags::CLIMB_CEILING) {
                return true;
            }
            cursor = sector.above;
        }
        cursor = self.sector(id).and_then(|s| s.below);
        while let Some(sid) = cursor {
            let Some(sector) = self.sector(sid) else { break };
            if sector.flags.contains(SectorFlags::CLIMB_CEILING) {
                return true;
            }
            cursor = sector.below;
        }
        false
    }
}

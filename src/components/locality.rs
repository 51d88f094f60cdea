//! Spatial placement back-references.

use bevy_ecs::prelude::Component;

use crate::resources::worldmap::{RoomId, SectorId};

/// Where the entity currently sits in the room/sector graph. These are
/// back-references only; rooms own their entity sets in
/// [`WorldMap`](crate::resources::worldmap::WorldMap).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Locality {
    pub room: Option<RoomId>,
    pub sector: Option<SectorId>,
    pub last_sector: Option<SectorId>,
    /// Transient per-sector flag, reset whenever the sector changes. Host
    /// systems use it to run once-per-sector logic.
    pub sector_status: bool,
}

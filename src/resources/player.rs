//! Player-controlled entity reference.
//!
//! A handful of behaviours need to know which entity the player controls:
//! screen-shake falloff is measured from it, and it keeps its room
//! registration across room changes (the host moves it explicitly). Passed
//! as an explicit resource rather than an engine-wide global.

use bevy_ecs::prelude::{Entity, Resource};

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PlayerRef(pub Option<Entity>);

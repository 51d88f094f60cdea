//! Per-bone kinematic physics proxy handles.

use bevy_ecs::prelude::Component;
use smallvec::SmallVec;

use crate::resources::physicsworld::BodyHandle;

/// Handles of the kinematic bodies mirroring this entity's bones. Built
/// lazily on the first collision enable; bones without a collision shape
/// keep a `None` slot so indices stay aligned with the skeleton.
#[derive(Component, Debug, Clone, Default)]
pub struct PhysicsProxies {
    pub bodies: SmallVec<[Option<BodyHandle>; 8]>,
    /// Whether proxies should currently be members of the physics world.
    pub collidable: bool,
}

impl PhysicsProxies {
    pub fn is_built(&self) -> bool {
        !self.bodies.is_empty()
    }
}

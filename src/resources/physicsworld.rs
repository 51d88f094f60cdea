//! Kinematic physics body registry.
//!
//! An opaque stand-in for the physics engine's dynamics world, exposing only
//! the contract the animation core needs: create/destroy bodies, toggle
//! world membership, and push authoritative transforms into kinematic
//! proxies. Broad-phase and collision response live outside this crate.

use bevy_ecs::prelude::Resource;
use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::resources::modelstore::CollisionShapeDesc;

pub const COLLISION_GROUP_KINEMATIC: u16 = 0x0004;
pub const COLLISION_MASK_ALL: u16 = 0xFFFF;

/// Opaque handle to a registered body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(u64);

/// A body whose transform is driven externally, never by simulated forces.
#[derive(Debug, Clone)]
pub struct KinematicBody {
    pub shape: CollisionShapeDesc,
    pub transform: Mat4,
    pub group: u16,
    pub mask: u16,
    in_world: bool,
}

#[derive(Resource, Debug, Default)]
pub struct PhysicsWorld {
    bodies: FxHashMap<u64, KinematicBody>,
    next_handle: u64,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body and add it to the world immediately.
    pub fn create_body(
        &mut self,
        shape: CollisionShapeDesc,
        transform: Mat4,
        group: u16,
        mask: u16,
    ) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(
            handle.0,
            KinematicBody {
                shape,
                transform,
                group,
                mask,
                in_world: true,
            },
        );
        handle
    }

    pub fn destroy_body(&mut self, handle: BodyHandle) {
        self.bodies.remove(&handle.0);
    }

    pub fn is_in_world(&self, handle: BodyHandle) -> bool {
        self.bodies.get(&handle.0).is_some_and(|b| b.in_world)
    }

    /// Add the body to the world. No-op when already a member, so a bone can
    /// never gain two simultaneous memberships.
    pub fn add_to_world(&mut self, handle: BodyHandle) {
        if let Some(body) = self.bodies.get_mut(&handle.0) {
            body.in_world = true;
        }
    }

    /// Remove the body from the world without destroying it; re-adding is
    /// cheap.
    pub fn remove_from_world(&mut self, handle: BodyHandle) {
        if let Some(body) = self.bodies.get_mut(&handle.0) {
            body.in_world = false;
        }
    }

    /// Push an authoritative transform into a kinematic proxy.
    pub fn set_transform(&mut self, handle: BodyHandle, transform: Mat4) {
        if let Some(body) = self.bodies.get_mut(&handle.0) {
            body.transform = transform;
        }
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&KinematicBody> {
        self.bodies.get(&handle.0)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn unit_shape() -> CollisionShapeDesc {
        CollisionShapeDesc {
            half_extents: Vec3::ONE,
        }
    }

    #[test]
    fn membership_toggles_without_destroying() {
        let mut world = PhysicsWorld::new();
        let h = world.create_body(
            unit_shape(),
            Mat4::IDENTITY,
            COLLISION_GROUP_KINEMATIC,
            COLLISION_MASK_ALL,
        );
        assert!(world.is_in_world(h));
        world.remove_from_world(h);
        assert!(!world.is_in_world(h));
        assert_eq!(world.body_count(), 1);
        world.add_to_world(h);
        world.add_to_world(h); // idempotent
        assert!(world.is_in_world(h));
    }

    #[test]
    fn destroyed_body_is_gone() {
        let mut world = PhysicsWorld::new();
        let h = world.create_body(
            unit_shape(),
            Mat4::IDENTITY,
            COLLISION_GROUP_KINEMATIC,
            COLLISION_MASK_ALL,
        );
        world.destroy_body(h);
        assert!(!world.is_in_world(h));
        assert!(world.body(h).is_none());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn set_transform_updates_proxy() {
        let mut world = PhysicsWorld::new();
        let h = world.create_body(
            unit_shape(),
            Mat4::IDENTITY,
            COLLISION_GROUP_KINEMATIC,
            COLLISION_MASK_ALL,
        );
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        world.set_transform(h, m);
        assert_eq!(world.body(h).unwrap().transform, m);
    }
}

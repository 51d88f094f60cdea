//! Rigid-body synchronizer.
//!
//! Mirrors solved bone transforms into kinematic physics proxies, one body
//! per bone that carries a collision shape. Proxies are built lazily on the
//! first collision enable and live until the entity is destroyed; collision
//! and entity enable toggles only flip world membership.

use bevy_ecs::prelude::*;
use glam::Mat4;

use crate::components::boneframe::BoneFrame;
use crate::components::physicsproxy::PhysicsProxies;
use crate::components::status::EntityStatus;
use crate::components::transform::Transform;
use crate::resources::modelstore::{ModelStore, SkeletalModel};
use crate::resources::physicsworld::{
    COLLISION_GROUP_KINEMATIC, COLLISION_MASK_ALL, PhysicsWorld,
};

fn bone_world_matrix(transform: &Transform, bf: &BoneFrame, index: usize) -> Mat4 {
    transform.matrix * bf.base.bones[index].world
}

/// Create the per-bone bodies for an entity. Bones without a shape keep a
/// `None` slot so body indices track bone indices.
fn build_proxies(
    proxies: &mut PhysicsProxies,
    model: &SkeletalModel,
    bf: &BoneFrame,
    transform: &Transform,
    physics: &mut PhysicsWorld,
) {
    proxies.bodies.clear();
    for (i, bone) in model.bones.iter().enumerate() {
        let handle = bone.shape.map(|shape| {
            physics.create_body(
                shape,
                bone_world_matrix(transform, bf, i),
                COLLISION_GROUP_KINEMATIC,
                COLLISION_MASK_ALL,
            )
        });
        proxies.bodies.push(handle);
    }
}

/// Turn collision on, building the proxies on first use.
pub fn enable_collision(
    proxies: &mut PhysicsProxies,
    model: &SkeletalModel,
    bf: &BoneFrame,
    transform: &Transform,
    physics: &mut PhysicsWorld,
) {
    proxies.collidable = true;
    if !proxies.is_built() {
        build_proxies(proxies, model, bf, transform, physics);
        return;
    }
    for handle in proxies.bodies.iter().flatten() {
        if !physics.is_in_world(*handle) {
            physics.add_to_world(*handle);
        }
    }
}

/// Turn collision off. Bodies stay registered so re-enabling is cheap.
pub fn disable_collision(proxies: &mut PhysicsProxies, physics: &mut PhysicsWorld) {
    proxies.collidable = false;
    for handle in proxies.bodies.iter().flatten() {
        if physics.is_in_world(*handle) {
            physics.remove_from_world(*handle);
        }
    }
}

/// Bring a disabled entity back: restore its flags and re-add its bodies.
pub fn enable_entity(
    status: &mut EntityStatus,
    proxies: &mut PhysicsProxies,
    physics: &mut PhysicsWorld,
) {
    if status.enabled {
        return;
    }
    for handle in proxies.bodies.iter().flatten() {
        if !physics.is_in_world(*handle) {
            physics.add_to_world(*handle);
        }
    }
    status.enable();
}

/// Park an entity: pull its bodies out of the world and clear its flags.
pub fn disable_entity(
    status: &mut EntityStatus,
    proxies: &mut PhysicsProxies,
    physics: &mut PhysicsWorld,
) {
    if !status.enabled {
        return;
    }
    for handle in proxies.bodies.iter().flatten() {
        if physics.is_in_world(*handle) {
            physics.remove_from_world(*handle);
        }
    }
    status.disable();
}

/// Tear the proxies down for good, on entity destruction.
pub fn destroy_proxies(proxies: &mut PhysicsProxies, physics: &mut PhysicsWorld) {
    for handle in proxies.bodies.drain(..).flatten() {
        physics.destroy_body(handle);
    }
    proxies.collidable = false;
}

/// Push this tick's solved bone matrices into the kinematic proxies. Static
/// models never animate, so their proxies keep the transform they were built
/// with.
pub fn sync_rigid_bodies(
    mut query: Query<(&BoneFrame, &Transform, &mut PhysicsProxies)>,
    store: Res<ModelStore>,
    mut physics: ResMut<PhysicsWorld>,
) {
    for (bf, transform, proxies) in query.iter_mut() {
        if !proxies.is_built() || !proxies.collidable {
            continue;
        }
        if store.get(bf.base.model).is_none_or(|m| m.is_static()) {
            continue;
        }
        for (i, handle) in proxies.bodies.iter().enumerate() {
            if let Some(handle) = handle
                && i < bf.base.bones.len()
            {
                physics.set_transform(*handle, bone_world_matrix(transform, bf, i));
            }
        }
    }
}

//! Pose solver.
//!
//! Turns a [`BoneFrame`]'s playback cursors into world-space bone matrices:
//! interpolates bounds and per-bone rotations between the current and next
//! keyframe, lets overlay layers replace individual bones, then composes the
//! hierarchy with an explicit matrix stack driven by each bone's pop/push
//! flags. The result is deterministic for a given cursor state and overlay
//! chain.

use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};
use log::warn;
use smallvec::SmallVec;

use crate::components::boneframe::BoneFrame;
use crate::components::status::EntityStatus;
use crate::components::transform::Transform;
use crate::resources::modelstore::{Frame, FrameFlags, ModelStore, SkeletalModel};

/// Solve every enabled entity's pose. Runs after the state machines have
/// settled the frame cursors for this tick.
pub fn update_poses(
    mut query: Query<(&mut BoneFrame, &Transform, &EntityStatus)>,
    store: Res<ModelStore>,
) {
    for (mut bf, transform, status) in query.iter_mut() {
        if !status.enabled {
            continue;
        }
        solve_pose(&mut bf, &store, transform);
    }
}

fn layer_frames<'a>(
    model: &'a SkeletalModel,
    current_animation: u16,
    current_frame: u16,
    next_animation: u16,
    next_frame: u16,
) -> Option<(&'a Frame, &'a Frame)> {
    let curr = model
        .animation(current_animation)?
        .frames
        .get(current_frame as usize)?;
    let next = model
        .animation(next_animation)?
        .frames
        .get(next_frame as usize)?;
    Some((curr, next))
}

/// Compute the interpolated pose and world-space bone matrices for the main
/// layer of `bf`. The entity transform is only used to rotate a root-motion
/// command delta into the same coordinate frame the source frames use.
pub fn solve_pose(bf: &mut BoneFrame, store: &ModelStore, transform: &Transform) {
    let BoneFrame { base, overlays, .. } = bf;
    let Some(model) = store.get(base.model) else {
        warn!("pose solve skipped: model {} not registered", base.model);
        return;
    };
    let Some((curr, next)) = layer_frames(
        model,
        base.current_animation,
        base.current_frame,
        base.next_animation,
        base.next_frame,
    ) else {
        warn!(
            "pose solve skipped: cursor out of range (model {}, anim {}/{})",
            base.model, base.current_animation, base.next_animation
        );
        return;
    };

    let bone_count = base.bones.len();
    if curr.offsets.len() < bone_count
        || curr.rotations.len() < bone_count
        || next.offsets.len() < bone_count
        || next.rotations.len() < bone_count
    {
        warn!("pose solve skipped: frame bone data shorter than skeleton");
        return;
    }

    let lerp = base.lerp;
    let t = 1.0 - lerp;

    // Root-motion commands feed into the interpolated outputs scaled by the
    // blend factor, so the translation ramps in instead of snapping.
    let cmd_tr = if curr.flags.contains(FrameFlags::MOVE) {
        transform.rotate_vector(curr.move_delta) * lerp
    } else {
        Vec3::ZERO
    };

    base.bb_max = curr.bb_max * t + next.bb_max * lerp + cmd_tr;
    base.bb_min = curr.bb_min * t + next.bb_min * lerp + cmd_tr;
    base.centre = curr.centre * t + next.centre * lerp + cmd_tr;
    base.pos = curr.root_shift * t + next.root_shift * lerp + cmd_tr;

    for k in 0..bone_count {
        let offset = curr.offsets[k] * t + next.offsets[k] * lerp;
        let mut translation = offset;
        let rotation;
        if k == 0 {
            let target = if next.flags.contains(FrameFlags::CHANGE_DIRECTION) {
                // An about-face frame: the target rotation is the 180-degree
                // axis swap of the raw keyframe rotation, and the root shift
                // is compensated instead of applied.
                let q = next.rotations[0];
                translation.x -= base.pos.x;
                translation.y -= base.pos.y;
                translation.z += base.pos.z;
                Quat::from_xyzw(-q.y, q.x, q.w, -q.z)
            } else {
                translation += base.pos;
                next.rotations[0]
            };
            rotation = curr.rotations[0].slerp(target, lerp);
        } else {
            let mut src = curr.rotations[k];
            let mut dst = next.rotations[k];
            let mut weight = lerp;
            for overlay in overlays.iter() {
                let Some(ov_model) = store.get(overlay.model) else {
                    continue;
                };
                if !ov_model.bones.get(k).is_some_and(|b| b.replace_overlay) {
                    continue;
                }
                if let Some((ov_curr, ov_next)) = layer_frames(
                    ov_model,
                    overlay.current_animation,
                    overlay.current_frame,
                    overlay.next_animation,
                    overlay.next_frame,
                ) {
                    if let (Some(s), Some(d)) = (ov_curr.rotations.get(k), ov_next.rotations.get(k))
                    {
                        src = *s;
                        dst = *d;
                        weight = overlay.lerp;
                    }
                }
                break; // first matching overlay in the chain wins
            }
            rotation = src.slerp(dst, weight);
        }
        let tag = &mut base.bones[k];
        tag.offset = offset;
        tag.rotation = rotation;
        tag.local = Mat4::from_rotation_translation(rotation, translation);
    }

    compose_hierarchy(base);
}

/// Walk the bones in storage order, maintaining an explicit matrix stack.
/// `pop` discards the stack top before combining, `push` duplicates it so
/// later siblings reuse the same parent frame. The stack never outgrows the
/// bone count.
fn compose_hierarchy(base: &mut crate::components::boneframe::SkeletonPose) {
    let bone_count = base.bones.len();
    if bone_count == 0 {
        return;
    }
    let mut stack: SmallVec<[Mat4; 32]> = SmallVec::with_capacity(bone_count);
    base.bones[0].world = base.bones[0].local;
    stack.push(base.bones[0].local);

    for k in 1..bone_count {
        let (pop, push, local) = {
            let tag = &base.bones[k];
            (tag.pop, tag.push, tag.local)
        };
        if pop && stack.len() > 1 {
            stack.pop();
        }
        if push && stack.len() < bone_count {
            let top = stack[stack.len() - 1];
            stack.push(top);
        }
        if let Some(top) = stack.last_mut() {
            *top = *top * local;
            base.bones[k].world = *top;
        }
    }
}

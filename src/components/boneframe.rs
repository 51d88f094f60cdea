//! Per-entity skeletal playback state.
//!
//! A [`BoneFrame`] owns one main [`SkeletonPose`] layer plus an ordered list
//! of overlay layers (weapon poses and similar). Every layer has its own
//! playback cursor but all of them are ticked by the same delta. Overlay
//! models must match the main model's bone count; attaching a mismatched
//! overlay is rejected without mutating anything.

use bevy_ecs::prelude::Component;
use glam::{Mat4, Quat, Vec3};
use smallvec::SmallVec;

use crate::resources::modelstore::{FRAME_PERIOD, ModelId, SkeletalModel, StateId};

/// Runtime state of one bone slot: the interpolated local transform and the
/// composed world transform, refreshed by the pose solver each tick.
#[derive(Debug, Clone)]
pub struct BoneTag {
    pub offset: Vec3,
    pub rotation: Quat,
    pub local: Mat4,
    pub world: Mat4,
    pub pop: bool,
    pub push: bool,
}

/// One animation layer: playback cursor plus interpolated pose outputs.
#[derive(Debug, Clone)]
pub struct SkeletonPose {
    pub model: ModelId,
    pub current_animation: u16,
    pub current_frame: u16,
    pub next_animation: u16,
    pub next_frame: u16,
    pub last_animation: u16,
    /// Accumulated playback seconds within the current frame window.
    pub frame_time: f32,
    /// Seconds per frame, fixed at 1/30.
    pub period: f32,
    /// Blend factor in `[0, 1]` toward the next frame.
    pub lerp: f32,
    // Interpolated per-tick outputs.
    pub bb_min: Vec3,
    pub bb_max: Vec3,
    pub centre: Vec3,
    pub pos: Vec3,
    pub bones: Vec<BoneTag>,
}

impl SkeletonPose {
    pub fn new(model: &SkeletalModel) -> Self {
        let bones = model
            .bones
            .iter()
            .map(|spec| BoneTag {
                offset: spec.offset,
                rotation: Quat::IDENTITY,
                local: Mat4::IDENTITY,
                world: Mat4::IDENTITY,
                pop: spec.pop,
                push: spec.push,
            })
            .collect();
        Self {
            model: model.id,
            current_animation: 0,
            current_frame: 0,
            next_animation: 0,
            next_frame: 0,
            last_animation: 0,
            frame_time: 0.0,
            period: FRAME_PERIOD,
            lerp: 0.0,
            bb_min: Vec3::ZERO,
            bb_max: Vec3::ZERO,
            centre: Vec3::ZERO,
            pos: Vec3::ZERO,
            bones,
        }
    }

}

/// The skeletal animation component: main layer, overlays, and the logical
/// state request driving the main state machine.
#[derive(Component, Debug, Clone)]
pub struct BoneFrame {
    pub base: SkeletonPose,
    pub overlays: SmallVec<[SkeletonPose; 2]>,
    /// Logical state the owner wants to reach (dispatch table key).
    pub requested_state: StateId,
    pub last_state: StateId,
    /// Terminal sub-state: clamp to the last frame and never auto-advance.
    pub loop_last_frame: bool,
}

impl BoneFrame {
    pub fn new(model: &SkeletalModel) -> Self {
        let state = model
            .animations
            .first()
            .map(|a| a.state_id)
            .unwrap_or_default();
        Self {
            base: SkeletonPose::new(model),
            overlays: SmallVec::new(),
            requested_state: state,
            last_state: state,
            loop_last_frame: false,
        }
    }

    /// Attach an overlay layer. Rejected (returns `false`, state unchanged)
    /// when the overlay's bone count differs from the main model's.
    pub fn add_overlay(&mut self, model: &SkeletalModel) -> bool {
        if model.bone_count() != self.base.bones.len() {
            return false;
        }
        self.overlays.push(SkeletonPose::new(model));
        true
    }

    /// Detach the first overlay using `model`. Returns whether one was found.
    pub fn remove_overlay(&mut self, model: ModelId) -> bool {
        if let Some(idx) = self.overlays.iter().position(|o| o.model == model) {
            self.overlays.remove(idx);
            true
        } else {
            false
        }
    }

    pub fn overlay_mut(&mut self, model: ModelId) -> Option<&mut SkeletonPose> {
        self.overlays.iter_mut().find(|o| o.model == model)
    }
}

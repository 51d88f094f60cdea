//! Main animation state machine.
//!
//! Advances every active entity's main layer by the tick delta: resolves the
//! candidate frame from the accumulated clock, applies loop/follow-up/state
//! dispatch rules, runs the crossed frame's anim commands and root motion,
//! then precomputes the blend target one period ahead for the pose solver.

use bevy_ecs::message::MessageWriter;
use bevy_ecs::prelude::*;
use log::warn;

use crate::components::boneframe::{BoneFrame, SkeletonPose};
use crate::components::locality::Locality;
use crate::components::motion::{JumpImpulse, Motion, MoveType, Substance};
use crate::components::status::{EntityStatus, GameId};
use crate::components::transform::Transform;
use crate::events::audio::AudioCmd;
use crate::events::camera::CameraShake;
use crate::resources::modelstore::{
    FRAME_PERIOD, FrameFlags, ModelStore, SkeletalModel, StateChange,
};
use crate::resources::player::PlayerRef;
use crate::resources::worldmap::WorldMap;
use crate::resources::worldtime::WorldTime;
use crate::systems::animcommand::{CommandCtx, run_anim_commands};

/// What one tick did to the main layer's cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResult {
    FrameAdvanced,
    AnimationChanged,
}

/// Boundary record handed to the command interpreter: the animation and
/// frame the cursor sat on when the boundary fired.
#[derive(Debug, Clone, Copy)]
pub struct FrameStep {
    pub result: FrameResult,
    pub commands_animation: u16,
    pub commands_frame: u16,
}

/// Jump the main layer's cursor to `(animation, frame)` directly, resetting
/// the clock and blend state. The requested state snaps to the new
/// animation's own state id; out-of-range frames wrap.
pub fn set_animation(
    bf: &mut BoneFrame,
    model: &SkeletalModel,
    mut motion: Option<&mut Motion>,
    animation: u16,
    frame: u16,
) {
    let Some(anim) = model.animation(animation) else {
        warn!(
            "set_animation ignored: model {} has no animation {}",
            model.id, animation
        );
        return;
    };
    let frame = if anim.frames.is_empty() {
        0
    } else {
        frame % anim.frame_count()
    };

    bf.base.lerp = 0.0;
    bf.base.period = FRAME_PERIOD;
    bf.last_state = anim.state_id;
    bf.requested_state = anim.state_id;
    bf.base.current_animation = animation;
    bf.base.current_frame = frame;
    bf.base.next_animation = animation;
    bf.base.next_frame = frame;
    bf.base.frame_time = frame as f32 * bf.base.period;

    if let Some(motion) = motion.as_deref_mut() {
        motion.speed = anim.speed;
    }
}

/// Resolve the `(animation, frame)` the cursor lands on `dt` seconds ahead.
///
/// Priority order: the loop-last-frame clamp beats everything, then the
/// end-of-animation follow-up (or modulo wrap), then the state-change
/// dispatch scan. Dispatch ranges are checked in declared order and the
/// first one containing the candidate frame wins.
pub fn next_cursor(
    pose: &SkeletonPose,
    model: &SkeletalModel,
    dt: f32,
    stc: Option<&StateChange>,
    loop_last_frame: bool,
) -> (u16, u16) {
    let anim_index = pose.current_animation;
    let Some(anim) = model.animation(anim_index) else {
        return (anim_index, pose.current_frame);
    };
    let count = anim.frame_count();
    if count == 0 {
        return (anim_index, pose.current_frame);
    }

    let candidate = ((pose.frame_time + dt) / pose.period).floor().max(0.0) as u16;

    if loop_last_frame {
        return (anim_index, candidate.min(count - 1));
    }

    if candidate >= count {
        if let Some(follow) = &anim.follow {
            return (follow.animation, follow.frame);
        }
        return (anim_index, candidate % count);
    }

    if let Some(stc) = stc
        && let Some(dispatch) = stc.dispatch_for(candidate)
    {
        return (dispatch.next_animation, dispatch.next_frame);
    }

    (anim_index, candidate)
}

/// Apply a crossed frame's root-motion flags: charge a jump impulse, turn
/// the entity around on a direction-change frame, translate on a move frame.
/// Runs after that frame's anim commands, so an end-of-animation offset is
/// translated in the pre-flip basis.
fn apply_frame_motion(
    model: &SkeletalModel,
    animation: u16,
    frame: u16,
    mut motion: Option<&mut Motion>,
    transform: &mut Transform,
) {
    let Some(frame) = model
        .animation(animation)
        .and_then(|a| a.frames.get(frame as usize))
    else {
        return;
    };

    if frame.flags.contains(FrameFlags::JUMP)
        && let Some(motion) = motion.as_deref_mut()
    {
        motion.pending_jump = Some(JumpImpulse {
            vertical: -frame.jump.0,
            horizontal: frame.jump.1,
        });
    }
    if frame.flags.contains(FrameFlags::CHANGE_DIRECTION) {
        transform.angles.x += 180.0;
        if let Some(motion) = motion.as_deref_mut() {
            if motion.move_type == MoveType::UnderWater {
                transform.angles.y = -transform.angles.y;
            }
            motion.flip_direction();
        }
        transform.update_rotation();
    }
    if frame.flags.contains(FrameFlags::MOVE) {
        let delta = transform.rotate_vector(frame.move_delta);
        transform.translate(delta);
    }
}

/// Advance the main layer by `dt`. Returns the boundary record when a frame
/// or animation boundary was crossed, so the caller can run that frame's
/// commands and then its root-motion flags. Static models (one animation,
/// one frame) never advance.
pub fn advance_animation(
    bf: &mut BoneFrame,
    model: &SkeletalModel,
    mut motion: Option<&mut Motion>,
    dt: f32,
    smooth: bool,
) -> Option<FrameStep> {
    if model.is_static() {
        return None;
    }

    bf.base.lerp = 0.0;
    let mut stc = model
        .animation(bf.base.current_animation)
        .and_then(|a| a.find_state_change(bf.requested_state));
    let (anim, frame) = next_cursor(&bf.base, model, dt, stc, bf.loop_last_frame);

    let mut step = None;
    if anim != bf.base.current_animation {
        bf.base.last_animation = bf.base.current_animation;
        step = Some(FrameStep {
            result: FrameResult::AnimationChanged,
            commands_animation: bf.base.current_animation,
            commands_frame: bf.base.current_frame,
        });
        set_animation(bf, model, motion.as_deref_mut(), anim, frame);
        stc = model
            .animation(bf.base.current_animation)
            .and_then(|a| a.find_state_change(bf.requested_state));
    } else if bf.base.current_frame != frame {
        if bf.base.current_frame == 0 {
            bf.base.last_animation = bf.base.current_animation;
        }
        step = Some(FrameStep {
            result: FrameResult::FrameAdvanced,
            commands_animation: bf.base.current_animation,
            commands_frame: bf.base.current_frame,
        });
        bf.base.current_frame = frame;
    }

    // Re-anchor the clock on the resolved frame, keeping the sub-period
    // remainder as the blend offset.
    bf.base.frame_time += dt;
    let whole = (bf.base.frame_time / bf.base.period).floor();
    let rem = bf.base.frame_time - whole * bf.base.period;
    bf.base.frame_time = bf.base.current_frame as f32 * bf.base.period + rem;
    bf.base.lerp = if smooth { rem / bf.base.period } else { 0.0 };

    // One-period lookahead gives the pose solver its blend target.
    let (next_anim, next_frame) = next_cursor(&bf.base, model, bf.base.period, stc, bf.loop_last_frame);
    bf.base.next_animation = next_anim;
    bf.base.next_frame = next_frame;

    if let Some(motion) = motion
        && let Some(anim) = model.animation(bf.base.current_animation)
    {
        motion.speed += dt * motion.speed_mult * anim.accel;
    }

    step
}

/// Per-tick driver: advances every active entity's main layer and runs the
/// anim commands of whatever boundary was crossed.
pub fn animate_entities(
    mut query: Query<(
        &GameId,
        &mut BoneFrame,
        &mut Transform,
        &mut EntityStatus,
        Option<&mut Motion>,
        Option<&Locality>,
    )>,
    store: Res<ModelStore>,
    time: Res<WorldTime>,
    map: Res<WorldMap>,
    player: Res<PlayerRef>,
    mut audio: MessageWriter<AudioCmd>,
    mut camera: MessageWriter<CameraShake>,
) {
    let player_pos = player
        .0
        .and_then(|e| query.get(e).ok())
        .map(|(_, _, transform, ..)| transform.origin());

    for (id, mut bf, mut transform, mut status, mut motion, locality) in query.iter_mut() {
        if !status.enabled || !status.active {
            continue;
        }
        let Some(model) = store.get(bf.base.model) else {
            warn!("entity {} references unknown model {}", id.0, bf.base.model);
            continue;
        };

        let Some(step) = advance_animation(
            &mut bf,
            model,
            motion.as_deref_mut(),
            time.delta,
            status.smooth_anim,
        ) else {
            continue;
        };

        let Some(crossed) = model.animation(step.commands_animation) else {
            continue;
        };
        let substance = motion
            .as_deref()
            .map(|m| m.substance)
            .unwrap_or(Substance::None);
        let material = locality
            .and_then(|loc| loc.sector)
            .and_then(|sid| map.sector(sid))
            .map(|s| s.material);
        let mut ctx = CommandCtx {
            entity_id: id.0,
            transform: &mut transform,
            status: &mut status,
            motion: motion.as_deref_mut(),
            substance,
            material,
            version: map.version,
            player_pos,
        };
        run_anim_commands(
            &crossed.commands,
            step.commands_frame,
            step.commands_frame == crossed.last_frame(),
            &mut ctx,
            &mut audio,
            &mut camera,
        );
        apply_frame_motion(
            model,
            step.commands_animation,
            step.commands_frame,
            motion.as_deref_mut(),
            &mut transform,
        );
    }
}

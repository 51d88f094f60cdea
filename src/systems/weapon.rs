//! Weapon overlay state machine.
//!
//! Drives the readiness cycle of a weapon overlay layer: holstered, drawing,
//! idle, aiming, firing, back to idle, holstering. The layer is attached to
//! the owner's [`BoneFrame`] when the weapon is first drawn and detached
//! once it is fully holstered again.
//!
//! Two animation-set conventions exist in the assets. Sidearms carry exactly
//! four animations (0 aim, 2 draw, 3 fire) and reuse the draw animation
//! backwards for holstering. Two-handed weapons carry more than four
//! (0 aim, 1 draw, 2 fire, 3 holster) with a dedicated forward holster
//! animation. Models with any other animation count are left alone.

use bevy_ecs::prelude::*;
use log::warn;

use crate::components::boneframe::{BoneFrame, SkeletonPose};
use crate::components::status::EntityStatus;
use crate::components::weapon::{WeaponPose, WeaponState};
use crate::resources::modelstore::{ModelStore, SkeletalModel};
use crate::resources::worldtime::WorldTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Convention {
    Sidearm,
    TwoHanded,
}

impl Convention {
    fn of(model: &SkeletalModel) -> Option<Self> {
        match model.animations.len() {
            4 => Some(Convention::Sidearm),
            n if n > 4 => Some(Convention::TwoHanded),
            _ => None,
        }
    }

    fn aim(self) -> u16 {
        0
    }

    fn draw(self) -> u16 {
        match self {
            Convention::Sidearm => 2,
            Convention::TwoHanded => 1,
        }
    }

    fn fire(self) -> u16 {
        match self {
            Convention::Sidearm => 3,
            Convention::TwoHanded => 2,
        }
    }

    /// Forward holster animation; sidearms play the draw animation in
    /// reverse instead.
    fn holster(self) -> Option<u16> {
        match self {
            Convention::Sidearm => None,
            Convention::TwoHanded => Some(3),
        }
    }
}

/// Accumulate the layer clock and return the raw frame index plus the
/// sub-period remainder. The caller decides how to map the raw index onto
/// the cursor (forward, reversed, clamped).
fn advance_clock(pose: &mut SkeletonPose, dt: f32, smooth: bool) -> (u16, f32) {
    pose.frame_time += dt;
    let raw = (pose.frame_time / pose.period).floor().max(0.0);
    let rem = pose.frame_time - raw * pose.period;
    pose.lerp = if smooth { rem / pose.period } else { 0.0 };
    (raw as u16, rem)
}

/// Pin the cursor to `(animation, frame)` with a cleared clock.
fn snap(pose: &mut SkeletonPose, animation: u16, frame: u16) {
    pose.current_animation = animation;
    pose.next_animation = animation;
    pose.current_frame = frame;
    pose.next_frame = frame;
    pose.frame_time = frame as f32 * pose.period;
    pose.lerp = 0.0;
}

fn frames_of(model: &SkeletalModel, animation: u16) -> u16 {
    model.animation(animation).map_or(0, |a| a.frame_count())
}

/// Tick every armed entity's weapon machine by the world delta.
pub fn update_weapon_overlays(
    mut query: Query<(&mut BoneFrame, &mut WeaponPose, &EntityStatus)>,
    store: Res<ModelStore>,
    time: Res<WorldTime>,
) {
    for (mut bf, mut wp, status) in query.iter_mut() {
        if !status.enabled || !status.active {
            continue;
        }
        let Some(model) = store.get(wp.model) else {
            warn!("weapon overlay references unknown model {}", wp.model);
            continue;
        };
        let Some(convention) = Convention::of(model) else {
            continue;
        };
        tick_weapon(&mut bf, &mut wp, model, convention, time.delta, status.smooth_anim);
    }
}

fn tick_weapon(
    bf: &mut BoneFrame,
    wp: &mut WeaponPose,
    model: &SkeletalModel,
    convention: Convention,
    dt: f32,
    smooth: bool,
) {
    if wp.state == WeaponState::Hidden {
        if wp.ready {
            if bf.overlay_mut(wp.model).is_none() && !bf.add_overlay(model) {
                warn!(
                    "weapon model {} rejected as overlay (bone count mismatch)",
                    model.id
                );
                return;
            }
            if let Some(overlay) = bf.overlay_mut(wp.model) {
                snap(overlay, convention.draw(), 0);
            }
            wp.state = WeaponState::HideToReady;
        }
        return;
    }

    let Some(overlay) = bf.overlay_mut(wp.model) else {
        // Layer went away under us (model swap); fall back to holstered.
        wp.state = WeaponState::Hidden;
        return;
    };

    let mut detach = false;
    match wp.state {
        // Holstered ticks return before the overlay lookup above.
        WeaponState::Hidden => {}

        WeaponState::HideToReady => {
            let count = frames_of(model, overlay.current_animation);
            let (raw, _) = advance_clock(overlay, dt, smooth);
            if count > 1 && raw < count - 1 {
                overlay.current_frame = raw;
                overlay.next_frame = (raw + 1) % count;
                overlay.next_animation = overlay.current_animation;
            } else {
                // Reached the last draw frame; weapon is out.
                snap(overlay, convention.aim(), 0);
                wp.state = WeaponState::Idle;
            }
        }

        WeaponState::Idle => {
            snap(overlay, convention.aim(), 0);
            if wp.ready {
                match convention.holster() {
                    Some(holster) => snap(overlay, holster, 0),
                    None => {
                        // Reverse the draw animation from its last frame.
                        let last = frames_of(model, convention.draw()).saturating_sub(1);
                        snap(overlay, convention.draw(), last);
                        overlay.frame_time = 0.0;
                    }
                }
                wp.state = WeaponState::IdleToHide;
            } else if wp.fire {
                wp.state = WeaponState::IdleToFire;
            }
        }

        WeaponState::IdleToFire => {
            let count = frames_of(model, overlay.current_animation);
            let (raw, _) = advance_clock(overlay, dt, smooth);
            if count > 1 && raw < count - 1 {
                overlay.current_frame = raw;
                overlay.next_frame = raw + 1;
                overlay.next_animation = overlay.current_animation;
            } else if raw < count {
                // Last aim frame blends into the fire animation.
                overlay.current_frame = raw;
                overlay.next_frame = 0;
                overlay.next_animation = convention.fire();
            } else if wp.fire {
                snap(overlay, convention.fire(), 0);
                overlay.next_frame = 1;
                wp.state = WeaponState::Fire;
            } else {
                let last = count.saturating_sub(1);
                snap(overlay, convention.aim(), last);
                overlay.frame_time = 0.0;
                wp.state = WeaponState::FireToIdle;
            }
        }

        WeaponState::Fire => {
            if wp.fire {
                let count = frames_of(model, overlay.current_animation);
                let (raw, rem) = advance_clock(overlay, dt, smooth);
                if count > 1 && raw < count - 1 {
                    overlay.current_frame = raw;
                    overlay.next_frame = raw + 1;
                    overlay.next_animation = overlay.current_animation;
                } else if raw < count {
                    overlay.current_frame = raw;
                    overlay.next_frame = 0;
                    overlay.next_animation = overlay.current_animation;
                } else {
                    // Loop: keep the sub-period remainder so cadence holds.
                    overlay.frame_time = rem;
                    overlay.current_frame = 0;
                    overlay.next_frame = 1;
                }
            } else {
                let last = frames_of(model, convention.aim()).saturating_sub(1);
                snap(overlay, convention.aim(), last);
                overlay.frame_time = 0.0;
                overlay.next_frame = last.saturating_sub(1);
                wp.state = WeaponState::FireToIdle;
            }
        }

        WeaponState::FireToIdle => {
            // Aim animation played backwards.
            let count = frames_of(model, overlay.current_animation);
            let (raw, _) = advance_clock(overlay, dt, smooth);
            let frame = count.saturating_sub(1).saturating_sub(raw);
            overlay.current_frame = frame;
            overlay.next_animation = overlay.current_animation;
            if frame > 0 {
                overlay.next_frame = frame - 1;
            } else {
                overlay.next_frame = 0;
                wp.state = WeaponState::Idle;
            }
        }

        WeaponState::IdleToHide => match convention.holster() {
            Some(_) => {
                let count = frames_of(model, overlay.current_animation);
                let (raw, _) = advance_clock(overlay, dt, smooth);
                if count > 1 && raw < count - 1 {
                    overlay.current_frame = raw;
                    overlay.next_frame = raw + 1;
                    overlay.next_animation = overlay.current_animation;
                } else {
                    snap(overlay, overlay.current_animation, 0);
                    wp.state = WeaponState::Hidden;
                    detach = true;
                }
            }
            None => {
                // Draw animation in reverse.
                let count = frames_of(model, overlay.current_animation);
                let (raw, _) = advance_clock(overlay, dt, smooth);
                let frame = count.saturating_sub(1).saturating_sub(raw);
                overlay.current_frame = frame;
                overlay.next_animation = overlay.current_animation;
                if frame > 0 {
                    overlay.next_frame = frame - 1;
                } else {
                    overlay.next_frame = 0;
                    wp.state = WeaponState::Hidden;
                    detach = true;
                }
            }
        },
    }

    if detach {
        bf.remove_overlay(wp.model);
    }
}

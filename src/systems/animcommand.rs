//! Anim-command interpreter.
//!
//! Runs the typed command list of an animation whenever the state machine
//! crosses a frame or an animation boundary. Commands never act in place on
//! foreign subsystems; sounds and camera shakes go out as messages, entity
//! side effects mutate the components in [`CommandCtx`].

use bevy_ecs::message::MessageWriter;
use glam::Vec3;
use log::debug;

use crate::components::motion::{JumpImpulse, Motion, Substance};
use crate::components::status::EntityStatus;
use crate::components::transform::Transform;
use crate::events::audio::AudioCmd;
use crate::events::camera::CameraShake;
use crate::resources::modelstore::{
    AnimCommand, EFFECT_BUBBLE, EFFECT_CHANGE_DIRECTION, EFFECT_HIDE_OBJECT,
    EFFECT_PLAY_STEP_SOUND, EFFECT_SHAKE_SCREEN, EFFECT_SHOW_OBJECT,
};
use crate::resources::worldmap::{EngineVersion, SectorMaterial};

/// Shake requests attenuate linearly and cut off entirely past this range.
pub const MAX_SHAKE_DISTANCE: f32 = 8192.0;
pub const DEFAULT_SHAKE_POWER: f32 = 0.1;
pub const SHAKE_DURATION: f32 = 0.5;

/// Any play-sound fired while the emitter stands in quicksand plays this
/// wading sound instead of the encoded index.
pub const QUICKSAND_SOUND: i32 = 18;
pub const BUBBLE_SOUND: i32 = 37;

/// Everything a command batch may touch on its own entity, plus the world
/// facts the effects read. Borrowed per entity for one interpreter run.
pub struct CommandCtx<'a> {
    pub entity_id: u32,
    pub transform: &'a mut Transform,
    pub status: &'a mut EntityStatus,
    pub motion: Option<&'a mut Motion>,
    pub substance: Substance,
    /// Material under the entity's current sector, when placed.
    pub material: Option<SectorMaterial>,
    pub version: EngineVersion,
    /// Player position for shake falloff; `None` mutes shakes.
    pub player_pos: Option<Vec3>,
}

/// Footstep sound id for a floor material, or `None` when the material is
/// silent for this engine version. `Some(-1)` requests the mixer default.
/// Snow and ice exist outside version four only; marble replaces snow's id
/// in version four. Water sectors never produce footsteps.
pub fn footstep_sound(material: SectorMaterial, version: EngineVersion) -> Option<i32> {
    let v4 = version == EngineVersion::Four;
    match material {
        SectorMaterial::Mud => Some(288),
        SectorMaterial::Snow => (!v4).then_some(293),
        SectorMaterial::Sand | SectorMaterial::Grass => Some(291),
        SectorMaterial::Gravel => Some(290),
        SectorMaterial::Ice => (!v4).then_some(289),
        SectorMaterial::Water => None,
        SectorMaterial::Stone | SectorMaterial::Concrete => Some(-1),
        SectorMaterial::Wood | SectorMaterial::OldWood => Some(292),
        SectorMaterial::Metal | SectorMaterial::OldMetal => Some(294),
        SectorMaterial::Marble => v4.then_some(293),
    }
}

fn in_quicksand(substance: Substance) -> bool {
    matches!(
        substance,
        Substance::QuicksandShallow | Substance::QuicksandConsumed
    )
}

/// Run one animation's command list against the frame that was just crossed.
///
/// `crossed_frame` is the frame the cursor sat on when the boundary fired;
/// `at_final_frame` marks end-of-animation semantics for the commands that
/// only trigger there. Exact-frame commands compare against `crossed_frame`.
pub fn run_anim_commands(
    commands: &[AnimCommand],
    crossed_frame: u16,
    at_final_frame: bool,
    ctx: &mut CommandCtx<'_>,
    audio: &mut MessageWriter<AudioCmd>,
    camera: &mut MessageWriter<CameraShake>,
) {
    for command in commands {
        match *command {
            AnimCommand::SetPosition { offset } => {
                if at_final_frame {
                    let delta = ctx.transform.rotate_vector(offset);
                    ctx.transform.translate(delta);
                }
            }
            AnimCommand::JumpDistance {
                vertical,
                horizontal,
            } => {
                if at_final_frame {
                    if let Some(motion) = ctx.motion.as_deref_mut() {
                        motion.pending_jump = Some(JumpImpulse {
                            vertical: -vertical,
                            horizontal,
                        });
                    }
                }
            }
            AnimCommand::EmptyHands => {}
            AnimCommand::Kill => {
                if at_final_frame {
                    ctx.status.kill_pending = true;
                }
            }
            AnimCommand::PlaySound {
                frame,
                sound,
                water_only,
                land_only,
            } => {
                if frame != crossed_frame {
                    continue;
                }
                let sound = if in_quicksand(ctx.substance) {
                    QUICKSAND_SOUND
                } else {
                    sound
                };
                let fire = if water_only {
                    ctx.substance == Substance::WaterShallow
                } else if land_only {
                    ctx.substance != Substance::WaterShallow
                } else {
                    true
                };
                if fire {
                    audio.write(AudioCmd::PlaySound {
                        sound,
                        entity: ctx.entity_id,
                    });
                }
            }
            AnimCommand::PlayEffect { frame, effect } => {
                if frame != crossed_frame {
                    continue;
                }
                run_effect(effect, ctx, audio, camera);
            }
        }
    }
}

fn run_effect(
    effect: u16,
    ctx: &mut CommandCtx<'_>,
    audio: &mut MessageWriter<AudioCmd>,
    camera: &mut MessageWriter<CameraShake>,
) {
    match effect {
        // Handled by the direction-change frame flag; nothing extra here.
        EFFECT_CHANGE_DIRECTION => {}
        EFFECT_SHAKE_SCREEN => {
            if let Some(player_pos) = ctx.player_pos {
                let dist = (player_pos - ctx.transform.origin()).length();
                let scale = if dist > MAX_SHAKE_DISTANCE {
                    0.0
                } else {
                    (MAX_SHAKE_DISTANCE - dist) / 1024.0
                };
                if scale > 0.0 {
                    camera.write(CameraShake {
                        power: scale * DEFAULT_SHAKE_POWER,
                        duration: SHAKE_DURATION,
                    });
                }
            }
        }
        EFFECT_HIDE_OBJECT => {
            ctx.status.visible = false;
        }
        EFFECT_SHOW_OBJECT => {
            ctx.status.visible = true;
        }
        EFFECT_PLAY_STEP_SOUND => {
            // The land/water condition bits are ignored here on purpose:
            // footsteps key off the substance state and floor material only.
            if ctx.substance == Substance::None
                && let Some(material) = ctx.material
                && let Some(sound) = footstep_sound(material, ctx.version)
            {
                audio.write(AudioCmd::PlaySound {
                    sound,
                    entity: ctx.entity_id,
                });
            }
        }
        EFFECT_BUBBLE => {
            if fastrand::i32(0..100) > 60 {
                audio.write(AudioCmd::PlaySound {
                    sound: BUBBLE_SOUND,
                    entity: ctx.entity_id,
                });
            }
        }
        other => {
            debug!("unhandled flip effect {other}");
        }
    }
}

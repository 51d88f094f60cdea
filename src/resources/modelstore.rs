//! Skeletal model asset registry.
//!
//! This module provides the immutable animation data consumed by the runtime:
//! bone hierarchies, keyframes, state-change dispatch tables and the typed
//! anim-command streams. Models are produced by an external loader (or JSON
//! definitions in tests) and registered here; systems look them up by model id
//! and never mutate them.

use bevy_ecs::prelude::Resource;
use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub type ModelId = u32;
pub type StateId = u32;

/// Seconds per animation frame. All layers tick at 30 frames per second.
pub const FRAME_PERIOD: f32 = 1.0 / 30.0;

// Anim-command opcodes as they appear in raw streams.
pub const OP_SET_POSITION: i16 = 1;
pub const OP_JUMP_DISTANCE: i16 = 2;
pub const OP_EMPTY_HANDS: i16 = 3;
pub const OP_KILL: i16 = 4;
pub const OP_PLAY_SOUND: i16 = 5;
pub const OP_PLAY_EFFECT: i16 = 6;

/// Mask applied to the sound/effect operand; the high bits carry conditions.
pub const OPERAND_INDEX_MASK: i16 = 0x3FFF;
pub const CONDITION_WATER: i16 = 0x4000;
pub const CONDITION_LAND: i16 = 0x8000_u16 as i16;

/// Flip-effect ids dispatched by the command interpreter. The numbering is
/// configuration data inherited from the original engine family; remapping it
/// does not require touching the interpreter.
pub const EFFECT_CHANGE_DIRECTION: u16 = 0;
pub const EFFECT_SHAKE_SCREEN: u16 = 1;
pub const EFFECT_BUBBLE: u16 = 3;
pub const EFFECT_HIDE_OBJECT: u16 = 10;
pub const EFFECT_SHOW_OBJECT: u16 = 11;
pub const EFFECT_PLAY_STEP_SOUND: u16 = 32;

/// Per-frame command flag bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameFlags(pub u16);

impl FrameFlags {
    pub const MOVE: FrameFlags = FrameFlags(0x01);
    pub const CHANGE_DIRECTION: FrameFlags = FrameFlags(0x02);
    pub const JUMP: FrameFlags = FrameFlags(0x04);

    pub fn contains(self, other: FrameFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: FrameFlags) {
        self.0 |= other.0;
    }
}

/// Errors raised while registering or decoding model data. Nothing here is
/// fatal at runtime; callers log and skip the offending piece.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelDataError {
    /// A frame carries a different bone count than its model declares.
    BoneCountMismatch {
        animation: usize,
        frame: usize,
        expected: usize,
        actual: usize,
    },
    /// A command stream ended in the middle of an opcode's operands.
    TruncatedCommandStream { offset: usize, opcode: i16 },
    /// An opcode outside the known set; operand counts are positional, so the
    /// rest of the stream cannot be interpreted.
    UnknownOpcode { offset: usize, opcode: i16 },
    /// A model with this id is already registered.
    DuplicateModel(ModelId),
    /// JSON definition parse failure.
    Definition(String),
}

impl std::fmt::Display for ModelDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelDataError::BoneCountMismatch {
                animation,
                frame,
                expected,
                actual,
            } => write!(
                f,
                "animation {animation} frame {frame}: expected {expected} bones, found {actual}"
            ),
            ModelDataError::TruncatedCommandStream { offset, opcode } => write!(
                f,
                "command stream truncated at word {offset} (opcode {opcode})"
            ),
            ModelDataError::UnknownOpcode { offset, opcode } => {
                write!(f, "unknown anim-command opcode {opcode} at word {offset}")
            }
            ModelDataError::DuplicateModel(id) => write!(f, "model {id} already registered"),
            ModelDataError::Definition(e) => write!(f, "model definition error: {e}"),
        }
    }
}

impl std::error::Error for ModelDataError {}

impl From<serde_json::Error> for ModelDataError {
    fn from(e: serde_json::Error) -> Self {
        ModelDataError::Definition(e.to_string())
    }
}

/// A decoded, typed anim command. Raw streams are positional `i16` sequences;
/// [`decode_commands`] turns them into these records once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnimCommand {
    /// Offset the entity transform at the end of the animation.
    SetPosition { offset: Vec3 },
    /// Charge a jump impulse at the end of the animation.
    JumpDistance { vertical: f32, horizontal: f32 },
    /// Behaviour inherited but unused; kept so streams round-trip.
    EmptyHands,
    /// Mark the entity as killed at the end of the animation.
    Kill,
    /// Request a sound on an exact frame, subject to substance conditions.
    PlaySound {
        frame: u16,
        sound: i32,
        water_only: bool,
        land_only: bool,
    },
    /// Dispatch a flip-effect on an exact frame.
    PlayEffect { frame: u16, effect: u16 },
}

/// Decode a raw anim-command stream into typed records.
///
/// Operand counts are fixed per opcode and must be consumed even when the
/// command will never fire for the current frame; a stream that ends inside
/// an operand list is malformed and rejected as a whole.
pub fn decode_commands(raw: &[i16]) -> Result<Vec<AnimCommand>, ModelDataError> {
    fn operands<'a>(
        raw: &'a [i16],
        i: &mut usize,
        count: usize,
        offset: usize,
        opcode: i16,
    ) -> Result<&'a [i16], ModelDataError> {
        let ops = raw
            .get(*i..*i + count)
            .ok_or(ModelDataError::TruncatedCommandStream { offset, opcode })?;
        *i += count;
        Ok(ops)
    }

    let mut out = Vec::new();
    let mut i = 0usize;
    while i < raw.len() {
        let opcode = raw[i];
        let at = i;
        i += 1;
        let command = match opcode {
            OP_SET_POSITION => {
                let ops = operands(raw, &mut i, 3, at, opcode)?;
                AnimCommand::SetPosition {
                    offset: Vec3::new(ops[0] as f32, ops[1] as f32, ops[2] as f32),
                }
            }
            OP_JUMP_DISTANCE => {
                let ops = operands(raw, &mut i, 2, at, opcode)?;
                AnimCommand::JumpDistance {
                    vertical: ops[0] as f32,
                    horizontal: ops[1] as f32,
                }
            }
            OP_EMPTY_HANDS => AnimCommand::EmptyHands,
            OP_KILL => AnimCommand::Kill,
            OP_PLAY_SOUND => {
                let ops = operands(raw, &mut i, 2, at, opcode)?;
                AnimCommand::PlaySound {
                    frame: ops[0].max(0) as u16,
                    sound: (ops[1] & OPERAND_INDEX_MASK) as i32,
                    water_only: ops[1] & CONDITION_WATER != 0,
                    land_only: ops[1] & CONDITION_LAND != 0,
                }
            }
            OP_PLAY_EFFECT => {
                let ops = operands(raw, &mut i, 2, at, opcode)?;
                AnimCommand::PlayEffect {
                    frame: ops[0].max(0) as u16,
                    effect: (ops[1] & OPERAND_INDEX_MASK) as u16,
                }
            }
            _ => return Err(ModelDataError::UnknownOpcode { offset: at, opcode }),
        };
        out.push(command);
    }
    Ok(out)
}

/// One keyframe of one animation: per-bone local offsets and rotations plus
/// the frame-local bounds and root displacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub offsets: Vec<Vec3>,
    pub rotations: Vec<Quat>,
    #[serde(default)]
    pub bb_min: Vec3,
    #[serde(default)]
    pub bb_max: Vec3,
    #[serde(default)]
    pub centre: Vec3,
    /// Root displacement applied to bone 0.
    #[serde(default)]
    pub root_shift: Vec3,
    #[serde(default)]
    pub flags: FrameFlags,
    /// Root-motion translation, active while [`FrameFlags::MOVE`] is set.
    #[serde(default)]
    pub move_delta: Vec3,
    /// Jump impulse pair, active while [`FrameFlags::JUMP`] is set.
    #[serde(default)]
    pub jump: (f32, f32),
}

/// Frame-range redirect inside a state change. Ranges are inclusive and, by
/// authoring convention, non-overlapping; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimDispatch {
    pub frame_low: u16,
    pub frame_high: u16,
    pub next_animation: u16,
    pub next_frame: u16,
}

impl AnimDispatch {
    pub fn covers(&self, frame: u16) -> bool {
        self.frame_high >= self.frame_low && frame >= self.frame_low && frame <= self.frame_high
    }
}

/// Dispatch table for one requested logical state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChange {
    pub state_id: StateId,
    pub dispatches: Vec<AnimDispatch>,
}

impl StateChange {
    /// First dispatch whose range contains `frame`. Scan order is
    /// authoritative when authored data overlaps.
    pub fn dispatch_for(&self, frame: u16) -> Option<&AnimDispatch> {
        self.dispatches.iter().find(|d| d.covers(frame))
    }
}

/// Automatic continuation link at the end of an animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub animation: u16,
    pub frame: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animation {
    /// Logical state this animation embodies.
    pub state_id: StateId,
    #[serde(default)]
    pub speed: f32,
    #[serde(default)]
    pub accel: f32,
    pub frames: Vec<Frame>,
    /// Successor to jump to when the playback cursor runs past the last
    /// frame. `None` loops within this animation.
    #[serde(default)]
    pub follow: Option<FollowUp>,
    #[serde(default)]
    pub commands: Vec<AnimCommand>,
    #[serde(default)]
    pub state_changes: Vec<StateChange>,
}

impl Animation {
    pub fn frame_count(&self) -> u16 {
        self.frames.len() as u16
    }

    pub fn last_frame(&self) -> u16 {
        self.frame_count().saturating_sub(1)
    }

    pub fn find_state_change(&self, state_id: StateId) -> Option<&StateChange> {
        self.state_changes.iter().find(|sc| sc.state_id == state_id)
    }
}

/// Box proxy description used to build a bone's kinematic physics body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionShapeDesc {
    pub half_extents: Vec3,
}

/// One bone slot: stack flags encoding the hierarchy, the bind offset, and an
/// optional collision shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoneSpec {
    /// Pop the composition stack before combining this bone.
    #[serde(default)]
    pub pop: bool,
    /// Duplicate the stack top before combining, so siblings share a parent.
    #[serde(default)]
    pub push: bool,
    /// When this model is attached as an overlay, it replaces this bone's
    /// animation on the main skeleton.
    #[serde(default)]
    pub replace_overlay: bool,
    #[serde(default)]
    pub offset: Vec3,
    #[serde(default)]
    pub shape: Option<CollisionShapeDesc>,
}

/// Immutable skeletal model asset: bone slots plus animations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkeletalModel {
    pub id: ModelId,
    pub bones: Vec<BoneSpec>,
    pub animations: Vec<Animation>,
}

impl SkeletalModel {
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn animation(&self, index: u16) -> Option<&Animation> {
        self.animations.get(index as usize)
    }

    /// Single-animation, single-frame models never animate; ticking them is
    /// short-circuited everywhere.
    pub fn is_static(&self) -> bool {
        self.animations.len() == 1 && self.animations[0].frames.len() == 1
    }

    /// Check that every frame carries one offset and one rotation per bone.
    pub fn validate(&self) -> Result<(), ModelDataError> {
        let expected = self.bones.len();
        for (ai, anim) in self.animations.iter().enumerate() {
            for (fi, frame) in anim.frames.iter().enumerate() {
                let actual = frame.offsets.len().min(frame.rotations.len());
                if frame.offsets.len() != expected || frame.rotations.len() != expected {
                    return Err(ModelDataError::BoneCountMismatch {
                        animation: ai,
                        frame: fi,
                        expected,
                        actual,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Central registry of skeletal models keyed by model id.
#[derive(Resource, Default)]
pub struct ModelStore {
    pub models: FxHashMap<ModelId, SkeletalModel>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ModelId) -> Option<&SkeletalModel> {
        self.models.get(&id)
    }

    /// Validate and register a model. Leaves the store unchanged on error.
    pub fn register(&mut self, model: SkeletalModel) -> Result<(), ModelDataError> {
        model.validate()?;
        if self.models.contains_key(&model.id) {
            return Err(ModelDataError::DuplicateModel(model.id));
        }
        self.models.insert(model.id, model);
        Ok(())
    }

    /// Load a JSON array of model definitions, registering each in order.
    /// Returns the number of models registered.
    pub fn load_json(&mut self, json: &str) -> Result<usize, ModelDataError> {
        let models: Vec<SkeletalModel> = serde_json::from_str(json)?;
        let count = models.len();
        for model in models {
            self.register(model)?;
        }
        Ok(count)
    }
}

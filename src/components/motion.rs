//! Movement state for simulated entities.
//!
//! Entities that move under their own power (the player, creatures) carry a
//! [`Motion`] component. Decorations do not, which is how systems tell the
//! two apart. The substance state is resolved once per tick from a height
//! probe snapshot; the probe itself lives outside this crate.

use bevy_ecs::prelude::Component;

/// How the entity currently travels through the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveType {
    #[default]
    OnFloor,
    FreeFalling,
    OnWater,
    UnderWater,
    Wade,
    Quicksand,
    Climbing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveDirection {
    #[default]
    Stay,
    Forward,
    Backward,
}

/// What the entity is immersed in, resolved from the height probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Substance {
    #[default]
    None,
    WaterShallow,
    WaterWade,
    WaterSwim,
    QuicksandShallow,
    QuicksandConsumed,
}

/// Jump impulse charged by an anim command, consumed by the movement host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpImpulse {
    pub vertical: f32,
    pub horizontal: f32,
}

/// Climbability derived from the current sector's flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClimbInfo {
    /// Wall-climb direction bits (west/east/north/south), straight from the
    /// sector flags.
    pub walls_mask: u8,
    pub walls_climb: bool,
    pub ceiling_climb: bool,
}

/// Snapshot of the external height probe used for substance resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeightInfo {
    pub water: bool,
    /// Z level where the medium transitions (water surface, quicksand top).
    pub transition_level: f32,
}

#[derive(Component, Debug, Clone)]
pub struct Motion {
    pub move_type: MoveType,
    pub direction: MoveDirection,
    pub substance: Substance,
    /// Current playback-driven speed, accelerated by the animation's accel.
    pub speed: f32,
    pub speed_mult: f32,
    pub health: f32,
    /// Entity height used for the quicksand consumed/shallow split.
    pub height: f32,
    /// Z depth at which walking becomes wading.
    pub wade_depth: f32,
    pub pending_jump: Option<JumpImpulse>,
    pub climb: ClimbInfo,
    pub height_info: HeightInfo,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            move_type: MoveType::OnFloor,
            direction: MoveDirection::Stay,
            substance: Substance::None,
            speed: 0.0,
            speed_mult: 1.0,
            health: 1.0,
            height: 768.0,
            wade_depth: 256.0,
            pending_jump: None,
            climb: ClimbInfo::default(),
            height_info: HeightInfo::default(),
        }
    }
}

impl Motion {
    /// Swap forward/backward travel, as a change-direction frame does.
    pub fn flip_direction(&mut self) {
        self.direction = match self.direction {
            MoveDirection::Forward => MoveDirection::Backward,
            MoveDirection::Backward => MoveDirection::Forward,
            MoveDirection::Stay => MoveDirection::Stay,
        };
    }

    /// Death sectors only kill entities travelling through a medium; an
    /// entity in free fall or mid-climb passes over them.
    pub fn vulnerable_to_death_sector(&self) -> bool {
        matches!(
            self.move_type,
            MoveType::OnFloor
                | MoveType::UnderWater
                | MoveType::Wade
                | MoveType::OnWater
                | MoveType::Quicksand
        )
    }
}

/// Resolve the substance state from the height probe, the room's quicksand
/// flag, and the entity's Z position.
pub fn resolve_substance(motion: &Motion, in_quicksand_room: bool, z: f32) -> Substance {
    let hi = &motion.height_info;
    if in_quicksand_room {
        if hi.transition_level > z + motion.height {
            Substance::QuicksandConsumed
        } else {
            Substance::QuicksandShallow
        }
    } else if !hi.water {
        Substance::None
    } else if hi.transition_level > z && hi.transition_level < z + motion.wade_depth {
        Substance::WaterShallow
    } else if hi.transition_level > z + motion.wade_depth {
        Substance::WaterWade
    } else {
        Substance::WaterSwim
    }
}

//! Weapon overlay state.
//!
//! The weapon readiness machine runs on an overlay layer of the owning
//! entity's [`BoneFrame`](super::boneframe::BoneFrame). Intents are sampled
//! once per tick by the weapon system; hosts set them from input or AI.

use bevy_ecs::prelude::Component;

use crate::resources::modelstore::ModelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeaponState {
    #[default]
    Hidden,
    HideToReady,
    Idle,
    IdleToFire,
    Fire,
    FireToIdle,
    IdleToHide,
}

#[derive(Component, Debug, Clone)]
pub struct WeaponPose {
    pub state: WeaponState,
    /// Overlay model driven by this machine.
    pub model: ModelId,
    /// Intent: toggle between holstered and drawn.
    pub ready: bool,
    /// Intent: pull the trigger while drawn.
    pub fire: bool,
}

impl WeaponPose {
    pub fn new(model: ModelId) -> Self {
        Self {
            state: WeaponState::Hidden,
            model,
            ready: false,
            fire: false,
        }
    }
}

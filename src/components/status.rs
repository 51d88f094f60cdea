//! Entity status flags and identity.

use bevy_ecs::prelude::Component;
use glam::Vec3;

/// Stable id assigned by the level loader, used in scripting and audio calls.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameId(pub u32);

/// Lifecycle and interaction flags for one entity.
#[derive(Component, Debug, Clone)]
pub struct EntityStatus {
    /// Participates in the simulation at all.
    pub enabled: bool,
    /// Ticks its animation state machine.
    pub active: bool,
    /// Drawn by the renderer; toggled by hide/show effects.
    pub visible: bool,
    /// Set by kill commands and death sectors; destruction is the host's job.
    pub kill_pending: bool,
    /// Interpolate between frames. When false `lerp` stays at zero.
    pub smooth_anim: bool,
    /// Activates through OBB overlap with a scanning entity.
    pub interactive: bool,
    /// Activates through the pickup cylinder test.
    pub pickable: bool,
    /// Offset of the activation probe in entity space.
    pub activation_offset: Vec3,
    /// Activation radius for pickable entities.
    pub activation_radius: f32,
}

impl Default for EntityStatus {
    fn default() -> Self {
        Self {
            enabled: true,
            active: true,
            visible: true,
            kill_pending: false,
            smooth_anim: true,
            interactive: false,
            pickable: false,
            activation_offset: Vec3::new(0.0, 256.0, 0.0),
            activation_radius: 128.0,
        }
    }
}

impl EntityStatus {
    /// Drop every runtime flag, leaving the entity inert.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.active = false;
        self.visible = false;
    }

    /// Restore the default enabled/active/visible trio.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.active = true;
        self.visible = true;
    }
}

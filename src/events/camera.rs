//! Camera effect requests.

use bevy_ecs::message::Message;

/// Ask the camera collaborator to shake for a while. Emitted by the
/// screen-shake flip-effect, scaled by distance to the player.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct CameraShake {
    pub power: f32,
    pub duration: f32,
}

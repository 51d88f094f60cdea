//! Bridge systems between ECS messages and the external mixer/camera.
//!
//! The command interpreter writes [`AudioCmd`] and [`CameraShake`] messages;
//! these systems push the audio ones through the channel in
//! [`AudioBridge`](crate::resources::audiobridge::AudioBridge) and advance
//! the message queues once per frame so readers see this frame's writes.

use bevy_ecs::prelude::{MessageReader, Messages, Res, ResMut};

use crate::events::audio::AudioCmd;
use crate::events::camera::CameraShake;
use crate::resources::audiobridge::AudioBridge;

/// Forward ECS [`AudioCmd`] messages to the mixer thread.
pub fn forward_audio_cmds(bridge: Res<AudioBridge>, mut reader: MessageReader<AudioCmd>) {
    for cmd in reader.read() {
        // Ignore send errors on shutdown; the mixer may already be gone.
        let _ = bridge.tx_cmd.send(*cmd);
    }
}

/// Advance the [`AudioCmd`] queue. Run once per frame, after the writers.
pub fn update_audio_cmds(mut msgs: ResMut<Messages<AudioCmd>>) {
    msgs.update();
}

/// Advance the [`CameraShake`] queue. The camera host drains it with its own
/// reader.
pub fn update_camera_shakes(mut msgs: ResMut<Messages<CameraShake>>) {
    msgs.update();
}

//! Channel bridge between the ECS world and the audio mixer.
//!
//! The mixer runs outside this crate (usually on its own thread). Use
//! [`setup_audio`] once during initialization: it creates the command
//! channel, inserts the [`AudioBridge`] resource plus the `Messages` queues,
//! and hands back the receiving end for the mixer to drain.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::events::audio::AudioCmd;

/// Shared bridge between the ECS world and the audio mixer.
///
/// Systems write [`AudioCmd`] messages; the
/// [`forward_audio_cmds`](crate::systems::audio::forward_audio_cmds) system
/// pushes them through [`AudioBridge::tx_cmd`].
#[derive(Resource)]
pub struct AudioBridge {
    /// Sender for [`AudioCmd`] messages (ECS -> mixer).
    pub tx_cmd: Sender<AudioCmd>,
}

/// Create the command channel and register bridge resources. Returns the
/// receiver the host's mixer should drain.
pub fn setup_audio(world: &mut World) -> Receiver<AudioCmd> {
    let (tx_cmd, rx_cmd) = unbounded::<AudioCmd>();
    world.insert_resource(AudioBridge { tx_cmd });
    world.insert_resource(Messages::<AudioCmd>::default());
    rx_cmd
}

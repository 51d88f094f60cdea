//! Audio request messages.

use bevy_ecs::message::Message;

/// Commands sent *to* the audio mixer.
///
/// `entity` identifies the emitting entity so the mixer can spatialize the
/// sound. A `sound` of `-1` is a valid request meaning "default sound for
/// the context"; the mixer decides what that is.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCmd {
    PlaySound { sound: i32, entity: u32 },
}

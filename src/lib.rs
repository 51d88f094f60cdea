//! Marrow Engine library.
//!
//! Runtime core of a skeletal-animation entity simulation: pose solving,
//! animation state dispatch, command interpretation, and the bridges toward
//! the physics, audio, scripting, and camera collaborators. Hosts embed it
//! by building a [`bevy_ecs`] world and scheduling the systems in
//! [`systems`].

pub mod components;
pub mod events;
pub mod resources;
pub mod systems;

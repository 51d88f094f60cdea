//! Messages exchanged between the animation core and external collaborators.
//!
//! Side effects computed by the command interpreter are never executed in
//! place; they become messages a host system (or the channel bridge in
//! [`crate::resources::audiobridge`]) delivers to the owning subsystem.
//!
//! Submodules:
//! - [`audio`] – sound playback requests toward the mixer
//! - [`camera`] – screen shake requests toward the camera
pub mod audio;
pub mod camera;

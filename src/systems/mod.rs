//! Engine systems.
//!
//! This module groups all ECS systems that advance the entity simulation.
//! Intended per-tick order: [`time`], [`frame`], [`weapon`], [`pose`],
//! [`rigidbody`], [`boundingvolume`], [`activation`], then [`audio`].
//!
//! Submodules overview
//! - [`activation`] – player probe for interactive and pickable entities
//! - [`animcommand`] – interpret animation commands into messages and state
//! - [`audio`] – bridge with the mixer thread (forward/update message queues)
//! - [`boundingvolume`] – rebuild bounding boxes, track rooms and sectors
//! - [`frame`] – advance animation clocks and drive the state dispatch
//! - [`pose`] – solve interpolated bone poses and compose the hierarchy
//! - [`rigidbody`] – mirror solved bones into kinematic physics proxies
//! - [`time`] – update simulation time and delta
//! - [`weapon`] – overlay weapon draw/fire/holster state machine

pub mod activation;
pub mod animcommand;
pub mod audio;
pub mod boundingvolume;
pub mod frame;
pub mod pose;
pub mod rigidbody;
pub mod time;
pub mod weapon;

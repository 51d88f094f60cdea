//! ECS components for simulated entities.
//!
//! This module groups all component types attached to entities in the game
//! world. Components hold the per-entity animation, pose, placement, and
//! lifecycle data the systems advance every tick.
//!
//! Submodules overview:
//! - [`boneframe`] – solved skeletal pose and its animation layers
//! - [`locality`] – current room and sector placement
//! - [`motion`] – movement speeds, angles, and medium state
//! - [`obb`] – oriented bounding box derived from the pose bounds
//! - [`physicsproxy`] – per-bone kinematic body handles
//! - [`status`] – lifecycle flags, health, and activation traits
//! - [`transform`] – world placement as origin plus Euler angles
//! - [`weapon`] – overlay weapon state machine bookkeeping

pub mod boneframe;
pub mod locality;
pub mod motion;
pub mod obb;
pub mod physicsproxy;
pub mod status;
pub mod transform;
pub mod weapon;

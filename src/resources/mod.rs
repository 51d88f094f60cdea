//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution: model definitions, the room map,
//! collaborator bridges, and timing. Each submodule documents the semantics
//! and intended usage of its resource(s).
//!
//! Overview
//! - `audiobridge` – channel toward the background mixer thread
//! - `modelstore` – skeletal model definitions shared across entities
//! - `physicsworld` – kinematic body registry standing in for the physics engine
//! - `player` – which entity the activator scan treats as the player
//! - `script` – trigger and callback host (Lua-backed when the feature is on)
//! - `worldmap` – rooms, sectors, and per-room entity registration
//! - `worldtime` – simulation time and delta
pub mod audiobridge;
pub mod modelstore;
pub mod physicsworld;
pub mod player;
pub mod script;
pub mod worldmap;
pub mod worldtime;

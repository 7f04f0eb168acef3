//! ECS resources making up a session.
//!
//! This module groups the long-lived state injected into the session's ECS
//! world and accessed by systems during execution. Each submodule documents
//! the semantics and intended usage of its resource(s).
//!
//! Overview
//! - `animationengine` – animation registry, toggle states and pose blends
//! - `animationstore` – animation definitions shared across instances
//! - `blend` – easing curves and timed pose blends
//! - `classcache` – memoized, thread-safe class lookups
//! - `controllers` – left/right/HMD controller slots
//! - `host` – shared handle to the engine facade
//! - `input` – queued control states for the animation engine
//! - `modconfig` – INI-backed settings
//! - `worldtime` – session time and delta
pub mod animationengine;
pub mod animationstore;
pub mod blend;
pub mod classcache;
pub mod controllers;
pub mod host;
pub mod input;
pub mod modconfig;
pub mod worldtime;

//! Session systems.
//!
//! Submodules overview
//! - [`animation`] – apply queued control input and advance pose blends
//! - [`modconfig`] – push [`crate::resources::modconfig::ModConfig`] changes into other resources
//! - [`time`] – update simulation time and delta

pub mod animation;
pub mod modconfig;
pub mod time;

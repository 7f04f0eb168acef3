//! uevr_utils library.
//!
//! Convenience layer over a host engine's live reflection system for VR
//! injection mods: cached class lookups, a three-slot motion controller
//! manager and a toggle-driven bone pose animation engine. Everything the
//! engine does is reached through the [`host::ObjectModel`] facade.
//!
//! Session state lives in bevy_ecs resources so it can be driven from a
//! per-frame schedule and reset on level transitions (see [`session`]).

pub mod bones;
pub mod events;
pub mod host;
pub mod lookup;
pub mod resources;
pub mod session;
pub mod systems;

/// Result type used throughout the library
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Crate error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Facade or reflected call failure
    #[error(transparent)]
    Host(#[from] host::HostError),

    /// Configuration file could not be read, parsed or written
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

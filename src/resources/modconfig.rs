//! Mod configuration resource.
//!
//! Manages mod settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [log]
//! animation_level = error
//!
//! [animation]
//! blend_duration = 0.15
//! easing = quad_out
//!
//! [controllers]
//! collision_handling = 1
//! level_change = destroy
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use super::blend::{Easing, Interpolation};
use super::controllers::{DEFAULT_COLLISION_HANDLING, LevelChangePolicy};
use crate::host::LogLevel;

/// Default safe values for startup
const DEFAULT_BLEND_DURATION: f32 = 0.0;
const DEFAULT_CONFIG_PATH: &str = "./uevr_utils.ini";

/// Mod configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ModConfig {
    /// Severity filter of the animation engine.
    pub animation_log_level: LogLevel,
    /// Seconds a toggle transition blends over. Zero snaps.
    pub blend_duration: f32,
    /// Easing curve of toggle blends.
    pub easing: Easing,
    /// Collision handling mode passed when spawning controller actors.
    pub collision_handling: i32,
    /// What happens to controller actors on a level change.
    pub level_change: LevelChangePolicy,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for ModConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ModConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            animation_log_level: LogLevel::default(),
            blend_duration: DEFAULT_BLEND_DURATION,
            easing: Easing::default(),
            collision_handling: DEFAULT_COLLISION_HANDLING,
            level_change: LevelChangePolicy::default(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Interpolation for toggle transitions, if blending is enabled.
    pub fn interpolation(&self) -> Option<Interpolation> {
        let interpolation = Interpolation::new(self.blend_duration).with_easing(self.easing);
        (!interpolation.is_instant()).then_some(interpolation)
    }

    /// Load configuration from the INI file.
    ///
    /// Missing or unparsable values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> crate::Result<()> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| crate::Error::Config(format!("Failed to load config file: {}", e)))?;

        // [log] section
        if let Some(level) = config.get("log", "animation_level") {
            match level.parse() {
                Ok(level) => self.animation_log_level = level,
                Err(e) => warn!("Ignoring [log] animation_level: {}", e),
            }
        }

        // [animation] section
        if let Some(duration) = config.getfloat("animation", "blend_duration").ok().flatten() {
            if duration.is_finite() {
                self.blend_duration = duration as f32;
            } else {
                warn!("Ignoring [animation] blend_duration: {} is not a finite number", duration);
            }
        }
        if let Some(easing) = config.get("animation", "easing") {
            match easing.parse() {
                Ok(easing) => self.easing = easing,
                Err(e) => warn!("Ignoring [animation] easing: {}", e),
            }
        }

        // [controllers] section
        if let Some(mode) = config.getint("controllers", "collision_handling").ok().flatten() {
            self.collision_handling = mode as i32;
        }
        if let Some(policy) = config.get("controllers", "level_change") {
            match policy.parse() {
                Ok(policy) => self.level_change = policy,
                Err(e) => warn!("Ignoring [controllers] level_change: {}", e),
            }
        }

        info!(
            "Loaded config: animation_level={}, blend={}s {}, collision_handling={}, level_change={}",
            self.animation_log_level,
            self.blend_duration,
            self.easing,
            self.collision_handling,
            self.level_change
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> crate::Result<()> {
        let mut config = Ini::new();

        // [log] section
        config.set("log", "animation_level", Some(self.animation_log_level.to_string()));

        // [animation] section
        config.set("animation", "blend_duration", Some(self.blend_duration.to_string()));
        config.set("animation", "easing", Some(self.easing.to_string()));

        // [controllers] section
        config.set(
            "controllers",
            "collision_handling",
            Some(self.collision_handling.to_string()),
        );
        config.set("controllers", "level_change", Some(self.level_change.to_string()));

        config.write(&self.config_path)?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ModConfig::new();
        assert_eq!(config.animation_log_level, LogLevel::Error);
        assert_eq!(config.interpolation(), None);
        assert_eq!(config.collision_handling, 1);
        assert_eq!(config.level_change, LevelChangePolicy::Destroy);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.ini");
        std::fs::write(
            &path,
            "[animation]\nblend_duration = 0.25\neasing = cubic_out\n\n[controllers]\nlevel_change = forget\n",
        )
        .unwrap();

        let mut config = ModConfig::with_path(&path);
        config.load_from_file().unwrap();

        assert_eq!(config.blend_duration, 0.25);
        assert_eq!(config.easing, Easing::CubicOut);
        assert_eq!(config.level_change, LevelChangePolicy::Forget);
        assert_eq!(config.animation_log_level, LogLevel::Error);
        assert_eq!(
            config.interpolation(),
            Some(Interpolation::new(0.25).with_easing(Easing::CubicOut))
        );
    }

    #[test]
    fn test_bad_values_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.ini");
        std::fs::write(&path, "[log]\nanimation_level = shouty\n[animation]\neasing = wobble\n").unwrap();

        let mut config = ModConfig::with_path(&path);
        config.load_from_file().unwrap();
        assert_eq!(config.animation_log_level, LogLevel::Error);
        assert_eq!(config.easing, Easing::Linear);
    }

    #[test]
    fn test_non_finite_blend_duration_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.ini");
        for value in ["nan", "inf", "-inf"] {
            std::fs::write(&path, format!("[animation]\nblend_duration = {}\n", value)).unwrap();
            let mut config = ModConfig::with_path(&path);
            config.blend_duration = 0.3;
            config.load_from_file().unwrap();
            assert_eq!(config.blend_duration, 0.3, "{value}");
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ModConfig::with_path(dir.path().join("absent.ini"));
        assert!(matches!(config.load_from_file(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.ini");

        let mut saved = ModConfig::with_path(&path);
        saved.animation_log_level = LogLevel::Debug;
        saved.blend_duration = 0.5;
        saved.easing = Easing::QuadInOut;
        saved.collision_handling = 3;
        saved.level_change = LevelChangePolicy::Forget;
        saved.save_to_file().unwrap();

        let mut loaded = ModConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        assert_eq!(loaded, saved);
    }
}

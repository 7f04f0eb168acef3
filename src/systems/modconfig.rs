//! Mod configuration change detection system.
//!
//! Monitors [`ModConfig`] and pushes settings that live on other resources
//! (the animation engine's log level, the controller manager's collision
//! handling and level change policy) whenever it is added or modified.

use bevy_ecs::prelude::*;
use log::info;

use crate::resources::animationengine::AnimationEngine;
use crate::resources::controllers::ControllerManager;
use crate::resources::modconfig::ModConfig;

pub fn apply_modconfig_changes(
    config: Option<Res<ModConfig>>,
    mut engine: ResMut<AnimationEngine>,
    mut controllers: ResMut<ControllerManager>,
) {
    let Some(config) = config else {
        return;
    };
    if !config.is_changed() {
        return;
    }
    if engine.log_level() != config.animation_log_level {
        info!("Animation log level set to {}", config.animation_log_level);
        engine.set_log_level(config.animation_log_level);
    }
    if controllers.collision_handling() != config.collision_handling {
        info!("Controller collision handling set to {}", config.collision_handling);
        controllers.set_collision_handling(config.collision_handling);
    }
    if controllers.level_change() != Some(config.level_change) {
        info!("Controller level change policy set to {}", config.level_change);
        controllers.set_level_change(config.level_change);
    }
}

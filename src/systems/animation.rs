//! Animation systems.
//!
//! - [`apply_control_input`] – feed queued control states to the animation
//!   engine's edge-triggered toggles
//! - [`animation_blend_system`] – advance in-flight pose blends by the tick
//!   delta

use bevy_ecs::prelude::*;
use log::trace;

use crate::resources::animationengine::AnimationEngine;
use crate::resources::host::Host;
use crate::resources::input::ControlInput;
use crate::resources::modconfig::ModConfig;
use crate::resources::worldtime::WorldTime;

/// Drain [`ControlInput`] into [`AnimationEngine::update_animation`].
///
/// Transitions blend when [`ModConfig`] sets a blend duration, otherwise
/// they snap.
pub fn apply_control_input(
    host: Res<Host>,
    config: Option<Res<ModConfig>>,
    mut input: ResMut<ControlInput>,
    mut engine: ResMut<AnimationEngine>,
) {
    if input.is_empty() {
        return;
    }
    let interpolation = config.and_then(|c| c.interpolation());
    for event in input.drain() {
        trace!(
            "control {}/{} pressed={}",
            event.animation_id, event.control, event.pressed
        );
        engine.update_animation(
            &**host,
            &event.animation_id,
            &event.control,
            event.pressed,
            interpolation,
        );
    }
}

/// Advance pose blends by [`WorldTime::delta`].
pub fn animation_blend_system(host: Res<Host>, world_time: Res<WorldTime>, mut engine: ResMut<AnimationEngine>) {
    if engine.active_blends() == 0 {
        return;
    }
    engine.tick(&**host, world_time.delta);
}

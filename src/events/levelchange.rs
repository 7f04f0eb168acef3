//! Level transition event and observer.
//!
//! The host calls [`crate::session::Session::level_changed`] (or triggers
//! [`LevelChangedEvent`] itself) when the engine loads a new level. Every
//! engine handle the session holds belongs to the old level, so the observer
//! in this module drops them all in one place.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::resources::animationengine::AnimationEngine;
use crate::resources::controllers::ControllerManager;
use crate::resources::host::Host;
use crate::resources::input::ControlInput;

/// Event signalling that the engine switched levels.
#[derive(Event, Debug, Clone, Copy)]
pub struct LevelChangedEvent {}

/// Observer that resets session state for a new level.
///
/// Contract
/// - runs the controller manager's level teardown, which also drops the
///   host's persisted motion-controller state, and forgets every slot
/// - clears the animation registry, toggle states and blends
/// - discards control input queued against the old level
///
/// The class cache is kept: class descriptors survive level changes.
pub fn observe_level_change(
    _trigger: On<LevelChangedEvent>,
    host: Res<Host>,
    mut controllers: ResMut<ControllerManager>,
    mut animations: ResMut<AnimationEngine>,
    mut input: ResMut<ControlInput>,
) {
    debug!("LevelChangedEvent triggered");
    controllers.on_level_change(&**host);
    animations.reset_for_level();
    input.clear();
    info!("Session state reset for new level");
}

//! Per-mod session: a bevy `World` holding every resource plus the per-tick
//! schedule.
//!
//! # Tick
//!
//! 1. [`update_world_time`] applies the frame delta
//! 2. [`apply_modconfig_changes`] pushes config edits into other resources
//! 3. [`apply_control_input`] feeds queued control states to the animation
//!    engine
//! 4. [`animation_blend_system`] advances pose blends
//!
//! Level transitions go through [`Session::level_changed`], which triggers
//! [`LevelChangedEvent`].

use std::sync::Arc;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;

use crate::events::levelchange::{LevelChangedEvent, observe_level_change};
use crate::host::ObjectModel;
use crate::resources::animationengine::AnimationEngine;
use crate::resources::classcache::ClassCache;
use crate::resources::controllers::ControllerManager;
use crate::resources::host::Host;
use crate::resources::input::ControlInput;
use crate::resources::modconfig::ModConfig;
use crate::resources::worldtime::WorldTime;
use crate::systems::animation::{animation_blend_system, apply_control_input};
use crate::systems::modconfig::apply_modconfig_changes;
use crate::systems::time::update_world_time;

pub struct Session {
    world: World,
    schedule: Schedule,
}

impl Session {
    pub fn new(host: Arc<dyn ObjectModel>, config: ModConfig) -> Self {
        let mut world = World::new();

        let controllers = ControllerManager::new()
            .with_collision_handling(config.collision_handling)
            .with_level_change(config.level_change);

        world.insert_resource(Host::new(host));
        world.insert_resource(ClassCache::new());
        world.insert_resource(controllers);
        world.insert_resource(AnimationEngine::new());
        world.insert_resource(ControlInput::default());
        world.insert_resource(WorldTime::default());
        world.insert_resource(config);

        world.spawn(Observer::new(observe_level_change));
        world.flush();

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                apply_modconfig_changes,
                apply_control_input,
                animation_blend_system,
            )
                .chain(),
        );

        Session { world, schedule }
    }

    /// Run one tick of `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        update_world_time(&mut self.world, dt);
        self.schedule.run(&mut self.world);
        self.world.clear_trackers();
    }

    /// Reset controllers, animations and queued input for a new level.
    pub fn level_changed(&mut self) {
        self.world.trigger(LevelChangedEvent {});
    }

    pub fn host(&self) -> Arc<dyn ObjectModel> {
        self.world.resource::<Host>().0.clone()
    }

    /// Queue a control state for the next tick.
    pub fn push_control(&mut self, animation_id: &str, control: &str, pressed: bool) {
        self.world
            .resource_mut::<ControlInput>()
            .push(animation_id, control, pressed);
    }

    pub fn with_controllers<R>(
        &mut self,
        f: impl FnOnce(&mut ControllerManager, &dyn ObjectModel, &ClassCache) -> R,
    ) -> R {
        let host = self.host();
        self.world
            .resource_scope(|world, mut controllers: Mut<ControllerManager>| {
                let cache = world.resource::<ClassCache>();
                f(&mut controllers, host.as_ref(), cache)
            })
    }

    pub fn with_animations<R>(&mut self, f: impl FnOnce(&mut AnimationEngine, &dyn ObjectModel) -> R) -> R {
        let host = self.host();
        let mut engine = self.world.resource_mut::<AnimationEngine>();
        f(&mut engine, host.as_ref())
    }

    pub fn class_cache(&self) -> &ClassCache {
        self.world.resource::<ClassCache>()
    }

    pub fn config(&self) -> &ModConfig {
        self.world.resource::<ModConfig>()
    }

    /// Mutable config; edits are applied on the next tick.
    pub fn config_mut(&mut self) -> Mut<'_, ModConfig> {
        self.world.resource_mut::<ModConfig>()
    }

    pub fn world_time(&self) -> WorldTime {
        *self.world.resource::<WorldTime>()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

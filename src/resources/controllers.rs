//! Motion controller slots.
//!
//! [`ControllerManager`] tracks up to three engine-side controllers (left
//! hand, right hand, HMD). Each populated slot holds a spawned actor and the
//! component added to it: a motion controller component for the hands, a
//! plain scene component for the HMD. A slot is either empty or holds both
//! handles; the component's liveness is re-checked against the engine on
//! every existence query because the engine may destroy it out-of-band.
//!
//! Level transitions go through an injectable [`ControllerTeardown`] so the
//! engine-side cleanup policy is explicit.

use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::Resource;
use glam::Vec3;
use log::{debug, info, warn};
use smallvec::SmallVec;

use super::classcache::ClassCache;
use crate::host::call::{call, call_returning};
use crate::host::{
    HostError, MATH_LIBRARY_CLASS, MOTION_CONTROLLER_CLASS, ObjectHandle, ObjectModel, Rotator,
    SCENE_COMPONENT_CLASS, Transform, Value,
};

/// Default collision handling for spawned controller actors
/// (always spawn, ignoring collisions).
pub const DEFAULT_COLLISION_HANDLING: i32 = 1;

/// Controller slot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerId {
    Left = 0,
    Right = 1,
    Hmd = 2,
}

impl ControllerId {
    pub const ALL: [ControllerId; 3] = [ControllerId::Left, ControllerId::Right, ControllerId::Hmd];

    fn index(self) -> usize {
        self as usize
    }

    /// `MotionSource` name given to the hand components.
    fn motion_source(self) -> Option<&'static str> {
        match self {
            ControllerId::Left => Some("Left"),
            ControllerId::Right => Some("Right"),
            ControllerId::Hmd => None,
        }
    }
}

impl TryFrom<i32> for ControllerId {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ControllerId::Left),
            1 => Ok(ControllerId::Right),
            2 => Ok(ControllerId::Hmd),
            other => Err(format!("Invalid controller id {}", other)),
        }
    }
}

/// A populated slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controller {
    pub actor: ObjectHandle,
    pub component: ObjectHandle,
}

/// Engine-side cleanup run when a level changes.
pub trait ControllerTeardown: Send + Sync {
    fn teardown(&self, host: &dyn ObjectModel, controllers: &[Controller]);
}

/// Leave the actors to the engine's own level teardown.
pub struct ForgetControllers;

impl ControllerTeardown for ForgetControllers {
    fn teardown(&self, _host: &dyn ObjectModel, controllers: &[Controller]) {
        debug!("Forgetting {} controllers without destroying them", controllers.len());
    }
}

/// Destroy every still-valid controller actor.
pub struct DestroyControllerActors;

impl ControllerTeardown for DestroyControllerActors {
    fn teardown(&self, host: &dyn ObjectModel, controllers: &[Controller]) {
        for controller in controllers {
            if !host.is_valid(controller.actor) {
                continue;
            }
            if let Err(e) = call(host, controller.actor, "K2_DestroyActor", &[]) {
                debug!("Level teardown could not destroy {:?}: {}", controller.actor, e);
            }
        }
    }
}

/// Configurable choice of [`ControllerTeardown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelChangePolicy {
    Forget,
    #[default]
    Destroy,
}

impl LevelChangePolicy {
    pub fn teardown(self) -> Box<dyn ControllerTeardown> {
        match self {
            LevelChangePolicy::Forget => Box::new(ForgetControllers),
            LevelChangePolicy::Destroy => Box::new(DestroyControllerActors),
        }
    }
}

impl fmt::Display for LevelChangePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelChangePolicy::Forget => f.write_str("forget"),
            LevelChangePolicy::Destroy => f.write_str("destroy"),
        }
    }
}

impl FromStr for LevelChangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forget" => Ok(LevelChangePolicy::Forget),
            "destroy" => Ok(LevelChangePolicy::Destroy),
            other => Err(format!("Unknown level change policy '{}'", other)),
        }
    }
}

/// Owner of the three controller slots.
#[derive(Resource)]
pub struct ControllerManager {
    slots: [Option<Controller>; 3],
    collision_handling: i32,
    teardown: Box<dyn ControllerTeardown>,
    /// Policy behind `teardown`; `None` once a custom teardown is installed.
    level_change: Option<LevelChangePolicy>,
}

impl Default for ControllerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerManager {
    pub fn new() -> Self {
        ControllerManager {
            slots: [None; 3],
            collision_handling: DEFAULT_COLLISION_HANDLING,
            teardown: LevelChangePolicy::default().teardown(),
            level_change: Some(LevelChangePolicy::default()),
        }
    }

    pub fn with_teardown(mut self, teardown: Box<dyn ControllerTeardown>) -> Self {
        self.teardown = teardown;
        self.level_change = None;
        self
    }

    pub fn with_level_change(mut self, policy: LevelChangePolicy) -> Self {
        self.set_level_change(policy);
        self
    }

    pub fn with_collision_handling(mut self, collision_handling: i32) -> Self {
        self.collision_handling = collision_handling;
        self
    }

    /// Swap the teardown for the one `policy` selects. Takes effect on the
    /// next level change.
    pub fn set_level_change(&mut self, policy: LevelChangePolicy) {
        self.teardown = policy.teardown();
        self.level_change = Some(policy);
    }

    pub fn level_change(&self) -> Option<LevelChangePolicy> {
        self.level_change
    }

    /// Collision handling used for actors spawned from now on. Existing
    /// controllers keep theirs.
    pub fn set_collision_handling(&mut self, collision_handling: i32) {
        self.collision_handling = collision_handling;
    }

    pub fn collision_handling(&self) -> i32 {
        self.collision_handling
    }

    /// Return the controller's component, spawning it if the slot is empty
    /// or its component no longer validates.
    ///
    /// `Hmd` is created with a scene component, the hands with motion
    /// controller components. On failure the slot is left empty.
    pub fn create_controller(
        &mut self,
        host: &dyn ObjectModel,
        cache: &ClassCache,
        id: ControllerId,
    ) -> Option<ObjectHandle> {
        if id == ControllerId::Hmd {
            return self.create_hmd_controller(host, cache);
        }
        self.populate(host, cache, id, MOTION_CONTROLLER_CLASS)
    }

    pub fn create_hmd_controller(&mut self, host: &dyn ObjectModel, cache: &ClassCache) -> Option<ObjectHandle> {
        self.populate(host, cache, ControllerId::Hmd, SCENE_COMPONENT_CLASS)
    }

    fn populate(
        &mut self,
        host: &dyn ObjectModel,
        cache: &ClassCache,
        id: ControllerId,
        component_class: &str,
    ) -> Option<ObjectHandle> {
        if let Some(existing) = self.slots[id.index()] {
            if host.is_valid(existing.component) {
                return Some(existing.component);
            }
            debug!("{:?} controller went stale, recreating", id);
            self.destroy_controller(host, id);
        }

        let Some(actor) = host.spawn_actor(&Transform::IDENTITY, self.collision_handling, None) else {
            warn!("Failed to spawn actor for {:?} controller", id);
            return None;
        };

        let component = match add_component(host, cache, actor, component_class) {
            Ok(component) => component,
            Err(e) => {
                warn!("Failed to add {} to {:?} controller: {}", component_class, id, e);
                if let Err(e) = call(host, actor, "K2_DestroyActor", &[]) {
                    debug!("Could not discard controller actor {:?}: {}", actor, e);
                }
                return None;
            }
        };

        if let Some(source) = id.motion_source() {
            let name = host.intern_name(source);
            if let Err(e) = host.set_property(component, "MotionSource", Value::Name(name)) {
                debug!("Could not set MotionSource on {:?} controller: {}", id, e);
            }
        }

        self.slots[id.index()] = Some(Controller { actor, component });
        info!("Created {:?} controller", id);
        Some(component)
    }

    /// The slot's component, without checking liveness.
    pub fn get_controller(&self, id: ControllerId) -> Option<ObjectHandle> {
        self.slots[id.index()].map(|c| c.component)
    }

    pub fn controller(&self, id: ControllerId) -> Option<Controller> {
        self.slots[id.index()]
    }

    /// Whether the slot is populated and its component is still alive.
    pub fn controller_exists(&self, host: &dyn ObjectModel, id: ControllerId) -> bool {
        self.slots[id.index()].is_some_and(|c| host.is_valid(c.component))
    }

    /// Destroy the slot's actor (best effort) and clear the slot.
    pub fn destroy_controller(&mut self, host: &dyn ObjectModel, id: ControllerId) {
        let Some(controller) = self.slots[id.index()].take() else {
            return;
        };
        if let Err(e) = call(host, controller.actor, "K2_DestroyActor", &[]) {
            debug!("Destroying {:?} controller actor failed: {}", id, e);
        }
    }

    pub fn destroy_controllers(&mut self, host: &dyn ObjectModel) {
        for id in ControllerId::ALL {
            self.destroy_controller(host, id);
        }
        self.reset_controllers();
    }

    /// Forget every slot without touching the engine.
    pub fn reset_controllers(&mut self) {
        self.slots = [None; 3];
    }

    /// Level transition: run the teardown collaborator, ask the host to drop
    /// persisted motion-controller state, then forget every slot.
    pub fn on_level_change(&mut self, host: &dyn ObjectModel) {
        let tracked: SmallVec<[Controller; 3]> = self.slots.iter().flatten().copied().collect();
        self.teardown.teardown(host, &tracked);
        host.remove_motion_controller_states();
        self.reset_controllers();
        info!("Controllers reset for level change ({} tracked)", tracked.len());
    }

    /// Attach `child` to the controller's component at `socket_name`.
    ///
    /// Returns false if the controller or the child is missing or the
    /// engine rejects the attachment.
    pub fn attach_component_to_controller(
        &self,
        host: &dyn ObjectModel,
        id: ControllerId,
        child: ObjectHandle,
        socket_name: &str,
        attach_type: i32,
        weld: bool,
    ) -> bool {
        let Some(controller) = self.get_controller(id) else {
            return false;
        };
        if !host.is_valid(child) {
            return false;
        }
        let socket = host.intern_name(socket_name);
        let args = [
            Value::Object(Some(controller)),
            Value::Name(socket),
            Value::Int(attach_type),
            Value::Bool(weld),
        ];
        match call(host, child, "K2_AttachTo", &args) {
            Ok(ret) => ret.and_then(|v| v.as_bool()).unwrap_or(true),
            Err(e) => {
                warn!("Attach to {:?} controller failed: {}", id, e);
                false
            }
        }
    }

    pub fn controller_location(&self, host: &dyn ObjectModel, id: ControllerId) -> Option<Vec3> {
        let controller = self.get_controller(id)?;
        query(host, controller, "K2_GetComponentLocation", &[])?.as_vector()
    }

    pub fn controller_rotation(&self, host: &dyn ObjectModel, id: ControllerId) -> Option<Rotator> {
        let controller = self.get_controller(id)?;
        query(host, controller, "K2_GetComponentRotation", &[])?.as_rotator()
    }

    /// Forward vector of the controller's rotation, via the engine's math
    /// library default object.
    pub fn controller_direction(
        &self,
        host: &dyn ObjectModel,
        cache: &ClassCache,
        id: ControllerId,
    ) -> Option<Vec3> {
        let rotation = self.controller_rotation(host, id)?;
        let math_class = cache.resolve(host, MATH_LIBRARY_CLASS, false)?;
        let math = host.class_default_object(math_class)?;
        query(host, math, "GetForwardVector", &[Value::Rotator(rotation)])?.as_vector()
    }
}

fn add_component(
    host: &dyn ObjectModel,
    cache: &ClassCache,
    actor: ObjectHandle,
    component_class: &str,
) -> Result<ObjectHandle, HostError> {
    let class = cache.resolve_required(host, component_class)?;
    let args = [
        Value::Class(Some(class)),
        Value::Bool(true),
        Value::Transform(Transform::IDENTITY),
        Value::Bool(false),
    ];
    call_returning(host, actor, "AddComponentByClass", &args)?
        .as_object()
        .ok_or_else(|| HostError::Invocation("AddComponentByClass returned null".to_string()))
}

fn query(host: &dyn ObjectModel, object: ObjectHandle, function: &str, args: &[Value]) -> Option<Value> {
    match call_returning(host, object, function, args) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("{} failed: {}", function, e);
            None
        }
    }
}

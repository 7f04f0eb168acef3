//! Toggle-driven bone pose animation.
//!
//! [`AnimationEngine`] owns three tables:
//!
//! - the registry of animation instances (id → component + shared definition)
//! - the toggle state of every `(animation id, control)` pair
//! - in-flight [`PoseBlend`]s started by interpolated toggles
//!
//! `animate` and `pose` write bone rotations straight away. `update_animation`
//! is edge-triggered: only a press after a release (or the reverse) plays the
//! control's `on` / `off` position, either instantly or as a blend advanced by
//! [`AnimationEngine::tick`].
//!
//! Bone writes are independent. If one fails the rest of the pose is still
//! applied and nothing is rolled back.
//!
//! The engine has its own severity filter (default [`LogLevel::Error`]) on
//! top of the global `log` filter; its messages use the `animation` target.

use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use log::log;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::animationstore::{AnimationDefinition, AnimationPose};
use super::blend::{BoneBlend, Interpolation, PoseBlend};
use crate::bones::{bone_local_rotation, set_bone_local_rotation};
use crate::host::{LogLevel, ObjectHandle, ObjectModel};

pub const ON: &str = "on";
pub const OFF: &str = "off";

/// A component bound to a definition.
#[derive(Debug, Clone)]
pub struct AnimationInstance {
    pub component: ObjectHandle,
    pub definition: Arc<AnimationDefinition>,
}

fn emit(filter: LogLevel, level: LogLevel, args: fmt::Arguments) {
    if !filter.allows(level) {
        return;
    }
    if let Some(l) = level.as_log_level() {
        log!(target: "animation", l, "{}", args);
    }
}

#[derive(Resource, Default)]
pub struct AnimationEngine {
    animations: FxHashMap<String, AnimationInstance>,
    states: FxHashMap<String, FxHashMap<String, bool>>,
    blends: FxHashMap<(String, String), PoseBlend>,
    log_level: LogLevel,
}

impl AnimationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Takes effect on the next message.
    pub fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = level;
    }

    fn log(&self, level: LogLevel, args: fmt::Arguments) {
        emit(self.log_level, level, args);
    }

    /// Register `id`, replacing any previous instance under the same id.
    pub fn add(&mut self, id: impl Into<String>, component: ObjectHandle, definition: Arc<AnimationDefinition>) {
        let id = id.into();
        self.log(LogLevel::Debug, format_args!("Registered animation {}", id));
        self.animations.insert(id, AnimationInstance { component, definition });
    }

    pub fn remove(&mut self, id: &str) -> Option<AnimationInstance> {
        self.blends.retain(|(blend_id, _), _| blend_id != id);
        self.animations.remove(id)
    }

    pub fn instance(&self, id: &str) -> Option<&AnimationInstance> {
        self.animations.get(id)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// The instance for `id` if its component is still alive.
    fn live_instance(&self, host: &dyn ObjectModel, id: &str) -> Option<&AnimationInstance> {
        let Some(instance) = self.animations.get(id) else {
            self.log(LogLevel::Warning, format_args!("Animation {} is not registered", id));
            return None;
        };
        if !host.is_valid(instance.component) {
            self.log(
                LogLevel::Warning,
                format_args!("Animation {} has no live component", id),
            );
            return None;
        }
        Some(instance)
    }

    /// Apply `positions[name][value]` of animation `id`.
    ///
    /// Cancels any blend running for `(id, name)`. A missing position is not
    /// an error and does nothing.
    pub fn animate(&mut self, host: &dyn ObjectModel, id: &str, name: &str, value: &str) {
        let Some(instance) = self.live_instance(host, id) else {
            return;
        };
        let instance = instance.clone();
        self.blends.remove(&(id.to_string(), name.to_string()));

        let Some(pose) = instance.definition.position(name, value) else {
            self.log(LogLevel::Trace, format_args!("{}: no position {}/{}", id, name, value));
            return;
        };
        let failed = self.apply_pose(host, instance.component, pose);
        if failed > 0 {
            self.log(
                LogLevel::Error,
                format_args!("{}: {} of {} bones failed for {}/{}", id, failed, pose.len(), name, value),
            );
        }
    }

    /// Write every bone of `pose`. Returns the number of failed writes.
    fn apply_pose(&self, host: &dyn ObjectModel, component: ObjectHandle, pose: &AnimationPose) -> usize {
        let mut failed = 0;
        for (bone, rotation) in pose {
            if let Err(e) = set_bone_local_rotation(host, component, bone, rotation.to_quat()) {
                self.log(LogLevel::Warning, format_args!("Bone {} not set: {}", bone, e));
                failed += 1;
            }
        }
        failed
    }

    /// Replay `poses[pose_id]` through [`AnimationEngine::animate`] in order.
    pub fn pose(&mut self, host: &dyn ObjectModel, id: &str, pose_id: &str) {
        let Some(instance) = self.live_instance(host, id) else {
            return;
        };
        let definition = instance.definition.clone();
        let Some(steps) = definition.pose_steps(pose_id) else {
            self.log(LogLevel::Trace, format_args!("{}: no pose {}", id, pose_id));
            return;
        };
        for (name, value) in steps {
            self.animate(host, id, name, value);
        }
    }

    /// Record the pressed state of `control` and play `on` / `off` on a
    /// transition.
    ///
    /// With an `interpolation` the transition becomes a blend that replaces
    /// any blend already running for the same control.
    pub fn update_animation(
        &mut self,
        host: &dyn ObjectModel,
        id: &str,
        control: &str,
        pressed: bool,
        interpolation: Option<Interpolation>,
    ) {
        let was_pressed = self.set_state(id, control, pressed);
        if was_pressed == pressed {
            return;
        }
        let value = if pressed { ON } else { OFF };
        self.log(LogLevel::Debug, format_args!("{}: {} {}", id, control, value));
        match interpolation {
            Some(interpolation) if !interpolation.is_instant() => {
                self.start_blend(host, id, control, value, interpolation)
            }
            _ => self.animate(host, id, control, value),
        }
    }

    /// Force the toggle state without animating.
    pub fn reset_animation(&mut self, id: &str, control: &str, pressed: bool) {
        self.set_state(id, control, pressed);
    }

    fn set_state(&mut self, id: &str, control: &str, pressed: bool) -> bool {
        let state = self
            .states
            .entry(id.to_string())
            .or_default()
            .entry(control.to_string())
            .or_insert(false);
        std::mem::replace(state, pressed)
    }

    pub fn is_pressed(&self, id: &str, control: &str) -> bool {
        self.states
            .get(id)
            .and_then(|controls| controls.get(control))
            .copied()
            .unwrap_or(false)
    }

    pub fn is_blending(&self, id: &str, control: &str) -> bool {
        self.blends.contains_key(&(id.to_string(), control.to_string()))
    }

    pub fn active_blends(&self) -> usize {
        self.blends.len()
    }

    fn start_blend(
        &mut self,
        host: &dyn ObjectModel,
        id: &str,
        control: &str,
        value: &str,
        interpolation: Interpolation,
    ) {
        let key = (id.to_string(), control.to_string());
        let Some(instance) = self.live_instance(host, id) else {
            return;
        };
        let Some(target) = instance.definition.position(control, value) else {
            self.blends.remove(&key);
            return;
        };
        let component = instance.component;

        let mut bones: SmallVec<[BoneBlend; 8]> = SmallVec::with_capacity(target.len());
        for (bone, rotation) in target {
            let to = rotation.to_quat();
            let from = bone_local_rotation(host, component, bone).unwrap_or_else(|e| {
                self.log(LogLevel::Warning, format_args!("Bone {} has no current rotation: {}", bone, e));
                to
            });
            bones.push(BoneBlend {
                bone: bone.clone(),
                from,
                to,
            });
        }
        self.blends.insert(key, PoseBlend::new(component, bones, interpolation));
    }

    /// Advance every blend by `dt` seconds and write the sampled rotations.
    /// Finished blends and blends whose component died are dropped.
    pub fn tick(&mut self, host: &dyn ObjectModel, dt: f32) {
        let filter = self.log_level;
        self.blends.retain(|(id, control), blend| {
            if !host.is_valid(blend.component) {
                emit(filter, LogLevel::Warning, format_args!("{}: blend on {} lost its component", id, control));
                return false;
            }
            let alpha = blend.advance(dt);
            for (bone, rotation) in blend.sample(alpha) {
                if let Err(e) = set_bone_local_rotation(host, blend.component, bone, rotation) {
                    emit(filter, LogLevel::Warning, format_args!("Bone {} not set: {}", bone, e));
                }
            }
            !blend.is_finished()
        });
    }

    /// Move every bone of `positions[name][value]` `alpha` of the way from
    /// its current local rotation towards the target. One-shot.
    pub fn lerp_animation(&self, host: &dyn ObjectModel, id: &str, name: &str, value: &str, alpha: f32) {
        let Some(instance) = self.live_instance(host, id) else {
            return;
        };
        let Some(pose) = instance.definition.position(name, value) else {
            return;
        };
        let alpha = alpha.clamp(0.0, 1.0);
        for (bone, rotation) in pose {
            let result = bone_local_rotation(host, instance.component, bone).and_then(|current| {
                set_bone_local_rotation(host, instance.component, bone, current.slerp(rotation.to_quat(), alpha))
            });
            if let Err(e) = result {
                self.log(LogLevel::Warning, format_args!("Bone {} not blended: {}", bone, e));
            }
        }
    }

    /// Forget every instance, toggle and blend. The log level is kept.
    pub fn reset_for_level(&mut self) {
        self.log(
            LogLevel::Info,
            format_args!("Resetting {} animations for level change", self.animations.len()),
        );
        self.animations.clear();
        self.states.clear();
        self.blends.clear();
    }

    /// Log every registered animation and its toggle states at `Info`.
    pub fn print_state(&self) {
        let mut ids: Vec<&String> = self.animations.keys().collect();
        ids.sort();
        for id in ids {
            let instance = &self.animations[id];
            let mut controls: Vec<_> = self
                .states
                .get(id)
                .map(|c| c.iter().collect())
                .unwrap_or_default();
            controls.sort();
            self.log(
                LogLevel::Info,
                format_args!("{} on {:?}: {:?}", id, instance.component, controls),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::host::{POSEABLE_MESH_CLASS, Rotator};
    use crate::resources::animationstore::pose_from;
    use crate::resources::blend::Easing;

    fn rig() -> (MockHost, ObjectHandle, AnimationEngine) {
        let host = MockHost::with_engine_classes();
        let mesh = host.spawn_named(POSEABLE_MESH_CLASS, "RightHand").unwrap();
        host.add_bone(mesh, "thumb", None, Rotator::ZERO);
        host.add_bone(mesh, "index", None, Rotator::ZERO);

        let mut def = AnimationDefinition::new();
        def.insert_position("grip", ON, pose_from([("thumb", Rotator::new(10.0, 0.0, 0.0))]));
        def.insert_position("grip", OFF, pose_from([("thumb", Rotator::ZERO)]));
        def.insert_position(
            "trigger",
            ON,
            pose_from([("thumb", Rotator::new(0.0, 30.0, 0.0)), ("index", Rotator::new(45.0, 0.0, 0.0))]),
        );
        def.insert_pose("fist", [("grip", ON), ("trigger", ON)]);

        let mut engine = AnimationEngine::new();
        engine.add("right", mesh, Arc::new(def));
        (host, mesh, engine)
    }

    fn local(host: &MockHost, mesh: ObjectHandle, bone: &str) -> Rotator {
        host.bone_local_rotation(mesh, bone).unwrap()
    }

    #[test]
    fn test_press_applies_on_position_once() {
        let (host, mesh, mut engine) = rig();

        engine.update_animation(&host, "right", "grip", true, None);
        assert!(local(&host, mesh, "thumb").approx_eq(Rotator::new(10.0, 0.0, 0.0), 1e-3));
        assert_eq!(host.call_count("SetBoneRotationByName"), 1);
        assert!(engine.is_pressed("right", "grip"));

        engine.update_animation(&host, "right", "grip", true, None);
        assert_eq!(host.call_count("SetBoneRotationByName"), 1);

        engine.update_animation(&host, "right", "grip", false, None);
        assert!(local(&host, mesh, "thumb").approx_eq(Rotator::ZERO, 1e-3));
        assert!(!engine.is_pressed("right", "grip"));
    }

    #[test]
    fn test_release_without_off_position_is_silent() {
        let (host, _mesh, mut engine) = rig();
        engine.update_animation(&host, "right", "trigger", true, None);
        let writes = host.call_count("SetBoneRotationByName");

        engine.update_animation(&host, "right", "trigger", false, None);
        assert_eq!(host.call_count("SetBoneRotationByName"), writes);
        assert!(!engine.is_pressed("right", "trigger"));
    }

    #[test]
    fn test_pose_applies_steps_in_order() {
        let (host, mesh, mut engine) = rig();
        engine.pose(&host, "right", "fist");

        // trigger/on comes after grip/on and wins on the shared bone.
        assert!(local(&host, mesh, "thumb").approx_eq(Rotator::new(0.0, 30.0, 0.0), 1e-3));
        assert!(local(&host, mesh, "index").approx_eq(Rotator::new(45.0, 0.0, 0.0), 1e-3));
    }

    #[test]
    fn test_missing_pose_and_position_are_no_ops() {
        let (host, _mesh, mut engine) = rig();
        engine.pose(&host, "right", "peace");
        engine.animate(&host, "right", "grip", "half");
        engine.animate(&host, "right", "wave", ON);
        assert_eq!(host.call_count("SetBoneRotationByName"), 0);
    }

    #[test]
    fn test_animate_unregistered_id_changes_nothing() {
        let (host, _mesh, mut engine) = rig();
        engine.animate(&host, "left", "grip", ON);
        assert!(host.calls().is_empty());
        assert!(!engine.is_pressed("left", "grip"));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_animate_with_dead_component_is_skipped() {
        let (host, mesh, mut engine) = rig();
        host.destroy_externally(mesh);
        engine.animate(&host, "right", "grip", ON);
        assert_eq!(host.call_count("SetBoneRotationByName"), 0);
    }

    #[test]
    fn test_partial_application_keeps_other_bones() {
        let (host, mesh, mut engine) = rig();
        host.fail_bone(mesh, "thumb");
        engine.animate(&host, "right", "trigger", ON);

        assert!(local(&host, mesh, "index").approx_eq(Rotator::new(45.0, 0.0, 0.0), 1e-3));
        assert!(local(&host, mesh, "thumb").approx_eq(Rotator::ZERO, 1e-3));
    }

    #[test]
    fn test_add_replaces_existing_instance() {
        let (host, _mesh, mut engine) = rig();
        let other = host.spawn_named(POSEABLE_MESH_CLASS, "OtherHand").unwrap();
        engine.add("right", other, Arc::new(AnimationDefinition::new()));

        assert_eq!(engine.len(), 1);
        assert_eq!(engine.instance("right").unwrap().component, other);
        engine.animate(&host, "right", "grip", ON);
        assert_eq!(host.call_count("SetBoneRotationByName"), 0);
    }

    #[test]
    fn test_reset_animation_does_not_animate() {
        let (host, _mesh, mut engine) = rig();
        engine.reset_animation("right", "grip", true);
        assert!(engine.is_pressed("right", "grip"));
        assert!(host.calls().is_empty());

        // Already pressed: no edge.
        engine.update_animation(&host, "right", "grip", true, None);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_interpolated_press_blends_over_ticks() {
        let (host, mesh, mut engine) = rig();
        let lerp = Interpolation::new(1.0);

        engine.update_animation(&host, "right", "grip", true, Some(lerp));
        assert!(engine.is_blending("right", "grip"));
        assert_eq!(host.call_count("SetBoneRotationByName"), 0);

        engine.tick(&host, 0.5);
        assert!(local(&host, mesh, "thumb").approx_eq(Rotator::new(5.0, 0.0, 0.0), 1e-2));

        engine.tick(&host, 0.5);
        assert!(local(&host, mesh, "thumb").approx_eq(Rotator::new(10.0, 0.0, 0.0), 1e-3));
        assert!(!engine.is_blending("right", "grip"));

        let writes = host.call_count("SetBoneRotationByName");
        engine.tick(&host, 0.5);
        assert_eq!(host.call_count("SetBoneRotationByName"), writes);
    }

    #[test]
    fn test_release_mid_blend_replaces_it() {
        let (host, mesh, mut engine) = rig();
        let lerp = Interpolation::new(1.0).with_easing(Easing::Linear);

        engine.update_animation(&host, "right", "grip", true, Some(lerp));
        engine.tick(&host, 0.5);
        engine.update_animation(&host, "right", "grip", false, Some(lerp));
        assert_eq!(engine.active_blends(), 1);

        // Blend back from the half-way rotation.
        engine.tick(&host, 0.5);
        assert!(local(&host, mesh, "thumb").approx_eq(Rotator::new(2.5, 0.0, 0.0), 1e-2));
        engine.tick(&host, 0.5);
        assert!(local(&host, mesh, "thumb").approx_eq(Rotator::ZERO, 1e-3));
        assert_eq!(engine.active_blends(), 0);
    }

    #[test]
    fn test_instant_animate_cancels_blend() {
        let (host, mesh, mut engine) = rig();
        engine.update_animation(&host, "right", "grip", true, Some(Interpolation::new(2.0)));
        engine.animate(&host, "right", "grip", OFF);
        assert!(!engine.is_blending("right", "grip"));

        engine.tick(&host, 1.0);
        assert!(local(&host, mesh, "thumb").approx_eq(Rotator::ZERO, 1e-3));
    }

    #[test]
    fn test_zero_duration_interpolation_snaps() {
        let (host, mesh, mut engine) = rig();
        engine.update_animation(&host, "right", "grip", true, Some(Interpolation::new(0.0)));
        assert!(!engine.is_blending("right", "grip"));
        assert!(local(&host, mesh, "thumb").approx_eq(Rotator::new(10.0, 0.0, 0.0), 1e-3));
    }

    #[test]
    fn test_blend_dropped_when_component_dies() {
        let (host, mesh, mut engine) = rig();
        engine.update_animation(&host, "right", "grip", true, Some(Interpolation::new(1.0)));
        host.destroy_externally(mesh);
        engine.tick(&host, 0.1);
        assert_eq!(engine.active_blends(), 0);
    }

    #[test]
    fn test_lerp_animation_single_sample() {
        let (host, mesh, engine) = rig();
        engine.lerp_animation(&host, "right", "grip", ON, 0.5);
        assert!(local(&host, mesh, "thumb").approx_eq(Rotator::new(5.0, 0.0, 0.0), 1e-2));
    }

    #[test]
    fn test_reset_for_level_clears_everything_but_level() {
        let (host, _mesh, mut engine) = rig();
        engine.set_log_level(LogLevel::Debug);
        engine.update_animation(&host, "right", "grip", true, Some(Interpolation::new(1.0)));

        engine.reset_for_level();
        assert!(engine.is_empty());
        assert!(!engine.is_pressed("right", "grip"));
        assert_eq!(engine.active_blends(), 0);
        assert_eq!(engine.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_default_log_level_is_error() {
        assert_eq!(AnimationEngine::new().log_level(), LogLevel::Error);
    }
}

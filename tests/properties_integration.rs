//! Behavioural properties of the class cache, controller manager and
//! animation engine, exercised against the mock engine.
//!
//! # Test Categories
//!
//! 1. **Class cache** - memoization and forced refresh
//! 2. **Controllers** - idempotent creation, teardown, stale handles
//! 3. **Animation toggles** - edge triggering, pose ordering, unknown ids
//! 4. **Definitions** - JSON in, identical poses out

use std::sync::Arc;

use uevr_utils::host::mock::MockHost;
use uevr_utils::host::{ACTOR_CLASS, ObjectHandle, ObjectModel, POSEABLE_MESH_CLASS, Rotator};
use uevr_utils::lookup::{Requirement, find_object};
use uevr_utils::resources::animationengine::AnimationEngine;
use uevr_utils::resources::animationstore::{AnimationDefinition, pose_from};
use uevr_utils::resources::classcache::ClassCache;
use uevr_utils::resources::controllers::{ControllerId, ControllerManager};

const TOLERANCE: f32 = 1e-3;

fn hand_definition() -> AnimationDefinition {
    AnimationDefinition::from_json(
        r#"{
            "positions": {
                "grip":  { "on": { "thumb": [10, 0, 0] } },
                "thumb": { "on": { "thumb": [0, 0, 20], "index": [5, 0, 0] } }
            },
            "poses": { "fist": [["grip", "on"], ["thumb", "on"]] }
        }"#,
    )
    .unwrap()
}

fn hand(host: &MockHost) -> ObjectHandle {
    let mesh = host.spawn_named(POSEABLE_MESH_CLASS, "Hand").unwrap();
    host.add_bone(mesh, "thumb", None, Rotator::ZERO);
    host.add_bone(mesh, "index", None, Rotator::ZERO);
    mesh
}

// =============================================================================
// Class cache
// =============================================================================

#[test]
fn class_cache_second_resolve_skips_the_engine() {
    let host = MockHost::with_engine_classes();
    let cache = ClassCache::new();

    let a = cache.resolve(&host, ACTOR_CLASS, false);
    let b = cache.resolve(&host, ACTOR_CLASS, false);
    assert_eq!(a, b);
    assert_eq!(host.class_lookups(ACTOR_CLASS), 1);

    cache.resolve(&host, ACTOR_CLASS, true);
    assert_eq!(host.class_lookups(ACTOR_CLASS), 2);
}

#[test]
fn required_lookup_is_distinguished_from_optional() {
    let host = MockHost::with_engine_classes();
    assert_eq!(find_object(&host, "Actor /Game/Nope.Nope", Requirement::Optional), Ok(None));
    assert!(find_object(&host, "Actor /Game/Nope.Nope", Requirement::Required).is_err());
}

// =============================================================================
// Controllers
// =============================================================================

#[test]
fn create_controller_twice_returns_same_component() {
    let host = MockHost::with_engine_classes();
    let cache = ClassCache::new();
    let mut controllers = ControllerManager::new();

    let first = controllers.create_controller(&host, &cache, ControllerId::Left);
    let second = controllers.create_controller(&host, &cache, ControllerId::Left);
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn destroy_controllers_leaves_no_slot_existing() {
    let host = MockHost::with_engine_classes();
    let cache = ClassCache::new();
    let mut controllers = ControllerManager::new();
    for id in ControllerId::ALL {
        controllers.create_controller(&host, &cache, id);
    }

    controllers.destroy_controllers(&host);
    for id in ControllerId::ALL {
        assert!(!controllers.controller_exists(&host, id), "{id:?}");
    }
}

#[test]
fn externally_destroyed_controller_is_not_reported_as_existing() {
    let host = MockHost::with_engine_classes();
    let cache = ClassCache::new();
    let mut controllers = ControllerManager::new();
    let hmd = controllers
        .create_hmd_controller(&host, &cache)
        .unwrap();

    host.destroy_externally(hmd);
    assert!(!controllers.controller_exists(&host, ControllerId::Hmd));
    assert_eq!(controllers.controller_location(&host, ControllerId::Hmd), None);
}

// =============================================================================
// Animation toggles
// =============================================================================

#[test]
fn grip_press_is_edge_triggered() {
    let host = MockHost::with_engine_classes();
    let mesh = hand(&host);
    let mut engine = AnimationEngine::new();
    engine.add("hand", mesh, Arc::new(hand_definition()));

    engine.update_animation(&host, "hand", "grip", true, None);
    let thumb = host.bone_local_rotation(mesh, "thumb").unwrap();
    assert!(thumb.approx_eq(Rotator::new(10.0, 0.0, 0.0), TOLERANCE));
    assert_eq!(host.call_count("SetBoneRotationByName"), 1);

    engine.update_animation(&host, "hand", "grip", true, None);
    assert_eq!(host.call_count("SetBoneRotationByName"), 1);

    // No "off" position: releasing writes nothing.
    engine.update_animation(&host, "hand", "grip", false, None);
    assert_eq!(host.call_count("SetBoneRotationByName"), 1);
}

#[test]
fn pose_replays_steps_in_list_order() {
    let host = MockHost::with_engine_classes();
    let mesh = hand(&host);
    let mut engine = AnimationEngine::new();
    engine.add("hand", mesh, Arc::new(hand_definition()));

    engine.pose(&host, "hand", "fist");

    let thumb = host.bone_local_rotation(mesh, "thumb").unwrap();
    assert!(thumb.approx_eq(Rotator::new(0.0, 0.0, 20.0), TOLERANCE), "{thumb:?}");
    let written: Vec<_> = host
        .calls()
        .into_iter()
        .filter(|c| c.function == "SetBoneRotationByName")
        .collect();
    assert_eq!(written.len(), 3);
    // grip/on (one bone) is written before anything from thumb/on.
    let first = written[0].args[1].as_rotator().unwrap();
    assert!(first.approx_eq(Rotator::new(10.0, 0.0, 0.0), TOLERANCE), "{first:?}");
}

#[test]
fn animate_unknown_id_touches_nothing() {
    let host = MockHost::with_engine_classes();
    let mesh = hand(&host);
    let mut engine = AnimationEngine::new();
    engine.add("hand", mesh, Arc::new(hand_definition()));

    engine.animate(&host, "left_hand", "grip", "on");
    engine.pose(&host, "left_hand", "fist");

    assert!(host.calls().is_empty());
    assert_eq!(engine.len(), 1);
    assert!(!engine.is_pressed("left_hand", "grip"));
}

// =============================================================================
// Definitions
// =============================================================================

#[test]
fn registered_definition_returns_inserted_pose() {
    let mut definition = AnimationDefinition::new();
    let pose = pose_from([
        ("thumb", Rotator::new(10.0, 0.0, 0.0)),
        ("index", Rotator::new(-3.5, 12.0, 90.0)),
    ]);
    definition.insert_position("grip", "on", pose.clone());

    let host = MockHost::with_engine_classes();
    let mut engine = AnimationEngine::new();
    engine.add("hand", hand(&host), Arc::new(definition));

    let stored = engine.instance("hand").unwrap().definition.position("grip", "on");
    assert_eq!(stored, Some(&pose));
}

#[test]
fn definition_survives_json_round_trip() {
    let definition = hand_definition();
    let json = definition.to_json().unwrap();
    assert_eq!(AnimationDefinition::from_json(&json).unwrap(), definition);
}

#[test]
fn shared_definition_drives_two_instances() {
    let host = MockHost::with_engine_classes();
    let left = hand(&host);
    let right = hand(&host);
    let definition = Arc::new(hand_definition());

    let mut engine = AnimationEngine::new();
    engine.add("left", left, definition.clone());
    engine.add("right", right, definition.clone());
    assert_eq!(Arc::strong_count(&definition), 3);

    engine.update_animation(&host, "right", "grip", true, None);
    assert!(host.bone_local_rotation(left, "thumb").unwrap().approx_eq(Rotator::ZERO, TOLERANCE));
    assert!(
        host.bone_local_rotation(right, "thumb")
            .unwrap()
            .approx_eq(Rotator::new(10.0, 0.0, 0.0), TOLERANCE)
    );
    assert!(host.is_valid(left));
}

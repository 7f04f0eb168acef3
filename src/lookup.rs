//! Name-based object discovery.
//!
//! Most lookups are best effort and return `Option`. [`find_object`] and
//! [`find_class`] take a [`Requirement`] so callers can mark names the mod
//! cannot work without; those come back as `Err(HostError::NotFound)` and the
//! caller decides whether to abort the feature.

use log::{debug, info};

use crate::host::call::{call, call_returning};
use crate::host::{ClassHandle, HostError, LookupKind, ObjectHandle, ObjectModel, Value};

/// Whether a missing name is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Missing is fine; the lookup yields `None`.
    Optional,
    /// Missing is a hard error for the calling feature.
    Required,
}

/// Look up an object by qualified name.
pub fn find_object(
    host: &dyn ObjectModel,
    name: &str,
    requirement: Requirement,
) -> Result<Option<ObjectHandle>, HostError> {
    match (host.find_object(name), requirement) {
        (Some(object), _) => Ok(Some(object)),
        (None, Requirement::Optional) => {
            debug!("Object {} not found", name);
            Ok(None)
        }
        (None, Requirement::Required) => Err(HostError::NotFound {
            kind: LookupKind::Object,
            name: name.to_string(),
        }),
    }
}

/// Look up a class by qualified name, bypassing the class cache.
pub fn find_class(
    host: &dyn ObjectModel,
    name: &str,
    requirement: Requirement,
) -> Result<Option<ClassHandle>, HostError> {
    match (host.find_class(name), requirement) {
        (Some(class), _) => Ok(Some(class)),
        (None, Requirement::Optional) => {
            debug!("Class {} not found", name);
            Ok(None)
        }
        (None, Requirement::Required) => Err(HostError::NotFound {
            kind: LookupKind::Class,
            name: name.to_string(),
        }),
    }
}

/// Shorthand for `find_object(.., Requirement::Required)`.
pub fn find_required_object(host: &dyn ObjectModel, name: &str) -> Result<ObjectHandle, HostError> {
    find_object(host, name, Requirement::Required)?.ok_or_else(|| HostError::NotFound {
        kind: LookupKind::Object,
        name: name.to_string(),
    })
}

/// Split `a.b.c` into `("a.b", "c")`. Without a period the whole input is
/// the first half.
pub fn split_on_last_period(input: &str) -> (&str, &str) {
    input.rsplit_once('.').unwrap_or((input, ""))
}

/// The object's own name within a full name: the part after the last `.`,
/// `:` or space, so subobjects (`Outer:Name`) yield `Name`.
pub fn object_name(full_name: &str) -> &str {
    full_name
        .rsplit_once(['.', ':', ' '])
        .map_or(full_name, |(_, name)| name)
}

/// Find an instance of `class_name` by object name.
///
/// A name without a period is matched against the part of each instance's
/// full name after its last period; otherwise the full name must match
/// exactly. Class default objects are included.
pub fn find_instance_of(host: &dyn ObjectModel, class_name: &str, object_name: &str) -> Option<ObjectHandle> {
    let class = host.find_class(class_name)?;
    let short = !object_name.contains('.');
    host.instances_of(class, true).into_iter().find(|instance| {
        let Some(full_name) = host.full_name(*instance) else {
            return false;
        };
        if short {
            let (_, after) = split_on_last_period(&full_name);
            !after.is_empty() && after == object_name
        } else {
            full_name == object_name
        }
    })
}

pub fn find_all_of(host: &dyn ObjectModel, class_name: &str, include_default: bool) -> Vec<ObjectHandle> {
    match host.find_class(class_name) {
        Some(class) => host.instances_of(class, include_default),
        None => Vec::new(),
    }
}

pub fn find_first_of(host: &dyn ObjectModel, class_name: &str, include_default: bool) -> Option<ObjectHandle> {
    let class = host.find_class(class_name)?;
    host.first_instance_of(class, include_default)
}

/// Class default object of `class_name`.
pub fn find_default_instance(host: &dyn ObjectModel, class_name: &str) -> Option<ObjectHandle> {
    let class = host.find_class(class_name)?;
    host.class_default_object(class)
}

/// Log `index full_name` for every live instance of `class_name`.
pub fn print_instance_names(host: &dyn ObjectModel, class_name: &str) {
    let Some(class) = host.find_class(class_name) else {
        info!("{} was not found", class_name);
        return;
    };
    for (index, instance) in host.instances_of(class, false).into_iter().enumerate() {
        let full_name = host.full_name(instance).unwrap_or_default();
        info!("{} {} {}", index, object_name(&full_name), full_name);
    }
}

/// First attached child of `parent` whose full name contains `partial_name`.
pub fn child_component(host: &dyn ObjectModel, parent: ObjectHandle, partial_name: &str) -> Option<ObjectHandle> {
    let children = host.get_property(parent, "AttachChildren").ok()?;
    children
        .as_array()?
        .iter()
        .filter_map(Value::as_object)
        .find(|child| {
            host.full_name(*child)
                .is_some_and(|name| name.contains(partial_name))
        })
}

/// Copy every material slot of `from` onto `to`. Returns the number of
/// slots written.
pub fn copy_materials(host: &dyn ObjectModel, from: ObjectHandle, to: ObjectHandle) -> usize {
    let materials = match call_returning(host, from, "GetMaterials", &[]) {
        Ok(Value::Array(materials)) => materials,
        Ok(_) => return 0,
        Err(e) => {
            debug!("copy_materials: {}", e);
            return 0;
        }
    };
    let mut copied = 0;
    for (index, material) in materials.into_iter().enumerate() {
        let args = [Value::Int(index as i32), material];
        match call(host, to, "SetMaterial", &args) {
            Ok(_) => copied += 1,
            Err(e) => debug!("copy_materials: slot {}: {}", index, e),
        }
    }
    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::host::{
        MATERIAL_CLASS, MATH_LIBRARY_CLASS, POSEABLE_MESH_CLASS, SCENE_COMPONENT_CLASS,
    };

    #[test]
    fn test_split_on_last_period() {
        assert_eq!(split_on_last_period("a.b.c"), ("a.b", "c"));
        assert_eq!(split_on_last_period("abc"), ("abc", ""));
    }

    #[test]
    fn test_object_name_of_subobject() {
        assert_eq!(
            object_name("SceneComponent /Game/Maps/Level.Level:PersistentLevel.Pawn_0:Weapon"),
            "Weapon"
        );
        assert_eq!(object_name("Actor /Game/Maps/Level.Level:PersistentLevel.Pawn_0"), "Pawn_0");
        assert_eq!(object_name("Package /Engine"), "/Engine");
        assert_eq!(object_name("Hand"), "Hand");
    }

    #[test]
    fn test_required_lookup_fails_fast() {
        let host = MockHost::with_engine_classes();
        let err = find_object(&host, "Missing /Game/Nope.Nope", Requirement::Required).unwrap_err();
        assert!(matches!(
            err,
            HostError::NotFound {
                kind: LookupKind::Object,
                ..
            }
        ));
        assert!(find_required_object(&host, "Missing /Game/Nope.Nope").is_err());
    }

    #[test]
    fn test_optional_lookup_returns_none() {
        let host = MockHost::with_engine_classes();
        let found = find_object(&host, "Missing /Game/Nope.Nope", Requirement::Optional).unwrap();
        assert_eq!(found, None);
        assert_eq!(
            find_class(&host, "Class /Script/Nope.Nope", Requirement::Optional).unwrap(),
            None
        );
    }

    #[test]
    fn test_find_instance_by_short_and_full_name() {
        let host = MockHost::with_engine_classes();
        let hand = host.spawn_named(SCENE_COMPONENT_CLASS, "RightHand").unwrap();
        host.spawn_named(SCENE_COMPONENT_CLASS, "LeftHand").unwrap();

        assert_eq!(find_instance_of(&host, SCENE_COMPONENT_CLASS, "RightHand"), Some(hand));
        let full = host.full_name(hand).unwrap();
        assert_eq!(find_instance_of(&host, SCENE_COMPONENT_CLASS, &full), Some(hand));
        assert_eq!(find_instance_of(&host, SCENE_COMPONENT_CLASS, "Hand"), None);
    }

    #[test]
    fn test_find_all_and_first_of() {
        let host = MockHost::with_engine_classes();
        let a = host.spawn_named(POSEABLE_MESH_CLASS, "A").unwrap();
        let b = host.spawn_named(POSEABLE_MESH_CLASS, "B").unwrap();

        assert_eq!(find_all_of(&host, SCENE_COMPONENT_CLASS, false), vec![a, b]);
        assert_eq!(find_first_of(&host, POSEABLE_MESH_CLASS, false), Some(a));
        assert!(find_all_of(&host, "Class /Script/Nope.Nope", true).is_empty());
    }

    #[test]
    fn test_find_default_instance() {
        let host = MockHost::with_engine_classes();
        let cdo = find_default_instance(&host, MATH_LIBRARY_CLASS).unwrap();
        assert!(host.full_name(cdo).unwrap().ends_with("Default__KismetMathLibrary"));
        assert_eq!(find_default_instance(&host, SCENE_COMPONENT_CLASS), None);
    }

    #[test]
    fn test_child_component_by_partial_name() {
        let host = MockHost::with_engine_classes();
        let parent = host.spawn_named(SCENE_COMPONENT_CLASS, "Root").unwrap();
        let child = host.spawn_named(SCENE_COMPONENT_CLASS, "WeaponMesh").unwrap();
        let socket = host.intern_name("None");
        call(
            &host,
            child,
            "K2_AttachTo",
            &[
                Value::Object(Some(parent)),
                Value::Name(socket),
                Value::Int(0),
                Value::Bool(false),
            ],
        )
        .unwrap();

        assert_eq!(child_component(&host, parent, "Weapon"), Some(child));
        assert_eq!(child_component(&host, parent, "Shield"), None);
    }

    #[test]
    fn test_copy_materials() {
        let host = MockHost::with_engine_classes();
        let from = host.spawn_named(POSEABLE_MESH_CLASS, "From").unwrap();
        let to = host.spawn_named(POSEABLE_MESH_CLASS, "To").unwrap();
        let m0 = host.spawn_named(MATERIAL_CLASS, "Skin").unwrap();
        let m1 = host.spawn_named(MATERIAL_CLASS, "Nails").unwrap();
        host.set_property(
            from,
            "OverrideMaterials",
            Value::Array(vec![Value::Object(Some(m0)), Value::Object(Some(m1))]),
        )
        .unwrap();

        assert_eq!(copy_materials(&host, from, to), 2);
        assert_eq!(
            host.get_property(to, "OverrideMaterials").unwrap(),
            Value::Array(vec![Value::Object(Some(m0)), Value::Object(Some(m1))])
        );
    }
}

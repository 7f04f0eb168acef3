//! Object model facade.
//!
//! Everything this crate does to the host engine goes through the
//! [`ObjectModel`] trait: name lookups, spawning, reflected property access
//! and reflected function calls. The engine owns every object; the handles in
//! this module are non-owning indices into its object table and may go stale
//! at any time, so liveness is always re-checked with
//! [`ObjectModel::is_valid`] rather than assumed.
//!
//! Submodules
//! - [`value`] – typed reflection values (`Value`, `Rotator`, `Transform`)
//! - [`call`] – function signatures and the schema-checked [`call::call`]
//! - [`logger`] – `log` bridge into the host's own log sink
//! - [`mock`] – in-memory engine used by tests and the demo CLI

use std::fmt;

pub mod call;
pub mod logger;
pub mod mock;
pub mod value;

pub use call::{FunctionSignature, Param};
pub use logger::LogLevel;
pub use value::{Rotator, Transform, Value, ValueKind};

pub const OBJECT_CLASS: &str = "Class /Script/CoreUObject.Object";
pub const ACTOR_CLASS: &str = "Class /Script/Engine.Actor";
pub const SCENE_COMPONENT_CLASS: &str = "Class /Script/Engine.SceneComponent";
pub const MOTION_CONTROLLER_CLASS: &str = "Class /Script/HeadMountedDisplay.MotionControllerComponent";
pub const MESH_COMPONENT_CLASS: &str = "Class /Script/Engine.MeshComponent";
pub const POSEABLE_MESH_CLASS: &str = "Class /Script/Engine.PoseableMeshComponent";
pub const MATERIAL_CLASS: &str = "Class /Script/Engine.MaterialInterface";
pub const MATH_LIBRARY_CLASS: &str = "Class /Script/Engine.KismetMathLibrary";

/// Handle to a live engine object (actor, component, struct instance, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

/// Handle to a reflected class descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassHandle(pub u64);

/// Handle to a reflected function on some class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionHandle(pub u64);

/// Interned engine name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameHandle(pub u32);

/// What kind of thing a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Class,
    Object,
    Function,
    Property,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LookupKind::Class => "class",
            LookupKind::Object => "object",
            LookupKind::Function => "function",
            LookupKind::Property => "property",
        };
        f.write_str(s)
    }
}

/// Errors reported by the facade and the checked call layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// A qualified name did not resolve.
    #[error("Cannot find {kind}: {name}")]
    NotFound { kind: LookupKind, name: String },

    /// The object no longer validates against the live-object registry.
    #[error("Stale object handle {0:?}")]
    StaleHandle(ObjectHandle),

    /// Arguments or return value did not match the function's parameter schema.
    #[error("Signature mismatch calling {function}: {reason}")]
    SignatureMismatch { function: String, reason: String },

    /// A typed property access used the wrong type.
    #[error("Property {property} is {found:?}, expected {expected:?}")]
    TypeMismatch {
        property: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// The engine rejected or failed the call.
    #[error("Invocation failed: {0}")]
    Invocation(String),
}

/// Capability surface the crate requires from the host engine.
///
/// Implementations must be callable from the game thread and, for the
/// class-cache path, from auxiliary threads; hence `Send + Sync`.
pub trait ObjectModel: Send + Sync {
    /// Resolve a class descriptor by qualified name, e.g.
    /// `Class /Script/Engine.Actor`.
    fn find_class(&self, qualified_name: &str) -> Option<ClassHandle>;

    /// Resolve any object by qualified name.
    fn find_object(&self, qualified_name: &str) -> Option<ObjectHandle>;

    fn object_class(&self, object: ObjectHandle) -> Option<ClassHandle>;

    /// Parent in the single-inheritance chain.
    fn super_class(&self, class: ClassHandle) -> Option<ClassHandle>;

    /// Fully qualified object name, e.g. `MeshComponent /Game/Map.Map:Hand.Mesh`.
    fn full_name(&self, object: ObjectHandle) -> Option<String>;

    /// Construct a new (non-actor) object of `class`.
    fn spawn_object(&self, class: ClassHandle, outer: Option<ObjectHandle>) -> Option<ObjectHandle>;

    /// Spawn a bare actor into the current world.
    fn spawn_actor(
        &self,
        transform: &Transform,
        collision_handling: i32,
        owner: Option<ObjectHandle>,
    ) -> Option<ObjectHandle>;

    /// Read a property by name. The engine checks the name; the caller
    /// checks the type via the returned [`Value`]'s kind.
    fn get_property(&self, object: ObjectHandle, name: &str) -> Result<Value, HostError>;

    /// Write a property by name. Implementations must reject a value whose
    /// kind differs from the property's declared kind.
    fn set_property(&self, object: ObjectHandle, name: &str, value: Value) -> Result<(), HostError>;

    /// Find a function on `class` or any of its ancestors.
    fn find_function(&self, class: ClassHandle, name: &str) -> Option<FunctionHandle>;

    fn function_signature(&self, function: FunctionHandle) -> Option<FunctionSignature>;

    /// Raw invocation. Prefer [`call::call`], which checks `args` against the
    /// function's signature first.
    fn process_event(
        &self,
        object: ObjectHandle,
        function: FunctionHandle,
        args: &[Value],
    ) -> Result<Option<Value>, HostError>;

    fn instances_of(&self, class: ClassHandle, include_defaults: bool) -> Vec<ObjectHandle>;

    fn first_instance_of(&self, class: ClassHandle, include_defaults: bool) -> Option<ObjectHandle> {
        self.instances_of(class, include_defaults).into_iter().next()
    }

    /// Class default object (CDO).
    fn class_default_object(&self, class: ClassHandle) -> Option<ObjectHandle>;

    /// Liveness check against the engine's live-object registry.
    fn is_valid(&self, object: ObjectHandle) -> bool;

    fn intern_name(&self, name: &str) -> NameHandle;

    fn name_string(&self, name: NameHandle) -> Option<String>;

    /// Drop any motion-controller associations the host persisted for
    /// objects of the previous level.
    fn remove_motion_controller_states(&self) {}

    fn log(&self, level: LogLevel, message: &str);
}

/// Typed property read.
pub fn property<T>(
    host: &dyn ObjectModel,
    object: ObjectHandle,
    name: &str,
    extract: impl FnOnce(&Value) -> Option<T>,
    expected: ValueKind,
) -> Result<T, HostError> {
    let value = host.get_property(object, name)?;
    extract(&value).ok_or_else(|| HostError::TypeMismatch {
        property: name.to_string(),
        expected,
        found: value.kind(),
    })
}

#[cfg(test)]
mod tests {
    use super::mock::MockHost;
    use super::*;

    #[test]
    fn test_typed_property_read_reports_mismatch() {
        let host = MockHost::with_engine_classes();
        let actor = host.spawn_actor(&Transform::IDENTITY, 1, None).unwrap();

        let err = property(&host, actor, "Tags", Value::as_float, ValueKind::Float).unwrap_err();
        assert!(matches!(
            err,
            HostError::TypeMismatch {
                expected: ValueKind::Float,
                found: ValueKind::Array,
                ..
            }
        ));
    }

    #[test]
    fn test_typed_property_read_missing_property() {
        let host = MockHost::with_engine_classes();
        let actor = host.spawn_actor(&Transform::IDENTITY, 1, None).unwrap();

        let err = property(&host, actor, "Nope", Value::as_float, ValueKind::Float).unwrap_err();
        assert!(matches!(
            err,
            HostError::NotFound {
                kind: LookupKind::Property,
                ..
            }
        ));
    }
}

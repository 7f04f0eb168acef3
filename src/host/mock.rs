//! In-memory engine for tests and the demo CLI.
//!
//! [`MockHost`] implements [`ObjectModel`] over a small object table with
//! single-inheritance classes, default-valued properties and native
//! functions written in Rust. [`MockHost::with_engine_classes`] registers the
//! handful of engine classes this crate talks to (actors, scene and motion
//! controller components, poseable meshes, the math library) with the same
//! qualified names and function signatures the real engine exposes.
//!
//! It also records what happened (function calls, class lookups, log lines)
//! so tests can assert on it.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::{Quat, Vec3};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use super::call::FunctionSignature;
use super::logger::LogLevel;
use super::value::{Rotator, Transform, Value, ValueKind};
use super::{
    ClassHandle, FunctionHandle, HostError, LookupKind, NameHandle, ObjectHandle, ObjectModel,
};
use super::{
    ACTOR_CLASS, MATERIAL_CLASS, MATH_LIBRARY_CLASS, MESH_COMPONENT_CLASS,
    MOTION_CONTROLLER_CLASS, OBJECT_CLASS, POSEABLE_MESH_CLASS, SCENE_COMPONENT_CLASS,
};

const LEVEL_PATH: &str = "/Game/Mock.Mock:PersistentLevel";

/// Native implementation of a mock function.
pub type NativeFn =
    Arc<dyn Fn(&mut MockState, ObjectHandle, &[Value]) -> Result<Option<Value>, HostError> + Send + Sync>;

/// One recorded `process_event` call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub object: ObjectHandle,
    pub function: String,
    pub args: Vec<Value>,
}

struct MockClass {
    name: String,
    parent: Option<ClassHandle>,
    functions: FxHashMap<String, FunctionHandle>,
    properties: Vec<(String, Value)>,
    default_object: Option<ObjectHandle>,
}

struct MockFunction {
    signature: FunctionSignature,
    native: NativeFn,
}

#[derive(Debug, Clone)]
struct MockBone {
    parent: Option<String>,
    rotation: Quat,
}

struct MockObject {
    name: String,
    class: ClassHandle,
    alive: bool,
    is_default: bool,
    properties: FxHashMap<String, Value>,
    bones: BTreeMap<String, MockBone>,
    components: Vec<ObjectHandle>,
}

/// Mutable engine state. Native functions receive it directly.
#[derive(Default)]
pub struct MockState {
    next_id: u64,
    classes: FxHashMap<ClassHandle, MockClass>,
    class_names: FxHashMap<String, ClassHandle>,
    functions: FxHashMap<FunctionHandle, MockFunction>,
    objects: BTreeMap<ObjectHandle, MockObject>,
    names: Vec<String>,
    name_ids: FxHashMap<String, NameHandle>,
    class_lookups: FxHashMap<String, usize>,
    calls: Vec<MockCall>,
    logs: Vec<(LogLevel, String)>,
    motion_state_resets: usize,
    failing_bones: FxHashSet<(ObjectHandle, String)>,
    failing_functions: FxHashSet<String>,
}

impl MockState {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn intern(&mut self, name: &str) -> NameHandle {
        if let Some(id) = self.name_ids.get(name) {
            return *id;
        }
        let id = NameHandle(self.names.len() as u32);
        self.names.push(name.to_string());
        self.name_ids.insert(name.to_string(), id);
        id
    }

    pub fn name(&self, name: NameHandle) -> Option<&str> {
        self.names.get(name.0 as usize).map(String::as_str)
    }

    fn class_short_name(&self, class: ClassHandle) -> String {
        self.classes
            .get(&class)
            .map(|c| c.name.rsplit('.').next().unwrap_or(&c.name).to_string())
            .unwrap_or_default()
    }

    fn is_a(&self, class: ClassHandle, ancestor: ClassHandle) -> bool {
        let mut current = Some(class);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.classes.get(&c).and_then(|c| c.parent);
        }
        false
    }

    fn default_properties(&self, class: ClassHandle) -> FxHashMap<String, Value> {
        let mut chain = Vec::new();
        let mut current = Some(class);
        while let Some(c) = current {
            chain.push(c);
            current = self.classes.get(&c).and_then(|c| c.parent);
        }
        let mut props = FxHashMap::default();
        for c in chain.into_iter().rev() {
            if let Some(class) = self.classes.get(&c) {
                for (name, value) in &class.properties {
                    props.insert(name.clone(), value.clone());
                }
            }
        }
        props
    }

    /// Create a live object of `class` with the given full name.
    pub fn instantiate(&mut self, class: ClassHandle, full_name: String, is_default: bool) -> ObjectHandle {
        let handle = ObjectHandle(self.next());
        let properties = self.default_properties(class);
        self.objects.insert(
            handle,
            MockObject {
                name: full_name,
                class,
                alive: true,
                is_default,
                properties,
                bones: BTreeMap::new(),
                components: Vec::new(),
            },
        );
        handle
    }

    fn live(&self, object: ObjectHandle) -> Result<&MockObject, HostError> {
        self.objects
            .get(&object)
            .filter(|o| o.alive)
            .ok_or(HostError::StaleHandle(object))
    }

    fn live_mut(&mut self, object: ObjectHandle) -> Result<&mut MockObject, HostError> {
        self.objects
            .get_mut(&object)
            .filter(|o| o.alive)
            .ok_or(HostError::StaleHandle(object))
    }

    fn property(&self, object: ObjectHandle, name: &str) -> Result<Value, HostError> {
        self.live(object)?
            .properties
            .get(name)
            .cloned()
            .ok_or_else(|| HostError::NotFound {
                kind: LookupKind::Property,
                name: name.to_string(),
            })
    }

    fn set_property(&mut self, object: ObjectHandle, name: &str, value: Value) -> Result<(), HostError> {
        let slot = self
            .live_mut(object)?
            .properties
            .get_mut(name)
            .ok_or_else(|| HostError::NotFound {
                kind: LookupKind::Property,
                name: name.to_string(),
            })?;
        if slot.kind() != value.kind() {
            return Err(HostError::TypeMismatch {
                property: name.to_string(),
                expected: slot.kind(),
                found: value.kind(),
            });
        }
        *slot = value;
        Ok(())
    }

    fn destroy(&mut self, object: ObjectHandle) {
        let components = match self.objects.get_mut(&object) {
            Some(o) => {
                o.alive = false;
                std::mem::take(&mut o.components)
            }
            None => return,
        };
        for component in components {
            if let Some(c) = self.objects.get_mut(&component) {
                c.alive = false;
            }
        }
    }

    fn bone_rotation(&self, object: ObjectHandle, bone: &str) -> Quat {
        self.objects
            .get(&object)
            .and_then(|o| o.bones.get(bone))
            .map(|b| b.rotation)
            .unwrap_or(Quat::IDENTITY)
    }
}

fn arg<'a>(args: &'a [Value], index: usize, function: &str) -> Result<&'a Value, HostError> {
    args.get(index)
        .ok_or_else(|| HostError::Invocation(format!("{} is missing argument {}", function, index)))
}

fn name_arg(state: &MockState, args: &[Value], index: usize, function: &str) -> Result<String, HostError> {
    let handle = arg(args, index, function)?
        .as_name()
        .ok_or_else(|| HostError::Invocation(format!("{} expects a name at {}", function, index)))?;
    Ok(state.name(handle).unwrap_or("None").to_string())
}

/// Thread-safe mock engine.
pub struct MockHost {
    state: Mutex<MockState>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    /// Create an engine with no classes. `None` is pre-interned.
    pub fn new() -> Self {
        let mut state = MockState::default();
        state.intern("None");
        MockHost {
            state: Mutex::new(state),
        }
    }

    /// Create an engine with the standard engine classes registered.
    pub fn with_engine_classes() -> Self {
        let host = Self::new();
        host.register_engine_classes();
        host
    }

    pub fn define_class(&self, qualified_name: &str, parent: Option<ClassHandle>) -> ClassHandle {
        let mut state = self.state.lock();
        if let Some(existing) = state.class_names.get(qualified_name) {
            return *existing;
        }
        let handle = ClassHandle(state.next());
        state.classes.insert(
            handle,
            MockClass {
                name: qualified_name.to_string(),
                parent,
                functions: FxHashMap::default(),
                properties: Vec::new(),
                default_object: None,
            },
        );
        state.class_names.insert(qualified_name.to_string(), handle);
        handle
    }

    pub fn define_property(&self, class: ClassHandle, name: &str, default: Value) {
        let mut state = self.state.lock();
        if let Some(c) = state.classes.get_mut(&class) {
            c.properties.push((name.to_string(), default));
        }
    }

    pub fn define_function(
        &self,
        class: ClassHandle,
        signature: FunctionSignature,
        native: impl Fn(&mut MockState, ObjectHandle, &[Value]) -> Result<Option<Value>, HostError>
            + Send
            + Sync
            + 'static,
    ) -> FunctionHandle {
        let mut state = self.state.lock();
        let handle = FunctionHandle(state.next());
        if let Some(c) = state.classes.get_mut(&class) {
            c.functions.insert(signature.name.clone(), handle);
        }
        state.functions.insert(
            handle,
            MockFunction {
                signature,
                native: Arc::new(native),
            },
        );
        handle
    }

    /// Give `class` a default object named `Default__<Class>`.
    pub fn define_default_object(&self, class: ClassHandle) -> ObjectHandle {
        let mut state = self.state.lock();
        let short = state.class_short_name(class);
        let package = state
            .classes
            .get(&class)
            .and_then(|c| c.name.split(' ').nth(1))
            .and_then(|path| path.rsplit_once('.').map(|(p, _)| p.to_string()))
            .unwrap_or_default();
        let name = format!("{} {}.Default__{}", short, package, short);
        let handle = state.instantiate(class, name, true);
        if let Some(c) = state.classes.get_mut(&class) {
            c.default_object = Some(handle);
        }
        handle
    }

    /// Spawn a live object of a registered class under the mock level.
    pub fn spawn_named(&self, class_name: &str, short_name: &str) -> Option<ObjectHandle> {
        let mut state = self.state.lock();
        let class = *state.class_names.get(class_name)?;
        let full_name = format!("{} {}.{}", state.class_short_name(class), LEVEL_PATH, short_name);
        Some(state.instantiate(class, full_name, false))
    }

    /// Add a bone to a poseable mesh with a component-space rotation.
    pub fn add_bone(&self, component: ObjectHandle, bone: &str, parent: Option<&str>, rotation: Rotator) {
        let mut state = self.state.lock();
        if let Some(o) = state.objects.get_mut(&component) {
            o.bones.insert(
                bone.to_string(),
                MockBone {
                    parent: parent.map(str::to_string),
                    rotation: rotation.to_quat(),
                },
            );
        }
    }

    /// Component-space rotation of a bone.
    pub fn bone_rotation(&self, component: ObjectHandle, bone: &str) -> Option<Rotator> {
        let state = self.state.lock();
        let b = state.objects.get(&component)?.bones.get(bone)?;
        Some(Rotator::from_quat(b.rotation))
    }

    /// Rotation of a bone relative to its parent.
    pub fn bone_local_rotation(&self, component: ObjectHandle, bone: &str) -> Option<Rotator> {
        let state = self.state.lock();
        let b = state.objects.get(&component)?.bones.get(bone)?;
        let parent = b
            .parent
            .as_deref()
            .map(|p| state.bone_rotation(component, p))
            .unwrap_or(Quat::IDENTITY);
        Some(Rotator::from_quat(parent.inverse() * b.rotation))
    }

    pub fn bone_names(&self, component: ObjectHandle) -> Vec<String> {
        let state = self.state.lock();
        state
            .objects
            .get(&component)
            .map(|o| o.bones.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Make every rotation write to `bone` on `component` fail.
    pub fn fail_bone(&self, component: ObjectHandle, bone: &str) {
        self.state
            .lock()
            .failing_bones
            .insert((component, bone.to_string()));
    }

    /// Make every call of `function` fail with an invocation error.
    pub fn fail_function(&self, function: &str) {
        self.state.lock().failing_functions.insert(function.to_string());
    }

    /// Simulate the engine destroying an object behind our back.
    pub fn destroy_externally(&self, object: ObjectHandle) {
        self.state.lock().destroy(object);
    }

    /// How many times `find_class` was asked for `name`.
    pub fn class_lookups(&self, name: &str) -> usize {
        self.state.lock().class_lookups.get(name).copied().unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, function: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.function == function)
            .count()
    }

    pub fn log_lines(&self) -> Vec<(LogLevel, String)> {
        self.state.lock().logs.clone()
    }

    pub fn motion_state_resets(&self) -> usize {
        self.state.lock().motion_state_resets
    }

    /// Number of live, non-default objects.
    pub fn live_object_count(&self) -> usize {
        self.state
            .lock()
            .objects
            .values()
            .filter(|o| o.alive && !o.is_default)
            .count()
    }

    fn register_engine_classes(&self) {
        let object = self.define_class(OBJECT_CLASS, None);

        let actor = self.define_class(ACTOR_CLASS, Some(object));
        self.define_property(actor, "Tags", Value::Array(Vec::new()));
        self.define_function(
            actor,
            FunctionSignature::new("AddComponentByClass")
                .param("Class", ValueKind::Class)
                .param("bManualAttachment", ValueKind::Bool)
                .param("RelativeTransform", ValueKind::Transform)
                .param("bDeferredFinish", ValueKind::Bool)
                .returns(ValueKind::Object),
            add_component_by_class,
        );
        self.define_function(actor, FunctionSignature::new("K2_DestroyActor"), |state, this, _| {
            state.live(this)?;
            state.destroy(this);
            Ok(None)
        });

        let scene = self.define_class(SCENE_COMPONENT_CLASS, Some(object));
        self.define_property(scene, "RelativeLocation", Value::Vector(Vec3::ZERO));
        self.define_property(scene, "RelativeRotation", Value::Rotator(Rotator::ZERO));
        self.define_property(scene, "AttachParent", Value::Object(None));
        self.define_property(scene, "AttachChildren", Value::Array(Vec::new()));
        self.define_function(
            scene,
            FunctionSignature::new("K2_GetComponentLocation").returns(ValueKind::Vector),
            |state, this, _| Ok(Some(state.property(this, "RelativeLocation")?)),
        );
        self.define_function(
            scene,
            FunctionSignature::new("K2_GetComponentRotation").returns(ValueKind::Rotator),
            |state, this, _| Ok(Some(state.property(this, "RelativeRotation")?)),
        );
        self.define_function(
            scene,
            FunctionSignature::new("K2_AttachTo")
                .param("InParent", ValueKind::Object)
                .param("InSocketName", ValueKind::Name)
                .param("AttachType", ValueKind::Int)
                .param("bWeldSimulatedBodies", ValueKind::Bool)
                .returns(ValueKind::Bool),
            attach_to,
        );

        let motion = self.define_class(MOTION_CONTROLLER_CLASS, Some(scene));
        let none = self.intern_name("None");
        self.define_property(motion, "MotionSource", Value::Name(none));

        let mesh = self.define_class(MESH_COMPONENT_CLASS, Some(scene));
        self.define_property(mesh, "OverrideMaterials", Value::Array(Vec::new()));
        self.define_function(
            mesh,
            FunctionSignature::new("GetMaterials").returns(ValueKind::Array),
            |state, this, _| Ok(Some(state.property(this, "OverrideMaterials")?)),
        );
        self.define_function(
            mesh,
            FunctionSignature::new("SetMaterial")
                .param("ElementIndex", ValueKind::Int)
                .param("Material", ValueKind::Object),
            set_material,
        );

        let poseable = self.define_class(POSEABLE_MESH_CLASS, Some(mesh));
        self.define_function(
            poseable,
            FunctionSignature::new("GetParentBone")
                .param("BoneName", ValueKind::Name)
                .returns(ValueKind::Name),
            |state, this, args| {
                let bone = name_arg(state, args, 0, "GetParentBone")?;
                let parent = state
                    .live(this)?
                    .bones
                    .get(&bone)
                    .and_then(|b| b.parent.clone())
                    .unwrap_or_else(|| "None".to_string());
                Ok(Some(Value::Name(state.intern(&parent))))
            },
        );
        self.define_function(
            poseable,
            FunctionSignature::new("GetBoneTransformByName")
                .param("BoneName", ValueKind::Name)
                .param("BoneSpace", ValueKind::Int)
                .returns(ValueKind::Transform),
            |state, this, args| {
                let bone = name_arg(state, args, 0, "GetBoneTransformByName")?;
                state.live(this)?;
                Ok(Some(Value::Transform(Transform {
                    rotation: state.bone_rotation(this, &bone),
                    ..Transform::IDENTITY
                })))
            },
        );
        self.define_function(
            poseable,
            FunctionSignature::new("SetBoneRotationByName")
                .param("BoneName", ValueKind::Name)
                .param("InRotation", ValueKind::Rotator)
                .param("BoneSpace", ValueKind::Int),
            set_bone_rotation,
        );

        self.define_class(MATERIAL_CLASS, Some(object));

        let math = self.define_class(MATH_LIBRARY_CLASS, Some(object));
        self.define_function(
            math,
            FunctionSignature::new("GetForwardVector")
                .param("InRot", ValueKind::Rotator)
                .returns(ValueKind::Vector),
            |_, _, args| {
                let rot = arg(args, 0, "GetForwardVector")?
                    .as_rotator()
                    .ok_or_else(|| HostError::Invocation("GetForwardVector expects a rotator".into()))?;
                let (sp, cp) = rot.pitch.to_radians().sin_cos();
                let (sy, cy) = rot.yaw.to_radians().sin_cos();
                Ok(Some(Value::Vector(Vec3::new(cp * cy, cp * sy, sp))))
            },
        );
        self.define_default_object(math);
    }
}

fn add_component_by_class(
    state: &mut MockState,
    this: ObjectHandle,
    args: &[Value],
) -> Result<Option<Value>, HostError> {
    let class = match arg(args, 0, "AddComponentByClass")? {
        Value::Class(Some(class)) => *class,
        _ => return Ok(Some(Value::Object(None))),
    };
    let owner_name = state.live(this)?.name.clone();
    let owner_path = owner_name.split_once(' ').map(|(_, p)| p).unwrap_or(&owner_name).to_string();
    let short = state.class_short_name(class);
    let id = state.next_id + 1;
    let component = state.instantiate(class, format!("{} {}.{}_{}", short, owner_path, short, id), false);
    state.live_mut(this)?.components.push(component);
    Ok(Some(Value::Object(Some(component))))
}

fn attach_to(state: &mut MockState, this: ObjectHandle, args: &[Value]) -> Result<Option<Value>, HostError> {
    let parent = match arg(args, 0, "K2_AttachTo")?.as_object() {
        Some(p) if state.live(p).is_ok() => p,
        _ => return Ok(Some(Value::Bool(false))),
    };
    state.set_property(this, "AttachParent", Value::Object(Some(parent)))?;
    let mut children = state
        .property(parent, "AttachChildren")?
        .as_array()
        .map(<[Value]>::to_vec)
        .unwrap_or_default();
    children.push(Value::Object(Some(this)));
    state.set_property(parent, "AttachChildren", Value::Array(children))?;
    Ok(Some(Value::Bool(true)))
}

fn set_material(state: &mut MockState, this: ObjectHandle, args: &[Value]) -> Result<Option<Value>, HostError> {
    let index = arg(args, 0, "SetMaterial")?
        .as_int()
        .ok_or_else(|| HostError::Invocation("SetMaterial expects an index".into()))?;
    let material = arg(args, 1, "SetMaterial")?.clone();
    let mut materials = state
        .property(this, "OverrideMaterials")?
        .as_array()
        .map(<[Value]>::to_vec)
        .unwrap_or_default();
    let index = usize::try_from(index)
        .map_err(|_| HostError::Invocation(format!("SetMaterial index {} is negative", index)))?;
    if materials.len() <= index {
        materials.resize(index + 1, Value::Object(None));
    }
    materials[index] = material;
    state.set_property(this, "OverrideMaterials", Value::Array(materials))?;
    Ok(None)
}

fn set_bone_rotation(state: &mut MockState, this: ObjectHandle, args: &[Value]) -> Result<Option<Value>, HostError> {
    let bone = name_arg(state, args, 0, "SetBoneRotationByName")?;
    let rotation = arg(args, 1, "SetBoneRotationByName")?
        .as_rotator()
        .ok_or_else(|| HostError::Invocation("SetBoneRotationByName expects a rotator".into()))?;
    if state.failing_bones.contains(&(this, bone.clone())) {
        return Err(HostError::Invocation(format!("bone {} rejected the write", bone)));
    }
    let object = state.live_mut(this)?;
    object
        .bones
        .entry(bone)
        .or_insert(MockBone {
            parent: None,
            rotation: Quat::IDENTITY,
        })
        .rotation = rotation.to_quat();
    Ok(None)
}

impl ObjectModel for MockHost {
    fn find_class(&self, qualified_name: &str) -> Option<ClassHandle> {
        let mut state = self.state.lock();
        *state
            .class_lookups
            .entry(qualified_name.to_string())
            .or_insert(0) += 1;
        state.class_names.get(qualified_name).copied()
    }

    fn find_object(&self, qualified_name: &str) -> Option<ObjectHandle> {
        let state = self.state.lock();
        state
            .objects
            .iter()
            .find(|(_, o)| o.alive && o.name == qualified_name)
            .map(|(h, _)| *h)
    }

    fn object_class(&self, object: ObjectHandle) -> Option<ClassHandle> {
        self.state.lock().objects.get(&object).map(|o| o.class)
    }

    fn super_class(&self, class: ClassHandle) -> Option<ClassHandle> {
        self.state.lock().classes.get(&class).and_then(|c| c.parent)
    }

    fn full_name(&self, object: ObjectHandle) -> Option<String> {
        self.state.lock().objects.get(&object).map(|o| o.name.clone())
    }

    fn spawn_object(&self, class: ClassHandle, outer: Option<ObjectHandle>) -> Option<ObjectHandle> {
        let mut state = self.state.lock();
        if !state.classes.contains_key(&class) {
            return None;
        }
        let outer_path = outer
            .and_then(|o| state.objects.get(&o))
            .and_then(|o| o.name.split_once(' ').map(|(_, p)| p.to_string()))
            .unwrap_or_else(|| "/Engine/Transient".to_string());
        let short = state.class_short_name(class);
        let id = state.next_id + 1;
        Some(state.instantiate(class, format!("{} {}.{}_{}", short, outer_path, short, id), false))
    }

    fn spawn_actor(
        &self,
        _transform: &Transform,
        _collision_handling: i32,
        _owner: Option<ObjectHandle>,
    ) -> Option<ObjectHandle> {
        let mut state = self.state.lock();
        if state.failing_functions.contains("SpawnActor") {
            return None;
        }
        let class = *state.class_names.get(ACTOR_CLASS)?;
        let id = state.next_id + 1;
        Some(state.instantiate(class, format!("Actor {}.Actor_{}", LEVEL_PATH, id), false))
    }

    fn get_property(&self, object: ObjectHandle, name: &str) -> Result<Value, HostError> {
        self.state.lock().property(object, name)
    }

    fn set_property(&self, object: ObjectHandle, name: &str, value: Value) -> Result<(), HostError> {
        self.state.lock().set_property(object, name, value)
    }

    fn find_function(&self, class: ClassHandle, name: &str) -> Option<FunctionHandle> {
        let state = self.state.lock();
        let mut current = Some(class);
        while let Some(c) = current {
            let class = state.classes.get(&c)?;
            if let Some(f) = class.functions.get(name) {
                return Some(*f);
            }
            current = class.parent;
        }
        None
    }

    fn function_signature(&self, function: FunctionHandle) -> Option<FunctionSignature> {
        self.state
            .lock()
            .functions
            .get(&function)
            .map(|f| f.signature.clone())
    }

    fn process_event(
        &self,
        object: ObjectHandle,
        function: FunctionHandle,
        args: &[Value],
    ) -> Result<Option<Value>, HostError> {
        let mut state = self.state.lock();
        let (name, native) = {
            let f = state
                .functions
                .get(&function)
                .ok_or_else(|| HostError::Invocation(format!("unknown function {:?}", function)))?;
            (f.signature.name.clone(), f.native.clone())
        };
        state.calls.push(MockCall {
            object,
            function: name.clone(),
            args: args.to_vec(),
        });
        if state.failing_functions.contains(&name) {
            return Err(HostError::Invocation(format!("{} failed", name)));
        }
        state.live(object)?;
        native(&mut *state, object, args)
    }

    fn instances_of(&self, class: ClassHandle, include_defaults: bool) -> Vec<ObjectHandle> {
        let state = self.state.lock();
        state
            .objects
            .iter()
            .filter(|(_, o)| o.alive && (include_defaults || !o.is_default) && state.is_a(o.class, class))
            .map(|(h, _)| *h)
            .collect()
    }

    fn class_default_object(&self, class: ClassHandle) -> Option<ObjectHandle> {
        self.state.lock().classes.get(&class).and_then(|c| c.default_object)
    }

    fn is_valid(&self, object: ObjectHandle) -> bool {
        self.state.lock().objects.get(&object).is_some_and(|o| o.alive)
    }

    fn intern_name(&self, name: &str) -> NameHandle {
        self.state.lock().intern(name)
    }

    fn name_string(&self, name: NameHandle) -> Option<String> {
        self.state.lock().name(name).map(str::to_string)
    }

    fn remove_motion_controller_states(&self) {
        self.state.lock().motion_state_resets += 1;
    }

    fn log(&self, level: LogLevel, message: &str) {
        self.state.lock().logs.push((level, message.to_string()));
    }
}

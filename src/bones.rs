//! Bone rotation access on poseable mesh components.
//!
//! Pose data is authored in bone-local space (relative to the parent bone),
//! while the engine's setter works in component space. Local rotations are
//! therefore composed with the parent bone's current component-space
//! rotation before they are written.

use glam::Quat;

use crate::host::call::{call, call_returning};
use crate::host::{HostError, ObjectHandle, ObjectModel, Rotator, Value};

/// Bone count above which a parent walk is treated as a cycle.
const MAX_BONE_DEPTH: usize = 256;

/// Coordinate space argument of the engine's bone functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoneSpace {
    World = 0,
    Component = 1,
}

/// Parent of `bone`, or `None` for a root bone.
pub fn parent_bone(host: &dyn ObjectModel, component: ObjectHandle, bone: &str) -> Result<Option<String>, HostError> {
    let name = host.intern_name(bone);
    let parent = call_returning(host, component, "GetParentBone", &[Value::Name(name)])?
        .as_name()
        .and_then(|n| host.name_string(n));
    Ok(parent.filter(|p| !p.is_empty() && p != "None"))
}

/// Walk parents from `bone` up to the skeleton root.
pub fn root_bone_of(host: &dyn ObjectModel, component: ObjectHandle, bone: &str) -> Result<String, HostError> {
    let mut current = bone.to_string();
    for _ in 0..MAX_BONE_DEPTH {
        match parent_bone(host, component, &current)? {
            Some(parent) => current = parent,
            None => return Ok(current),
        }
    }
    Err(HostError::Invocation(format!(
        "bone hierarchy above {} is deeper than {}",
        bone, MAX_BONE_DEPTH
    )))
}

/// Rotation of `bone` in `space`.
pub fn bone_rotation(
    host: &dyn ObjectModel,
    component: ObjectHandle,
    bone: &str,
    space: BoneSpace,
) -> Result<Quat, HostError> {
    let name = host.intern_name(bone);
    let args = [Value::Name(name), Value::Int(space as i32)];
    call_returning(host, component, "GetBoneTransformByName", &args)?
        .as_transform()
        .map(|t| t.rotation)
        .ok_or_else(|| HostError::Invocation("GetBoneTransformByName returned no transform".to_string()))
}

fn parent_rotation(host: &dyn ObjectModel, component: ObjectHandle, bone: &str) -> Result<Quat, HostError> {
    match parent_bone(host, component, bone)? {
        Some(parent) => bone_rotation(host, component, &parent, BoneSpace::Component),
        None => Ok(Quat::IDENTITY),
    }
}

/// Rotation of `bone` relative to its parent.
pub fn bone_local_rotation(host: &dyn ObjectModel, component: ObjectHandle, bone: &str) -> Result<Quat, HostError> {
    let own = bone_rotation(host, component, bone, BoneSpace::Component)?;
    Ok(parent_rotation(host, component, bone)?.inverse() * own)
}

/// Set `bone`'s rotation relative to its parent.
pub fn set_bone_local_rotation(
    host: &dyn ObjectModel,
    component: ObjectHandle,
    bone: &str,
    local: Quat,
) -> Result<(), HostError> {
    let parent = parent_rotation(host, component, bone)?;
    let name = host.intern_name(bone);
    let args = [
        Value::Name(name),
        Value::Rotator(Rotator::from_quat(parent * local)),
        Value::Int(BoneSpace::Component as i32),
    ];
    call(host, component, "SetBoneRotationByName", &args)?;
    Ok(())
}

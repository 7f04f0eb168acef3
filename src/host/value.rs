//! Typed values exchanged with the engine's reflection system.
//!
//! A [`Value`] is what a property read returns and what a reflected function
//! takes as arguments. [`ValueKind`] is its type tag and is what function
//! signatures are written in.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::{ClassHandle, NameHandle, ObjectHandle};

/// Engine rotator in degrees.
///
/// Deserializes either from `{ "pitch": .., "yaw": .., "roll": .. }` or from
/// a `[pitch, yaw, roll]` array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RotatorRepr")]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RotatorRepr {
    Angles([f32; 3]),
    Named { pitch: f32, yaw: f32, roll: f32 },
}

impl From<RotatorRepr> for Rotator {
    fn from(repr: RotatorRepr) -> Self {
        match repr {
            RotatorRepr::Angles([pitch, yaw, roll]) => Rotator { pitch, yaw, roll },
            RotatorRepr::Named { pitch, yaw, roll } => Rotator { pitch, yaw, roll },
        }
    }
}

const SINGULARITY_THRESHOLD: f32 = 0.499_999_5;

impl Rotator {
    pub const ZERO: Rotator = Rotator {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Rotator { pitch, yaw, roll }
    }

    /// Convert to a quaternion using the engine's axis conventions
    /// (yaw about Z, pitch about Y, roll about X).
    pub fn to_quat(self) -> Quat {
        let (sp, cp) = (self.pitch.to_radians() * 0.5).sin_cos();
        let (sy, cy) = (self.yaw.to_radians() * 0.5).sin_cos();
        let (sr, cr) = (self.roll.to_radians() * 0.5).sin_cos();

        Quat::from_xyzw(
            cr * sp * sy - sr * cp * cy,
            -cr * sp * cy - sr * cp * sy,
            cr * cp * sy - sr * sp * cy,
            cr * cp * cy + sr * sp * sy,
        )
    }

    /// Inverse of [`Rotator::to_quat`], handling the gimbal-lock poles.
    pub fn from_quat(q: Quat) -> Self {
        let singularity = q.z * q.x - q.w * q.y;
        let yaw_y = 2.0 * (q.w * q.z + q.x * q.y);
        let yaw_x = 1.0 - 2.0 * (q.y * q.y + q.z * q.z);
        let yaw = yaw_y.atan2(yaw_x).to_degrees();

        if singularity < -SINGULARITY_THRESHOLD {
            Rotator {
                pitch: -90.0,
                yaw,
                roll: normalize_axis(-yaw - 2.0 * q.x.atan2(q.w).to_degrees()),
            }
        } else if singularity > SINGULARITY_THRESHOLD {
            Rotator {
                pitch: 90.0,
                yaw,
                roll: normalize_axis(yaw - 2.0 * q.x.atan2(q.w).to_degrees()),
            }
        } else {
            Rotator {
                pitch: (2.0 * singularity).asin().to_degrees(),
                yaw,
                roll: (-2.0 * (q.w * q.x + q.y * q.z))
                    .atan2(1.0 - 2.0 * (q.x * q.x + q.y * q.y))
                    .to_degrees(),
            }
        }
    }

    /// Component-wise comparison within `tolerance` degrees, treating
    /// 180 and -180 as equal.
    pub fn approx_eq(self, other: Rotator, tolerance: f32) -> bool {
        let close = |a: f32, b: f32| normalize_axis(a - b).abs() <= tolerance;
        close(self.pitch, other.pitch) && close(self.yaw, other.yaw) && close(self.roll, other.roll)
    }
}

/// Wrap an angle in degrees into (-180, 180].
fn normalize_axis(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

/// Rotation, location and scale of an object or bone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub rotation: Quat,
    pub location: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        rotation: Quat::IDENTITY,
        location: Vec3::ZERO,
        scale: Vec3::ONE,
    };
}

/// Type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Name,
    Str,
    Object,
    Class,
    Vector,
    Rotator,
    Transform,
    Array,
}

/// A reflected property value or function argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    Name(NameHandle),
    Str(String),
    /// Object reference; `None` is the engine's null pointer.
    Object(Option<ObjectHandle>),
    Class(Option<ClassHandle>),
    Vector(Vec3),
    Rotator(Rotator),
    Transform(Transform),
    Array(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Name(_) => ValueKind::Name,
            Value::Str(_) => ValueKind::Str,
            Value::Object(_) => ValueKind::Object,
            Value::Class(_) => ValueKind::Class,
            Value::Vector(_) => ValueKind::Vector,
            Value::Rotator(_) => ValueKind::Rotator,
            Value::Transform(_) => ValueKind::Transform,
            Value::Array(_) => ValueKind::Array,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<NameHandle> {
        match self {
            Value::Name(n) => Some(*n),
            _ => None,
        }
    }

    /// Non-null object reference.
    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Value::Object(o) => *o,
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vec3> {
        match self {
            Value::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_rotator(&self) -> Option<Rotator> {
        match self {
            Value::Rotator(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_transform(&self) -> Option<Transform> {
        match self {
            Value::Transform(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

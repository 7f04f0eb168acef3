//! Timed blends between bone poses.
//!
//! A [`PoseBlend`] carries, for each bone of a target pose, the local
//! rotation the bone had when the blend started and the rotation it should
//! end at. Each tick the blend is advanced by the frame delta, the elapsed
//! fraction is shaped by an [`Easing`] curve, and every bone is written at
//! the spherical interpolation of its two rotations. The blend is done once
//! the eased alpha reaches 1.

use std::fmt;
use std::str::FromStr;

use glam::Quat;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::host::ObjectHandle;

/// Easing functions for smooth interpolation.
///
/// These functions transform a linear `t` value (0.0 to 1.0) to create
/// different acceleration/deceleration curves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant speed (no easing).
    #[default]
    Linear,
    /// Starts slow, accelerates (quadratic).
    QuadIn,
    /// Starts fast, decelerates (quadratic).
    QuadOut,
    /// Slow start and end (quadratic).
    QuadInOut,
    /// Starts slow, accelerates (cubic).
    CubicIn,
    /// Starts fast, decelerates (cubic).
    CubicOut,
    /// Slow start and end (cubic).
    CubicInOut,
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Easing::Linear => "linear",
            Easing::QuadIn => "quad_in",
            Easing::QuadOut => "quad_out",
            Easing::QuadInOut => "quad_in_out",
            Easing::CubicIn => "cubic_in",
            Easing::CubicOut => "cubic_out",
            Easing::CubicInOut => "cubic_in_out",
        };
        f.write_str(s)
    }
}

impl FromStr for Easing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "linear" => Ok(Easing::Linear),
            "quad_in" => Ok(Easing::QuadIn),
            "quad_out" => Ok(Easing::QuadOut),
            "quad_in_out" => Ok(Easing::QuadInOut),
            "cubic_in" => Ok(Easing::CubicIn),
            "cubic_out" => Ok(Easing::CubicOut),
            "cubic_in_out" => Ok(Easing::CubicInOut),
            other => Err(format!("Unknown easing '{}'", other)),
        }
    }
}

/// Apply an easing function to a normalized time value.
///
/// The input `t` is clamped to [0.0, 1.0] and transformed according to the
/// easing curve.
pub fn ease(e: Easing, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match e {
        Easing::Linear => t,
        Easing::QuadIn => t * t,
        Easing::QuadOut => t * (2.0 - t),
        Easing::QuadInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                -1.0 + (4.0 - 2.0 * t) * t
            }
        }
        Easing::CubicIn => t * t * t,
        Easing::CubicOut => {
            let p = t - 1.0;
            p * p * p + 1.0
        }
        Easing::CubicInOut => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                let p = 2.0 * t - 2.0;
                0.5 * p * p * p + 1.0
            }
        }
    }
}

/// How a toggle transition should be played instead of snapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interpolation {
    /// Blend duration in seconds. Zero, negative or non-finite snaps.
    pub duration: f32,
    #[serde(default)]
    pub easing: Easing,
}

impl Interpolation {
    pub fn new(duration: f32) -> Self {
        Interpolation {
            duration,
            easing: Easing::Linear,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn is_instant(&self) -> bool {
        !self.duration.is_finite() || self.duration <= 0.0
    }
}

/// Start and end local rotation of one bone.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneBlend {
    pub bone: String,
    pub from: Quat,
    pub to: Quat,
}

/// An in-flight blend on one component.
#[derive(Debug, Clone)]
pub struct PoseBlend {
    pub component: ObjectHandle,
    bones: SmallVec<[BoneBlend; 8]>,
    interpolation: Interpolation,
    time: f32,
}

impl PoseBlend {
    pub fn new(component: ObjectHandle, bones: SmallVec<[BoneBlend; 8]>, interpolation: Interpolation) -> Self {
        PoseBlend {
            component,
            bones,
            interpolation,
            time: 0.0,
        }
    }

    /// Advance by `dt` seconds and return the eased alpha.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.time = (self.time + dt.max(0.0)).min(self.interpolation.duration.max(0.0));
        self.alpha()
    }

    pub fn alpha(&self) -> f32 {
        if self.interpolation.is_instant() {
            return 1.0;
        }
        ease(self.interpolation.easing, self.time / self.interpolation.duration)
    }

    pub fn is_finished(&self) -> bool {
        self.alpha() >= 1.0
    }

    pub fn bones(&self) -> &[BoneBlend] {
        &self.bones
    }

    /// Per-bone local rotation at `alpha`.
    pub fn sample(&self, alpha: f32) -> impl Iterator<Item = (&str, Quat)> + '_ {
        self.bones
            .iter()
            .map(move |b| (b.bone.as_str(), b.from.slerp(b.to, alpha)))
    }
}

//! Bone pose animation definitions.
//!
//! An [`AnimationDefinition`] is immutable data shared (via `Arc`) by every
//! animation instance that uses it. It has three parts:
//!
//! - `positions[animation_name][value]` – a pose: bone name → local rotation
//! - `poses[pose_id]` – ordered `(animation_name, value)` steps replayed in
//!   sequence, so later steps win on shared bones
//! - `initial_transform[animation_id][bone]` – captured baseline transforms
//!
//! Definitions are usually authored as JSON:
//!
//! ```json
//! {
//!   "positions": { "grip": { "on": { "thumb_01": [10, 0, 0] } } },
//!   "poses": { "fist": [["grip", "on"], ["trigger", "on"]] }
//! }
//! ```

use std::fmt;
use std::path::Path;

use glam::Vec3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::host::Rotator;

/// Bone name → target local rotation.
pub type AnimationPose = FxHashMap<String, Rotator>;

/// One step of a composite pose: `(animation_name, value)`.
pub type PoseStep = (String, String);

/// Baseline transform of one bone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialBoneTransform {
    pub rotation: Rotator,
    #[serde(default)]
    pub location: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

/// Positions, composite poses and baseline transforms for one rig.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationDefinition {
    pub positions: FxHashMap<String, FxHashMap<String, AnimationPose>>,
    pub poses: FxHashMap<String, Vec<PoseStep>>,
    pub initial_transform: FxHashMap<String, FxHashMap<String, InitialBoneTransform>>,
}

/// Inconsistency found by [`AnimationDefinition::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionIssue {
    /// A pose step names a position that does not exist.
    MissingPosition {
        pose: String,
        animation: String,
        value: String,
    },
    /// A pose with no steps.
    EmptyPose(String),
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionIssue::MissingPosition {
                pose,
                animation,
                value,
            } => write!(f, "pose '{}' references missing position {}/{}", pose, animation, value),
            DefinitionIssue::EmptyPose(pose) => write!(f, "pose '{}' has no steps", pose),
        }
    }
}

impl AnimationDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON definition file.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The pose stored under `positions[animation][value]`.
    pub fn position(&self, animation: &str, value: &str) -> Option<&AnimationPose> {
        self.positions.get(animation)?.get(value)
    }

    pub fn pose_steps(&self, pose_id: &str) -> Option<&[PoseStep]> {
        self.poses.get(pose_id).map(Vec::as_slice)
    }

    pub fn insert_position(&mut self, animation: impl Into<String>, value: impl Into<String>, pose: AnimationPose) {
        self.positions
            .entry(animation.into())
            .or_default()
            .insert(value.into(), pose);
    }

    pub fn insert_pose<I, A, V>(&mut self, pose_id: impl Into<String>, steps: I)
    where
        I: IntoIterator<Item = (A, V)>,
        A: Into<String>,
        V: Into<String>,
    {
        let steps = steps.into_iter().map(|(a, v)| (a.into(), v.into())).collect();
        self.poses.insert(pose_id.into(), steps);
    }

    /// Report poses that are empty or reference positions that do not exist.
    ///
    /// Neither is fatal at runtime (missing positions are skipped), so this is
    /// an authoring aid. Issues are sorted by pose id.
    pub fn validate(&self) -> Vec<DefinitionIssue> {
        let mut pose_ids: Vec<&String> = self.poses.keys().collect();
        pose_ids.sort();

        let mut issues = Vec::new();
        for pose_id in pose_ids {
            let steps = &self.poses[pose_id];
            if steps.is_empty() {
                issues.push(DefinitionIssue::EmptyPose(pose_id.clone()));
            }
            for (animation, value) in steps {
                if self.position(animation, value).is_none() {
                    issues.push(DefinitionIssue::MissingPosition {
                        pose: pose_id.clone(),
                        animation: animation.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        issues
    }
}

/// Build an [`AnimationPose`] from `(bone, rotator)` pairs.
pub fn pose_from<I, S>(bones: I) -> AnimationPose
where
    I: IntoIterator<Item = (S, Rotator)>,
    S: Into<String>,
{
    bones.into_iter().map(|(b, r)| (b.into(), r)).collect()
}

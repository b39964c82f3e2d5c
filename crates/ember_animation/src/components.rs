//! # Animation Components
//!
//! Plain data attached to entities. All behavior lives in
//! [`AnimationSystem`](crate::AnimationSystem).

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::geometry::Geometry;
use crate::math::Mat3x4;

/// Playback state shared by bone and property animations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnimationState {
    /// Not advancing; time is zero.
    #[default]
    Stopped,
    /// Advancing every frame.
    Playing,
    /// Frozen in place; resumes without resetting time.
    Paused,
}

/// Per-entity skeletal playback.
///
/// `bones` holds one resolved transform per skeleton bone. It is seeded
/// on play, reset to identity on stop and rewritten every frame while
/// playing.
#[derive(Clone, Debug, PartialEq)]
pub struct BoneAnimation {
    /// Resolved bone transforms for the current frame.
    pub bones: Vec<Mat3x4>,
    /// Playback state.
    pub state: AnimationState,
    /// Index of the active clip in the geometry's clip table.
    pub animation: usize,
    /// Elapsed time, in clip frames.
    pub time: f32,
    /// Playback speed multiplier.
    pub speed: f32,
}

impl BoneAnimation {
    /// Stopped playback of clip `animation` at normal speed.
    #[must_use]
    pub fn new(animation: usize) -> Self {
        Self {
            animation,
            ..Self::default()
        }
    }

    /// Stopped playback with `bone_count` identity bones.
    #[must_use]
    pub fn with_bones(bone_count: usize) -> Self {
        Self {
            bones: vec![Mat3x4::IDENTITY; bone_count],
            ..Self::default()
        }
    }

    /// Checks whether playback is advancing.
    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == AnimationState::Playing
    }
}

impl Default for BoneAnimation {
    fn default() -> Self {
        Self {
            bones: Vec::new(),
            state: AnimationState::Stopped,
            animation: 0,
            time: 0.0,
            speed: 1.0,
        }
    }
}

/// Renderable mesh reference.
#[derive(Clone, Debug, Default)]
pub struct Model {
    /// Shared geometry, `None` until the asset is assigned.
    pub geometry: Option<Arc<Geometry>>,
}

impl Model {
    /// A model drawing `geometry`.
    #[must_use]
    pub fn new(geometry: Arc<Geometry>) -> Self {
        Self {
            geometry: Some(geometry),
        }
    }
}

/// Position, rotation and scale of an entity, with a cached matrix.
///
/// Setters mark the transform dirty; the cached matrix is rebuilt by
/// [`Transform::update_matrix`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World-space position.
    pub position: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
    /// Non-uniform scale.
    pub scale: Vec3,
    /// Cached model matrix.
    pub matrix: Mat4,
    /// Set when a component changed since the last rebuild.
    pub dirty: bool,
}

impl Transform {
    /// A transform at `position`, unrotated and unscaled.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        let mut transform = Self {
            position,
            ..Self::default()
        };
        transform.update_matrix();
        transform
    }

    /// Sets the position and marks the transform dirty.
    pub fn set_position(&mut self, position: Vec3) -> &mut Vec3 {
        self.dirty = true;
        self.position = position;
        &mut self.position
    }

    /// Sets the rotation and marks the transform dirty.
    pub fn set_rotation(&mut self, rotation: Quat) -> &mut Quat {
        self.dirty = true;
        self.rotation = rotation;
        &mut self.rotation
    }

    /// Sets the scale and marks the transform dirty.
    pub fn set_scale(&mut self, scale: Vec3) -> &mut Vec3 {
        self.dirty = true;
        self.scale = scale;
        &mut self.scale
    }

    /// Rebuilds the cached matrix as translation * rotation * scale and
    /// clears the dirty flag.
    pub fn update_matrix(&mut self) {
        self.matrix = Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position);
        self.dirty = false;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            matrix: Mat4::IDENTITY,
            dirty: false,
        }
    }
}

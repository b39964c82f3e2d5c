//! # Animation System
//!
//! Drives bone and property playback once per frame.
//!
//! Bone playback loops over the active clip. Each frame the elapsed time
//! (in clip frames) selects a pair of baked frames and a blend factor; every
//! bone blends its pair component-wise and, when it has a parent, is
//! composed onto the parent's transform resolved earlier in the same pass.

use ember_core::{Entity, System, SystemState, World};
use tracing::warn;

use crate::components::{AnimationState, BoneAnimation, Model, Transform};
use crate::geometry::Geometry;
use crate::math::Mat3x4;
use crate::property::{PropertyAnimation, PropertyTarget};

/// Plays [`BoneAnimation`] and [`PropertyAnimation`] components.
///
/// Tracks entities carrying both a [`BoneAnimation`] and a [`Model`].
///
/// # Example
///
/// ```rust,ignore
/// world.add_system(AnimationSystem::new());
/// AnimationSystem::play(&mut world, hero);
/// world.run_system(|animation: &mut AnimationSystem, world| animation.update(world, dt));
/// ```
pub struct AnimationSystem {
    state: SystemState,
}

impl AnimationSystem {
    /// Creates the system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SystemState::new().require::<BoneAnimation>().require::<Model>(),
        }
    }

    /// Advances every playing animation by `dt` seconds.
    pub fn update(&mut self, world: &mut World, dt: f32) {
        world.for_each2(|entity, animation: &mut BoneAnimation, model: &mut Model| {
            if animation.state != AnimationState::Playing {
                return;
            }
            match model.geometry.as_deref() {
                Some(geometry) => advance_bones(animation, geometry, dt),
                None => warn!(%entity, "playing bone animation has no geometry"),
            }
        });

        world.for_each_with_world(|world, entity, animation: &mut PropertyAnimation| {
            if animation.state != AnimationState::Playing {
                return;
            }
            animation.advance(dt);
            if world.has::<Transform>(entity) {
                apply_to_transform(animation, world.get_mut::<Transform>(entity));
            }
        });
    }

    /// Starts playback, or resumes it in place when paused.
    ///
    /// A fresh start rewinds and seeds the bones from the clip's first baked
    /// frame. Entities without animation components are left untouched.
    pub fn play(world: &mut World, entity: Entity) {
        let mut handled = false;

        if world.has::<BoneAnimation>(entity) && world.has::<Model>(entity) {
            handled = true;
            let geometry = world.get::<Model>(entity).geometry.clone();
            let animation = world.get_mut::<BoneAnimation>(entity);
            if animation.state == AnimationState::Paused {
                animation.state = AnimationState::Playing;
            } else {
                match geometry.as_deref() {
                    Some(geometry) => start_bones(entity, animation, geometry),
                    None => warn!(%entity, "play ignored: model has no geometry"),
                }
            }
        }

        if world.has::<PropertyAnimation>(entity) {
            handled = true;
            world.get_mut::<PropertyAnimation>(entity).play();
        }

        if !handled {
            warn!(%entity, "play ignored: entity has no animation");
        }
    }

    /// Freezes playback without touching time or bones.
    pub fn pause(world: &mut World, entity: Entity) {
        let mut handled = false;

        if world.has::<BoneAnimation>(entity) {
            handled = true;
            world.get_mut::<BoneAnimation>(entity).state = AnimationState::Paused;
        }

        if world.has::<PropertyAnimation>(entity) {
            handled = true;
            world.get_mut::<PropertyAnimation>(entity).pause();
        }

        if !handled {
            warn!(%entity, "pause ignored: entity has no animation");
        }
    }

    /// Stops and rewinds. Bones reset to one identity per skeleton bone.
    pub fn stop(world: &mut World, entity: Entity) {
        let mut handled = false;

        if world.has::<BoneAnimation>(entity) && world.has::<Model>(entity) {
            handled = true;
            let bone_count = world
                .get::<Model>(entity)
                .geometry
                .as_deref()
                .map(Geometry::bone_count);
            let animation = world.get_mut::<BoneAnimation>(entity);
            animation.state = AnimationState::Stopped;
            animation.time = 0.0;
            let bone_count = bone_count.unwrap_or(animation.bones.len());
            animation.bones.clear();
            animation.bones.resize(bone_count, Mat3x4::IDENTITY);
        }

        if world.has::<PropertyAnimation>(entity) {
            handled = true;
            world.get_mut::<PropertyAnimation>(entity).stop();
        }

        if !handled {
            warn!(%entity, "stop ignored: entity has no animation");
        }
    }
}

impl Default for AnimationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AnimationSystem {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }
}

fn start_bones(entity: Entity, animation: &mut BoneAnimation, geometry: &Geometry) {
    let Some(clip) = geometry.clip(animation.animation) else {
        warn!(%entity, clip = animation.animation, geometry = geometry.name(), "play ignored: unknown clip");
        return;
    };
    animation.state = AnimationState::Playing;
    animation.time = 0.0;
    animation.bones.clear();
    animation.bones.extend_from_slice(geometry.frame(clip.start as usize));
}

/// Advances one bone animation by `dt` seconds and resolves its bones.
///
/// # Panics
///
/// Panics if a bone's parent does not precede it.
pub fn advance_bones(animation: &mut BoneAnimation, geometry: &Geometry, dt: f32) {
    let Some(clip) = geometry.clip(animation.animation) else {
        warn!(clip = animation.animation, geometry = geometry.name(), "unknown clip, animation not advanced");
        return;
    };

    animation.time += dt * animation.speed * clip.frame_rate;
    let sample = clip.sample(animation.time);
    let start = clip.start as usize;
    let frame_a = geometry.frame(start + sample.frame_a as usize);
    let frame_b = geometry.frame(start + sample.frame_b as usize);

    let bone_count = geometry.bone_count();
    animation.bones.resize(bone_count, Mat3x4::IDENTITY);
    for bone in 0..bone_count {
        let local = frame_a[bone].lerp(&frame_b[bone], sample.alpha);
        animation.bones[bone] = match geometry.bone_parent(bone) {
            Some(parent) => {
                assert!(parent < bone, "bone {bone} resolved before its parent {parent}");
                animation.bones[parent] * local
            }
            None => local,
        };
    }
}

fn apply_to_transform(animation: &PropertyAnimation, transform: &mut Transform) {
    for track in &animation.vec3_tracks {
        let Some(value) = track.current() else { continue };
        match track.target {
            PropertyTarget::Position => {
                transform.set_position(value);
            }
            PropertyTarget::Scale => {
                transform.set_scale(value);
            }
            PropertyTarget::Rotation | PropertyTarget::Custom(_) => {}
        }
    }
    for track in &animation.quat_tracks {
        if let (PropertyTarget::Rotation, Some(value)) = (&track.target, track.current()) {
            transform.set_rotation(value);
        }
    }
}

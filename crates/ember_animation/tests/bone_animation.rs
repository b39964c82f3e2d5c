//! # Bone Animation Tests
//!
//! Playback behavior through the public API: clip wraparound, parent/child
//! composition, stop semantics and the reference two-bone scenario.
//!
//! Run with: cargo test --package ember_animation --test bone_animation

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use ember_animation::{
    AnimationClip, AnimationState, AnimationSystem, BoneAnimation, Geometry, Mat3x4, Model,
};
use ember_core::{Entity, World};
use glam::{Quat, Vec3};

const EPSILON: f32 = 1e-5;

fn translate(x: f32, y: f32, z: f32) -> Mat3x4 {
    Mat3x4::from_translation(Vec3::new(x, y, z))
}

fn spawn(world: &mut World, geometry: Geometry) -> Entity {
    let entity = world.create();
    world.add(entity, BoneAnimation::default());
    world.add(entity, Model::new(Arc::new(geometry)));
    world.update();
    world.add_system(AnimationSystem::new());
    entity
}

fn tick(world: &mut World, dt: f32) {
    world.run_system(|animation: &mut AnimationSystem, world| animation.update(world, dt));
}

// ============================================================================
// LOOP WRAPAROUND
// ============================================================================

#[test]
fn elapsed_time_past_the_clip_wraps_to_its_start() {
    // One bone whose frame f is translated by f along X
    let frames = (0..4).map(|f| translate(f as f32, 0.0, 0.0)).collect();
    let geometry = Geometry::skinned("walk", vec![-1], vec![AnimationClip::new("walk", 1.0, 0, 4)], frames).unwrap();
    let clip = geometry.clip(0).unwrap().clone();
    let mut world = World::new();
    let entity = spawn(&mut world, geometry);

    AnimationSystem::play(&mut world, entity);
    tick(&mut world, 5.5);

    let animation = world.get::<BoneAnimation>(entity);
    let sample = clip.sample(animation.time);
    assert_eq!(animation.time.floor(), 5.0);
    assert_eq!(sample.frame_a, 1);
    assert_eq!(sample.frame_b, 2);
    // Halfway between frame 1 and frame 2
    assert!((animation.bones[0].translation().x - 1.5).abs() < EPSILON);
}

#[test]
fn last_frame_blends_back_into_the_first() {
    let frames = (0..4).map(|f| translate(f as f32, 0.0, 0.0)).collect();
    let geometry = Geometry::skinned("walk", vec![-1], vec![AnimationClip::new("walk", 1.0, 0, 4)], frames).unwrap();
    let mut world = World::new();
    let entity = spawn(&mut world, geometry);

    AnimationSystem::play(&mut world, entity);
    tick(&mut world, 3.5);

    // Frame 3 (x = 3) towards frame 0 (x = 0)
    let bones = &world.get::<BoneAnimation>(entity).bones;
    assert!((bones[0].translation().x - 1.5).abs() < EPSILON);
}

#[test]
fn clips_address_their_own_frames() {
    // Clip "b" starts at baked frame 2; its frames translate along Y
    let frames = vec![
        Mat3x4::IDENTITY,
        Mat3x4::IDENTITY,
        translate(0.0, 10.0, 0.0),
        translate(0.0, 20.0, 0.0),
    ];
    let clips = vec![AnimationClip::new("a", 1.0, 0, 2), AnimationClip::new("b", 1.0, 2, 2)];
    let geometry = Geometry::skinned("two", vec![-1], clips, frames).unwrap();
    let mut world = World::new();
    let entity = spawn(&mut world, geometry);
    world.get_mut::<BoneAnimation>(entity).animation = 1;

    AnimationSystem::play(&mut world, entity);
    tick(&mut world, 0.5);

    let bones = &world.get::<BoneAnimation>(entity).bones;
    assert!((bones[0].translation().y - 15.0).abs() < EPSILON);
}

// ============================================================================
// HIERARCHY COMPOSITION
// ============================================================================

#[test]
fn child_bones_inherit_parent_transforms() {
    let mid = Mat3x4::from_quat(Quat::from_rotation_z(FRAC_PI_2));
    let tip = translate(1.0, 0.0, 0.0);
    let frame = [Mat3x4::IDENTITY, mid, tip];
    let frames = [frame, frame].concat();
    let geometry = Geometry::skinned("arm", vec![-1, 0, 1], vec![AnimationClip::new("hold", 1.0, 0, 2)], frames).unwrap();
    let mut world = World::new();
    let entity = spawn(&mut world, geometry);

    AnimationSystem::play(&mut world, entity);
    tick(&mut world, 0.25);

    let bones = &world.get::<BoneAnimation>(entity).bones;
    assert_eq!(bones.len(), 3);
    assert!(bones[0].abs_diff_eq(&Mat3x4::IDENTITY, EPSILON));
    assert!(bones[1].abs_diff_eq(&mid, EPSILON));

    // The tip's +X offset is carried by the mid rotation onto +Y
    assert!(bones[2].translation().abs_diff_eq(Vec3::Y, EPSILON));
    assert!(bones[2].abs_diff_eq(&(mid * tip), EPSILON));
}

#[test]
fn multiple_roots_resolve_independently() {
    let frame = [translate(1.0, 0.0, 0.0), translate(0.0, 2.0, 0.0), translate(0.0, 0.0, 3.0)];
    let frames = [frame, frame].concat();
    let geometry = Geometry::skinned("pair", vec![-1, -1, 1], vec![AnimationClip::new("idle", 1.0, 0, 2)], frames).unwrap();
    let mut world = World::new();
    let entity = spawn(&mut world, geometry);

    AnimationSystem::play(&mut world, entity);
    tick(&mut world, 0.5);

    let bones = &world.get::<BoneAnimation>(entity).bones;
    assert!(bones[0].translation().abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), EPSILON));
    assert!(bones[1].translation().abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), EPSILON));
    assert!(bones[2].translation().abs_diff_eq(Vec3::new(0.0, 2.0, 3.0), EPSILON));
}

// ============================================================================
// STATE MACHINE
// ============================================================================

#[test]
fn stop_resets_bones_to_identity() {
    let frames = vec![translate(1.0, 0.0, 0.0); 6];
    let geometry = Geometry::skinned("tri", vec![-1, 0, 0], vec![AnimationClip::new("idle", 1.0, 0, 2)], frames).unwrap();
    let mut world = World::new();
    let entity = spawn(&mut world, geometry);

    // From a stopped entity with no bones yet
    AnimationSystem::stop(&mut world, entity);
    assert_eq!(world.get::<BoneAnimation>(entity).bones, vec![Mat3x4::IDENTITY; 3]);

    // From playback
    AnimationSystem::play(&mut world, entity);
    tick(&mut world, 0.7);
    AnimationSystem::stop(&mut world, entity);
    let animation = world.get::<BoneAnimation>(entity);
    assert_eq!(animation.state, AnimationState::Stopped);
    assert_eq!(animation.time, 0.0);
    assert_eq!(animation.bones, vec![Mat3x4::IDENTITY; 3]);

    // From pause
    AnimationSystem::play(&mut world, entity);
    tick(&mut world, 0.3);
    AnimationSystem::pause(&mut world, entity);
    AnimationSystem::stop(&mut world, entity);
    assert_eq!(world.get::<BoneAnimation>(entity).bones, vec![Mat3x4::IDENTITY; 3]);
}

#[test]
fn stopped_and_paused_animations_do_not_advance() {
    let frames = vec![Mat3x4::IDENTITY, translate(1.0, 0.0, 0.0)];
    let geometry = Geometry::skinned("slide", vec![-1], vec![AnimationClip::new("slide", 1.0, 0, 2)], frames).unwrap();
    let mut world = World::new();
    let entity = spawn(&mut world, geometry);

    tick(&mut world, 0.5);
    assert_eq!(world.get::<BoneAnimation>(entity).time, 0.0);

    AnimationSystem::play(&mut world, entity);
    AnimationSystem::pause(&mut world, entity);
    tick(&mut world, 0.5);
    assert_eq!(world.get::<BoneAnimation>(entity).time, 0.0);
    assert_eq!(world.get::<BoneAnimation>(entity).bones, vec![Mat3x4::IDENTITY]);
}

#[test]
fn replaying_after_stop_starts_from_the_first_frame() {
    let frames = vec![translate(5.0, 0.0, 0.0), translate(7.0, 0.0, 0.0)];
    let geometry = Geometry::skinned("slide", vec![-1], vec![AnimationClip::new("slide", 1.0, 0, 2)], frames).unwrap();
    let mut world = World::new();
    let entity = spawn(&mut world, geometry);

    AnimationSystem::play(&mut world, entity);
    tick(&mut world, 0.5);
    AnimationSystem::stop(&mut world, entity);
    AnimationSystem::play(&mut world, entity);

    let animation = world.get::<BoneAnimation>(entity);
    assert_eq!(animation.time, 0.0);
    assert_eq!(animation.bones, vec![translate(5.0, 0.0, 0.0)]);
}

// ============================================================================
// REFERENCE SCENARIO
// ============================================================================

#[test]
fn two_bone_half_frame_scenario() {
    let frames = vec![
        // frame 0
        Mat3x4::IDENTITY,
        Mat3x4::IDENTITY,
        // frame 1
        translate(1.0, 0.0, 0.0),
        Mat3x4::IDENTITY,
    ];
    let geometry = Geometry::skinned("pair", vec![-1, -1], vec![AnimationClip::new("nudge", 1.0, 0, 2)], frames).unwrap();
    let clip = geometry.clip(0).unwrap().clone();

    let mut world = World::new();
    let entity = world.create();
    world.add(entity, BoneAnimation::default());
    world.add(entity, Model::new(Arc::new(geometry)));
    world.update();

    AnimationSystem::play(&mut world, entity);
    AnimationSystem::new().update(&mut world, 0.5);

    let animation = world.get::<BoneAnimation>(entity);
    assert!((animation.time - 0.5).abs() < EPSILON);
    let sample = clip.sample(animation.time);
    assert!((sample.alpha - 0.5).abs() < EPSILON);
    assert_eq!((sample.frame_a, sample.frame_b), (0, 1));
    assert!(animation.bones[0].abs_diff_eq(&translate(0.5, 0.0, 0.0), EPSILON));
    assert!(animation.bones[1].abs_diff_eq(&Mat3x4::IDENTITY, EPSILON));
}

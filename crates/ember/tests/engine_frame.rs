//! # Engine Frame Tests
//!
//! Full frames through the host loop against a recording render device.
//!
//! Run with: cargo test --package ember --test engine_frame

use std::collections::HashMap;

use ember::{BoneBufferId, Engine, EngineConfig, EngineError, SkinningDevice};
use ember_animation::{
    AnimationClip, AnimationMode, AnimationState, BoneAnimation, Mat3x4, PropertyAnimation,
    PropertyTarget, Track, Transform,
};
use glam::Vec3;

/// Remembers every buffer and the last bytes uploaded into it.
#[derive(Default)]
struct RecordingDevice {
    next: u32,
    buffers: HashMap<BoneBufferId, Vec<u8>>,
    destroyed: Vec<BoneBufferId>,
}

impl RecordingDevice {
    fn bones(&self, buffer: BoneBufferId) -> Vec<Mat3x4> {
        self.buffers[&buffer]
            .chunks_exact(std::mem::size_of::<Mat3x4>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }
}

impl SkinningDevice for RecordingDevice {
    fn create_bone_buffer(&mut self, bone_count: usize) -> BoneBufferId {
        self.next += 1;
        let id = BoneBufferId(self.next);
        self.buffers.insert(id, vec![0; bone_count * std::mem::size_of::<Mat3x4>()]);
        id
    }

    fn upload_bones(&mut self, buffer: BoneBufferId, bytes: &[u8]) {
        let Some(target) = self.buffers.get_mut(&buffer) else {
            panic!("upload into unknown buffer {buffer:?}");
        };
        assert_eq!(target.len(), bytes.len(), "upload size mismatch");
        target.copy_from_slice(bytes);
    }

    fn destroy_bone_buffer(&mut self, buffer: BoneBufferId) {
        assert!(self.buffers.remove(&buffer).is_some(), "double release of {buffer:?}");
        self.destroyed.push(buffer);
    }
}

/// Two root bones; frame 1 moves bone 0 by +1 on X.
fn engine_with_pair() -> Engine {
    let engine = Engine::new(EngineConfig::default());
    engine
        .assets()
        .load_skinned(
            "pair",
            vec![-1, -1],
            vec![AnimationClip::new("nudge", 1.0, 0, 2)],
            vec![
                Mat3x4::IDENTITY,
                Mat3x4::IDENTITY,
                Mat3x4::from_translation(Vec3::X),
                Mat3x4::IDENTITY,
            ],
        )
        .unwrap();
    engine
}

#[test]
fn spawn_unknown_geometry_fails() {
    let mut engine = Engine::new(EngineConfig::default());
    let err = engine.spawn_skinned("ghost").unwrap_err();
    assert!(matches!(err, EngineError::UnknownGeometry(name) if name == "ghost"));
    assert_eq!(engine.world().alive_count(), 0);
}

#[test]
fn spawned_entity_is_sized_to_its_skeleton() {
    let mut engine = engine_with_pair();
    let hero = engine.spawn_skinned("pair").unwrap();

    let animation = engine.world().get::<BoneAnimation>(hero);
    assert_eq!(animation.bones, vec![Mat3x4::IDENTITY; 2]);
    assert!(engine.world().has::<Transform>(hero));
}

#[test]
fn playing_entity_uploads_blended_bones() {
    let mut engine = engine_with_pair();
    let mut device = RecordingDevice::default();
    let hero = engine.spawn_skinned("pair").unwrap();

    // The spawn becomes visible on this frame
    let first = engine.tick(0.0, &mut device);
    assert_eq!(first.alive, 1);
    assert_eq!((first.skin.created, first.skin.uploaded), (1, 1));
    assert_eq!(first.skin.bytes, 96);

    engine.play(hero);
    // The default max_delta of 0.25 caps this frame
    let second = engine.tick(0.5, &mut device);
    assert!(second.clamped);
    assert!((second.dt - 0.25).abs() < 1e-6);
    assert_eq!(second.skin.created, 0);

    let buffer = device.buffers.keys().copied().next().unwrap();
    let uploaded = device.bones(buffer);
    assert!(uploaded[0].abs_diff_eq(&Mat3x4::from_translation(Vec3::new(0.25, 0.0, 0.0)), 1e-5));

    let third = engine.tick(0.25, &mut device);
    assert!(!third.clamped);
    let uploaded = device.bones(buffer);
    assert!(uploaded[0].abs_diff_eq(&Mat3x4::from_translation(Vec3::new(0.5, 0.0, 0.0)), 1e-5));
    assert!(uploaded[1].abs_diff_eq(&Mat3x4::IDENTITY, 1e-5));
}

#[test]
fn killed_entity_releases_its_buffer_once() {
    let mut engine = engine_with_pair();
    let mut device = RecordingDevice::default();
    let hero = engine.spawn_skinned("pair").unwrap();
    engine.tick(0.0, &mut device);
    assert_eq!(device.buffers.len(), 1);

    engine.world_mut().kill(hero);
    let stats = engine.tick(0.016, &mut device);
    assert_eq!(stats.skin.destroyed, 1);
    assert_eq!(stats.skin.uploaded, 0);
    assert!(device.buffers.is_empty());

    let stats = engine.tick(0.016, &mut device);
    assert_eq!(stats.skin.destroyed, 0);
    assert_eq!(device.destroyed.len(), 1);
}

#[test]
fn engine_play_pause_stop() {
    let mut engine = engine_with_pair();
    let mut device = RecordingDevice::default();
    let hero = engine.spawn_skinned("pair").unwrap();
    engine.tick(0.0, &mut device);

    engine.play(hero);
    engine.tick(0.25, &mut device);
    engine.pause(hero);
    engine.tick(0.25, &mut device);
    let paused = engine.world().get::<BoneAnimation>(hero);
    assert_eq!(paused.state, AnimationState::Paused);
    assert!((paused.time - 0.25).abs() < 1e-6);

    engine.stop(hero);
    let stopped = engine.world().get::<BoneAnimation>(hero);
    assert_eq!(stopped.state, AnimationState::Stopped);
    assert_eq!(stopped.bones, vec![Mat3x4::IDENTITY; 2]);
}

#[test]
fn property_animation_moves_transform_matrix() {
    let mut engine = Engine::new(EngineConfig::default());
    let mut device = RecordingDevice::default();
    let world = engine.world_mut();
    let door = world.create();
    world.add(door, Transform::default());
    world.add(
        door,
        PropertyAnimation::new(AnimationMode::Once).with_vec3_track(
            Track::new(PropertyTarget::Position)
                .key(0.0, Vec3::ZERO)
                .key(0.2, Vec3::new(0.0, 2.0, 0.0)),
        ),
    );
    engine.tick(0.0, &mut device);

    engine.play(door);
    let stats = engine.tick(0.1, &mut device);
    assert_eq!(stats.transforms_rebuilt, 1);

    let transform = engine.world().get::<Transform>(door);
    assert!(!transform.dirty);
    assert!(transform.matrix.w_axis.truncate().abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
    assert!(device.buffers.is_empty());
}

#[test]
fn shutdown_releases_live_buffers() {
    let mut engine = engine_with_pair();
    let mut device = RecordingDevice::default();
    engine.spawn_skinned("pair").unwrap();
    engine.spawn_skinned("pair").unwrap();
    engine.tick(0.0, &mut device);
    assert_eq!(device.buffers.len(), 2);

    assert_eq!(engine.shutdown(&mut device), 2);
    assert!(device.buffers.is_empty());
}

#[test]
fn config_drives_world_reuse_policy() {
    let config = EngineConfig::from_toml_str(
        r"
        [world]
        min_free_indices = 0
        ",
    )
    .unwrap();
    let mut engine = Engine::new(config);
    let mut device = RecordingDevice::default();

    let first = engine.world_mut().create();
    engine.tick(0.0, &mut device);
    engine.world_mut().kill(first);
    engine.tick(0.0, &mut device);

    let second = engine.world_mut().create();
    assert_eq!(second.index(), first.index());
    assert!(second.version() > first.version());
}

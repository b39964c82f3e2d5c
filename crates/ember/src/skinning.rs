//! # Skinning Sync
//!
//! Pushes resolved bone matrices to the render device once per frame.
//!
//! The device itself is out of scope: [`SkinningDevice`] is the contract a
//! renderer implements. Each animated entity owns one bone buffer sized to
//! its skeleton. Buffers of destroyed entities are retired and released at
//! the start of the following sync, never in the middle of the frame that
//! last drew with them.

use std::collections::HashMap;

use ember_animation::{BoneAnimation, Mat3x4, Model};
use ember_core::{Entity, System, SystemState, World};
use tracing::debug;

/// Device-side handle of a bone buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneBufferId(pub u32);

/// What the engine needs from a renderer to skin meshes.
pub trait SkinningDevice {
    /// Allocates a buffer holding `bone_count` 3x4 matrices.
    fn create_bone_buffer(&mut self, bone_count: usize) -> BoneBufferId;

    /// Replaces the contents of `buffer` with `bytes`, tightly packed
    /// row-major 3x4 matrices.
    fn upload_bones(&mut self, buffer: BoneBufferId, bytes: &[u8]);

    /// Releases `buffer`.
    fn destroy_bone_buffer(&mut self, buffer: BoneBufferId);
}

/// Counters for one sync pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkinSyncStats {
    /// Buffers uploaded.
    pub uploaded: usize,
    /// Buffers created.
    pub created: usize,
    /// Buffers released.
    pub destroyed: usize,
    /// Bytes uploaded.
    pub bytes: usize,
}

#[derive(Clone, Copy, Debug)]
struct BoneBuffer {
    id: BoneBufferId,
    bone_count: usize,
}

/// Mirrors every [`BoneAnimation`] into a device bone buffer.
pub struct SkinSyncSystem {
    state: SystemState,
    buffers: HashMap<Entity, BoneBuffer>,
    /// Released at the start of the next sync.
    retired: Vec<BoneBufferId>,
}

impl SkinSyncSystem {
    /// Creates the system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SystemState::new().require::<BoneAnimation>().require::<Model>(),
            buffers: HashMap::new(),
            retired: Vec::new(),
        }
    }

    /// Buffer currently owned by `entity`.
    #[must_use]
    pub fn buffer(&self, entity: Entity) -> Option<BoneBufferId> {
        self.buffers.get(&entity).map(|buffer| buffer.id)
    }

    /// Number of live buffers.
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Releases retired buffers, then uploads the bones of every tracked
    /// entity, (re)creating buffers whose size no longer matches.
    pub fn sync<D: SkinningDevice + ?Sized>(&mut self, world: &World, device: &mut D) -> SkinSyncStats {
        let mut stats = SkinSyncStats::default();

        for id in self.retired.drain(..) {
            device.destroy_bone_buffer(id);
            stats.destroyed += 1;
        }

        for &entity in self.state.entities() {
            if !(world.has::<BoneAnimation>(entity) && world.has::<Model>(entity)) {
                continue;
            }
            let bones = &world.get::<BoneAnimation>(entity).bones;
            if bones.is_empty() {
                continue;
            }

            let buffer = match self.buffers.get(&entity).copied() {
                Some(buffer) if buffer.bone_count == bones.len() => buffer,
                stale => {
                    if let Some(stale) = stale {
                        device.destroy_bone_buffer(stale.id);
                        stats.destroyed += 1;
                    }
                    let buffer = BoneBuffer {
                        id: device.create_bone_buffer(bones.len()),
                        bone_count: bones.len(),
                    };
                    debug!(%entity, buffer = buffer.id.0, bones = bones.len(), "created bone buffer");
                    self.buffers.insert(entity, buffer);
                    stats.created += 1;
                    buffer
                }
            };

            let bytes = bytemuck::cast_slice::<Mat3x4, u8>(bones);
            device.upload_bones(buffer.id, bytes);
            stats.uploaded += 1;
            stats.bytes += bytes.len();
        }

        stats
    }

    /// Releases every buffer, retired or live.
    pub fn release_all<D: SkinningDevice + ?Sized>(&mut self, device: &mut D) -> usize {
        let ids: Vec<BoneBufferId> = self
            .retired
            .drain(..)
            .chain(self.buffers.drain().map(|(_, buffer)| buffer.id))
            .collect();
        for &id in &ids {
            device.destroy_bone_buffer(id);
        }
        ids.len()
    }
}

impl Default for SkinSyncSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SkinSyncSystem {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    fn on_destroy(&mut self, entity: Entity) {
        if let Some(buffer) = self.buffers.remove(&entity) {
            debug!(%entity, buffer = buffer.id.0, "retired bone buffer");
            self.retired.push(buffer.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_animation::Geometry;
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingDevice {
        next: u32,
        live: Vec<BoneBufferId>,
        uploads: usize,
    }

    impl SkinningDevice for CountingDevice {
        fn create_bone_buffer(&mut self, _bone_count: usize) -> BoneBufferId {
            self.next += 1;
            let id = BoneBufferId(self.next);
            self.live.push(id);
            id
        }

        fn upload_bones(&mut self, buffer: BoneBufferId, _bytes: &[u8]) {
            assert!(self.live.contains(&buffer), "upload to released buffer");
            self.uploads += 1;
        }

        fn destroy_bone_buffer(&mut self, buffer: BoneBufferId) {
            self.live.retain(|&id| id != buffer);
        }
    }

    fn skinned(world: &mut World, bones: usize) -> Entity {
        let entity = world.create();
        world.add(entity, BoneAnimation::with_bones(bones));
        world.add(entity, Model::new(Arc::new(Geometry::rigid("placeholder"))));
        entity
    }

    #[test]
    fn test_buffer_recreated_when_bone_count_changes() {
        let mut world = World::new();
        let mut system = SkinSyncSystem::new();
        let mut device = CountingDevice::default();
        let entity = skinned(&mut world, 2);
        world.update();
        system.state_mut().add_entity(entity);

        let first = system.sync(&world, &mut device);
        assert_eq!((first.created, first.uploaded, first.bytes), (1, 1, 96));

        world.get_mut::<BoneAnimation>(entity).bones.push(Mat3x4::IDENTITY);
        let second = system.sync(&world, &mut device);
        assert_eq!((second.created, second.destroyed), (1, 1));
        assert_eq!(device.live.len(), 1);
    }

    #[test]
    fn test_destroy_hook_defers_release() {
        let mut device = CountingDevice::default();
        let mut system = SkinSyncSystem::new();
        let mut world = World::new();
        let entity = skinned(&mut world, 1);
        world.update();
        system.state_mut().add_entity(entity);
        system.sync(&world, &mut device);

        system.on_destroy(entity);
        assert_eq!(device.live.len(), 1);
        assert_eq!(system.buffer_count(), 0);

        system.state_mut().remove_entity(entity);
        let stats = system.sync(&world, &mut device);
        assert_eq!(stats.destroyed, 1);
        assert!(device.live.is_empty());
    }

    #[test]
    fn test_release_all() {
        let mut device = CountingDevice::default();
        let mut system = SkinSyncSystem::new();
        let mut world = World::new();
        let entity = skinned(&mut world, 4);
        world.update();
        system.state_mut().add_entity(entity);
        system.sync(&world, &mut device);

        assert_eq!(system.release_all(&mut device), 1);
        assert!(device.live.is_empty());
    }
}

//! # Host Loop
//!
//! One [`Engine::tick`] is one frame:
//!
//! 1. Clamp and scale the frame delta
//! 2. Flush the world's entity lifecycle
//! 3. Advance animations
//! 4. Rebuild dirty transforms
//! 5. Upload bone matrices to the render device
//!
//! System order is fixed here; the ECS itself imposes none.

use std::sync::Arc;
use std::time::Instant;

use ember_animation::{AnimationSystem, BoneAnimation, Model, Transform};
use ember_core::{Entity, World};
use tracing::{trace, warn};

use crate::assets::GeometryLibrary;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::skinning::{SkinSyncStats, SkinSyncSystem, SkinningDevice};
use crate::transform::TransformSystem;

/// Measures wall-clock time between frames.
#[derive(Debug)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    /// Starts the clock now.
    #[must_use]
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    /// Seconds since the previous call (or since creation).
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// What one frame did and how long each stage took.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Simulated delta after clamping and scaling, in seconds.
    pub dt: f32,
    /// Whether the raw delta exceeded the configured maximum.
    pub clamped: bool,
    /// Live entities after the flush.
    pub alive: usize,
    /// Transforms whose matrix was rebuilt.
    pub transforms_rebuilt: usize,
    /// Skinning upload counters.
    pub skin: SkinSyncStats,
    /// Lifecycle flush duration (microseconds).
    pub flush_us: u64,
    /// Animation duration (microseconds).
    pub animation_us: u64,
    /// Transform duration (microseconds).
    pub transform_us: u64,
    /// Skinning upload duration (microseconds).
    pub skin_us: u64,
}

/// The engine: a world, its built-in systems and the shared asset library.
pub struct Engine {
    config: EngineConfig,
    world: World,
    assets: Arc<GeometryLibrary>,
    frame: u64,
}

impl Engine {
    /// Creates an engine with an empty asset library.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_assets(config, Arc::new(GeometryLibrary::new()))
    }

    /// Creates an engine reading geometry from `assets`.
    #[must_use]
    pub fn with_assets(config: EngineConfig, assets: Arc<GeometryLibrary>) -> Self {
        let mut world = World::with_config(config.world.clone());
        world.add_system(AnimationSystem::new());
        world.add_system(TransformSystem::new());
        world.add_system(SkinSyncSystem::new());
        tracing::info!(systems = ?world.system_names().collect::<Vec<_>>(), "engine ready");

        Self {
            config,
            world,
            assets,
            frame: 0,
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The world, for gameplay code.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The shared asset library.
    #[must_use]
    pub fn assets(&self) -> &Arc<GeometryLibrary> {
        &self.assets
    }

    /// Frames ticked so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Creates an entity drawing geometry `name`, with identity bones sized
    /// to its skeleton and a default transform.
    ///
    /// Like every creation, it becomes visible at the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownGeometry`](crate::EngineError::UnknownGeometry)
    /// if no such geometry is loaded.
    pub fn spawn_skinned(&mut self, name: &str) -> EngineResult<Entity> {
        let geometry = self.assets.require(name)?;
        let entity = self.world.create();
        self.world.add(entity, BoneAnimation::with_bones(geometry.bone_count()));
        self.world.add(entity, Model::new(geometry));
        self.world.add(entity, Transform::default());
        Ok(entity)
    }

    /// Starts or resumes the animations of `entity`.
    pub fn play(&mut self, entity: Entity) {
        AnimationSystem::play(&mut self.world, entity);
    }

    /// Pauses the animations of `entity`.
    pub fn pause(&mut self, entity: Entity) {
        AnimationSystem::pause(&mut self.world, entity);
    }

    /// Stops and rewinds the animations of `entity`.
    pub fn stop(&mut self, entity: Entity) {
        AnimationSystem::stop(&mut self.world, entity);
    }

    /// Runs one frame of `dt` seconds.
    pub fn tick<D: SkinningDevice + ?Sized>(&mut self, dt: f32, device: &mut D) -> FrameStats {
        self.frame += 1;
        let (dt, clamped) = self.pace(dt);
        let mut stats = FrameStats {
            frame: self.frame,
            dt,
            clamped,
            ..FrameStats::default()
        };

        let start = Instant::now();
        self.world.update();
        stats.alive = self.world.alive_count();
        stats.flush_us = start.elapsed().as_micros() as u64;

        let start = Instant::now();
        self.world
            .run_system(|animation: &mut AnimationSystem, world| animation.update(world, dt));
        stats.animation_us = start.elapsed().as_micros() as u64;

        let start = Instant::now();
        stats.transforms_rebuilt = self
            .world
            .run_system(|transforms: &mut TransformSystem, world| transforms.update(world));
        stats.transform_us = start.elapsed().as_micros() as u64;

        let start = Instant::now();
        stats.skin = self
            .world
            .run_system(|skin: &mut SkinSyncSystem, world| skin.sync(world, device));
        stats.skin_us = start.elapsed().as_micros() as u64;

        trace!(
            frame = stats.frame,
            dt,
            flush_us = stats.flush_us,
            animation_us = stats.animation_us,
            transform_us = stats.transform_us,
            skin_us = stats.skin_us,
            "frame complete"
        );
        stats
    }

    /// Runs one frame timed by `clock`.
    pub fn tick_with_clock<D: SkinningDevice + ?Sized>(
        &mut self,
        clock: &mut FrameClock,
        device: &mut D,
    ) -> FrameStats {
        let dt = clock.tick();
        self.tick(dt, device)
    }

    /// Releases every device buffer the engine owns.
    pub fn shutdown<D: SkinningDevice + ?Sized>(&mut self, device: &mut D) -> usize {
        self.world
            .run_system(|skin: &mut SkinSyncSystem, _| skin.release_all(device))
    }

    fn pace(&self, raw: f32) -> (f32, bool) {
        let frame = &self.config.frame;
        if !raw.is_finite() || raw < 0.0 {
            warn!(dt = raw, "ignoring invalid frame delta");
            return (0.0, false);
        }
        let clamped = raw > frame.max_delta;
        if clamped {
            warn!(dt = raw, max = frame.max_delta, "clamping frame delta");
        }
        (raw.min(frame.max_delta) * frame.time_scale, clamped)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("frame", &self.frame)
            .field("world", &self.world)
            .field("assets", &self.assets.len())
            .finish_non_exhaustive()
    }
}

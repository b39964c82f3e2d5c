//! # Ember Engine
//!
//! Host-side integration of the Ember units: configuration, geometry
//! assets, the transform and skinning-sync systems, and the frame loop.
//!
//! ## Golden Path
//!
//! ```rust,ignore
//! use ember::{Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::load("ember.toml")?);
//! engine.assets().load_skinned("hero", parents, clips, frames)?;
//! let hero = engine.spawn_skinned("hero")?;
//! engine.tick(0.0, &mut device);
//! engine.play(hero);
//!
//! let mut clock = FrameClock::new();
//! loop {
//!     engine.tick_with_clock(&mut clock, &mut device);
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod assets;
pub mod config;
pub mod error;
pub mod game_loop;
pub mod skinning;
pub mod transform;

pub use assets::GeometryLibrary;
pub use config::{EngineConfig, FrameConfig};
pub use error::{EngineError, EngineResult};
pub use game_loop::{Engine, FrameClock, FrameStats};
pub use skinning::{BoneBufferId, SkinSyncStats, SkinSyncSystem, SkinningDevice};
pub use transform::TransformSystem;

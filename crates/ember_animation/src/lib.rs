//! # Ember Animation
//!
//! Skeletal playback of baked bone frames, keyframe property animation and
//! easing curves, running on top of the `ember_core` ECS.
//!
//! ## Architecture Rules
//!
//! 1. **Baked frames are absolute** - playback blends them, never re-derives them
//! 2. **Parents resolve first** - bone `i` only ever reads bones `< i`
//! 3. **Assets are validated at load** - the frame loop trusts a [`Geometry`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use ember_animation::{AnimationSystem, BoneAnimation, Model};
//!
//! let hero = world.create();
//! world.add(hero, BoneAnimation::new(0));
//! world.add(hero, Model::new(geometry));
//! world.update();
//!
//! AnimationSystem::play(&mut world, hero);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod components;
pub mod error;
pub mod geometry;
pub mod math;
pub mod property;
pub mod system;
pub mod tween;

pub use components::{AnimationState, BoneAnimation, Model, Transform};
pub use error::{AnimationError, AnimationResult};
pub use geometry::{AnimationClip, FrameSample, Geometry};
pub use math::Mat3x4;
pub use property::{AnimationMode, Interpolate, Keyframe, PropertyAnimation, PropertyTarget, Track};
pub use system::{advance_bones, AnimationSystem};
pub use tween::{ease, Easing, Tween};

//! # Ember Core
//!
//! Entity Component System at the heart of the Ember engine.
//!
//! ## Architecture Rules
//!
//! 1. **Entities are handles** - an index plus a version, nothing more
//! 2. **Components are plain data** - any `Default + Send + Sync` type
//! 3. **Systems match by mask** - membership is recomputed at flush time
//! 4. **Deferred lifecycle** - creations and kills land at [`World::update`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use ember_core::World;
//!
//! let mut world = World::new();
//! let entity = world.create();
//! world.add(entity, Position::default());
//! world.update();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;

pub use config::WorldConfig;
pub use ecs::{
    Component, ComponentId, ComponentMask, Entity, EntityIndex, Query, System, SystemState,
    Version, World, MAX_COMPONENTS, MAX_ENTITIES,
};

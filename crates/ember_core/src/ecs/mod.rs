//! # Entity Component System
//!
//! A bitmask ECS with deferred entity lifecycle.
//!
//! ## Design Philosophy
//!
//! - Components live in dense per-type pools indexed by entity slot
//! - Entity handles are indices with a version counter
//! - Systems are matched to entities by component mask, once per flush
//! - Creations and destructions take effect at [`World::update`]

mod component;
mod entity;
mod query;
mod storage;
mod system;
mod world;

pub use component::{Component, ComponentId, ComponentMask, ComponentRegistry, MAX_COMPONENTS};
pub use entity::{Entity, EntityIndex, EntityTable, Version, MAX_ENTITIES};
pub use query::Query;
pub use storage::{ComponentPool, PoolSet};
pub use system::{AsAny, System, SystemRegistry, SystemState};
pub use world::World;

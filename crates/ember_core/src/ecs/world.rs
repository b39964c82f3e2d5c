//! # ECS World
//!
//! The central container for all entities, components and systems.
//!
//! Entity lifecycle is two-phase. [`World::create`] hands out a usable
//! handle immediately but the entity stays invisible to systems and
//! iteration until the next [`World::update`]. [`World::kill`] only queues
//! the entity; the slot is reclaimed during the next update. Systems
//! therefore never observe half-built entities, and a frame's entity sets
//! stay stable while systems run.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::mem;

use tracing::{debug, warn};

use super::component::{Component, ComponentId, ComponentMask, ComponentRegistry};
use super::entity::{Entity, EntityTable};
use super::query::Query;
use super::storage::PoolSet;
use super::system::{System, SystemRegistry};
use crate::config::WorldConfig;

/// Generates one `for_each` variant per query arity, plus the variant
/// that also lends the world to the callback.
macro_rules! for_each_arity {
    ($name:ident, $with_world:ident, $arity:literal: $($ty:ident $pool:ident),+) => {
        #[doc = concat!(
            "Visits every flushed entity carrying all ", $arity, " component types, ",
            "in ascending slot order.\n\n",
            "Entities created since the last [`World::update`] are skipped. ",
            "Removing a component of the current entity inside the callback is fine; ",
            "adding a component type that is being iterated panics.\n\n",
            "# Panics\n\n",
            "Panics if the same component type is named twice."
        )]
        pub fn $name<$($ty: Component,)+ F>(&mut self, mut f: F)
        where
            F: FnMut(Entity, $(&mut $ty),+),
        {
            let Some(required) = <($($ty,)+) as Query>::mask(&self.components) else {
                return;
            };
            let Some(lent) = <($($ty,)+) as Query>::lend(&self.components, &mut self.pools) else {
                return;
            };
            let ($(mut $pool,)+) = lent;
            for index in 0..self.entities.len() {
                if self.is_visible(index, required) {
                    f(self.entities.entity_at(index), $($pool.get_mut(index)),+);
                }
            }
            <($($ty,)+) as Query>::give_back(&self.components, &mut self.pools, ($($pool,)+));
        }

        #[doc = concat!(
            "Like [`World::", stringify!($name), "`], but also lends the world to the callback ",
            "for access to components outside the query.\n\n",
            "Entities created inside the callback are not visited. ",
            "Touching the queried component types through the world panics."
        )]
        pub fn $with_world<$($ty: Component,)+ F>(&mut self, mut f: F)
        where
            F: FnMut(&mut World, Entity, $(&mut $ty),+),
        {
            let Some(required) = <($($ty,)+) as Query>::mask(&self.components) else {
                return;
            };
            let Some(lent) = <($($ty,)+) as Query>::lend(&self.components, &mut self.pools) else {
                return;
            };
            let ($(mut $pool,)+) = lent;
            let slot_count = self.entities.len();
            for index in 0..slot_count {
                if self.is_visible(index, required) {
                    let entity = self.entities.entity_at(index);
                    f(self, entity, $($pool.get_mut(index)),+);
                }
            }
            <($($ty,)+) as Query>::give_back(&self.components, &mut self.pools, ($($pool,)+));
        }
    };
}

/// The ECS World: entities, their components, systems, tags and groups.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new();
/// let entity = world.create();
/// world.add(entity, Position::new(1.0, 2.0, 3.0));
/// world.update();
///
/// world.for_each(|_, position: &mut Position| position.x += 1.0);
/// ```
pub struct World {
    config: WorldConfig,
    components: ComponentRegistry,
    entities: EntityTable,
    pools: PoolSet,
    systems: SystemRegistry,
    /// Tag name to entity, last writer wins.
    tags: HashMap<String, Entity>,
    /// Group name to member entities.
    groups: HashMap<String, BTreeSet<Entity>>,
    /// Created since the last flush.
    created: Vec<Entity>,
    /// Killed since the last flush.
    killed: Vec<Entity>,
}

impl World {
    /// Creates a world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a world with `config`.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            entities: EntityTable::new(config.min_free_indices, config.initial_capacity),
            config,
            components: ComponentRegistry::new(),
            pools: PoolSet::new(),
            systems: SystemRegistry::new(),
            tags: HashMap::new(),
            groups: HashMap::new(),
            created: Vec::new(),
            killed: Vec::new(),
        }
    }

    /// Returns the configuration the world was built with.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Creates an entity.
    ///
    /// The handle is valid for component attachment right away; systems and
    /// iteration see the entity after the next [`World::update`].
    pub fn create(&mut self) -> Entity {
        let entity = self.entities.allocate();
        self.created.push(entity);
        entity
    }

    /// Queues `entity` for destruction at the next [`World::update`].
    pub fn kill(&mut self, entity: Entity) {
        self.killed.push(entity);
    }

    /// Flushes the deferred lifecycle.
    ///
    /// First every entity created since the last flush becomes visible and
    /// joins each system whose mask it contains. Then every killed entity is
    /// handed to each system's destroy hook and its slot is reclaimed.
    ///
    /// Call once per frame, after gameplay code issued its creates/kills
    /// and before systems iterate.
    ///
    /// # Panics
    ///
    /// Panics if called from inside [`World::run_system`].
    pub fn update(&mut self) {
        if let Some(name) = self.systems.running() {
            panic!("cannot flush the world while system `{name}` is running");
        }

        let created = mem::take(&mut self.created);
        for &entity in &created {
            if !self.entities.is_alive(entity) {
                continue;
            }
            self.entities.activate(entity.index());
            self.match_systems(entity);
        }

        let killed = mem::take(&mut self.killed);
        let mut destroyed = HashSet::with_capacity(killed.len());
        for &entity in &killed {
            if !self.entities.is_alive(entity) {
                warn!(%entity, "ignoring kill of an entity that is already destroyed");
                continue;
            }
            self.destroy_entity(entity);
            destroyed.insert(entity);
        }
        if !destroyed.is_empty() {
            self.systems.for_each_mut(|system| {
                system
                    .state_mut()
                    .retain_entities(|entity| !destroyed.contains(&entity));
            });
        }
        let reclaimed = destroyed.len();

        if !created.is_empty() || reclaimed > 0 {
            debug!(
                created = created.len(),
                reclaimed,
                alive = self.entities.alive_count(),
                "flushed entity lifecycle"
            );
        }
    }

    /// Checks whether `entity` is the current occupant of its slot.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of occupied slots, pending creations included.
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Number of slots ever allocated. Every pool is aligned to it.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.entities.len()
    }

    /// Entities created since the last flush.
    #[must_use]
    pub fn pending_creations(&self) -> &[Entity] {
        &self.created
    }

    /// Entities killed since the last flush.
    #[must_use]
    pub fn pending_kills(&self) -> &[Entity] {
        &self.killed
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Returns the id of component type `T`, registering it on first use.
    ///
    /// # Panics
    ///
    /// Panics when more than 32 component types are registered.
    pub fn register_component<T: Component>(&mut self) -> ComponentId {
        self.components.register::<T>()
    }

    /// Returns the id of component type `T` if it was ever used.
    #[must_use]
    pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
        self.components.get::<T>()
    }

    /// Attaches `component` to `entity`, replacing any previous `T`.
    ///
    /// System membership is not re-evaluated until the next flush
    /// (or [`World::refresh_systems`]).
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive, or if `T` is being iterated.
    pub fn add<T: Component>(&mut self, entity: Entity, component: T) -> &mut T {
        self.assert_alive(entity);
        let id = self.components.register::<T>();
        let index = entity.index() as usize;
        let slot = self
            .pools
            .accommodate::<T>(id, self.entities.len())
            .set(index, component);
        self.entities.mask_mut(index).insert(id);
        slot
    }

    /// Detaches `T` from `entity`.
    ///
    /// Only the mask bit is cleared; the stale value stays in the pool until
    /// a later `add` overwrites it.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive.
    pub fn remove<T: Component>(&mut self, entity: Entity) {
        self.assert_alive(entity);
        if let Some(id) = self.components.get::<T>() {
            self.entities.mask_mut(entity.index() as usize).remove(id);
        }
    }

    /// Checks whether `entity` is alive and carries a `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.is_alive(entity)
            && self
                .components
                .get::<T>()
                .is_some_and(|id| self.entities.mask(entity.index() as usize).contains(id))
    }

    /// Returns the `T` attached to `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` does not carry a `T`. Check with [`World::has`]
    /// when absence is expected.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> &T {
        let id = self.attached_id::<T>(entity);
        match self.pools.get::<T>(id) {
            Some(pool) => pool.get(entity.index() as usize),
            None => panic!("no pool for `{}`", std::any::type_name::<T>()),
        }
    }

    /// Returns the `T` attached to `entity` for modification.
    ///
    /// # Panics
    ///
    /// Panics if `entity` does not carry a `T`.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        let id = self.attached_id::<T>(entity);
        match self.pools.get_mut::<T>(id) {
            Some(pool) => pool.get_mut(entity.index() as usize),
            None => panic!("no pool for `{}`", std::any::type_name::<T>()),
        }
    }

    /// Returns the component mask of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive.
    #[must_use]
    pub fn component_mask(&self, entity: Entity) -> ComponentMask {
        self.assert_alive(entity);
        self.entities.mask(entity.index() as usize)
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    for_each_arity!(for_each, for_each_with_world, "one": A a);
    for_each_arity!(for_each2, for_each2_with_world, "two": A a, B b);
    for_each_arity!(for_each3, for_each3_with_world, "three": A a, B b, C c);
    for_each_arity!(for_each4, for_each4_with_world, "four": A a, B b, C c, D d);

    // =========================================================================
    // Systems
    // =========================================================================

    /// Registers `system` and matches it against every flushed entity.
    ///
    /// # Panics
    ///
    /// Panics if a system of the same type is already registered.
    pub fn add_system<S: System>(&mut self, mut system: S) {
        system.state_mut().resolve(&mut self.components);
        let required = system.state().mask();
        for index in 0..self.entities.len() {
            let entity = self.entities.entity_at(index);
            if self.entities.is_occupied(index)
                && !self.entities.is_pending(index)
                && self.entities.mask(index).contains_all(required)
            {
                system.state_mut().add_entity(entity);
            }
        }
        debug!(
            system = std::any::type_name::<S>(),
            matched = system.state().entities().len(),
            "registered system"
        );
        self.systems.insert(system);
    }

    /// Unregisters and returns the system of type `S`.
    pub fn remove_system<S: System>(&mut self) -> Option<S> {
        let removed = self.systems.remove::<S>();
        if removed.is_some() {
            debug!(system = std::any::type_name::<S>(), "removed system");
        }
        removed
    }

    /// Checks whether a system of type `S` is registered.
    #[must_use]
    pub fn has_system<S: System>(&self) -> bool {
        self.systems.contains::<S>()
    }

    /// Returns the system of type `S`.
    ///
    /// # Panics
    ///
    /// Panics if no such system is registered.
    #[must_use]
    pub fn system<S: System>(&self) -> &S {
        match self.systems.get::<S>() {
            Some(system) => system,
            None => panic!("failed to get system `{}`", std::any::type_name::<S>()),
        }
    }

    /// Returns the system of type `S` for modification.
    ///
    /// # Panics
    ///
    /// Panics if no such system is registered.
    pub fn system_mut<S: System>(&mut self) -> &mut S {
        match self.systems.get_mut::<S>() {
            Some(system) => system,
            None => panic!("failed to get system `{}`", std::any::type_name::<S>()),
        }
    }

    /// Runs `f` with the system of type `S` and the world itself.
    ///
    /// The system is lent out of the registry for the call, so its update
    /// can take the world explicitly:
    ///
    /// ```rust,ignore
    /// world.run_system(|animation: &mut AnimationSystem, world| animation.update(world, dt));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if no such system is registered or it is already running.
    pub fn run_system<S: System, R>(&mut self, f: impl FnOnce(&mut S, &mut World) -> R) -> R {
        let mut system = self.systems.take::<S>();
        let result = f(&mut system, self);
        self.systems.restore(system);
        result
    }

    /// Re-evaluates which systems track an already-flushed `entity`, after
    /// components were added or removed.
    pub fn refresh_systems(&mut self, entity: Entity) {
        if !self.is_alive(entity) || self.entities.is_pending(entity.index() as usize) {
            return;
        }
        let mask = self.entities.mask(entity.index() as usize);
        self.systems.for_each_mut(|system| {
            let matches = mask.contains_all(system.state().mask());
            let tracked = system.state().contains(entity);
            if matches && !tracked {
                system.state_mut().add_entity(entity);
            } else if !matches && tracked {
                system.state_mut().remove_entity(entity);
            }
        });
    }

    /// Names of the registered systems, in registration order.
    pub fn system_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.systems.names()
    }

    // =========================================================================
    // Tags and groups
    // =========================================================================

    /// Maps `name` to `entity`, replacing any previous mapping.
    pub fn tag(&mut self, entity: Entity, name: impl Into<String>) {
        self.tags.insert(name.into(), entity);
    }

    /// Checks whether `name` maps to a live entity.
    #[must_use]
    pub fn has_tagged_entity(&self, name: &str) -> bool {
        self.tagged_entity(name).is_some()
    }

    /// Returns the live entity tagged `name`, if any.
    #[must_use]
    pub fn tagged_entity(&self, name: &str) -> Option<Entity> {
        self.tags.get(name).copied().filter(|&entity| self.is_alive(entity))
    }

    /// Returns the entity tagged `name`.
    ///
    /// # Panics
    ///
    /// Panics if no live entity carries the tag. Check with
    /// [`World::has_tagged_entity`] when absence is expected.
    #[must_use]
    pub fn entity_by_tag(&self, name: &str) -> Entity {
        match self.tagged_entity(name) {
            Some(entity) => entity,
            None => panic!("no live entity tagged `{name}`"),
        }
    }

    /// Adds `entity` to the group `name`, creating the group if needed.
    pub fn group(&mut self, entity: Entity, name: impl Into<String>) {
        self.groups.entry(name.into()).or_default().insert(entity);
    }

    /// Removes `entity` from the group `name`. The group itself remains.
    pub fn ungroup(&mut self, entity: Entity, name: &str) {
        if let Some(group) = self.groups.get_mut(name) {
            group.remove(&entity);
        }
    }

    /// Checks whether the group `name` was ever created.
    #[must_use]
    pub fn has_entity_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Returns the members of group `name`, ordered by index.
    ///
    /// # Panics
    ///
    /// Panics if the group was never created.
    #[must_use]
    pub fn entity_group(&self, name: &str) -> Vec<Entity> {
        match self.groups.get(name) {
            Some(group) => group.iter().copied().collect(),
            None => panic!("no entity group `{name}`"),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    #[inline]
    fn is_visible(&self, index: usize, required: ComponentMask) -> bool {
        self.entities.is_occupied(index)
            && !self.entities.is_pending(index)
            && self.entities.mask(index).contains_all(required)
    }

    fn match_systems(&mut self, entity: Entity) {
        let mask = self.entities.mask(entity.index() as usize);
        self.systems.for_each_mut(|system| {
            // Fresh entities are pending until this flush, so no system tracks them yet
            if mask.contains_all(system.state().mask()) {
                system.state_mut().add_entity(entity);
            }
        });
    }

    fn destroy_entity(&mut self, entity: Entity) {
        self.systems.for_each_mut(|system| system.on_destroy(entity));
        for group in self.groups.values_mut() {
            group.remove(&entity);
        }
        self.tags.retain(|_, tagged| *tagged != entity);
        self.entities.release(entity.index());
    }

    fn attached_id<T: Component>(&self, entity: Entity) -> ComponentId {
        match self.components.get::<T>() {
            Some(id) if self.has::<T>(entity) => id,
            _ => panic!(
                "{entity} has no `{}` component",
                std::any::type_name::<T>()
            ),
        }
    }

    fn assert_alive(&self, entity: Entity) {
        assert!(self.is_alive(entity), "{entity} is not alive");
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("alive", &self.entities.alive_count())
            .field("slots", &self.entities.len())
            .field("components", &self.components.len())
            .field("systems", &self.systems.len())
            .field("pools", &self.pools)
            .finish_non_exhaustive()
    }
}

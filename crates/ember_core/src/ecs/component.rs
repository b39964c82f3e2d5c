//! # Component Registry
//!
//! Components are plain values with no behavior and no base trait to
//! implement by hand. Every distinct component type used with a [`World`]
//! is assigned a small integer id the first time the world sees it. The id
//! selects one bit of the per-entity [`ComponentMask`].
//!
//! [`World`]: super::World

use std::any::{type_name, TypeId};
use std::collections::HashMap;

/// Maximum number of distinct component types per world.
///
/// Matches the width of [`ComponentMask`].
pub const MAX_COMPONENTS: usize = 32;

/// Marker trait for ECS components.
///
/// Implemented automatically for every `Default + Send + Sync + 'static`
/// type. `Default` fills pool slots that no entity has claimed yet.
pub trait Component: Default + Send + Sync + 'static {}

impl<T: Default + Send + Sync + 'static> Component for T {}

/// Small integer identifier of a component type within one world (0-31).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ComponentId(u8);

impl ComponentId {
    /// Returns the id as a pool/bit index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Fixed-width bitset of component types.
///
/// One mask per entity slot records the attached components; one mask per
/// system records the components it requires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ComponentMask(u32);

impl ComponentMask {
    /// The mask with no bits set.
    pub const EMPTY: Self = Self(0);

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns a copy of the mask with `id` set.
    #[inline]
    #[must_use]
    pub const fn with(self, id: ComponentId) -> Self {
        Self(self.0 | (1 << id.0))
    }

    /// Sets the bit for `id`.
    #[inline]
    pub fn insert(&mut self, id: ComponentId) {
        self.0 |= 1 << id.0;
    }

    /// Clears the bit for `id`.
    #[inline]
    pub fn remove(&mut self, id: ComponentId) {
        self.0 &= !(1 << id.0);
    }

    /// Checks whether the bit for `id` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, id: ComponentId) -> bool {
        self.0 & (1 << id.0) != 0
    }

    /// Checks whether every bit of `required` is also set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains_all(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// Clears every bit.
    #[inline]
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Checks whether no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of set bits.
    #[inline]
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

/// Assigns stable ids to component types, in first-use order.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    ids: HashMap<TypeId, ComponentId>,
    names: Vec<&'static str>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `T`, assigning the next free id on first use.
    ///
    /// # Panics
    ///
    /// Panics when more than [`MAX_COMPONENTS`] distinct types are registered.
    /// That is a build-time budget overrun, not a runtime condition.
    pub fn register<T: Component>(&mut self) -> ComponentId {
        self.register_raw(TypeId::of::<T>(), type_name::<T>())
    }

    /// Registers a type by its runtime identity.
    ///
    /// Systems declare requirements before they know which world they
    /// belong to, so they store `(TypeId, name)` pairs and resolve them here.
    ///
    /// # Panics
    ///
    /// Panics when more than [`MAX_COMPONENTS`] distinct types are registered.
    pub fn register_raw(&mut self, type_id: TypeId, name: &'static str) -> ComponentId {
        if let Some(&id) = self.ids.get(&type_id) {
            return id;
        }
        assert!(
            self.names.len() < MAX_COMPONENTS,
            "component type limit exceeded: cannot register `{name}`, \
             all {MAX_COMPONENTS} component ids are taken"
        );
        let id = ComponentId(self.names.len() as u8);
        self.ids.insert(type_id, id);
        self.names.push(name);
        id
    }

    /// Returns the id of `T` if the type was registered.
    #[inline]
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<ComponentId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the type name registered under `id`.
    #[must_use]
    pub fn name(&self, id: ComponentId) -> Option<&'static str> {
        self.names.get(id.index()).copied()
    }

    /// Number of registered component types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Checks whether no component type is registered yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Health(u32);

    #[derive(Default)]
    struct Armor;

    #[test]
    fn test_ids_assigned_in_first_use_order() {
        let mut registry = ComponentRegistry::new();
        assert!(registry.get::<Health>().is_none());

        let health = registry.register::<Health>();
        let armor = registry.register::<Armor>();
        assert_eq!(health.index(), 0);
        assert_eq!(armor.index(), 1);

        // Stable on re-registration
        assert_eq!(registry.register::<Health>(), health);
        assert_eq!(registry.len(), 2);
        assert!(registry.name(armor).unwrap().ends_with("Armor"));
    }

    #[test]
    fn test_mask_containment() {
        let mut registry = ComponentRegistry::new();
        let a = registry.register::<Health>();
        let b = registry.register::<Armor>();

        let entity = ComponentMask::EMPTY.with(a).with(b);
        let system = ComponentMask::EMPTY.with(b);
        assert!(entity.contains_all(system));
        assert!(!system.contains_all(entity));
        assert!(entity.contains_all(ComponentMask::EMPTY));
        assert_eq!(entity.count(), 2);

        let mut mask = entity;
        mask.remove(a);
        assert!(!mask.contains(a));
        assert!(mask.contains(b));
        mask.clear();
        assert!(mask.is_empty());
    }

    #[test]
    #[should_panic(expected = "component type limit exceeded")]
    fn test_registry_overflow_is_fatal() {
        let mut registry = ComponentRegistry::new();
        // Distinct TypeIds without 33 distinct structs.
        macro_rules! register_arrays {
            ($($n:literal)*) => { $( registry.register::<[u8; $n]>(); )* };
        }
        register_arrays!(0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31 32);
    }
}

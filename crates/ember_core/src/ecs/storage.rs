//! # Component Storage
//!
//! Dense component storage indexed by entity slot.
//!
//! The storage uses a dense array strategy:
//! - One pool per component type, grown (never shrunk) to the world's slot count
//! - Access is O(1) via entity index
//! - Iteration is cache-friendly (contiguous memory)
//!
//! A slot whose mask bit is clear still holds a stale or default value.
//! Callers check the mask before touching a pool.

use std::any::{type_name, Any};

use super::component::{Component, ComponentId, ComponentMask};

/// Storage for a single component type.
///
/// # Type Parameters
///
/// * `C` - The component type to store
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: ComponentPool<Position> = ComponentPool::new();
/// pool.set(50, Position::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug)]
pub struct ComponentPool<C> {
    /// The dense array of components.
    data: Vec<C>,
}

impl<C: Component> ComponentPool<C> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Creates a pool covering `len` slots, all holding the default value.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        let mut pool = Self::new();
        pool.ensure_len(len);
        pool
    }

    /// Number of slots covered by the pool.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks whether the pool covers no slot.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Grows the pool with default values until it covers `len` slots.
    pub fn ensure_len(&mut self, len: usize) {
        if len > self.data.len() {
            self.data.resize_with(len, C::default);
        }
    }

    /// Stores `component` at `index`, growing the pool if needed.
    ///
    /// Returns a reference to the stored value.
    #[inline]
    pub fn set(&mut self, index: usize, component: C) -> &mut C {
        self.ensure_len(index + 1);
        let slot = &mut self.data[index];
        *slot = component;
        slot
    }

    /// Gets the component at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is beyond the pool. The caller has already checked
    /// the mask, so there is no optional return.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> &C {
        &self.data[index]
    }

    /// Gets the component at `index` for modification.
    ///
    /// # Panics
    ///
    /// Panics if `index` is beyond the pool.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut C {
        &mut self.data[index]
    }

    /// Returns a slice of all slots, attached or not.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.data
    }

    /// Drops every stored value.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl<C: Component> Default for ComponentPool<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Object-safe view of a [`ComponentPool`] with its element type erased.
trait ErasedPool: Send + Sync {
    fn len(&self) -> usize;
    fn ensure_len(&mut self, len: usize);
    fn clear(&mut self);
    fn element_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<C: Component> ErasedPool for ComponentPool<C> {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn ensure_len(&mut self, len: usize) {
        ComponentPool::ensure_len(self, len);
    }

    fn clear(&mut self) {
        ComponentPool::clear(self);
    }

    fn element_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// All component pools of a world, indexed by [`ComponentId`].
///
/// Pools are recovered with a checked downcast; a mismatch means two types
/// share an id, which is a registry bug and panics.
#[derive(Default)]
pub struct PoolSet {
    pools: Vec<Option<Box<dyn ErasedPool>>>,
    /// Pools currently lent out to a running query.
    borrowed: ComponentMask,
}

impl PoolSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether a pool exists for `id`.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        matches!(self.pools.get(id.index()), Some(Some(_)))
    }

    /// Checks whether the pool for `id` is lent out to a running query.
    #[inline]
    #[must_use]
    pub fn is_borrowed(&self, id: ComponentId) -> bool {
        self.borrowed.contains(id)
    }

    /// Returns the pool for `id`, if it exists.
    ///
    /// # Panics
    ///
    /// Panics if the pool is lent out or holds another element type.
    #[must_use]
    pub fn get<C: Component>(&self, id: ComponentId) -> Option<&ComponentPool<C>> {
        self.assert_not_borrowed::<C>(id);
        let pool = self.pools.get(id.index())?.as_ref()?;
        Some(downcast_ref(&**pool))
    }

    /// Returns the pool for `id` for modification, if it exists.
    ///
    /// # Panics
    ///
    /// Panics if the pool is lent out or holds another element type.
    pub fn get_mut<C: Component>(&mut self, id: ComponentId) -> Option<&mut ComponentPool<C>> {
        self.assert_not_borrowed::<C>(id);
        let pool = self.pools.get_mut(id.index())?.as_mut()?;
        Some(downcast_mut(&mut **pool))
    }

    /// Returns the pool for `id`, creating it on first use, grown to cover
    /// `slot_count` slots so all pools stay index-aligned.
    ///
    /// # Panics
    ///
    /// Panics if the pool is lent out or holds another element type.
    pub fn accommodate<C: Component>(
        &mut self,
        id: ComponentId,
        slot_count: usize,
    ) -> &mut ComponentPool<C> {
        self.assert_not_borrowed::<C>(id);
        if id.index() >= self.pools.len() {
            self.pools.resize_with(id.index() + 1, || None);
        }
        let pool = self.pools[id.index()]
            .get_or_insert_with(|| Box::new(ComponentPool::<C>::new()) as Box<dyn ErasedPool>);
        if pool.len() < slot_count {
            pool.ensure_len(slot_count);
        }
        downcast_mut(&mut **pool)
    }

    /// Moves the pool for `id` out of the set for the duration of a query.
    ///
    /// Returns `None` if no pool exists.
    ///
    /// # Panics
    ///
    /// Panics if the pool is already lent out.
    pub fn lend<C: Component>(&mut self, id: ComponentId) -> Option<Box<ComponentPool<C>>> {
        self.assert_not_borrowed::<C>(id);
        let pool = self.pools.get_mut(id.index())?.take()?;
        self.borrowed.insert(id);
        match pool.into_any().downcast::<ComponentPool<C>>() {
            Ok(pool) => Some(pool),
            Err(_) => panic!("component pool {} does not store `{}`", id.index(), type_name::<C>()),
        }
    }

    /// Returns a pool previously taken with [`PoolSet::lend`].
    pub fn give_back<C: Component>(&mut self, id: ComponentId, pool: Box<ComponentPool<C>>) {
        debug_assert!(self.borrowed.contains(id), "pool {} was not lent out", id.index());
        self.pools[id.index()] = Some(pool);
        self.borrowed.remove(id);
    }

    /// Drops the contents of every pool.
    pub fn clear(&mut self) {
        for pool in self.pools.iter_mut().flatten() {
            pool.clear();
        }
    }

    fn assert_not_borrowed<C: Component>(&self, id: ComponentId) {
        assert!(
            !self.borrowed.contains(id),
            "component pool for `{}` is borrowed by a running query",
            type_name::<C>()
        );
    }
}

impl std::fmt::Debug for PoolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.pools
                    .iter()
                    .map(|pool| pool.as_ref().map(|p| (p.element_name(), p.len()))),
            )
            .finish()
    }
}

fn downcast_ref<'a, C: Component>(pool: &'a (dyn ErasedPool + 'static)) -> &'a ComponentPool<C> {
    let name = pool.element_name();
    pool.as_any()
        .downcast_ref()
        .unwrap_or_else(|| panic!("component pool stores `{name}`, not `{}`", type_name::<C>()))
}

fn downcast_mut<'a, C: Component>(
    pool: &'a mut (dyn ErasedPool + 'static),
) -> &'a mut ComponentPool<C> {
    let name = pool.element_name();
    pool.as_any_mut()
        .downcast_mut()
        .unwrap_or_else(|| panic!("component pool stores `{name}`, not `{}`", type_name::<C>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::ComponentRegistry;

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[test]
    fn test_pool_grows_on_set() {
        let mut pool: ComponentPool<Position> = ComponentPool::new();
        assert!(pool.is_empty());

        pool.set(50, Position { x: 1.0, y: 2.0 });
        assert_eq!(pool.len(), 51);
        assert_eq!(*pool.get(50), Position { x: 1.0, y: 2.0 });
        assert_eq!(*pool.get(10), Position::default());
    }

    #[test]
    fn test_pool_never_shrinks() {
        let mut pool: ComponentPool<Position> = ComponentPool::with_len(100);
        pool.ensure_len(10);
        assert_eq!(pool.len(), 100);
    }

    #[test]
    fn test_accommodate_aligns_to_slot_count() {
        let mut registry = ComponentRegistry::new();
        let id = registry.register::<Position>();
        let mut pools = PoolSet::new();

        assert!(!pools.contains(id));
        let pool = pools.accommodate::<Position>(id, 8);
        assert_eq!(pool.len(), 8);
        assert!(pools.contains(id));
        assert_eq!(pools.get::<Position>(id).map(ComponentPool::len), Some(8));
    }

    #[test]
    fn test_lend_and_give_back() {
        let mut registry = ComponentRegistry::new();
        let id = registry.register::<Position>();
        let mut pools = PoolSet::new();
        pools.accommodate::<Position>(id, 1).set(0, Position { x: 3.0, y: 0.0 });

        let pool = pools.lend::<Position>(id).unwrap();
        assert!(pools.is_borrowed(id));
        assert!(!pools.contains(id));
        pools.give_back(id, pool);

        assert!(!pools.is_borrowed(id));
        assert_eq!(pools.get::<Position>(id).unwrap().get(0).x, 3.0);
    }

    #[test]
    #[should_panic(expected = "borrowed by a running query")]
    fn test_touching_lent_pool_panics() {
        let mut registry = ComponentRegistry::new();
        let id = registry.register::<Position>();
        let mut pools = PoolSet::new();
        pools.accommodate::<Position>(id, 1);
        let _pool = pools.lend::<Position>(id);
        pools.accommodate::<Position>(id, 2);
    }

    #[test]
    #[should_panic(expected = "component pool stores")]
    fn test_type_mismatch_panics() {
        let mut registry = ComponentRegistry::new();
        let id = registry.register::<Position>();
        let mut pools = PoolSet::new();
        pools.accommodate::<Position>(id, 1);
        let _ = pools.get::<u32>(id);
    }
}

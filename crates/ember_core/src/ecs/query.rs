//! # Multi-Component Queries
//!
//! A query is a tuple of component types iterated in lockstep by the
//! `for_each*` family on [`World`](super::World):
//!
//! ```rust,ignore
//! world.for_each2(|entity, position: &mut Position, velocity: &mut Velocity| {
//!     position.x += velocity.x;
//! });
//! ```
//!
//! The pools named by the query are moved out of the world for the whole
//! iteration, which is what allows handing out one `&mut` per pool at once
//! without aliasing.

use super::component::{Component, ComponentMask, ComponentRegistry};
use super::storage::{ComponentPool, PoolSet};

/// A tuple of component types that can be iterated together.
///
/// Implemented for tuples of one to four components, matching the
/// `for_each` to `for_each4` family.
pub trait Query {
    /// The pools lent out while iterating.
    type Pools;

    /// Mask an entity needs to match, or `None` if some type was never
    /// registered (then nothing can match).
    ///
    /// # Panics
    ///
    /// Panics if the same component type appears twice.
    fn mask(registry: &ComponentRegistry) -> Option<ComponentMask>;

    /// Takes the pools out of `pools`, or `None` if one does not exist yet.
    ///
    /// # Panics
    ///
    /// Panics if a pool is already lent to an enclosing query.
    fn lend(registry: &ComponentRegistry, pools: &mut PoolSet) -> Option<Self::Pools>;

    /// Puts the pools back.
    fn give_back(registry: &ComponentRegistry, pools: &mut PoolSet, lent: Self::Pools);
}

macro_rules! impl_query {
    ($count:literal: $($name:ident),+) => {
        impl<$($name: Component),+> Query for ($($name,)+) {
            type Pools = ($(Box<ComponentPool<$name>>,)+);

            fn mask(registry: &ComponentRegistry) -> Option<ComponentMask> {
                let mut mask = ComponentMask::EMPTY;
                $( mask.insert(registry.get::<$name>()?); )+
                assert!(
                    mask.count() == $count,
                    "a component type appears twice in query `{}`",
                    std::any::type_name::<Self>()
                );
                Some(mask)
            }

            fn lend(registry: &ComponentRegistry, pools: &mut PoolSet) -> Option<Self::Pools> {
                $(
                    let id = registry.get::<$name>()?;
                    assert!(
                        !pools.is_borrowed(id),
                        "component pool for `{}` is borrowed by a running query",
                        std::any::type_name::<$name>()
                    );
                    if !pools.contains(id) {
                        return None;
                    }
                )+
                Some(($( pools.lend::<$name>(registry.get::<$name>()?)?, )+))
            }

            #[allow(non_snake_case)]
            fn give_back(registry: &ComponentRegistry, pools: &mut PoolSet, lent: Self::Pools) {
                let ($($name,)+) = lent;
                $(
                    if let Some(id) = registry.get::<$name>() {
                        pools.give_back(id, $name);
                    }
                )+
            }
        }
    };
}

impl_query!(1: A);
impl_query!(2: A, B);
impl_query!(3: A, B, C);
impl_query!(4: A, B, C, D);

//! # Systems
//!
//! A system declares the components it needs once, then receives every
//! flushed entity whose mask contains them. At most one instance of each
//! concrete system type lives in a world.
//!
//! ```rust,ignore
//! struct Gravity { state: SystemState }
//!
//! impl Gravity {
//!     fn new() -> Self {
//!         Self { state: SystemState::new().require::<Velocity>() }
//!     }
//! }
//!
//! impl System for Gravity {
//!     fn state(&self) -> &SystemState { &self.state }
//!     fn state_mut(&mut self) -> &mut SystemState { &mut self.state }
//! }
//! ```

use std::any::{type_name, Any, TypeId};

use super::component::{Component, ComponentMask, ComponentRegistry};
use super::entity::Entity;

/// Bookkeeping shared by every system: its requirements and the entities
/// currently matching them.
#[derive(Debug, Default)]
pub struct SystemState {
    required: Vec<(TypeId, &'static str)>,
    mask: ComponentMask,
    entities: Vec<Entity>,
}

impl SystemState {
    /// Creates a state with no requirements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SystemState::require_component`].
    #[must_use]
    pub fn require<T: Component>(mut self) -> Self {
        self.require_component::<T>();
        self
    }

    /// Declares that matching entities must carry a `T`.
    pub fn require_component<T: Component>(&mut self) {
        let id = TypeId::of::<T>();
        if !self.required.iter().any(|(required, _)| *required == id) {
            self.required.push((id, type_name::<T>()));
        }
    }

    /// Resolves the declared requirements against a world's registry.
    pub(crate) fn resolve(&mut self, registry: &mut ComponentRegistry) {
        let mut mask = ComponentMask::EMPTY;
        for &(type_id, name) in &self.required {
            mask.insert(registry.register_raw(type_id, name));
        }
        self.mask = mask;
    }

    /// The resolved requirement mask. Empty until the system joins a world.
    #[inline]
    #[must_use]
    pub fn mask(&self) -> ComponentMask {
        self.mask
    }

    /// Entities currently matched to the system, in flush order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Checks whether `entity` is tracked.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Starts tracking `entity`.
    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Stops tracking `entity`.
    pub fn remove_entity(&mut self, entity: Entity) {
        self.entities.retain(|&tracked| tracked != entity);
    }

    /// Keeps only the tracked entities for which `keep` returns true.
    pub fn retain_entities(&mut self, mut keep: impl FnMut(Entity) -> bool) {
        self.entities.retain(|&tracked| keep(tracked));
    }
}

/// Upcasting helper so boxed systems can be recovered by type.
pub trait AsAny: Any {
    /// Returns `self` as [`Any`].
    fn as_any(&self) -> &dyn Any;
    /// Returns `self` as mutable [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Converts the box into a boxed [`Any`].
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
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

/// A logic unit matched to entities by component mask.
///
/// The per-frame update is not part of the trait: each system exposes its
/// own update taking the world explicitly, driven by the host loop through
/// [`World::run_system`](super::World::run_system).
pub trait System: AsAny + Send {
    /// Requirements and tracked entities.
    fn state(&self) -> &SystemState;

    /// Requirements and tracked entities, for modification.
    fn state_mut(&mut self) -> &mut SystemState;

    /// Called when a killed entity is reclaimed, before its slot is reused.
    ///
    /// Use it to clean up system-owned side state.
    fn on_destroy(&mut self, _entity: Entity) {}
}

struct SystemEntry {
    type_id: TypeId,
    name: &'static str,
    /// `None` while lent out by [`SystemRegistry::take`].
    system: Option<Box<dyn System>>,
}

/// One instance per registered system type, in registration order.
#[derive(Default)]
pub struct SystemRegistry {
    entries: Vec<SystemEntry>,
}

impl SystemRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether no system is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks whether a system of type `S` is registered.
    #[must_use]
    pub fn contains<S: System>(&self) -> bool {
        self.position::<S>().is_some()
    }

    /// Registers `system`.
    ///
    /// # Panics
    ///
    /// Panics if a system of the same type is already registered.
    pub fn insert<S: System>(&mut self, system: S) {
        assert!(
            !self.contains::<S>(),
            "system `{}` is already registered",
            type_name::<S>()
        );
        self.entries.push(SystemEntry {
            type_id: TypeId::of::<S>(),
            name: type_name::<S>(),
            system: Some(Box::new(system)),
        });
    }

    /// Unregisters and returns the system of type `S`.
    pub fn remove<S: System>(&mut self) -> Option<S> {
        let position = self.position::<S>()?;
        let entry = self.entries.remove(position);
        entry.system.map(|system| *downcast_box::<S>(system))
    }

    /// Returns the system of type `S`.
    #[must_use]
    pub fn get<S: System>(&self) -> Option<&S> {
        let entry = &self.entries[self.position::<S>()?];
        let system: &dyn System = entry.system.as_deref()?;
        system.as_any().downcast_ref()
    }

    /// Returns the system of type `S` for modification.
    pub fn get_mut<S: System>(&mut self) -> Option<&mut S> {
        let position = self.position::<S>()?;
        let system: &mut dyn System = self.entries[position].system.as_deref_mut()?;
        system.as_any_mut().downcast_mut()
    }

    /// Lends the system of type `S` out of the registry.
    ///
    /// # Panics
    ///
    /// Panics if no such system is registered or it is already lent out.
    pub fn take<S: System>(&mut self) -> Box<S> {
        let position = self
            .position::<S>()
            .unwrap_or_else(|| panic!("system `{}` is not registered", type_name::<S>()));
        let system = self.entries[position]
            .system
            .take()
            .unwrap_or_else(|| panic!("system `{}` is already running", type_name::<S>()));
        downcast_box(system)
    }

    /// Returns a system lent with [`SystemRegistry::take`].
    pub fn restore<S: System>(&mut self, system: Box<S>) {
        match self.position::<S>() {
            Some(position) => self.entries[position].system = Some(system),
            // Removed while running: it stays removed.
            None => drop(system),
        }
    }

    /// Name of a system currently lent out with [`SystemRegistry::take`].
    #[must_use]
    pub fn running(&self) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|entry| entry.system.is_none())
            .map(|entry| entry.name)
    }

    /// Visits every registered system.
    ///
    /// # Panics
    ///
    /// Panics if a system is currently lent out, since it would miss the
    /// notification.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut dyn System)) {
        for entry in &mut self.entries {
            match entry.system.as_deref_mut() {
                Some(system) => f(system),
                None => panic!("system `{}` is running and cannot be notified", entry.name),
            }
        }
    }

    /// Names of the registered systems, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    fn position<S: System>(&self) -> Option<usize> {
        let id = TypeId::of::<S>();
        self.entries.iter().position(|entry| entry.type_id == id)
    }
}

fn downcast_box<S: System>(system: Box<dyn System>) -> Box<S> {
    match system.into_any().downcast::<S>() {
        Ok(system) => system,
        Err(_) => panic!("registered system is not a `{}`", type_name::<S>()),
    }
}

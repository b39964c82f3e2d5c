//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into the component pools
//! - A version counter for detecting stale handles after slot reuse
//!
//! The [`EntityTable`] owns the slots: versions, component masks, the
//! pending flag of freshly created entities and the free-index queue.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

use super::component::ComponentMask;

/// Index part of an entity handle.
pub type EntityIndex = u32;

/// Version part of an entity handle. Wraps after 256 reuses of a slot.
pub type Version = u8;

/// Number of bits used for the index.
const INDEX_BITS: u32 = 22;
const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;
const VERSION_MASK: u32 = 0xFF;

/// Largest slot count a world can address.
pub const MAX_ENTITIES: usize = 1 << INDEX_BITS;

/// Handle to an entity.
///
/// The id packs two parts:
/// - Lower 22 bits: index into component pools
/// - Next 8 bits: version of the slot when the handle was issued
///
/// Two handles are equal only when both index and version match, so a
/// handle to a destroyed entity never equals the handle of the entity that
/// later reuses its slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Entity(u32);

impl Entity {
    /// Creates a handle from index and version.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not fit in 22 bits.
    #[inline]
    #[must_use]
    pub const fn new(index: EntityIndex, version: Version) -> Self {
        assert!(index <= INDEX_MASK, "entity index exceeds 22 bits");
        Self(((version as u32) << INDEX_BITS) | index)
    }

    /// Returns the index portion of the handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> EntityIndex {
        self.0 & INDEX_MASK
    }

    /// Returns the version portion of the handle.
    #[inline]
    #[must_use]
    pub const fn version(self) -> Version {
        ((self.0 >> INDEX_BITS) & VERSION_MASK) as Version
    }

    /// Returns the packed id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index()
            .cmp(&other.index())
            .then(self.version().cmp(&other.version()))
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity_{}_v{}", self.index(), self.version())
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Slot allocator for entities.
///
/// Slots are appended until the free queue holds more than `min_free`
/// indices. Only then is the oldest freed index reused, which gives stale
/// handles time to age out before their version can wrap.
#[derive(Debug)]
pub struct EntityTable {
    /// Current version per slot.
    versions: Vec<Version>,
    /// Attached components per slot.
    masks: Vec<ComponentMask>,
    /// Slots currently held by an entity.
    occupied: Vec<bool>,
    /// Slots created since the last flush, invisible to iteration.
    pending: Vec<bool>,
    /// Freed indices, oldest first.
    free: VecDeque<EntityIndex>,
    /// Minimum queue length before indices are reused.
    min_free: usize,
}

impl EntityTable {
    /// Creates an empty table.
    ///
    /// # Arguments
    ///
    /// * `min_free` - Free indices kept in reserve before one is reused
    /// * `capacity` - Slots to pre-reserve
    #[must_use]
    pub fn new(min_free: usize, capacity: usize) -> Self {
        Self {
            versions: Vec::with_capacity(capacity),
            masks: Vec::with_capacity(capacity),
            occupied: Vec::with_capacity(capacity),
            pending: Vec::with_capacity(capacity),
            free: VecDeque::new(),
            min_free,
        }
    }

    /// Total number of slots ever allocated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Checks whether no slot was ever allocated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Number of indices waiting in the free queue.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.versions.len() - self.free.len()
    }

    /// Allocates a slot and returns the handle for it.
    ///
    /// The slot starts pending with an empty mask.
    ///
    /// # Panics
    ///
    /// Panics when the 22-bit index space is exhausted.
    pub fn allocate(&mut self) -> Entity {
        let index = if self.free.len() > self.min_free {
            // Non-empty by the length check above
            self.free.pop_front().unwrap_or_default()
        } else {
            let index = self.versions.len();
            assert!(index < MAX_ENTITIES, "entity index space exhausted");
            self.versions.push(0);
            self.masks.push(ComponentMask::EMPTY);
            self.occupied.push(false);
            self.pending.push(false);
            index as EntityIndex
        };

        let slot = index as usize;
        self.masks[slot].clear();
        self.occupied[slot] = true;
        self.pending[slot] = true;
        Entity::new(index, self.versions[slot])
    }

    /// Reclaims a slot: bumps its version, clears its mask and queues the
    /// index for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the index was never allocated.
    pub fn release(&mut self, index: EntityIndex) {
        let slot = index as usize;
        assert!(slot < self.versions.len(), "released unknown entity index {index}");
        self.versions[slot] = self.versions[slot].wrapping_add(1);
        self.masks[slot].clear();
        self.occupied[slot] = false;
        self.pending[slot] = false;
        self.free.push_back(index);
    }

    /// Checks whether `entity` refers to the current occupant of its slot.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index() as usize;
        self.versions
            .get(slot)
            .is_some_and(|&version| version == entity.version() && self.occupied[slot])
    }

    /// Checks whether slot `index` is held by an entity.
    #[inline]
    #[must_use]
    pub fn is_occupied(&self, index: usize) -> bool {
        self.occupied.get(index).copied().unwrap_or(false)
    }

    /// Marks a pending slot as visible to iteration.
    #[inline]
    pub fn activate(&mut self, index: EntityIndex) {
        if let Some(pending) = self.pending.get_mut(index as usize) {
            *pending = false;
        }
    }

    /// Checks whether the slot was created since the last flush.
    #[inline]
    #[must_use]
    pub fn is_pending(&self, index: usize) -> bool {
        self.pending[index]
    }

    /// Returns the handle of the current occupant of `index`.
    #[inline]
    #[must_use]
    pub fn entity_at(&self, index: usize) -> Entity {
        Entity::new(index as EntityIndex, self.versions[index])
    }

    /// Returns the component mask of slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if the index was never allocated.
    #[inline]
    #[must_use]
    pub fn mask(&self, index: usize) -> ComponentMask {
        self.masks[index]
    }

    /// Returns the component mask of slot `index` for modification.
    ///
    /// # Panics
    ///
    /// Panics if the index was never allocated.
    #[inline]
    pub fn mask_mut(&mut self, index: usize) -> &mut ComponentMask {
        &mut self.masks[index]
    }
}

impl Default for EntityTable {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MIN_FREE_INDICES, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_roundtrip() {
        let e = Entity::new(12345, 67);
        assert_eq!(e.index(), 12345);
        assert_eq!(e.version(), 67);
        assert_eq!(e.to_string(), "entity_12345_v67");
    }

    #[test]
    fn test_equality_includes_version() {
        assert_ne!(Entity::new(3, 0), Entity::new(3, 1));
        assert_eq!(Entity::new(3, 1), Entity::new(3, 1));
        assert!(Entity::new(2, 9) < Entity::new(3, 0));
        assert!(Entity::new(3, 0) < Entity::new(3, 1));
    }

    #[test]
    fn test_appends_until_threshold_exceeded() {
        let mut table = EntityTable::new(2, 0);
        let a = table.allocate();
        let b = table.allocate();
        let c = table.allocate();
        table.release(a.index());
        table.release(b.index());

        // Two free indices do not exceed a threshold of two
        let d = table.allocate();
        assert_eq!(d.index(), 3);

        table.release(c.index());
        // Three free indices exceed it: the oldest is reused
        let e = table.allocate();
        assert_eq!(e.index(), a.index());
        assert_eq!(e.version(), 1);
        assert!(!table.is_alive(a));
        assert!(table.is_alive(e));
    }

    #[test]
    fn test_release_clears_mask_and_pending() {
        let mut table = EntityTable::new(0, 4);
        let e = table.allocate();
        assert!(table.is_pending(0));
        table.mask_mut(0).insert(crate::ecs::ComponentRegistry::new().register::<u8>());
        table.release(e.index());
        assert!(table.mask(0).is_empty());
        assert!(!table.is_pending(0));
        assert!(!table.is_occupied(0));
        assert!(!table.is_alive(table.entity_at(0)));
        assert_eq!(table.alive_count(), 0);
        assert_eq!(table.free_count(), 1);
    }

    #[test]
    fn test_version_wraps_after_256_reuses() {
        let mut table = EntityTable::new(0, 1);
        let first = table.allocate();
        table.release(first.index());
        for _ in 0..255 {
            let e = table.allocate();
            assert_eq!(e.index(), first.index());
            table.release(e.index());
        }
        // Known and accepted: the version has wrapped back to the first one
        let reused = table.allocate();
        assert_eq!(reused, first);
        assert_eq!(table.len(), 1);
    }
}

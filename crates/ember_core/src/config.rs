//! # World Configuration
//!
//! Tunables of the ECS core. Loaded once at startup, usually as the
//! `[world]` table of the engine configuration file.

use serde::{Deserialize, Serialize};

/// Default number of freed indices kept in reserve before one is reused.
pub const DEFAULT_MIN_FREE_INDICES: usize = 256;

/// Configuration for a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Freed entity indices are only reused once more than this many are
    /// queued. Lets stale handles age out before a slot's version can wrap.
    pub min_free_indices: usize,
    /// Entity slots to reserve up front.
    pub initial_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min_free_indices: DEFAULT_MIN_FREE_INDICES,
            initial_capacity: 0,
        }
    }
}

impl WorldConfig {
    /// Configuration that reuses a freed index as soon as one is available.
    ///
    /// Handy in tests that need to observe slot reuse.
    #[must_use]
    pub fn eager_reuse() -> Self {
        Self {
            min_free_indices: 0,
            ..Self::default()
        }
    }
}

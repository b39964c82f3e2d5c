//! # Transform System
//!
//! Rebuilds the cached matrix of every transform changed since the last
//! frame.

use ember_animation::Transform;
use ember_core::{System, SystemState, World};

/// Keeps [`Transform::matrix`] in sync with position, rotation and scale.
pub struct TransformSystem {
    state: SystemState,
}

impl TransformSystem {
    /// Creates the system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SystemState::new().require::<Transform>(),
        }
    }

    /// Rebuilds dirty matrices. Returns how many were rebuilt.
    pub fn update(&mut self, world: &mut World) -> usize {
        let mut rebuilt = 0;
        world.for_each(|_, transform: &mut Transform| {
            if transform.dirty {
                transform.update_matrix();
                rebuilt += 1;
            }
        });
        rebuilt
    }
}

impl Default for TransformSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for TransformSystem {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }
}

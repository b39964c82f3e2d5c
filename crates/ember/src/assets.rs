//! # Geometry Library
//!
//! Name-keyed store of loaded geometry. Loader threads insert finished
//! assets while the frame loop reads them; entities hold `Arc` clones, so
//! removing an asset never invalidates a model already using it.

use std::collections::HashMap;
use std::sync::Arc;

use ember_animation::{AnimationClip, Geometry, Mat3x4};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Thread-safe map from asset name to shared geometry.
#[derive(Debug, Default)]
pub struct GeometryLibrary {
    geometries: RwLock<HashMap<String, Arc<Geometry>>>,
}

impl GeometryLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `geometry` under its own name, replacing any previous entry.
    ///
    /// Returns the shared handle.
    pub fn insert(&self, geometry: Geometry) -> Arc<Geometry> {
        let geometry = Arc::new(geometry);
        let name = geometry.name().to_owned();
        let replaced = self
            .geometries
            .write()
            .insert(name.clone(), Arc::clone(&geometry));
        debug!(%name, bones = geometry.bone_count(), replaced = replaced.is_some(), "stored geometry");
        geometry
    }

    /// Validates and stores a skinned geometry.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Asset`] if the skeleton or clips are malformed.
    pub fn load_skinned(
        &self,
        name: &str,
        bone_parents: Vec<i32>,
        clips: Vec<AnimationClip>,
        frames: Vec<Mat3x4>,
    ) -> EngineResult<Arc<Geometry>> {
        let geometry = Geometry::skinned(name, bone_parents, clips, frames)?;
        Ok(self.insert(geometry))
    }

    /// Returns the geometry called `name`, if loaded.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Geometry>> {
        self.geometries.read().get(name).cloned()
    }

    /// Returns the geometry called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownGeometry`] if it is not loaded.
    pub fn require(&self, name: &str) -> EngineResult<Arc<Geometry>> {
        self.get(name)
            .ok_or_else(|| EngineError::UnknownGeometry(name.to_owned()))
    }

    /// Drops the library's handle to `name`.
    pub fn remove(&self, name: &str) -> Option<Arc<Geometry>> {
        self.geometries.write().remove(name)
    }

    /// Number of loaded geometries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.geometries.read().len()
    }

    /// Checks whether nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometries.read().is_empty()
    }

    /// Names of the loaded geometries, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.geometries.read().keys().cloned().collect();
        names.sort();
        names
    }
}

//! Scene serialization
//!
//! A [`Scene`] is the instance store: the cage it plays in, the spawned
//! instances and the current selection. It is loaded from and saved to RON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use cagebox_math::Vec3;

use crate::cage::CageDimensions;
use crate::instance::{InstanceId, Object3DInstance};

/// A serializable sandbox scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name (for display/debugging)
    pub name: String,
    #[serde(default)]
    pub cage: CageDimensions,
    #[serde(default)]
    pub instances: Vec<Object3DInstance>,
    /// Selected instance, if any
    #[serde(default)]
    pub selected: Option<InstanceId>,
}

impl Scene {
    /// Create a new empty scene with the default cage
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cage: CageDimensions::default(),
            instances: Vec::new(),
            selected: None,
        }
    }

    pub fn with_cage(mut self, cage: CageDimensions) -> Self {
        self.cage = cage;
        self
    }

    /// Load a scene from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneLoadError> {
        let contents = fs::read_to_string(path)?;
        let scene = ron::from_str(&contents)?;
        Ok(scene)
    }

    /// Save a scene to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneSaveError> {
        let pretty = ron::ser::PrettyConfig::new()
            .struct_names(true)
            .enumerate_arrays(false);
        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Add an instance. An instance whose id is already present replaces
    /// the old one.
    pub fn add_instance(&mut self, instance: Object3DInstance) {
        if !self.is_position_within_bounds(instance.position) {
            log::warn!("Instance {} spawned outside the cage at {:?}", instance.id, instance.position);
        }
        match self.instances.iter_mut().find(|i| i.id == instance.id) {
            Some(existing) => *existing = instance,
            None => self.instances.push(instance),
        }
    }

    /// Remove an instance, clearing the selection if it pointed at it
    pub fn remove_instance(&mut self, id: &InstanceId) -> Option<Object3DInstance> {
        let index = self.instances.iter().position(|i| &i.id == id)?;
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        Some(self.instances.remove(index))
    }

    /// Remove every instance and the selection
    pub fn clear(&mut self) {
        self.instances.clear();
        self.selected = None;
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&Object3DInstance> {
        self.instances.iter().find(|i| &i.id == id)
    }

    /// Select an instance, or clear the selection with `None`
    ///
    /// Returns false and leaves the selection alone for unknown ids.
    pub fn select(&mut self, id: Option<InstanceId>) -> bool {
        match id {
            Some(id) if self.instance(&id).is_none() => {
                log::debug!("Ignoring selection of unknown instance {}", id);
                false
            }
            id => {
                self.selected = id;
                true
            }
        }
    }

    /// Whether a spawn position lies inside the cage walls
    pub fn is_position_within_bounds(&self, position: Vec3) -> bool {
        self.cage.contains_xz(position)
    }
}

/// Error loading a scene
#[derive(Debug)]
pub enum SceneLoadError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid RON syntax)
    Parse(ron::error::SpannedError),
}

impl From<io::Error> for SceneLoadError {
    fn from(e: io::Error) -> Self {
        SceneLoadError::Io(e)
    }
}

impl From<ron::error::SpannedError> for SceneLoadError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneLoadError::Parse(e)
    }
}

impl std::fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneLoadError::Io(e) => write!(f, "IO error: {}", e),
            SceneLoadError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for SceneLoadError {}

/// Error saving a scene
#[derive(Debug)]
pub enum SceneSaveError {
    Io(io::Error),
    Serialize(ron::Error),
}

impl From<io::Error> for SceneSaveError {
    fn from(e: io::Error) -> Self {
        SceneSaveError::Io(e)
    }
}

impl From<ron::Error> for SceneSaveError {
    fn from(e: ron::Error) -> Self {
        SceneSaveError::Serialize(e)
    }
}

impl std::fmt::Display for SceneSaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneSaveError::Io(e) => write!(f, "IO error: {}", e),
            SceneSaveError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for SceneSaveError {}

//! Consumer side of scene publication

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::assets::AssetResolver;
use crate::ecs::{Scene, SceneId};
use crate::runtime::{Locked, RuntimeLock, RuntimeState};
use crate::scene::{PublicationSnapshot, PublicationStats, SceneSet, SceneSimulation};
use crate::serialization::{FieldTree, LoadReport, SceneSerializer, SerializationError};

/// Scene management errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// No scene with this id is loaded
    #[error("scene {0} is not loaded")]
    NotLoaded(SceneId),

    /// Published scenes can only change while the simulation is inactive
    #[error("published scenes cannot change while the simulation is {0}")]
    SimulationActive(RuntimeState),

    /// A scene with this id is already loaded
    #[error("scene {0} is already loaded")]
    AlreadyLoaded(SceneId),

    /// Scene file or tree could not be (de)serialized
    #[error("scene serialization failed: {0}")]
    Serialization(#[from] SerializationError),
}

/// Loads, unloads and reads the published scenes.
///
/// Anything that changes the published set is rejected with
/// [`SceneError::SimulationActive`] unless the runtime is inactive. The
/// check happens under the same lock that guards the runtime state.
pub struct SceneSystem {
    lock: Arc<RuntimeLock<SceneSet>>,
    serializer: SceneSerializer,
    stats: Arc<PublicationStats>,
}

impl SceneSystem {
    /// Create a scene system and the simulation delegate that publishes
    /// into it
    pub fn with_simulation(serializer: SceneSerializer) -> (Self, SceneSimulation) {
        let lock = Arc::new(RuntimeLock::new(SceneSet::new()));
        let stats = Arc::new(PublicationStats::new());
        let simulation = SceneSimulation::new(Arc::clone(&stats));
        let system = Self {
            lock,
            serializer,
            stats,
        };
        (system, simulation)
    }

    /// Lock shared with the runtime driver
    pub fn lock(&self) -> &Arc<RuntimeLock<SceneSet>> {
        &self.lock
    }

    /// Serializer used for scene files
    pub fn serializer(&self) -> &SceneSerializer {
        &self.serializer
    }

    /// Current runtime state
    pub fn state(&self) -> RuntimeState {
        self.lock.state()
    }

    /// Publication counters
    pub fn stats(&self) -> PublicationSnapshot {
        self.stats.snapshot()
    }

    // Loading

    /// Publish a scene
    pub fn load_scene(&self, scene: Scene) -> Result<SceneId, SceneError> {
        let id = scene.id();
        let name = scene.name().to_string();
        let entities = scene.entity_count();

        let mut guard = self.lock_inactive()?;
        if !guard.data.insert(Arc::new(scene)) {
            log::warn!("Scene {} is already loaded", id);
            return Err(SceneError::AlreadyLoaded(id));
        }
        log::info!("Loaded scene '{}' ({}) with {} entities", name, id, entities);
        Ok(id)
    }

    /// Decode and publish a scene tree
    pub fn load_scene_tree(
        &self,
        tree: &FieldTree,
        resolver: &dyn AssetResolver,
    ) -> Result<(SceneId, LoadReport), SceneError> {
        self.ensure_inactive()?;
        let (scene, report) = self.serializer.deserialize(tree, resolver)?;
        Ok((self.load_scene(scene)?, report))
    }

    /// Read and publish a RON scene file
    pub fn load_scene_file(
        &self,
        path: impl AsRef<Path>,
        resolver: &dyn AssetResolver,
    ) -> Result<(SceneId, LoadReport), SceneError> {
        self.ensure_inactive()?;
        let (scene, report) = self.serializer.load_from_file(path, resolver)?;
        Ok((self.load_scene(scene)?, report))
    }

    /// Write the published copy of a scene to a RON file.
    /// Allowed in any state; the snapshot is taken under the lock and
    /// written after releasing it.
    pub fn save_scene_file(&self, id: SceneId, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let scene = self.scene(id).ok_or(SceneError::NotLoaded(id))?;
        self.serializer.save_to_file(&scene, path)?;
        Ok(())
    }

    /// Remove a published scene
    pub fn unload_scene(&self, id: SceneId) -> Result<Arc<Scene>, SceneError> {
        let mut guard = self.lock_inactive()?;
        let scene = guard.data.remove(id).ok_or_else(|| {
            log::warn!("Cannot unload scene {}: not loaded", id);
            SceneError::NotLoaded(id)
        })?;
        log::info!("Unloaded scene '{}' ({})", scene.name(), id);
        Ok(scene)
    }

    /// Remove every published scene, returning how many there were
    pub fn unload_all(&self) -> Result<usize, SceneError> {
        let mut guard = self.lock_inactive()?;
        let count = guard.data.len();
        guard.data.clear();
        log::info!("Unloaded all scenes ({})", count);
        Ok(count)
    }

    // Access

    /// Edit a published scene in place
    pub fn edit_scene<R>(&self, id: SceneId, edit: impl FnOnce(&mut Scene) -> R) -> Result<R, SceneError> {
        let mut guard = self.lock_inactive()?;
        let scene = guard.data.get_mut(id).ok_or(SceneError::NotLoaded(id))?;
        Ok(edit(scene))
    }

    /// Shared handle to the published copy of a scene.
    ///
    /// The handle stays valid and unchanged after later publications.
    pub fn scene(&self, id: SceneId) -> Option<Arc<Scene>> {
        let scene = self.lock.lock().data.get(id).cloned();
        if scene.is_none() {
            log::warn!("Scene {} is not loaded", id);
        }
        scene
    }

    /// Consistent copy of every published scene, in load order
    pub fn snapshot(&self) -> SceneSet {
        self.lock.lock().data.clone()
    }

    /// Run `read` with the published scenes while holding the lock.
    /// The simulation skips publishing while the lock is held.
    pub fn with_published<R>(&self, read: impl FnOnce(&SceneSet) -> R) -> R {
        read(&self.lock.lock().data)
    }

    /// Resolve world matrices of every published scene.
    ///
    /// While the simulation runs it resolves its own scenes each tick, so
    /// this does nothing and returns false.
    pub fn apply_transform_hierarchy(&self) -> bool {
        let Ok(mut guard) = self.lock_inactive() else {
            return false;
        };
        for scene in guard.data.iter_mut() {
            scene.propagate_transforms();
        }
        true
    }

    fn lock_inactive(&self) -> Result<parking_lot::MutexGuard<'_, Locked<SceneSet>>, SceneError> {
        let guard = self.lock.lock();
        match guard.state() {
            RuntimeState::Inactive => Ok(guard),
            state => {
                log::warn!("Rejected scene change while simulation is {}", state);
                Err(SceneError::SimulationActive(state))
            }
        }
    }

    fn ensure_inactive(&self) -> Result<(), SceneError> {
        self.lock_inactive().map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetCatalog;
    use crate::ecs::components::{TagComponent, TransformComponent, TransformMatrixComponent};
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn system() -> SceneSystem {
        SceneSystem::with_simulation(SceneSerializer::default()).0
    }

    #[test]
    fn test_load_and_unload() {
        let scenes = system();
        let id = scenes.load_scene(Scene::new("level")).unwrap();
        assert!(scenes.scene(id).is_some());
        assert!(matches!(scenes.load_scene(Scene::with_id(id, "dup")), Err(SceneError::AlreadyLoaded(_))));

        assert_eq!(scenes.unload_scene(id).unwrap().name(), "level");
        assert!(scenes.scene(id).is_none());
        assert!(matches!(scenes.unload_scene(id), Err(SceneError::NotLoaded(_))));
    }

    #[test]
    fn test_unload_all() {
        let scenes = system();
        scenes.load_scene(Scene::new("a")).unwrap();
        scenes.load_scene(Scene::new("b")).unwrap();
        assert_eq!(scenes.unload_all().unwrap(), 2);
        assert!(scenes.snapshot().is_empty());
    }

    #[test]
    fn test_edits_do_not_touch_handed_out_snapshots() {
        let scenes = system();
        let mut scene = Scene::new("level");
        let entity = scene.create_entity("Ship");
        let id = scenes.load_scene(scene).unwrap();

        let before = scenes.scene(id).unwrap();
        scenes
            .edit_scene(id, |scene| scene.get_mut::<TagComponent>(entity).name = "Renamed".into())
            .unwrap();

        assert_eq!(before.get::<TagComponent>(entity).name, "Ship");
        assert_eq!(scenes.scene(id).unwrap().get::<TagComponent>(entity).name, "Renamed");
    }

    #[test]
    fn test_apply_transform_hierarchy() {
        let scenes = system();
        let mut scene = Scene::new("level");
        let parent = scene.create_entity("Parent");
        let child = scene.create_entity("Child");
        scene.get_mut::<TransformComponent>(parent).position = Vec3::new(0.0, 5.0, 0.0);
        scene.parent(child, parent).unwrap();
        scene.get_mut::<TransformComponent>(child).position = Vec3::new(1.0, 0.0, 0.0);
        let id = scenes.load_scene(scene).unwrap();

        assert!(scenes.apply_transform_hierarchy());
        let published = scenes.scene(id).unwrap();
        assert_relative_eq!(
            published.get::<TransformMatrixComponent>(child).translation(),
            Vec3::new(1.0, 5.0, 0.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_scene_file_roundtrip() {
        let scenes = system();
        let mut scene = Scene::new("saved");
        scene.create_entity("A");
        let id = scenes.load_scene(scene).unwrap();

        let path = std::env::temp_dir().join(format!("scene_system_{}.ron", uuid::Uuid::new_v4()));
        scenes.save_scene_file(id, &path).unwrap();
        scenes.unload_scene(id).unwrap();

        let (loaded, report) = scenes.load_scene_file(&path, &AssetCatalog::new()).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, id);
        assert!(report.is_clean());
        assert_eq!(scenes.scene(id).unwrap().entity_count(), 1);
    }

    #[test]
    fn test_missing_scene_lookups() {
        let scenes = system();
        let stranger = SceneId::generate();
        assert!(scenes.scene(stranger).is_none());
        assert!(matches!(scenes.edit_scene(stranger, |_| ()), Err(SceneError::NotLoaded(_))));
        assert!(matches!(
            scenes.save_scene_file(stranger, std::env::temp_dir().join("never.ron")),
            Err(SceneError::NotLoaded(_))
        ));
    }
}

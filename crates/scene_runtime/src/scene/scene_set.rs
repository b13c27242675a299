//! Ordered set of shared scenes

use std::sync::Arc;

use crate::ecs::{Scene, SceneId};

/// Scenes in load order, unique by id.
///
/// Scenes are held in `Arc`s and copied on write, so cloning a set is cheap
/// and a clone never observes later mutations of the original. Sets hold a
/// handful of scenes, so lookups scan.
#[derive(Debug, Clone, Default)]
pub struct SceneSet {
    scenes: Vec<Arc<Scene>>,
}

impl SceneSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scene. Returns false, leaving the set unchanged, if its id is
    /// already present.
    pub fn insert(&mut self, scene: Arc<Scene>) -> bool {
        if self.contains(scene.id()) {
            return false;
        }
        self.scenes.push(scene);
        true
    }

    /// Remove a scene
    pub fn remove(&mut self, id: SceneId) -> Option<Arc<Scene>> {
        let index = self.position(id)?;
        Some(self.scenes.remove(index))
    }

    /// Shared handle to a scene
    pub fn get(&self, id: SceneId) -> Option<&Arc<Scene>> {
        self.scenes.iter().find(|scene| scene.id() == id)
    }

    /// Mutable access to a scene, detaching it from other sets sharing it
    pub fn get_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        let index = self.position(id)?;
        Some(Arc::make_mut(&mut self.scenes[index]))
    }

    /// Whether a scene is present
    pub fn contains(&self, id: SceneId) -> bool {
        self.position(id).is_some()
    }

    /// Scene ids in load order
    pub fn ids(&self) -> Vec<SceneId> {
        self.scenes.iter().map(|scene| scene.id()).collect()
    }

    /// Scenes in load order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Scene>> {
        self.scenes.iter()
    }

    /// Mutable access to every scene in load order, detaching each from
    /// other sets
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Scene> {
        self.scenes.iter_mut().map(Arc::make_mut)
    }

    /// Number of scenes
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Remove every scene
    pub fn clear(&mut self) {
        self.scenes.clear();
    }

    fn position(&self, id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|scene| scene.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::TagComponent;

    #[test]
    fn test_load_order_is_kept() {
        let mut set = SceneSet::new();
        let a = Arc::new(Scene::new("a"));
        let b = Arc::new(Scene::new("b"));
        assert!(set.insert(Arc::clone(&b)));
        assert!(set.insert(Arc::clone(&a)));
        assert!(!set.insert(Arc::clone(&a)));

        assert_eq!(set.ids(), vec![b.id(), a.id()]);
        assert!(set.remove(b.id()).is_some());
        assert_eq!(set.ids(), vec![a.id()]);
        assert!(set.remove(b.id()).is_none());
    }

    #[test]
    fn test_clone_is_copy_on_write() {
        let mut scene = Scene::new("cow");
        let entity = scene.create_entity("before");
        let id = scene.id();

        let mut original = SceneSet::new();
        original.insert(Arc::new(scene));
        let snapshot = original.clone();
        assert!(Arc::ptr_eq(original.get(id).unwrap(), snapshot.get(id).unwrap()));

        original.get_mut(id).unwrap().get_mut::<TagComponent>(entity).name = "after".into();
        assert_eq!(snapshot.get(id).unwrap().get::<TagComponent>(entity).name, "before");
        assert_eq!(original.get(id).unwrap().get::<TagComponent>(entity).name, "after");
    }

    #[test]
    fn test_iter_mut_follows_load_order() {
        let mut set = SceneSet::new();
        let names = ["first", "second", "third", "fourth", "fifth"];
        for name in names {
            set.insert(Arc::new(Scene::new(name)));
        }
        let second = set.ids()[1];
        set.remove(second);

        let visited: Vec<String> = set.iter_mut().map(|scene| scene.name().to_string()).collect();
        assert_eq!(visited, vec!["first", "third", "fourth", "fifth"]);
    }
}

//! Multi-component views
//!
//! A [`View`] iterates the entities that hold every component in a tuple of
//! types. Iteration walks the smallest participating storage and looks up the
//! others, so cost is proportional to the rarest component.

use std::marker::PhantomData;

use crate::ecs::{Component, EntityId, Scene};

/// A tuple of component types that can be viewed together
pub trait ViewQuery {
    /// Borrowed components yielded per entity
    type Item<'a>;

    /// Entities of the smallest participating storage, or `None` if any
    /// type has no storage at all
    fn candidates(scene: &Scene) -> Option<&[EntityId]>;

    /// Borrow every component of `entity`, or `None` if one is missing
    fn fetch(scene: &Scene, entity: EntityId) -> Option<Self::Item<'_>>;
}

macro_rules! impl_view_query {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ViewQuery for ($($name,)+) {
            type Item<'a> = ($(&'a $name,)+);

            fn candidates(scene: &Scene) -> Option<&[EntityId]> {
                let mut smallest: Option<&[EntityId]> = None;
                $(
                    let entities = scene.storage::<$name>()?.entities();
                    if smallest.map_or(true, |current| entities.len() < current.len()) {
                        smallest = Some(entities);
                    }
                )+
                smallest
            }

            fn fetch(scene: &Scene, entity: EntityId) -> Option<Self::Item<'_>> {
                Some(($(scene.storage::<$name>()?.get(entity)?,)+))
            }
        }
    };
}

impl_view_query!(A);
impl_view_query!(A, B);
impl_view_query!(A, B, C);
impl_view_query!(A, B, C, D);

/// Lazy, restartable view over a scene
pub struct View<'a, Q: ViewQuery> {
    scene: &'a Scene,
    _marker: PhantomData<fn() -> Q>,
}

impl<'a, Q: ViewQuery> View<'a, Q> {
    pub(crate) fn new(scene: &'a Scene) -> Self {
        Self {
            scene,
            _marker: PhantomData,
        }
    }

    /// Start a fresh pass over the view
    pub fn iter(&self) -> ViewIter<'a, Q> {
        let candidates = Q::candidates(self.scene).unwrap_or(&[]);
        ViewIter {
            scene: self.scene,
            candidates: candidates.iter(),
            _marker: PhantomData,
        }
    }

    /// Matching entities, in iteration order
    pub fn entities(&self) -> Vec<EntityId> {
        self.iter().map(|(entity, _)| entity).collect()
    }

    /// Number of matching entities
    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

impl<'a, Q: ViewQuery> IntoIterator for &View<'a, Q> {
    type Item = (EntityId, Q::Item<'a>);
    type IntoIter = ViewIter<'a, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator produced by [`View::iter`]
pub struct ViewIter<'a, Q: ViewQuery> {
    scene: &'a Scene,
    candidates: std::slice::Iter<'a, EntityId>,
    _marker: PhantomData<fn() -> Q>,
}

impl<'a, Q: ViewQuery> Iterator for ViewIter<'a, Q> {
    type Item = (EntityId, Q::Item<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entity = *self.candidates.next()?;
            if let Some(item) = Q::fetch(self.scene, entity) {
                return Some((entity, item));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.candidates.len()))
    }
}

//! Property tests for hierarchy invariants

use std::collections::HashSet;

use crate::ecs::components::{HierarchyComponent, TransformComponent};
use crate::ecs::{EntityId, Scene};
use crate::foundation::math::Vec3;
use approx::relative_eq;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum HierOp {
    Parent(usize, usize),
    Unparent(usize),
}

fn arb_transform() -> impl Strategy<Value = TransformComponent> {
    (
        (-5.0f32..5.0, -5.0f32..5.0, -5.0f32..5.0),
        (-3.0f32..3.0, -1.5f32..1.5, -3.0f32..3.0),
        0.8f32..1.25,
    )
        .prop_map(|((x, y, z), (roll, pitch, yaw), scale)| {
            TransformComponent::from_position(Vec3::new(x, y, z))
                .with_rotation_euler(roll, pitch, yaw)
                .with_uniform_scale(scale)
        })
}

fn arb_ops(max_ops: usize) -> impl Strategy<Value = Vec<HierOp>> {
    proptest::collection::vec(
        prop_oneof![
            3 => (0..8usize, 0..8usize).prop_map(|(child, parent)| HierOp::Parent(child, parent)),
            1 => (0..8usize).prop_map(HierOp::Unparent),
        ],
        1..=max_ops,
    )
}

fn build_scene(transforms: &[TransformComponent]) -> (Scene, Vec<EntityId>) {
    let mut scene = Scene::new("property");
    let ids = transforms
        .iter()
        .enumerate()
        .map(|(i, transform)| {
            let id = scene.create_entity(format!("E{i}"));
            *scene.get_mut::<TransformComponent>(id) = transform.clone();
            id
        })
        .collect();
    (scene, ids)
}

/// Every entity reachable from the roots exactly once
fn reached_once(scene: &Scene) -> bool {
    let mut seen = HashSet::new();
    let mut pending = scene.gather_roots();
    while let Some(entity) = pending.pop() {
        if !seen.insert(entity) {
            return false;
        }
        pending.extend(scene.gather_children(entity));
    }
    seen.len() == scene.entity_count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Accepted operations keep every entity reachable once; rejected ones change nothing
    #[test]
    fn prop_reachability_holds(
        transforms in proptest::collection::vec(arb_transform(), 8),
        ops in arb_ops(40),
    ) {
        let (mut scene, ids) = build_scene(&transforms);

        for op in ops {
            match op {
                HierOp::Parent(child, parent) => {
                    let (child, parent) = (ids[child], ids[parent]);
                    let legal = scene.parent_of(child).is_none() && !scene.descends_from(parent, child);
                    let before = scene.clone();
                    let result = scene.parent(child, parent);
                    prop_assert_eq!(result.is_ok(), legal);
                    if !legal {
                        for id in &ids {
                            prop_assert_eq!(
                                before.get::<HierarchyComponent>(*id),
                                scene.get::<HierarchyComponent>(*id)
                            );
                        }
                    }
                }
                HierOp::Unparent(child) => {
                    prop_assert!(scene.unparent(ids[child]).is_ok());
                }
            }
            prop_assert!(reached_once(&scene));
            prop_assert_eq!(scene.validate_hierarchy(), Ok(()));
        }
    }

    /// World transforms survive parent and unparent
    #[test]
    fn prop_world_transform_preserved(
        transforms in proptest::collection::vec(arb_transform(), 8),
        ops in arb_ops(30),
    ) {
        let (mut scene, ids) = build_scene(&transforms);

        for op in ops {
            let child = match op {
                HierOp::Parent(child, _) | HierOp::Unparent(child) => ids[child],
            };
            let before = scene.world_transform(child);
            match op {
                HierOp::Parent(_, parent) => {
                    let _ = scene.parent(child, ids[parent]);
                }
                HierOp::Unparent(_) => {
                    scene.unparent(child).unwrap();
                }
            }
            let after = scene.world_transform(child);
            prop_assert!(
                relative_eq!(after, before, epsilon = 1e-3, max_relative = 1e-3),
                "world transform of {} drifted:\n{}\n{}", child, before, after
            );
        }
    }

    /// Unparenting an unparented entity never changes anything
    #[test]
    fn prop_unparent_idempotent(
        transforms in proptest::collection::vec(arb_transform(), 8),
        ops in arb_ops(20),
        target in 0..8usize,
    ) {
        let (mut scene, ids) = build_scene(&transforms);
        for op in ops {
            match op {
                HierOp::Parent(child, parent) => { let _ = scene.parent(ids[child], ids[parent]); }
                HierOp::Unparent(child) => { scene.unparent(ids[child]).unwrap(); }
            }
        }

        scene.unparent(ids[target]).unwrap();
        let transform = scene.get::<TransformComponent>(ids[target]).clone();
        let links = *scene.get::<HierarchyComponent>(ids[target]);

        scene.unparent(ids[target]).unwrap();
        prop_assert_eq!(scene.get::<TransformComponent>(ids[target]), &transform);
        prop_assert_eq!(scene.get::<HierarchyComponent>(ids[target]), &links);
    }
}

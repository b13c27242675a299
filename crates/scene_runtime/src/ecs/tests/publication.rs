//! Concurrent stepping against consumer reads

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use crate::core::config::RuntimeConfig;
use crate::ecs::components::HierarchyComponent;
use crate::ecs::{EntityId, Scene, System};
use crate::runtime::{CoreRuntime, RuntimeState};
use crate::scene::{SceneSet, SceneSystem};
use crate::serialization::SceneSerializer;

/// Moves one entity to a new parent every tick
struct Shuffler {
    entities: Vec<EntityId>,
    tick: usize,
}

impl System for Shuffler {
    fn run(&mut self, scene: &mut Scene, _delta_time: f32) {
        self.tick += 1;
        let count = self.entities.len();
        let child = self.entities[1 + self.tick % (count - 1)];
        let target = self.entities[(self.tick * 7) % count];

        scene.unparent(child).unwrap();
        if scene.parent(child, target).is_err() {
            scene.parent(child, self.entities[0]).unwrap();
        }
    }
}

fn assert_consistent(set: &SceneSet) {
    for scene in set.iter() {
        for (entity, links) in scene.query::<HierarchyComponent>() {
            assert_eq!(
                links.first_child.is_null(),
                links.last_child.is_null(),
                "{entity} has a torn child list"
            );
        }
        assert_eq!(scene.validate_hierarchy(), Ok(()));
    }
}

#[test]
fn test_readers_never_observe_torn_hierarchy() {
    let mut scene = Scene::new("shuffle");
    let entities: Vec<_> = (0..12).map(|i| scene.create_entity(format!("N{i}"))).collect();
    for child in &entities[1..] {
        scene.parent(*child, entities[0]).unwrap();
    }

    let (scenes, mut simulation) = SceneSystem::with_simulation(SceneSerializer::default());
    simulation.add_system(Shuffler { entities, tick: 0 });
    scenes.load_scene(scene).unwrap();

    let mut runtime = CoreRuntime::new(simulation, Arc::clone(scenes.lock()), RuntimeConfig::new());
    let scenes = Arc::new(scenes);
    let done = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(3));

    let readers: Vec<_> = (0..2)
        .map(|reader| {
            let scenes = Arc::clone(&scenes);
            let done = Arc::clone(&done);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                let mut reads = 0u64;
                while !done.load(Ordering::Acquire) {
                    if reader == 0 {
                        scenes.with_published(assert_consistent);
                    } else {
                        assert_consistent(&scenes.snapshot());
                    }
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    runtime.run().unwrap();
    barrier.wait();
    std::thread::sleep(Duration::from_millis(200));
    runtime.pause();
    std::thread::sleep(Duration::from_millis(10));
    runtime.resume();
    std::thread::sleep(Duration::from_millis(50));
    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.join().expect("reader panicked") > 0);
    }
    runtime.stop().unwrap();
    assert_eq!(runtime.state(), RuntimeState::Inactive);

    let stats = scenes.stats();
    assert!(stats.ticks > 0);
    assert!(stats.published > 0);
    assert_eq!(stats.ticks, stats.published + stats.skipped);
    assert_consistent(&scenes.snapshot());
}

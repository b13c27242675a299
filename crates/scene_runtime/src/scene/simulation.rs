//! Simulation side of scene publication

use std::sync::Arc;

use crate::ecs::System;
use crate::runtime::{RuntimeDelegate, RuntimeLock};
use crate::scene::{PublicationStats, SceneSet};

/// Runtime delegate that steps a private copy of the published scenes and
/// republishes it every tick.
///
/// `simulation` and `backup` are only touched by the simulation thread.
/// Publication uses `try_lock`: if a consumer holds the lock the tick skips
/// publishing and the previous snapshot stays visible.
pub struct SceneSimulation {
    simulation: SceneSet,
    backup: SceneSet,
    systems: Vec<Box<dyn System>>,
    stats: Arc<PublicationStats>,
}

impl SceneSimulation {
    pub(crate) fn new(stats: Arc<PublicationStats>) -> Self {
        Self {
            simulation: SceneSet::new(),
            backup: SceneSet::new(),
            systems: Vec::new(),
            stats,
        }
    }

    /// Add a system run on every simulated scene each tick
    pub fn add_system(&mut self, system: impl System + 'static) {
        log::debug!("Registered system {}", system.name());
        self.systems.push(Box::new(system));
    }

    /// Number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Publish the simulation set if the lock is free.
    /// Returns whether a new snapshot was published.
    pub fn try_copy_out(&mut self, lock: &RuntimeLock<SceneSet>) -> bool {
        let Some(mut guard) = lock.try_lock() else {
            self.stats.record_skipped();
            log::trace!("Publication skipped, scenes are locked by a reader");
            return false;
        };
        guard.data = self.simulation.clone();
        drop(guard);

        self.stats.record_published();
        true
    }
}

impl RuntimeDelegate for SceneSimulation {
    type Shared = SceneSet;

    fn on_start(&mut self, lock: &RuntimeLock<SceneSet>) {
        let guard = lock.lock();
        self.backup = guard.data.clone();
        self.simulation = guard.data.clone();
        drop(guard);

        log::info!("Simulation started with {} scenes", self.simulation.len());
    }

    fn on_stop(&mut self, lock: &RuntimeLock<SceneSet>) {
        let mut guard = lock.lock();
        self.simulation.clear();
        guard.data = std::mem::take(&mut self.backup);
        drop(guard);

        log::info!("Simulation stopped, published scenes restored");
    }

    fn on_pause(&mut self) {
        log::debug!("Simulation paused");
    }

    fn on_resume(&mut self) {
        log::debug!("Simulation resumed");
    }

    fn on_step(&mut self, lock: &RuntimeLock<SceneSet>, delta_time: f32) {
        self.stats.record_tick();
        self.try_copy_out(lock);

        for scene in self.simulation.iter_mut() {
            for system in &mut self.systems {
                system.run(scene, delta_time);
            }
            scene.propagate_transforms();
        }
    }
}

//! Engine facade
//!
//! Wires a [`SceneSystem`] to a [`CoreRuntime`] driving its
//! [`SceneSimulation`], so callers deal with one object.

use thiserror::Error;

use crate::{
    core::config::{ConfigError, EngineConfig},
    ecs::System,
    foundation::logging,
    runtime::{CoreRuntime, RuntimeError, RuntimeState},
    scene::{PublicationSnapshot, SceneError, SceneSimulation, SceneSystem},
    serialization::{SceneSerializer, SerializationError},
};

/// Main engine struct
///
/// Consumers read and edit scenes through [`Engine::scenes`]; the simulation
/// thread is controlled with run / pause / resume / stop.
pub struct Engine {
    scenes: SceneSystem,
    runtime: CoreRuntime<SceneSimulation>,
    config: EngineConfig,
}

impl Engine {
    /// Create a new engine instance.
    ///
    /// Validates `config` and installs the logger if none is installed yet.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        if !logging::init_with_level(&config.log_level) {
            log::debug!("Logger already installed, keeping it");
        }
        log::info!("Initializing engine...");

        let serializer = SceneSerializer::default().with_config(&config.serialization);
        let (scenes, simulation) = SceneSystem::with_simulation(serializer);
        let runtime = CoreRuntime::new(simulation, scenes.lock().clone(), config.runtime.clone());

        Ok(Self {
            scenes,
            runtime,
            config,
        })
    }

    /// Scene access for consumers
    pub fn scenes(&self) -> &SceneSystem {
        &self.scenes
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current runtime state
    pub fn state(&self) -> RuntimeState {
        self.runtime.state()
    }

    /// Publication counters
    pub fn stats(&self) -> PublicationSnapshot {
        self.scenes.stats()
    }

    /// Add a simulation system. Only possible while inactive.
    pub fn add_system(&mut self, system: impl System + 'static) -> Result<(), EngineError> {
        let state = self.runtime.state();
        if state != RuntimeState::Inactive {
            return Err(SceneError::SimulationActive(state).into());
        }
        let simulation = self.runtime.delegate_mut().ok_or(RuntimeError::DelegateLost)?;
        simulation.add_system(system);
        Ok(())
    }

    /// Start simulating the published scenes
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.runtime.run()?;
        Ok(())
    }

    /// Pause the simulation
    pub fn pause(&self) {
        self.runtime.pause();
    }

    /// Resume a paused simulation
    pub fn resume(&self) {
        self.runtime.resume();
    }

    /// Stop the simulation and restore the scenes published before `run`
    pub fn stop(&mut self) -> Result<(), EngineError> {
        self.runtime.stop()?;
        Ok(())
    }

    /// Stop the simulation and unload every scene
    pub fn shutdown(&mut self) -> Result<(), EngineError> {
        log::info!("Shutting down engine...");
        self.stop()?;
        self.scenes.unload_all()?;
        Ok(())
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scene management error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Scene file error
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Simulation thread error
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

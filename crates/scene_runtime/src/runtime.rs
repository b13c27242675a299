//! Background simulation driver
//!
//! [`CoreRuntime`] owns one worker thread and the Inactive / Running / Paused
//! state machine. It knows nothing about scenes: a [`RuntimeDelegate`] is
//! called from the worker thread at each transition and once per tick.
//!
//! The runtime state lives inside the same mutex as the delegate's shared
//! data ([`RuntimeLock`]), so a consumer holding the lock sees a state and a
//! snapshot that agree with each other. The paused loop waits on a condition
//! variable paired with that mutex.

use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex, MutexGuard};
use thiserror::Error;

use crate::core::config::RuntimeConfig;
use crate::foundation::time::Timer;

/// Lifecycle state of the simulation thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeState {
    /// No thread is running
    #[default]
    Inactive,
    /// The thread is stepping
    Running,
    /// The thread is blocked until resumed or stopped
    Paused,
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inactive => "inactive",
            Self::Running => "running",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Data guarded by a [`RuntimeLock`]
#[derive(Debug)]
pub struct Locked<P> {
    state: RuntimeState,
    /// Data shared between the delegate and consumers
    pub data: P,
}

impl<P> Locked<P> {
    /// Runtime state at the time the lock was taken
    pub fn state(&self) -> RuntimeState {
        self.state
    }
}

/// Mutex over the runtime state and the delegate's shared data, plus the
/// condition variable the paused loop sleeps on
#[derive(Debug)]
pub struct RuntimeLock<P> {
    guarded: Mutex<Locked<P>>,
    wake: Condvar,
}

impl<P> RuntimeLock<P> {
    /// Create an inactive lock around `data`
    pub fn new(data: P) -> Self {
        Self {
            guarded: Mutex::new(Locked {
                state: RuntimeState::Inactive,
                data,
            }),
            wake: Condvar::new(),
        }
    }

    /// Block until the lock is acquired
    pub fn lock(&self) -> MutexGuard<'_, Locked<P>> {
        self.guarded.lock()
    }

    /// Acquire the lock only if nobody holds it
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Locked<P>>> {
        self.guarded.try_lock()
    }

    /// Current runtime state
    pub fn state(&self) -> RuntimeState {
        self.guarded.lock().state
    }

    fn transition(&self, from: &[RuntimeState], to: RuntimeState) -> Option<RuntimeState> {
        let mut guard = self.guarded.lock();
        let previous = guard.state;
        if !from.contains(&previous) {
            return None;
        }
        guard.state = to;
        self.wake.notify_all();
        Some(previous)
    }
}

/// Callbacks driven by [`CoreRuntime`], all invoked on the worker thread
pub trait RuntimeDelegate: Send + 'static {
    /// Data shared with consumers under the runtime lock
    type Shared: Send + 'static;

    /// Called once when the thread starts, before the first step
    fn on_start(&mut self, lock: &RuntimeLock<Self::Shared>);

    /// Called once when the thread observes `Inactive`, before it exits
    fn on_stop(&mut self, lock: &RuntimeLock<Self::Shared>);

    /// Called once each time the loop enters `Paused`
    fn on_pause(&mut self) {}

    /// Called when the loop leaves `Paused` for `Running`
    fn on_resume(&mut self) {}

    /// Advance by `delta_time` seconds. The lock is not held on entry.
    fn on_step(&mut self, lock: &RuntimeLock<Self::Shared>, delta_time: f32);
}

/// Runtime driver errors
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The OS refused to create the worker thread
    #[error("failed to spawn simulation thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The worker thread panicked; its delegate is gone
    #[error("simulation thread panicked")]
    ThreadPanicked,

    /// The delegate was lost to an earlier failure and the runtime cannot start
    #[error("runtime delegate was lost to an earlier failure")]
    DelegateLost,
}

/// Owner of the simulation thread
pub struct CoreRuntime<D: RuntimeDelegate> {
    lock: Arc<RuntimeLock<D::Shared>>,
    delegate: Option<D>,
    thread: Option<JoinHandle<D>>,
    config: RuntimeConfig,
}

impl<D: RuntimeDelegate> CoreRuntime<D> {
    /// Create an inactive runtime
    pub fn new(delegate: D, lock: Arc<RuntimeLock<D::Shared>>, config: RuntimeConfig) -> Self {
        Self {
            lock,
            delegate: Some(delegate),
            thread: None,
            config,
        }
    }

    /// Lock shared with consumers
    pub fn lock(&self) -> &Arc<RuntimeLock<D::Shared>> {
        &self.lock
    }

    /// Current state
    pub fn state(&self) -> RuntimeState {
        self.lock.state()
    }

    /// The delegate, while no thread owns it
    pub fn delegate(&self) -> Option<&D> {
        self.delegate.as_ref()
    }

    /// Mutable access to the delegate, while no thread owns it
    pub fn delegate_mut(&mut self) -> Option<&mut D> {
        self.delegate.as_mut()
    }

    /// Start the simulation thread. Does nothing unless `Inactive`.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let mut guard = self.lock.lock();
        if guard.state != RuntimeState::Inactive {
            return Ok(());
        }
        let Some(delegate) = self.delegate.take() else {
            return Err(RuntimeError::DelegateLost);
        };
        guard.state = RuntimeState::Running;
        drop(guard);

        let lock = Arc::clone(&self.lock);
        let config = self.config.clone();
        let spawned = std::thread::Builder::new()
            .name("scene-simulation".to_string())
            .spawn(move || simulation_loop(delegate, &lock, &config));

        match spawned {
            Ok(handle) => {
                self.thread = Some(handle);
                log::info!("Runtime: inactive -> running");
                Ok(())
            }
            Err(err) => {
                self.lock.lock().state = RuntimeState::Inactive;
                log::error!("Failed to spawn simulation thread: {}", err);
                Err(RuntimeError::Spawn(err))
            }
        }
    }

    /// Stop the simulation and wait for the thread to finish its current
    /// tick and `on_stop`. Does nothing if no thread is running.
    pub fn stop(&mut self) -> Result<(), RuntimeError> {
        if let Some(previous) = self
            .lock
            .transition(&[RuntimeState::Running, RuntimeState::Paused], RuntimeState::Inactive)
        {
            log::info!("Runtime: {} -> inactive", previous);
        }

        let Some(handle) = self.thread.take() else {
            return Ok(());
        };
        match handle.join() {
            Ok(delegate) => {
                self.delegate = Some(delegate);
                Ok(())
            }
            Err(_) => {
                log::error!("Simulation thread panicked; published scenes were not restored");
                Err(RuntimeError::ThreadPanicked)
            }
        }
    }

    /// Pause stepping. Does nothing unless `Running`.
    pub fn pause(&self) {
        if self.lock.transition(&[RuntimeState::Running], RuntimeState::Paused).is_some() {
            log::info!("Runtime: running -> paused");
        }
    }

    /// Resume stepping. Does nothing unless `Paused`.
    pub fn resume(&self) {
        if self.lock.transition(&[RuntimeState::Paused], RuntimeState::Running).is_some() {
            log::info!("Runtime: paused -> running");
        }
    }
}

impl<D: RuntimeDelegate> Drop for CoreRuntime<D> {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::error!("Runtime shutdown failed: {}", err);
        }
    }
}

fn simulation_loop<D: RuntimeDelegate>(mut delegate: D, lock: &RuntimeLock<D::Shared>, config: &RuntimeConfig) -> D {
    log::info!("Simulation thread started");
    delegate.on_start(lock);

    let mut timer = Timer::new().with_max_delta(config.max_delta_seconds);
    let interval = config.tick_interval();

    loop {
        let state = lock.lock().state;
        match state {
            RuntimeState::Running => {
                let delta_time = timer.update();
                delegate.on_step(lock, delta_time);

                if let Some(interval) = interval {
                    let remaining = timer.remaining(interval);
                    let mut guard = lock.lock();
                    if !remaining.is_zero() && guard.state == RuntimeState::Running {
                        // Woken early by pause/stop
                        lock.wake.wait_for(&mut guard, remaining);
                    }
                }
            }
            RuntimeState::Paused => {
                delegate.on_pause();

                let mut guard = lock.lock();
                while guard.state == RuntimeState::Paused {
                    lock.wake.wait(&mut guard);
                }
                let resumed = guard.state == RuntimeState::Running;
                drop(guard);

                if resumed {
                    delegate.on_resume();
                    timer.reset();
                }
            }
            RuntimeState::Inactive => break,
        }
    }

    delegate.on_stop(lock);
    log::info!("Simulation thread stopped after {} ticks", timer.tick_count());
    delegate
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct Counters {
        starts: AtomicUsize,
        stops: AtomicUsize,
        pauses: AtomicUsize,
        resumes: AtomicUsize,
        steps: AtomicUsize,
    }

    struct CountingDelegate {
        counters: Arc<Counters>,
        panic_on_step: bool,
    }

    impl RuntimeDelegate for CountingDelegate {
        type Shared = u64;

        fn on_start(&mut self, _lock: &RuntimeLock<u64>) {
            self.counters.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stop(&mut self, _lock: &RuntimeLock<u64>) {
            self.counters.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn on_pause(&mut self) {
            self.counters.pauses.fetch_add(1, Ordering::SeqCst);
        }

        fn on_resume(&mut self) {
            self.counters.resumes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_step(&mut self, lock: &RuntimeLock<u64>, _delta_time: f32) {
            assert!(!self.panic_on_step, "step failure");
            self.counters.steps.fetch_add(1, Ordering::SeqCst);
            if let Some(mut guard) = lock.try_lock() {
                guard.data += 1;
            }
        }
    }

    fn runtime(panic_on_step: bool) -> (CoreRuntime<CountingDelegate>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let delegate = CountingDelegate {
            counters: Arc::clone(&counters),
            panic_on_step,
        };
        let config = RuntimeConfig::new().with_tick_rate(500);
        (CoreRuntime::new(delegate, Arc::new(RuntimeLock::new(0)), config), counters)
    }

    fn wait_until(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for the simulation thread");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_inactive_ignores_pause_and_resume() {
        let (mut runtime, counters) = runtime(false);
        runtime.pause();
        runtime.resume();
        assert_eq!(runtime.state(), RuntimeState::Inactive);
        runtime.stop().unwrap();
        assert_eq!(counters.starts.load(Ordering::SeqCst), 0);
        assert!(runtime.delegate().is_some());
    }

    #[test]
    fn test_state_machine_transitions() {
        let (mut runtime, counters) = runtime(false);

        runtime.run().unwrap();
        assert_eq!(runtime.state(), RuntimeState::Running);
        assert!(runtime.delegate().is_none());
        wait_until(|| counters.steps.load(Ordering::SeqCst) > 2);

        // Running ignores run and resume
        runtime.run().unwrap();
        runtime.resume();
        assert_eq!(runtime.state(), RuntimeState::Running);

        runtime.pause();
        assert_eq!(runtime.state(), RuntimeState::Paused);
        wait_until(|| counters.pauses.load(Ordering::SeqCst) == 1);
        let steps = counters.steps.load(Ordering::SeqCst);

        // Paused ignores run and pause
        runtime.run().unwrap();
        runtime.pause();
        assert_eq!(runtime.state(), RuntimeState::Paused);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(counters.steps.load(Ordering::SeqCst), steps);

        runtime.resume();
        assert_eq!(runtime.state(), RuntimeState::Running);
        wait_until(|| counters.steps.load(Ordering::SeqCst) > steps);
        assert_eq!(counters.resumes.load(Ordering::SeqCst), 1);

        runtime.stop().unwrap();
        assert_eq!(runtime.state(), RuntimeState::Inactive);
        assert_eq!(counters.starts.load(Ordering::SeqCst), 1);
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
        assert!(runtime.delegate().is_some());
        assert!(runtime.lock().lock().data > 0);
    }

    #[test]
    fn test_stop_from_paused() {
        let (mut runtime, counters) = runtime(false);
        runtime.run().unwrap();
        runtime.pause();
        wait_until(|| counters.pauses.load(Ordering::SeqCst) == 1);

        runtime.stop().unwrap();
        assert_eq!(runtime.state(), RuntimeState::Inactive);
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
        assert_eq!(counters.resumes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_runtime_can_restart() {
        let (mut runtime, counters) = runtime(false);
        for _ in 0..2 {
            runtime.run().unwrap();
            runtime.stop().unwrap();
        }
        assert_eq!(counters.starts.load(Ordering::SeqCst), 2);
        assert_eq!(counters.stops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicked_thread_is_reported() {
        let (mut runtime, _counters) = runtime(true);
        runtime.run().unwrap();
        std::thread::sleep(Duration::from_millis(20));

        assert!(matches!(runtime.stop(), Err(RuntimeError::ThreadPanicked)));
        assert_eq!(runtime.state(), RuntimeState::Inactive);
        assert!(matches!(runtime.run(), Err(RuntimeError::DelegateLost)));
    }
}

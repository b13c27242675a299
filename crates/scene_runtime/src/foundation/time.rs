//! Time management utilities

use std::time::{Duration, Instant};

/// High-precision timer supplying the per-tick delta time
pub struct Timer {
    last_tick: Instant,
    delta_time: f32,
    total_time: f32,
    tick_count: u64,
    max_delta: Option<f32>,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            tick_count: 0,
            max_delta: None,
        }
    }

    /// Clamp every reported delta to at most `seconds`
    pub fn with_max_delta(mut self, seconds: f32) -> Self {
        self.max_delta = Some(seconds.max(0.0));
        self
    }

    /// Update the timer (should be called once per tick) and return the delta
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let mut elapsed = now.duration_since(self.last_tick).as_secs_f32();
        if let Some(max) = self.max_delta {
            elapsed = elapsed.min(max);
        }
        self.delta_time = elapsed;
        self.total_time += elapsed;
        self.last_tick = now;
        self.tick_count += 1;
        elapsed
    }

    /// Restart delta accounting from now, e.g. after the loop was paused
    pub fn reset(&mut self) {
        self.last_tick = Instant::now();
        self.delta_time = 0.0;
    }

    /// Time remaining until `interval` has passed since the last tick
    pub fn remaining(&self, interval: Duration) -> Duration {
        interval.saturating_sub(self.last_tick.elapsed())
    }

    /// Get the time since the last tick in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total accumulated time
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current tick count
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

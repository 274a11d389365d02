//! Time management utilities

use std::time::{Duration, Instant};

/// Fixed-timestep accumulator driving the simulation tick
///
/// Real elapsed time is accumulated into `pending` and drained in steps of
/// `interval`; the render side only ever observes the state between steps.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    interval: Duration,
    pending: Duration,
    max_steps: u32,
    steps_total: u64,
}

impl FixedTimestep {
    /// Create an accumulator ticking `tps` times per second
    pub fn new(tps: u32, max_steps: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / tps.max(1),
            pending: Duration::ZERO,
            max_steps: max_steps.max(1),
            steps_total: 0,
        }
    }

    /// Add real elapsed time to the accumulator
    pub fn accumulate(&mut self, elapsed: Duration) {
        self.pending += elapsed;
    }

    /// Consume one step if enough time is pending
    pub fn try_step(&mut self) -> bool {
        if self.pending < self.interval {
            return false;
        }
        self.pending -= self.interval;
        self.steps_total += 1;
        true
    }

    /// Number of steps that can run now, capped at the per-tick limit.
    ///
    /// Time beyond the cap is dropped so a long stall does not spiral.
    pub fn drain(&mut self) -> u32 {
        let mut steps = 0;
        while steps < self.max_steps && self.try_step() {
            steps += 1;
        }
        if steps == self.max_steps && self.pending >= self.interval {
            log::warn!(
                "Simulation fell behind, dropping {:?} of pending time",
                self.pending
            );
            self.pending = Duration::ZERO;
        }
        steps
    }

    /// Length of one simulation step
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time accumulated but not yet simulated
    pub fn pending(&self) -> Duration {
        self.pending
    }

    /// Total steps simulated since creation
    pub fn steps_total(&self) -> u64 {
        self.steps_total
    }
}

/// High-precision wall clock producing per-frame deltas
pub struct Timer {
    last_frame: Instant,
    delta: Duration,
    frame_count: u64,
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
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Update the timer and return the time since the previous call
    pub fn update(&mut self) -> Duration {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.frame_count += 1;
        self.delta
    }

    /// Time between the last two updates
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_drains_whole_steps() {
        let mut clock = FixedTimestep::new(10, 8);
        clock.accumulate(Duration::from_millis(250));

        assert_eq!(clock.drain(), 2);
        assert_eq!(clock.pending(), Duration::from_millis(50));
        assert_eq!(clock.steps_total(), 2);
    }

    #[test]
    fn test_fixed_step_caps_catch_up() {
        let mut clock = FixedTimestep::new(10, 3);
        clock.accumulate(Duration::from_secs(5));

        assert_eq!(clock.drain(), 3);
        assert_eq!(clock.pending(), Duration::ZERO);
    }
}

use std::time::{Duration, Instant};

/// Converts wall-clock time into whole fixed simulation ticks.
pub struct TimeSystem {
    // Core
    pub sim_ticks: u64,
    last_update: Instant,
    sim_accumulator: Duration,

    // Constants
    sim_dt: Duration,
    max_steps: u32,
}

impl TimeSystem {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            sim_ticks: 0,
            last_update: now,
            sim_accumulator: Duration::ZERO,
            sim_dt: Duration::from_millis(16), // ~60 Hz, one display frame
            max_steps: 5,
        }
    }

    pub fn sim_dt(&self) -> Duration {
        self.sim_dt
    }

    /// Advances time and returns the number of fixed ticks to run.
    pub fn tick(&mut self, now: Instant) -> u32 {
        let frame_dt = now.saturating_duration_since(self.last_update);
        self.last_update = now;

        // Long stalls (window drag, debugger) only catch up a few ticks.
        self.sim_accumulator += frame_dt.min(self.sim_dt * self.max_steps);

        let mut sim_steps = 0;
        while self.sim_accumulator >= self.sim_dt {
            self.sim_accumulator -= self.sim_dt;
            self.sim_ticks += 1;
            sim_steps += 1;
        }

        sim_steps
    }

    /// Drops accumulated time, e.g. after the loop leaves idle.
    pub fn resync(&mut self, now: Instant) {
        self.last_update = now;
        self.sim_accumulator = Duration::ZERO;
    }

    pub fn next_wakeup(&self) -> Instant {
        self.last_update + self.sim_dt
    }
}

impl Default for TimeSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_ticks_only() {
        let t0 = Instant::now();
        let mut time = TimeSystem::starting_at(t0);

        let steps = time.tick(t0 + Duration::from_millis(40));
        assert_eq!(steps, 2);

        // 8 ms carried over + 10 ms = 18 ms -> one more tick.
        let steps = time.tick(t0 + Duration::from_millis(50));
        assert_eq!(steps, 1);
        assert_eq!(time.sim_ticks, 3);
    }

    #[test]
    fn stalls_are_capped() {
        let t0 = Instant::now();
        let mut time = TimeSystem::starting_at(t0);
        let steps = time.tick(t0 + Duration::from_secs(10));
        assert_eq!(steps, 5);
    }

    #[test]
    fn steady_frames_tick_at_fixed_rate() {
        let t0 = Instant::now();
        let mut time = TimeSystem::starting_at(t0);

        let total: u32 = (1..=60)
            .map(|i| time.tick(t0 + Duration::from_millis(i * 20)))
            .sum();
        // 1200 ms / 16 ms
        assert_eq!(total, 75);
        assert_eq!(time.sim_ticks, 75);
    }

    #[test]
    fn resync_discards_backlog() {
        let t0 = Instant::now();
        let mut time = TimeSystem::starting_at(t0);
        time.resync(t0 + Duration::from_secs(3));
        let steps = time.tick(t0 + Duration::from_secs(3) + Duration::from_millis(16));
        assert_eq!(steps, 1);
    }
}

use std::time::{Duration, Instant};

/// Rolling per-second counters for the HUD.
pub struct FrameStats {
    last_present: Instant,
    present_time_accum: Duration,
    presented: u32,
    rendered: u32,
    ticks: u32,
    physics_ticks: u32,

    last_report: Instant,
    report_dt: Duration,

    pub avg_frame_time_ms: f32,
    pub present_fps: u32,
    pub render_fps: u32,
    pub sim_tps: u32,
    /// Ticks per second that actually stepped physics; the rest only rotated.
    pub physics_tps: u32,
}

impl FrameStats {
    pub fn new(now: Instant) -> Self {
        Self {
            last_present: now,
            present_time_accum: Duration::ZERO,
            presented: 0,
            rendered: 0,
            ticks: 0,
            physics_ticks: 0,
            last_report: now,
            report_dt: Duration::from_secs(1),
            avg_frame_time_ms: 0.0,
            present_fps: 0,
            render_fps: 0,
            sim_tps: 0,
            physics_tps: 0,
        }
    }

    pub fn record_render(&mut self) {
        self.rendered += 1;
    }

    pub fn record_present(&mut self, now: Instant) {
        self.present_time_accum += now.saturating_duration_since(self.last_present);
        self.last_present = now;
        self.presented += 1;
    }

    /// Counts fixed ticks run this frame. `physics` is false while the
    /// simulation is switched off.
    pub fn record_ticks(&mut self, steps: u32, physics: bool) {
        self.ticks += steps;
        if physics {
            self.physics_ticks += steps;
        }
    }

    /// Folds the counters into rates once per report window. Returns `true`
    /// when the rates changed.
    pub fn refresh(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_report);
        if elapsed < self.report_dt {
            return false;
        }
        let secs = elapsed.as_secs_f32();

        if self.presented > 0 {
            let avg_dt = self.present_time_accum.as_secs_f32() / self.presented as f32;
            self.avg_frame_time_ms = avg_dt * 1000.0;
            if avg_dt > 0.0 {
                self.present_fps = (1.0 / avg_dt).round() as u32;
            }
        }
        let rate = |count: u32| (count as f32 / secs).round() as u32;
        self.render_fps = rate(self.rendered);
        self.sim_tps = rate(self.ticks);
        self.physics_tps = rate(self.physics_ticks);

        self.present_time_accum = Duration::ZERO;
        self.presented = 0;
        self.rendered = 0;
        self.ticks = 0;
        self.physics_ticks = 0;
        self.last_report = now;
        true
    }

    pub fn summary(&self) -> String {
        format!(
            "Frame:   {:5.2} ms ({:3} fps)\nTicks:   {:3}/s (physics {:3}/s)\nRender:  {:3} fps",
            self.avg_frame_time_ms, self.present_fps, self.sim_tps, self.physics_tps, self.render_fps,
        )
    }
}

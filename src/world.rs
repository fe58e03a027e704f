use anyhow::Result;

use crate::components::{
    Appearance, Axis, COLOR_PALETTE, Kinematics, Orientation, ShapeKind, SphereParams, hex_to_rgb,
};
use crate::systems::{PhysicsSystem, advance_orientation};

pub const SCALE_MIN: f32 = 0.1;
pub const SCALE_MAX: f32 = 3.0;

/// Position the object returns to on reset.
pub const RESET_POSITION: [f32; 2] = [0.0, 0.5];

/// Everything the viewer mutates between and during frames.
#[derive(Clone, Debug)]
pub struct SimState {
    pub kinematics: Kinematics,
    pub orientation: Orientation,
    pub appearance: Appearance,
    pub shape: ShapeKind,
    pub scale: [f32; 3],
    pub force: [f32; 2],
    pub sphere: SphereParams,
    pub simulation_running: bool,
    /// Axis the +/- keys scale; `None` scales all three.
    pub scale_target: Option<Axis>,

    object_palette_idx: usize,
    ambient_palette_idx: usize,
}

impl SimState {
    pub fn new() -> Self {
        Self {
            kinematics: Kinematics::new(),
            orientation: Orientation::new(),
            appearance: Appearance::new(),
            shape: ShapeKind::default(),
            scale: [1.0, 1.0, 1.0],
            force: [0.0, 0.0],
            sphere: SphereParams::default(),
            simulation_running: false,
            scale_target: None,
            object_palette_idx: 0,
            ambient_palette_idx: COLOR_PALETTE.len() - 1,
        }
    }

    /// One fixed tick. Physics only runs while the simulation is on;
    /// rotation always advances.
    pub fn tick(&mut self, physics: &PhysicsSystem) {
        if self.simulation_running {
            physics.step(&mut self.kinematics);
        }
        advance_orientation(&mut self.orientation);
    }

    /// Switches shape and clears all rotation state.
    pub fn select_shape(&mut self, shape: ShapeKind) {
        self.shape = shape;
        self.orientation.reset();
        log::info!("shape: {}", shape.name());
    }

    pub fn toggle_rotation(&mut self, axis: Axis) {
        self.orientation.toggle(axis);
        log::debug!("rotate {:?}: {}", axis, self.orientation.is_active(axis));
    }

    pub fn reset(&mut self) {
        self.orientation.reset();
        self.kinematics.position = RESET_POSITION;
        self.kinematics.velocity = [0.0, 0.0];
        self.kinematics.gravity_enabled = false;
        log::info!("state reset");
    }

    pub fn set_simulation_running(&mut self, running: bool) {
        if self.simulation_running != running {
            log::info!("simulation {}", if running { "started" } else { "stopped" });
        }
        self.simulation_running = running;
    }

    pub fn toggle_gravity(&mut self) {
        self.kinematics.gravity_enabled = !self.kinematics.gravity_enabled;
        log::info!("gravity: {}", self.kinematics.gravity_enabled);
    }

    pub fn adjust_force(&mut self, delta: [f32; 2]) {
        self.force[0] += delta[0];
        self.force[1] += delta[1];
    }

    pub fn apply_force(&mut self, physics: &PhysicsSystem) {
        physics.apply_force(&mut self.kinematics, self.force);
        log::debug!("force {:?} -> velocity {:?}", self.force, self.kinematics.velocity);
    }

    /// Adds `delta` to every scale axis, keeping each within range.
    pub fn scale_by(&mut self, delta: f32) {
        for axis in Axis::ALL {
            self.scale_axis(axis, delta);
        }
    }

    pub fn scale_axis(&mut self, axis: Axis, delta: f32) {
        let s = &mut self.scale[axis as usize];
        *s = (*s + delta).clamp(SCALE_MIN, SCALE_MAX);
    }

    /// Scales whatever `scale_target` selects.
    pub fn adjust_scale(&mut self, delta: f32) {
        match self.scale_target {
            Some(axis) => self.scale_axis(axis, delta),
            None => self.scale_by(delta),
        }
    }

    /// all -> X -> Y -> Z -> all
    pub fn cycle_scale_target(&mut self) {
        self.scale_target = match self.scale_target {
            None => Some(Axis::X),
            Some(Axis::X) => Some(Axis::Y),
            Some(Axis::Y) => Some(Axis::Z),
            Some(Axis::Z) => None,
        };
        log::debug!("scale target: {}", scale_target_name(self.scale_target));
    }

    pub fn adjust_sphere_bands(&mut self, delta: i32) {
        self.sphere = self.sphere.with_band_delta(delta);
    }

    pub fn set_object_color(&mut self, hex: &str) -> Result<()> {
        self.appearance.object_color = hex_to_rgb(hex)?;
        Ok(())
    }

    pub fn set_ambient_color(&mut self, hex: &str) -> Result<()> {
        let [r, g, b, _] = hex_to_rgb(hex)?;
        self.appearance.ambient_color = [r, g, b];
        Ok(())
    }

    pub fn cycle_object_color(&mut self) -> Result<()> {
        self.object_palette_idx = (self.object_palette_idx + 1) % COLOR_PALETTE.len();
        self.set_object_color(COLOR_PALETTE[self.object_palette_idx])
    }

    pub fn cycle_ambient_color(&mut self) -> Result<()> {
        self.ambient_palette_idx = (self.ambient_palette_idx + 1) % COLOR_PALETTE.len();
        self.set_ambient_color(COLOR_PALETTE[self.ambient_palette_idx])
    }

    /// Multi-line summary for the HUD.
    pub fn summary(&self) -> String {
        let k = &self.kinematics;
        let [sx, sy, sz] = self.scale;
        format!(
            "Shape: {:<7} sim: {:<3} gravity: {:<3}\npos: ({:+.2}, {:+.2})  vel: ({:+.3}, {:+.3})\nforce: ({:+.1}, {:+.1})  bands: {}\nscale: ({sx:.1}, {sy:.1}, {sz:.1})  +/- {}",
            self.shape.name(),
            on_off(self.simulation_running),
            on_off(k.gravity_enabled),
            k.position[0],
            k.position[1],
            k.velocity[0],
            k.velocity[1],
            self.force[0],
            self.force[1],
            self.sphere.latitude_bands,
            scale_target_name(self.scale_target),
        )
    }
}

impl Default for SimState {
    fn default() -> Self {
        Self::new()
    }
}

fn scale_target_name(target: Option<Axis>) -> &'static str {
    match target {
        None => "all",
        Some(Axis::X) => "x",
        Some(Axis::Y) => "y",
        Some(Axis::Z) => "z",
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

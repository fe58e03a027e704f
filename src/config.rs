use anyhow::{Context, Result};
use winit::dpi::LogicalSize;

use crate::components::{ShapeKind, SphereParams};
use crate::logging::LoggingConfig;
use crate::systems::parse_force;
use crate::world::SimState;

/// Startup configuration for the viewer.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,

    /// Start the frame loop immediately instead of waiting for a shape key.
    pub autostart: bool,
    pub initial_shape: ShapeKind,

    pub object_color: String,  // #RRGGBB
    pub ambient_color: String, // #RRGGBB
    pub scale: [f32; 3],
    pub sphere: SphereParams,
    /// Raw force fields; anything non-numeric counts as zero.
    pub force: [String; 2],

    pub present_mode: wgpu::PresentMode,
    pub clear_color: wgpu::Color,
    pub logging: LoggingConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "shapes3d".to_string(),
            initial_size: LogicalSize::new(1024.0, 768.0),
            autostart: true,
            initial_shape: ShapeKind::Cube,
            object_color: "#FF0000".to_string(),
            ambient_color: "#808080".to_string(),
            scale: [1.0, 1.0, 1.0],
            sphere: SphereParams::default(),
            force: ["0".to_string(), "0".to_string()],
            present_mode: wgpu::PresentMode::AutoVsync,
            clear_color: wgpu::Color {
                r: 0.2,
                g: 0.2,
                b: 0.2,
                a: 1.0,
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Builds the initial viewer state, validating colors.
    pub fn initial_state(&self) -> Result<SimState> {
        let mut state = SimState::new();
        state.shape = self.initial_shape;
        state.scale = self.scale;
        state.sphere = self.sphere;
        state.force = [parse_force(&self.force[0]), parse_force(&self.force[1])];
        state
            .set_object_color(&self.object_color)
            .context("invalid object color in config")?;
        state
            .set_ambient_color(&self.ambient_color)
            .context("invalid ambient color in config")?;
        Ok(state)
    }
}

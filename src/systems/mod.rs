mod frame_stats;
mod input;
mod physics;
mod render_loop;
mod renderer;
mod timing;
mod transform;

pub use input::{CommandEffect, InputCommand, InputSystem};
pub use physics::{PhysicsSystem, parse_force};
pub use render_loop::RenderLoop;
pub use renderer::{Renderer, SurfaceErrorAction};
pub use timing::TimeSystem;
pub use transform::advance_orientation;

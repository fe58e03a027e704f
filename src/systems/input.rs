use winit::keyboard::{KeyCode, ModifiersState};

use crate::components::{Axis, ShapeKind};
use crate::systems::{PhysicsSystem, RenderLoop};
use crate::world::SimState;

/// Force change per arrow key press.
const FORCE_STEP: f32 = 1.0;
/// Scale change per +/- press.
const SCALE_STEP: f32 = 0.1;

/// InputSystem translates raw key events into viewer commands
pub struct InputSystem {
    pub modifiers: ModifiersState,
}

impl InputSystem {
    pub fn new() -> Self {
        Self {
            modifiers: ModifiersState::empty(),
        }
    }

    pub fn update_modifiers(&mut self, modifiers: ModifiersState) {
        self.modifiers = modifiers;
    }

    pub fn handle_key(&self, keycode: KeyCode) -> Option<InputCommand> {
        // Shift makes force steps coarser.
        let coarse = if self.modifiers.shift_key() { 10.0 } else { 1.0 };

        match keycode {
            KeyCode::Escape => Some(InputCommand::Exit),

            KeyCode::Digit1 | KeyCode::Numpad1 => Some(InputCommand::SelectShape(ShapeKind::Cube)),
            KeyCode::Digit2 | KeyCode::Numpad2 => {
                Some(InputCommand::SelectShape(ShapeKind::Sphere))
            }
            KeyCode::Digit3 | KeyCode::Numpad3 => {
                Some(InputCommand::SelectShape(ShapeKind::Pyramid))
            }

            KeyCode::KeyX => Some(InputCommand::ToggleRotation(Axis::X)),
            KeyCode::KeyY => Some(InputCommand::ToggleRotation(Axis::Y)),
            KeyCode::KeyZ => Some(InputCommand::ToggleRotation(Axis::Z)),

            KeyCode::KeyR => Some(InputCommand::Reset),
            KeyCode::Enter | KeyCode::NumpadEnter => Some(InputCommand::StartSimulation),
            KeyCode::Space => Some(InputCommand::StopSimulation),
            KeyCode::KeyG => Some(InputCommand::ToggleGravity),

            KeyCode::KeyF => Some(InputCommand::ApplyForce),
            KeyCode::ArrowLeft => Some(InputCommand::AdjustForce([-FORCE_STEP * coarse, 0.0])),
            KeyCode::ArrowRight => Some(InputCommand::AdjustForce([FORCE_STEP * coarse, 0.0])),
            KeyCode::ArrowUp => Some(InputCommand::AdjustForce([0.0, FORCE_STEP * coarse])),
            KeyCode::ArrowDown => Some(InputCommand::AdjustForce([0.0, -FORCE_STEP * coarse])),

            KeyCode::Equal | KeyCode::NumpadAdd => Some(InputCommand::Scale(SCALE_STEP)),
            KeyCode::Minus | KeyCode::NumpadSubtract => Some(InputCommand::Scale(-SCALE_STEP)),
            KeyCode::Tab => Some(InputCommand::CycleScaleTarget),

            KeyCode::BracketLeft => Some(InputCommand::SphereBands(-1)),
            KeyCode::BracketRight => Some(InputCommand::SphereBands(1)),

            KeyCode::KeyC => Some(InputCommand::CycleObjectColor),
            KeyCode::KeyA => Some(InputCommand::CycleAmbientColor),

            _ => None,
        }
    }
}

impl Default for InputSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Commands that the input system can emit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputCommand {
    Exit,
    SelectShape(ShapeKind),
    ToggleRotation(Axis),
    Reset,
    StartSimulation,
    StopSimulation,
    ToggleGravity,
    ApplyForce,
    AdjustForce([f32; 2]),
    Scale(f32),
    CycleScaleTarget,
    SphereBands(i32),
    CycleObjectColor,
    CycleAmbientColor,
}

impl InputCommand {
    /// Whether a held key should keep firing this command.
    pub fn repeatable(&self) -> bool {
        matches!(
            self,
            InputCommand::AdjustForce(_) | InputCommand::Scale(_) | InputCommand::SphereBands(_)
        )
    }

    /// Applies the command to the viewer state. Picking a shape is what moves
    /// an idle loop to running; `Exit` is left to the caller.
    pub fn apply(
        self,
        state: &mut SimState,
        render_loop: &mut RenderLoop,
        physics: &PhysicsSystem,
    ) -> CommandEffect {
        match self {
            InputCommand::Exit => return CommandEffect::Exit,
            InputCommand::SelectShape(shape) => {
                state.select_shape(shape);
                if render_loop.start() {
                    return CommandEffect::LoopStarted;
                }
            }
            InputCommand::ToggleRotation(axis) => state.toggle_rotation(axis),
            InputCommand::Reset => state.reset(),
            InputCommand::StartSimulation => state.set_simulation_running(true),
            InputCommand::StopSimulation => state.set_simulation_running(false),
            InputCommand::ToggleGravity => state.toggle_gravity(),
            InputCommand::ApplyForce => state.apply_force(physics),
            InputCommand::AdjustForce(delta) => state.adjust_force(delta),
            InputCommand::Scale(delta) => state.adjust_scale(delta),
            InputCommand::CycleScaleTarget => state.cycle_scale_target(),
            InputCommand::SphereBands(delta) => state.adjust_sphere_bands(delta),
            InputCommand::CycleObjectColor => {
                if let Err(err) = state.cycle_object_color() {
                    log::warn!("object color unchanged: {err:#}");
                }
            }
            InputCommand::CycleAmbientColor => {
                if let Err(err) = state.cycle_ambient_color() {
                    log::warn!("ambient color unchanged: {err:#}");
                }
            }
        }
        CommandEffect::Applied
    }
}

/// What is left for the caller after [`InputCommand::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEffect {
    Applied,
    /// The loop just left idle; fixed-step timing should resync.
    LoopStarted,
    Exit,
}

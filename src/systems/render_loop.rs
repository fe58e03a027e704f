/// Lifecycle of the frame loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopState {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// Gatekeeper for per-frame work. Once stopped, it never runs again.
#[derive(Debug, Default)]
pub struct RenderLoop {
    state: LoopState,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.state == LoopState::Stopped
    }

    /// Idle -> Running. Returns `true` only on the actual transition.
    pub fn start(&mut self) -> bool {
        match self.state {
            LoopState::Idle => {
                self.state = LoopState::Running;
                log::info!("render loop running");
                true
            }
            LoopState::Running | LoopState::Stopped => false,
        }
    }

    /// Idle | Running -> Stopped. Returns `true` only on the actual transition.
    pub fn stop(&mut self) -> bool {
        if self.state == LoopState::Stopped {
            return false;
        }
        log::info!("render loop stopped (was {:?})", self.state);
        self.state = LoopState::Stopped;
        true
    }
}

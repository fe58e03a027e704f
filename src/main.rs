use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

mod components;
mod config;
mod logging;
mod mesh;
mod systems;
mod world;

use config::ViewerConfig;
use mesh::GeometryCache;
use systems::{
    CommandEffect, InputCommand, InputSystem, PhysicsSystem, RenderLoop, Renderer,
    SurfaceErrorAction, TimeSystem,
};
use world::SimState;

struct App {
    config: ViewerConfig,

    // Systems
    renderer: Option<Renderer>,
    timing: TimeSystem,
    physics: PhysicsSystem,
    input: InputSystem,
    render_loop: RenderLoop,

    // Viewer state
    state: SimState,
    geometry: GeometryCache,

    init_error: Option<anyhow::Error>,
}

impl App {
    fn new(config: ViewerConfig) -> Result<Self> {
        let state = config.initial_state()?;
        let geometry = GeometryCache::new(state.sphere);

        Ok(Self {
            config,
            renderer: None,
            timing: TimeSystem::new(),
            physics: PhysicsSystem::new(),
            input: InputSystem::new(),
            render_loop: RenderLoop::new(),
            state,
            geometry,
            init_error: None,
        })
    }

    fn start_loop(&mut self) {
        if self.render_loop.start() {
            self.resync_timing();
        }
    }

    fn resync_timing(&mut self) {
        self.timing.resync(Instant::now());
        log::debug!("fixed tick: {:?}", self.timing.sim_dt());
    }

    fn stop_loop(&mut self, event_loop: &ActiveEventLoop) {
        self.render_loop.stop();
        log::info!("exiting ({:?})", self.render_loop.state());
        event_loop.exit();
    }

    fn handle_input_command(&mut self, event_loop: &ActiveEventLoop, command: InputCommand) {
        match command.apply(&mut self.state, &mut self.render_loop, &self.physics) {
            CommandEffect::Exit => {
                self.stop_loop(event_loop);
                return;
            }
            CommandEffect::LoopStarted => self.resync_timing(),
            CommandEffect::Applied => {}
        }

        if let Some(renderer) = &self.renderer {
            renderer.window.request_redraw();
        }
    }

    fn create_renderer(&self, event_loop: &ActiveEventLoop) -> Result<Renderer> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        pollster::block_on(Renderer::new(window, &self.config))
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        match self.create_renderer(event_loop) {
            Ok(renderer) => {
                renderer.window.request_redraw();
                self.renderer = Some(renderer);
                if self.config.autostart {
                    self.start_loop();
                }
            }
            Err(err) => {
                log::error!("initialization failed: {err:#}");
                self.init_error = Some(err);
                self.stop_loop(event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window close requested");
                self.stop_loop(event_loop);
            }

            WindowEvent::RedrawRequested => {
                if self.render_loop.is_stopped() {
                    return;
                }
                let Some(renderer) = self.renderer.as_mut() else {
                    return;
                };

                let running = self.render_loop.is_running();
                match renderer.render(&self.state, &self.geometry, running) {
                    Ok(()) => {}
                    Err(SurfaceErrorAction::Fatal) => {
                        log::error!("surface lost beyond recovery");
                        self.stop_loop(event_loop);
                    }
                    Err(action) => log::debug!("frame skipped: {action:?}"),
                }
            }

            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                    renderer.window.request_redraw();
                }
            }

            WindowEvent::ModifiersChanged(new_modifiers) => {
                self.input.update_modifiers(new_modifiers.state());
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() {
                    if let PhysicalKey::Code(keycode) = event.physical_key {
                        if let Some(command) = self.input.handle_key(keycode) {
                            if !event.repeat || command.repeatable() {
                                self.handle_input_command(event_loop, command);
                            }
                        }
                    }
                }
            }

            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.render_loop.is_running() {
            // Idle frames only change on input.
            if !self.render_loop.is_stopped() {
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            return;
        }
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        let steps = self.timing.tick(Instant::now());

        // Fixed ticks: physics (when enabled) and rotation
        for _ in 0..steps {
            self.state.tick(&self.physics);
        }
        self.geometry.update_sphere(self.state.sphere);

        renderer
            .frame_stats
            .record_ticks(steps, self.state.simulation_running);
        renderer.window.request_redraw();

        log::trace!(
            "tick {}: pos {:?} vel {:?}",
            self.timing.sim_ticks,
            self.state.kinematics.position,
            self.state.kinematics.velocity
        );

        let next = self.timing.next_wakeup();
        event_loop.set_control_flow(ControlFlow::WaitUntil(next));
    }
}

fn main() -> Result<()> {
    let config = ViewerConfig::default();
    logging::init_logging(&config.logging);

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = App::new(config)?;
    event_loop
        .run_app(&mut app)
        .context("event loop terminated with error")?;

    match app.init_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

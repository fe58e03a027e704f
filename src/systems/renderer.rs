use crate::components::ShapeKind;
use crate::config::ViewerConfig;
use crate::mesh::{GeometryCache, Vertex};
use crate::systems::frame_stats::FrameStats;
use crate::systems::transform;
use crate::world::SimState;
use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use wgpu::SurfaceError;
use wgpu::util::DeviceExt;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const HELP_TEXT: &str = "1/2/3 shape  X/Y/Z rotate  R reset  Enter/Space sim  G gravity\n\
arrows force  F apply  +/- scale  Tab scale axis  [/] bands\n\
C/A colors  Esc quit";

const SHAPE_SHADER: &str = include_str!("../shader.wgsl");

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    model_view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    ambient: [f32; 4],
    diffuse: [f32; 4],
    light_dir: [f32; 4],
}

impl Uniforms {
    fn from_state(state: &SimState, width: u32, height: u32) -> Self {
        let model_view = transform::model_view(
            state.kinematics.position,
            state.scale,
            &state.orientation,
        );
        let a = &state.appearance;

        Self {
            model_view: model_view.to_cols_array_2d(),
            projection: transform::projection(width, height).to_cols_array_2d(),
            normal_matrix: transform::normal_matrix(&model_view).to_cols_array_2d(),
            color: a.object_color,
            ambient: extend(a.ambient_color),
            diffuse: extend(a.diffuse_color),
            light_dir: extend(a.light_direction),
        }
    }
}

fn extend(v: [f32; 3]) -> [f32; 4] {
    [v[0], v[1], v[2], 0.0]
}

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); stop the loop.
    Fatal,
}

/// GPU buffers for one shape, uploaded once and reused across frames.
struct ShapeBuffers {
    vertices: wgpu::Buffer,
    indices: Option<wgpu::Buffer>,
    draw_count: u32,
    generation: u64,
}

pub struct Renderer {
    pub window: Arc<Window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    clear_color: wgpu::Color,

    render_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    shapes: HashMap<ShapeKind, ShapeBuffers>,

    // Text rendering
    font_system: glyphon::FontSystem,
    swash_cache: glyphon::SwashCache,
    viewport: glyphon::Viewport,
    atlas: glyphon::TextAtlas,
    text_renderer: glyphon::TextRenderer,
    stats_buffer: glyphon::Buffer,
    status_buffer: glyphon::Buffer,
    last_status: String,

    pub frame_stats: FrameStats,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, config: &ViewerConfig) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("rendering context unavailable: failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("rendering context unavailable: no suitable GPU adapter")?;
        log::info!("adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("shapes3d device"),
                ..Default::default()
            })
            .await
            .context("rendering context unavailable: failed to create device")?;

        let caps = surface.get_capabilities(&adapter);
        let surface_format = choose_surface_format(&caps.formats)
            .context("rendering context unavailable: no supported surface formats")?;
        log::info!("surface format: {surface_format:?}");

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            view_formats: vec![],
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            width: size.width.max(1),
            height: size.height.max(1),
            desired_maximum_frame_latency: 2,
            present_mode: config.present_mode,
        };
        surface.configure(&device, &surface_config);

        let shader = create_shader(&device, "Shape Shader", SHAPE_SHADER).await?;

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shape Pipeline"),
            layout: None,
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: std::mem::size_of::<Uniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &render_pipeline.get_bind_group_layout(0),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let depth_view = create_depth_view(&device, surface_config.width, surface_config.height);

        // Text rendering setup
        let mut font_system = glyphon::FontSystem::new();
        let swash_cache = glyphon::SwashCache::new();
        let cache = glyphon::Cache::new(&device);
        let viewport = glyphon::Viewport::new(&device, &cache);
        let color_mode = if surface_format.is_srgb() {
            glyphon::ColorMode::Accurate
        } else {
            glyphon::ColorMode::Web
        };
        let mut atlas =
            glyphon::TextAtlas::with_color_mode(&device, &queue, &cache, surface_format, color_mode);
        let text_renderer = glyphon::TextRenderer::new(
            &mut atlas,
            &device,
            wgpu::MultisampleState::default(),
            Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
        );

        let mut stats_buffer =
            glyphon::Buffer::new(&mut font_system, glyphon::Metrics::new(18.0, 24.0));
        let mut status_buffer =
            glyphon::Buffer::new(&mut font_system, glyphon::Metrics::new(18.0, 24.0));
        for buffer in [&mut stats_buffer, &mut status_buffer] {
            buffer.set_size(
                &mut font_system,
                Some(size.width as f32),
                Some(size.height as f32),
            );
        }

        let mut renderer = Self {
            window,
            device,
            queue,
            surface,
            surface_config,
            clear_color: config.clear_color,
            render_pipeline,
            uniform_buffer,
            uniform_bind_group,
            depth_view,
            shapes: HashMap::new(),
            font_system,
            swash_cache,
            viewport,
            atlas,
            text_renderer,
            stats_buffer,
            status_buffer,
            last_status: String::new(),
            frame_stats: FrameStats::new(Instant::now()),
        };

        renderer.update_stats_text();
        Ok(renderer)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Reconfigures the surface; a 0x0 size (minimized) is deferred.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, new_size.width, new_size.height);

        for buffer in [&mut self.stats_buffer, &mut self.status_buffer] {
            buffer.set_size(
                &mut self.font_system,
                Some(new_size.width as f32),
                Some(new_size.height as f32),
            );
        }
    }

    fn update_stats_text(&mut self) {
        set_hud_text(
            &mut self.font_system,
            &mut self.stats_buffer,
            &self.frame_stats.summary(),
            glyphon::Color::rgb(255, 255, 160),
        );
    }

    fn update_status_text(&mut self, status: String) {
        if status == self.last_status {
            return;
        }
        set_hud_text(
            &mut self.font_system,
            &mut self.status_buffer,
            &status,
            glyphon::Color::rgb(220, 220, 220),
        );
        self.last_status = status;
    }

    /// Uploads the shape's vertices on first use, or again when the sphere
    /// was rebuilt since the last upload.
    fn ensure_shape_buffers(&mut self, shape: ShapeKind, geometry: &GeometryCache) {
        let generation = match shape {
            ShapeKind::Sphere => geometry.sphere_generation(),
            ShapeKind::Cube | ShapeKind::Pyramid => 0,
        };

        if self
            .shapes
            .get(&shape)
            .is_some_and(|b| b.generation == generation)
        {
            return;
        }

        let data = geometry.geometry(shape);
        let vertices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(shape.name()),
                contents: bytemuck::cast_slice(data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let indices = data.indices.map(|indices| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(shape.name()),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
        });

        log::debug!(
            "uploaded {} buffers ({} vertices, generation {generation})",
            shape.name(),
            data.vertices.len()
        );

        // Replacing the entry drops the previous buffers.
        self.shapes.insert(
            shape,
            ShapeBuffers {
                vertices,
                indices,
                draw_count: data.draw_count(),
                generation,
            },
        );
    }

    /// Draws one frame. The shape is only drawn while `running`; otherwise the
    /// frame is cleared and the HUD shown.
    pub fn render(
        &mut self,
        state: &SimState,
        geometry: &GeometryCache,
        running: bool,
    ) -> Result<(), SurfaceErrorAction> {
        self.frame_stats.record_render();

        let (width, height) = self.size();
        if running {
            self.ensure_shape_buffers(state.shape, geometry);
            let uniforms = Uniforms::from_state(state, width, height);
            self.queue
                .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        }

        let status = if running {
            format!("{}\n\n{HELP_TEXT}", state.summary())
        } else {
            format!("Press 1, 2 or 3 to pick a shape\n\n{HELP_TEXT}")
        };
        self.update_status_text(status);
        self.prepare_text(width, height);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => return Err(self.handle_surface_error(err)),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shape Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let Some(buffers) = self.shapes.get(&state.shape).filter(|_| running) {
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_vertex_buffer(0, buffers.vertices.slice(..));

                match &buffers.indices {
                    Some(indices) => {
                        render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..buffers.draw_count, 0, 0..1);
                    }
                    None => render_pass.draw(0..buffers.draw_count, 0..1),
                }
            }

            if let Err(err) =
                self.text_renderer
                    .render(&self.atlas, &self.viewport, &mut render_pass)
            {
                log::warn!("HUD render failed: {err}");
            }
        }

        self.queue.submit([encoder.finish()]);
        self.window.pre_present_notify();
        surface_texture.present();
        self.atlas.trim();

        let now = Instant::now();
        self.frame_stats.record_present(now);
        if self.frame_stats.refresh(now) {
            self.update_stats_text();
        }

        Ok(())
    }

    fn prepare_text(&mut self, width: u32, height: u32) {
        self.viewport
            .update(&self.queue, glyphon::Resolution { width, height });

        // Bottom-right corner, sized to the laid-out text.
        let (w, h) = self
            .stats_buffer
            .layout_runs()
            .fold((0.0f32, 0.0f32), |(w, h), run| {
                (w.max(run.line_w), h + run.line_height)
            });
        let margin = 12.0;
        let stats_left = (width as f32 - w - margin).max(margin).round();
        let stats_top = (height as f32 - h - margin).max(margin).round();

        let areas = [
            glyphon::TextArea {
                buffer: &self.status_buffer,
                left: margin,
                top: margin,
                scale: 1.0,
                bounds: glyphon::TextBounds::default(),
                default_color: glyphon::Color::rgb(220, 220, 220),
                custom_glyphs: &[],
            },
            glyphon::TextArea {
                buffer: &self.stats_buffer,
                left: stats_left,
                top: stats_top,
                scale: 1.0,
                bounds: glyphon::TextBounds::default(),
                default_color: glyphon::Color::rgb(255, 255, 160),
                custom_glyphs: &[],
            },
        ];

        if let Err(err) = self.text_renderer.prepare(
            &self.device,
            &self.queue,
            &mut self.font_system,
            &mut self.atlas,
            &self.viewport,
            areas,
            &mut self.swash_cache,
        ) {
            log::warn!("HUD prepare failed: {err}");
        }
    }

    fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        log::warn!("surface error: {err}");
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => {
                self.surface.configure(&self.device, &self.surface_config);
                SurfaceErrorAction::Reconfigured
            }
            SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceError::Timeout | SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

fn set_hud_text(
    font_system: &mut glyphon::FontSystem,
    buffer: &mut glyphon::Buffer,
    text: &str,
    color: glyphon::Color,
) {
    buffer.set_text(
        font_system,
        text,
        &glyphon::Attrs::new()
            .family(glyphon::Family::Monospace)
            .color(color),
        glyphon::Shaping::Basic,
        None,
    );
    buffer.shape_until_scroll(font_system, false);
}

/// Prefers a linear (non-sRGB) format: the shader's output is written as-is,
/// so ambient 0.5 shows as half intensity.
fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first().copied())
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Compiles WGSL inside a validation error scope so a broken shader becomes
/// an error instead of reaching the device's uncaptured-error handler.
async fn create_shader(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let validation = scope.pop().await;

    // Compiler messages carry line numbers; prefer them over the scope error.
    check_shader(&module, label).await?;
    if let Some(err) = validation {
        bail!("failed to compile {label}: {err}");
    }
    Ok(module)
}

/// Fails with the compiler's diagnostic log if the module has errors.
async fn check_shader(module: &wgpu::ShaderModule, label: &str) -> Result<()> {
    let info = module.get_compilation_info().await;

    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
        .map(|m| match &m.location {
            Some(loc) => format!("{}:{}: {}", loc.line_number, loc.line_position, m.message),
            None => m.message.clone(),
        })
        .collect();

    for warning in info
        .messages
        .iter()
        .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Warning))
    {
        log::warn!("{label}: {}", warning.message);
    }

    if !errors.is_empty() {
        bail!("failed to compile {label}:\n{}", errors.join("\n"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Axis;

    // ── uniforms ──────────────────────────────────────────────────────────

    #[test]
    fn uniform_block_layout() {
        // 3 mat4 + 4 vec4, no padding.
        assert_eq!(std::mem::size_of::<Uniforms>(), 3 * 64 + 4 * 16);
    }

    #[test]
    fn uniforms_carry_appearance() {
        let mut state = SimState::new();
        state.set_ambient_color("#00FF00").unwrap();
        state.toggle_rotation(Axis::X);

        let u = Uniforms::from_state(&state, 800, 600);
        assert_eq!(u.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(u.ambient, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(u.light_dir, [0.0, 0.0, 1.0, 0.0]);
        // Translation column places the object at z = -3.
        assert_eq!(u.model_view[3][2], -transform::EYE_DISTANCE);
    }

    // ── surface format ────────────────────────────────────────────────────

    #[test]
    fn linear_surface_format_preferred() {
        let formats = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Bgra8Unorm,
        ];
        assert_eq!(
            choose_surface_format(&formats),
            Some(wgpu::TextureFormat::Bgra8Unorm)
        );
    }

    #[test]
    fn srgb_only_surface_still_usable() {
        let formats = [wgpu::TextureFormat::Rgba8UnormSrgb];
        assert_eq!(
            choose_surface_format(&formats),
            Some(wgpu::TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(choose_surface_format(&[]), None);
    }

    // ── shader compilation ────────────────────────────────────────────────

    /// Software adapter for shader checks; `None` when the host has none.
    fn fallback_device() -> Option<wgpu::Device> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: true,
        }))
        .ok()?;
        let (device, _queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()?;
        Some(device)
    }

    #[test]
    fn broken_shader_is_an_error() {
        let Some(device) = fallback_device() else {
            eprintln!("no fallback adapter, skipping");
            return;
        };
        let err = pollster::block_on(create_shader(&device, "Broken Shader", "fn broken( {"))
            .unwrap_err();
        assert!(err.to_string().contains("failed to compile Broken Shader"));
    }

    #[test]
    fn bundled_shader_compiles() {
        let Some(device) = fallback_device() else {
            eprintln!("no fallback adapter, skipping");
            return;
        };
        assert!(pollster::block_on(create_shader(&device, "Shape Shader", SHAPE_SHADER)).is_ok());
    }
}

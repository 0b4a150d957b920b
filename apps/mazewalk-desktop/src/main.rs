use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use mazewalk_assets::{LoadedAssets, demo, load_all};
use mazewalk_common::GameConfig;
use mazewalk_input::InputState;
use mazewalk_kernel::{FrameReport, Session, World};
use mazewalk_render::MinimapCamera;
use mazewalk_render_wgpu::{SceneFrame, WgpuRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "mazewalk-desktop", about = "Third-person maze walkthrough")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML file overriding the built-in configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the asset paths are resolved against
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Walk the built-in maze instead of loading asset files
    #[arg(long)]
    demo: bool,

    /// Hide the minimap inset
    #[arg(long)]
    no_minimap: bool,
}

/// Key name as the input layer expects it, lowercase with arrows spelled out.
fn key_name(key: &Key) -> Option<String> {
    let name = match key {
        Key::Character(text) => return Some(text.to_lowercase()),
        Key::Named(NamedKey::Space) => " ",
        Key::Named(NamedKey::ArrowUp) => "arrowup",
        Key::Named(NamedKey::ArrowDown) => "arrowdown",
        Key::Named(NamedKey::ArrowLeft) => "arrowleft",
        Key::Named(NamedKey::ArrowRight) => "arrowright",
        _ => return None,
    };
    Some(name.to_string())
}

/// Wheel movement in line steps; positive zooms in.
fn wheel_steps(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
    }
}

/// Application state.
struct AppState {
    /// `None` once asset loading failed; nothing is updated after that.
    session: Option<Session>,
    load_error: Option<String>,
    minimap_camera: Option<MinimapCamera>,
    input: InputState,
    last_report: Option<FrameReport>,
    show_hud: bool,
    dragging: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
    viewport_height: f32,
    last_frame: Instant,
}

impl AppState {
    fn new(config: GameConfig, demo_mode: bool) -> Self {
        let loaded = if demo_mode {
            tracing::info!("using the built-in maze");
            Ok(LoadedAssets {
                clips: demo::demo_clips(&config.animation),
                ..LoadedAssets::demo()
            })
        } else {
            load_all(&config.assets)
        };

        let mut state = Self {
            session: None,
            load_error: None,
            minimap_camera: None,
            input: InputState::new(),
            last_report: None,
            show_hud: true,
            dragging: false,
            last_cursor: None,
            viewport_height: 720.0,
            last_frame: Instant::now(),
        };

        match loaded {
            Ok(assets) => {
                let mut config = config;
                if demo_mode {
                    config.character.initial_position = demo::start_position(&config.maze);
                }
                tracing::debug!(
                    nodes = assets.character.len(),
                    "character mesh loaded; drawn as a proxy box"
                );
                let world = World::from_nodes(assets.maze, &config.maze);
                if config.minimap.enabled {
                    state.minimap_camera =
                        MinimapCamera::fit(&world.bounds(), &config.minimap, config.maze.scale);
                }
                state.session = Some(Session::new(config, world, assets.clips));
            }
            Err(err) => {
                state.load_error = Some(err.to_string());
            }
        }
        state
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;
        if let Some(session) = &mut self.session {
            self.last_report = Some(session.update(dt, &self.input));
        }
    }

    fn handle_key(&mut self, key: &Key, pressed: bool) {
        if pressed && *key == Key::Named(NamedKey::F1) {
            self.show_hud = !self.show_hud;
            return;
        }
        if let Some(name) = key_name(key) {
            self.input.set_key(&name, pressed);
        }
    }

    /// A press the HUD took never starts a drag; any release ends one.
    fn left_button(&mut self, pressed: bool, consumed_by_ui: bool) {
        self.dragging = pressed && !consumed_by_ui;
    }

    fn cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        if let (true, Some(last), Some(session)) = (self.dragging, self.last_cursor, &mut self.session) {
            session.orbit_mut().rotate(
                (position.x - last.x) as f32,
                (position.y - last.y) as f32,
                self.viewport_height,
            );
        }
        self.last_cursor = Some(position);
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if let Some(error) = &self.load_error {
            egui::TopBottomPanel::top("load_error").show(ctx, |ui| {
                ui.colored_label(
                    egui::Color32::from_rgb(220, 40, 40),
                    format!("Failed to load the maze walkthrough: {error}"),
                );
            });
            return;
        }

        if !self.show_hud {
            return;
        }
        let Some(report) = &self.last_report else {
            return;
        };

        egui::Window::new("Walkthrough")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.label(format!("Frame: {}  t={:.1}s", report.frame, report.elapsed));
                ui.label(format!(
                    "Position: ({:.1}, {:.1}, {:.1})",
                    report.position.x, report.position.y, report.position.z
                ));
                ui.label(format!("Heading: {:.2} rad", report.yaw));
                ui.label(format!(
                    "Animation: {}{}",
                    report.animation.as_deref().unwrap_or("none"),
                    if report.busy { " (busy)" } else { "" }
                ));
                ui.label(format!(
                    "Moving: {}{}",
                    report.movement.moving,
                    if report.movement.trying_to_move && !report.movement.moving {
                        " (blocked)"
                    } else {
                        ""
                    }
                ));
                ui.separator();
                ui.label(format!(
                    "Camera: ({:.1}, {:.1}, {:.1})",
                    report.camera.x, report.camera.y, report.camera.z
                ));
                match report.rig.wall_hit {
                    Some(d) => ui.label(format!("Wall behind camera at {d:.1}")),
                    None => ui.label("Camera line of sight clear"),
                };
                ui.separator();
                ui.small("F1: Toggle HUD | LMB drag: Orbit | Wheel: Zoom | WASD/Arrows: Move | Space: Action");
            });
    }
}

/// Window and GPU resources, created on the first resume.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, world: &World) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Maze Walkthrough")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("creating window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("creating surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("mazewalk_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("creating device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height, world);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn redraw(&mut self) {
        self.state.update();

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let scene_drawn = match &self.state.session {
            Some(session) => {
                let frame = SceneFrame::build(
                    session,
                    gpu.config.width,
                    gpu.config.height,
                    self.state.minimap_camera.as_ref(),
                );
                gpu.renderer.render(&gpu.device, &gpu.queue, &view, &frame);
                true
            }
            None => false,
        };

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let load = if scene_drawn {
                wgpu::LoadOp::Load
            } else {
                wgpu::LoadOp::Clear(wgpu::Color::BLACK)
            };
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        let empty = World::empty();
        let world = self.state.session.as_ref().map_or(&empty, Session::world);
        match Gpu::new(event_loop, &self.egui_ctx, world) {
            Ok(gpu) => {
                self.state.viewport_height = gpu.config.height as f32;
                self.gpu = Some(gpu);
            }
            Err(err) => {
                tracing::error!("failed to initialize graphics: {err:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match &mut self.gpu {
            Some(gpu) => gpu.egui_winit.on_window_event(&gpu.window, &event).consumed,
            None => false,
        };
        // Releases over the HUD still have to end a drag.
        if let WindowEvent::MouseInput {
            button: MouseButton::Left,
            state: btn_state,
            ..
        } = event
        {
            self.state
                .left_button(btn_state == ElementState::Pressed, consumed);
            return;
        }
        if consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                    self.state.viewport_height = gpu.config.height as f32;
                }
            }
            WindowEvent::Focused(false) => {
                self.state.input.clear();
                self.state.dragging = false;
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(&logical_key, key_state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.cursor_moved(position);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(session) = &mut self.state.session {
                    session.orbit_mut().zoom(wheel_steps(delta));
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("mazewalk-desktop starting");

    let mut config = match &cli.config {
        Some(path) => GameConfig::from_yaml_file(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(root) = &cli.assets {
        config = config.with_asset_root(root);
    }
    if cli.no_minimap {
        config.minimap.enabled = false;
    }

    let state = AppState::new(config, cli.demo);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::SmolStr;

    #[test]
    fn keys_map_to_input_names() {
        assert_eq!(key_name(&Key::Character(SmolStr::new("W"))).as_deref(), Some("w"));
        assert_eq!(key_name(&Key::Named(NamedKey::Space)).as_deref(), Some(" "));
        assert_eq!(
            key_name(&Key::Named(NamedKey::ArrowLeft)).as_deref(),
            Some("arrowleft")
        );
        assert_eq!(key_name(&Key::Named(NamedKey::Shift)), None);
    }

    #[test]
    fn demo_mode_starts_a_session() {
        let state = AppState::new(GameConfig::default(), true);
        assert!(state.load_error.is_none());
        let session = state.session.as_ref().unwrap();
        assert!(!session.world().walls().is_empty());
        assert!(state.minimap_camera.is_some());
    }

    #[test]
    fn failed_load_never_updates() {
        let mut config = GameConfig::default();
        config.assets.maze = PathBuf::from("/nonexistent/maze.glb");
        let mut state = AppState::new(config, false);
        assert!(state.load_error.is_some());
        assert!(state.session.is_none());
        state.input.key_down("w");
        state.update();
        assert!(state.last_report.is_none());
    }

    #[test]
    fn f1_toggles_hud_without_touching_input() {
        let mut state = AppState::new(GameConfig::default(), true);
        state.handle_key(&Key::Named(NamedKey::F1), true);
        assert!(!state.show_hud);
        assert_eq!(state.input.held_count(), 0);
    }

    #[test]
    fn release_over_hud_ends_drag() {
        let mut state = AppState::new(GameConfig::default(), true);
        state.cursor_moved(PhysicalPosition::new(100.0, 100.0));
        state.left_button(true, false);
        assert!(state.dragging);
        state.left_button(false, true);
        assert!(!state.dragging);

        state.cursor_moved(PhysicalPosition::new(180.0, 140.0));
        let session = state.session.as_ref().unwrap();
        assert!(!session.orbit().has_pending_input());
    }

    #[test]
    fn press_on_hud_does_not_orbit() {
        let mut state = AppState::new(GameConfig::default(), true);
        state.cursor_moved(PhysicalPosition::new(100.0, 100.0));
        state.left_button(true, true);
        state.cursor_moved(PhysicalPosition::new(150.0, 100.0));
        assert!(!state.session.as_ref().unwrap().orbit().has_pending_input());
    }
}

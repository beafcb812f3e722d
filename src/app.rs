use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use life_backdrop::config::{grid_dimensions, Settings, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use life_backdrop::simulation::{Simulation, Snapshot};

use crate::gpu::{CellBuffers, GpuContext, RenderPipeline};

/// GPU resources for painting the grid
struct Renderer {
    gpu: GpuContext,
    pipeline: RenderPipeline,
    buffers: CellBuffers,
    bind_group: wgpu::BindGroup,
    /// Revision of the last snapshot uploaded to `buffers`
    uploaded_revision: Option<u64>,
}

impl Renderer {
    fn new(gpu: GpuContext, snapshot: Snapshot<'_>, cell_size: u32) -> Self {
        let pipeline = RenderPipeline::new(&gpu.device, gpu.format());
        let (width, height) = snapshot.grid.dimensions();
        let buffers = CellBuffers::new(&gpu.device, width as u32, height as u32);
        buffers.update_params(&gpu.queue, cell_size, gpu.format().is_srgb());
        let bind_group = pipeline.create_bind_group(&gpu.device, &buffers);

        Self {
            gpu,
            pipeline,
            buffers,
            bind_group,
            uploaded_revision: None,
        }
    }

    /// Bring the GPU copy up to date with `snapshot`.
    ///
    /// Grids never change size in place, so new dimensions mean new buffers.
    fn sync(&mut self, snapshot: Snapshot<'_>, cell_size: u32) {
        if !self.buffers.matches(snapshot.grid) {
            let (width, height) = snapshot.grid.dimensions();
            log::debug!("Rebuilding cell buffers for {}x{}", width, height);
            self.buffers = CellBuffers::new(&self.gpu.device, width as u32, height as u32);
            self.buffers
                .update_params(&self.gpu.queue, cell_size, self.gpu.format().is_srgb());
            self.bind_group = self.pipeline.create_bind_group(&self.gpu.device, &self.buffers);
            self.uploaded_revision = None;
        }

        if self.uploaded_revision != Some(snapshot.revision) {
            self.buffers.upload_cells(&self.gpu.queue, snapshot.grid);
            self.uploaded_revision = Some(snapshot.revision);
        }
    }

    fn draw(&mut self) {
        let output = match self.gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.gpu.reconfigure();
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        self.pipeline.draw(&mut encoder, &view, &self.bind_group);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

/// Render/interaction surface around a [`Simulation`]
pub struct App {
    settings: Settings,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    simulation: Option<Simulation>,
    cursor: Option<PhysicalPosition<f64>>,
    title_revision: Option<u64>,
    init_error: Option<anyhow::Error>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            window: None,
            renderer: None,
            simulation: None,
            cursor: None,
            title_revision: None,
            init_error: None,
        }
    }

    /// Error that aborted initialization, if any
    pub fn take_init_error(&mut self) -> Option<anyhow::Error> {
        self.init_error.take()
    }

    fn grid_size_for(&self, size: PhysicalSize<u32>) -> (usize, usize) {
        grid_dimensions(size.width, size.height, self.settings.cell_size)
    }

    fn render(&mut self) {
        let (Some(renderer), Some(simulation)) = (self.renderer.as_mut(), self.simulation.as_ref())
        else {
            return;
        };

        let snapshot = simulation.snapshot();
        renderer.sync(snapshot, self.settings.cell_size);
        renderer.draw();

        if self.title_revision != Some(snapshot.revision) {
            if let Some(window) = &self.window {
                window.set_title(&format!(
                    "Game of Life - Gen {} - {}",
                    snapshot.generation,
                    simulation.status().label()
                ));
            }
            self.title_revision = Some(snapshot.revision);
        }
    }

    fn handle_key(&mut self, key_code: KeyCode) {
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };

        match key_code {
            KeyCode::Space => {
                simulation.toggle();
                log::info!("Status: {}", simulation.status().label());
            }
            KeyCode::KeyN | KeyCode::ArrowRight => {
                simulation.step_once();
            }
            KeyCode::KeyR => simulation.reset(),
            KeyCode::KeyC => simulation.clear_all(),
            _ => {}
        }
    }

    fn handle_click(&mut self) {
        let (Some(simulation), Some(cursor)) = (self.simulation.as_mut(), self.cursor) else {
            return;
        };

        let cell_size = f64::from(self.settings.cell_size);
        let x = (cursor.x / cell_size).floor() as i64;
        let y = (cursor.y / cell_size).floor() as i64;
        simulation.handle_click(x, y);
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.gpu.resize(new_size);
        }
        if new_size.width == 0 || new_size.height == 0 {
            // Minimized; keep the current grid
            return;
        }

        let (width, height) = self.grid_size_for(new_size);
        let auto_play = self.settings.auto_play;
        if let Some(simulation) = self.simulation.as_mut() {
            if simulation.grid().dimensions() != (width, height) {
                simulation.resize(width, height);
                if auto_play {
                    simulation.start();
                }
            }
        }
    }

    /// Cancel the tick schedule before any GPU or window state goes away
    fn shutdown(&mut self) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.stop();
        }
        self.renderer = None;
        self.window = None;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        log::info!("Initializing Game of Life backdrop...");

        let window_attrs = Window::default_attributes()
            .with_title("Game of Life - Initializing...")
            .with_inner_size(winit::dpi::LogicalSize::new(
                DEFAULT_WINDOW_WIDTH,
                DEFAULT_WINDOW_HEIGHT,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.init_error = Some(anyhow::Error::new(e).context("failed to create window"));
                event_loop.exit();
                return;
            }
        };

        log::info!("Creating GPU context...");
        let gpu = match pollster::block_on(GpuContext::new(window.clone())) {
            Ok(gpu) => gpu,
            Err(e) => {
                self.init_error = Some(e);
                event_loop.exit();
                return;
            }
        };

        let (width, height) = self.grid_size_for(window.inner_size());
        log::info!("Grid size: {}x{} (cell size {}px)", width, height, self.settings.cell_size);
        let mut simulation = Simulation::new(width, height, &self.settings);
        if self.settings.auto_play {
            simulation.start();
        }

        let renderer = Renderer::new(gpu, simulation.snapshot(), self.settings.cell_size);

        log::info!("Initialization complete!");
        log::info!("Controls:");
        log::info!("  Click: Toggle cell");
        log::info!("  Space: Play/pause");
        log::info!("  N/Right: Step one generation");
        log::info!("  R: Reset with a random grid");
        log::info!("  C: Clear all cells");
        log::info!("  Escape: Quit");

        window.request_redraw();
        self.window = Some(window);
        self.renderer = Some(renderer);
        self.simulation = Some(simulation);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() && !event.repeat {
                    if let PhysicalKey::Code(key_code) = event.physical_key {
                        if key_code == KeyCode::Escape {
                            log::info!("Escape pressed, exiting...");
                            self.shutdown();
                            event_loop.exit();
                        } else {
                            self.handle_key(key_code);
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.handle_click();
            }
            WindowEvent::Resized(new_size) => {
                log::info!("Window resized to {}x{}", new_size.width, new_size.height);
                self.handle_resize(new_size);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };

        simulation.advance(Instant::now());

        let drawn = self.renderer.as_ref().and_then(|r| r.uploaded_revision);
        if drawn != Some(simulation.revision()) {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }

        event_loop.set_control_flow(match simulation.next_deadline() {
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        });
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

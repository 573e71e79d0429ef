use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

mod config;
mod error;
mod mesh;
mod occluder;
mod renderer;
mod ui;
mod viewer;

use config::{Args, ViewerConfig};
use error::ViewerError;
use mesh::{MODELS, model_index};
use occluder::VoxelOccluderGenerator;
use renderer::{GpuState, WgpuDevice};
use ui::{PanelInfo, UiActions, UiState, apply_theme, draw_side_panel};
use viewer::ViewerController;

type Controller = ViewerController<WgpuDevice, VoxelOccluderGenerator>;

struct App {
    config: ViewerConfig,

    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    viewer: Option<Controller>,
    ui_state: Option<UiState>,

    fatal: Option<ViewerError>,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),
            viewer: None,
            ui_state: None,
            fatal: None,
        }
    }

    fn init(&mut self, window: Arc<Window>) -> Result<(), ViewerError> {
        let gpu = pollster::block_on(GpuState::new(window.clone()))?;

        let viewer = ViewerController::new(
            gpu.render_device(),
            VoxelOccluderGenerator::with_max_cells(self.config.max_voxel_cells),
            self.config.viewer_options(),
        )?;
        let selected = model_index(viewer.active_model().id).unwrap_or(0);
        let ui_state = UiState::new(selected, viewer.config(), self.config.depth_test);

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
        self.viewer = Some(viewer);
        self.ui_state = Some(ui_state);
        Ok(())
    }

    fn render(&mut self) -> Result<(), ViewerError> {
        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return Ok(());
        };
        let (Some(viewer), Some(ui_state)) = (&self.viewer, &mut self.ui_state) else {
            return Ok(());
        };

        let raw_input = egui_state.take_egui_input(window);

        let mut ui_actions = UiActions::default();
        let info = PanelInfo {
            limits: viewer.limits(),
            vertex_count: viewer.vertex_count(),
            index_count: viewer.index_count(),
            stats: viewer.last_stats(),
        };

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = draw_side_panel(ctx, ui_state, &info);
        });

        self.handle_ui_actions(ui_actions)?;

        let Some(gpu) = &mut self.gpu else { return Ok(()) };
        let Some(window) = &self.window else { return Ok(()) };
        let Some(egui_state) = &mut self.egui_state else {
            return Ok(());
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return Ok(());
        };
        let (Some(viewer), Some(ui_state)) = (&mut self.viewer, &self.ui_state) else {
            return Ok(());
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.size);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(ViewerError::Gpu("surface out of memory".into()));
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("Surface timeout, skipping frame");
                return Ok(());
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        let plan = viewer.render_frame(
            gpu.config.width,
            gpu.config.height,
            ui_state.depth_test,
            self.config.rotation_step,
        );
        gpu.render_scene(&view, &mut encoder, &plan);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        window.request_redraw();
        Ok(())
    }

    /// Non-fatal failures end up in the panel. Device failures are returned.
    fn handle_ui_actions(&mut self, actions: UiActions) -> Result<(), ViewerError> {
        let (Some(viewer), Some(ui_state)) = (&mut self.viewer, &mut self.ui_state) else {
            return Ok(());
        };

        for parameter in actions.parameters {
            viewer.set_parameter(parameter);
        }

        let selected = actions
            .select_model
            .and_then(|i| MODELS.get(i).map(|model| (i, model)));
        if let Some((index, model)) = selected {
            match viewer.select_model(model.id) {
                Ok(()) => {
                    ui_state.selected_model = index;
                    ui_state.sync(viewer.config());
                    ui_state.last_error = None;
                }
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => {
                    log::warn!("{}", err);
                    ui_state.last_error = Some(err.to_string());
                }
            }
        }

        if actions.generate {
            match viewer.regenerate_occluder() {
                Ok(()) => ui_state.last_error = None,
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => {
                    log::warn!("{}", err);
                    ui_state.last_error = Some(err.to_string());
                }
            }
        }

        Ok(())
    }

    /// Stops the loop. `run` reports the error once the loop has returned.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ViewerError) {
        if let Some(viewer) = &mut self.viewer {
            viewer.shutdown();
        }
        self.fatal = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, ViewerError::Gpu(e.to_string())),
        };

        if let Err(err) = self.init(window) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(egui_state) = &mut self.egui_state {
            if let Some(window) = &self.window {
                let response = egui_state.on_window_event(window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.shutdown();
                }
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(err) = self.render() {
                    self.fail(event_loop, err);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn run(args: &Args) -> Result<(), ViewerError> {
    let config = ViewerConfig::from_args(args)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

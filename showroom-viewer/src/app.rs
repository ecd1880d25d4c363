//! winit application driving an [`Experience`] at display rate

use crate::experience::{Experience, UiAction};
use crate::orbit::DragButton;
use crate::ui;
use showroom_core::{ArRuntime, CameraRig, Error, Lighting, Result};
use showroom_gpu::{GpuMesh, MeshRenderer};
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 800;

/// GPU-side state that only exists while a window is open
struct RenderState {
    renderer: MeshRenderer,
    mesh: Option<GpuMesh>,
    // What the renderer was last given; the landing page swaps both when the viewer changes
    lighting: Lighting,
    background: [f64; 4],
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl RenderState {
    async fn new(window: Arc<Window>, experience: &Experience) -> Result<Self> {
        let renderer = MeshRenderer::new(window.clone(), experience.lighting(), experience.background()).await?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(renderer.device(), renderer.surface_format(), None, 1, false);

        Ok(Self {
            renderer,
            mesh: None,
            lighting: experience.lighting().clone(),
            background: experience.background(),
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    fn sync_scene(&mut self, experience: &Experience) {
        if self.lighting != *experience.lighting() {
            self.lighting = experience.lighting().clone();
            self.renderer.set_lighting(&self.lighting);
        }
        let background = experience.background();
        if self.background != background {
            self.background = background;
            self.renderer.set_background(background);
        }
    }
}

/// Application state machine
enum AppState {
    /// Before the window is created
    Uninitialized,
    /// Window and graphics context are ready
    Running { window: Arc<Window>, render: Box<RenderState> },
}

/// Window shell around an experience
pub struct ViewerApp<R: ArRuntime> {
    experience: Experience,
    runtime: R,
    state: AppState,
    error: Option<Error>,
}

impl<R: ArRuntime> ViewerApp<R> {
    pub fn new(experience: Experience, runtime: R) -> Self {
        Self {
            experience,
            runtime,
            state: AppState::Uninitialized,
            error: None,
        }
    }

    /// Open the window and run until it is closed
    pub fn run(mut self) -> Result<()> {
        let event_loop =
            EventLoop::new().map_err(|e| Error::Visualization(format!("Failed to create event loop: {}", e)))?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self)
            .map_err(|e| Error::Visualization(format!("Event loop error: {}", e)))?;

        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = WindowAttributes::default()
            .with_title(self.experience.window_title())
            .with_inner_size(LogicalSize::new(DEFAULT_WIDTH, DEFAULT_HEIGHT));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|e| Error::Visualization(format!("Failed to create window: {}", e)))?,
        );

        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);

        let render = pollster::block_on(RenderState::new(window.clone(), &self.experience))?;
        self.experience.set_aspect_ratio(render.renderer.aspect_ratio());

        self.state = AppState::Running {
            window,
            render: Box::new(render),
        };
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    /// Handle pointer input for the orbit controls. Returns whether the camera moved.
    fn navigate(&mut self, event: &WindowEvent) -> bool {
        let (orbit, camera) = self.experience.navigation();
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => DragButton::Primary,
                    MouseButton::Right | MouseButton::Middle => DragButton::Secondary,
                    _ => return false,
                };
                orbit.button(button, *state == ElementState::Pressed);
                false
            }
            WindowEvent::CursorMoved { position, .. } => orbit.cursor_moved(position.x, position.y, camera),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                orbit.scrolled(lines, camera)
            }
            _ => false,
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let AppState::Running { window, render } = &mut self.state else {
            return Ok(());
        };

        self.experience.tick();
        if let Some(mesh) = self.experience.presenter_mut().take_mesh() {
            log::info!("Uploading model: {} vertices, {} faces", mesh.vertex_count(), mesh.face_count());
            render.mesh = Some(render.renderer.upload(&mesh));
        }
        render.sync_scene(&self.experience);

        let camera = self.experience.camera();
        render
            .renderer
            .update_camera(&camera.view_matrix(), &camera.projection_matrix(), &camera.position());
        render.renderer.update_model(&self.experience.model_matrix());

        // UI
        let raw_input = render.egui_state.take_egui_input(window);
        let mut actions: Vec<UiAction> = Vec::new();
        let experience = &self.experience;
        let full_output = render.egui_ctx.run(raw_input, |ctx| {
            actions = ui::show(ctx, experience);
        });
        render.egui_state.handle_platform_output(window, full_output.platform_output);
        let paint_jobs = render.egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let Some(mut frame) = render.renderer.begin_frame()? else {
            return Ok(());
        };

        render.renderer.draw(&mut frame, render.mesh.as_ref());

        for (id, image_delta) in &full_output.textures_delta.set {
            render
                .egui_renderer
                .update_texture(render.renderer.device(), render.renderer.queue(), *id, image_delta);
        }

        let size = render.renderer.size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: full_output.pixels_per_point,
        };
        let callback_buffers = render.egui_renderer.update_buffers(
            render.renderer.device(),
            render.renderer.queue(),
            &mut frame.encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut render_pass = frame
                .encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &frame.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            render.egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        if !callback_buffers.is_empty() {
            render.renderer.queue().submit(callback_buffers);
        }
        render.renderer.present(frame);

        for id in &full_output.textures_delta.free {
            render.egui_renderer.free_texture(id);
        }

        // Clicks act from the next frame on, like any other pulse
        for action in actions {
            log::debug!("UI action: {:?}", action);
            self.experience.handle(action, &self.runtime);
        }

        Ok(())
    }
}

impl<R: ArRuntime> ApplicationHandler for ViewerApp<R> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let AppState::Uninitialized = &self.state {
            if let Err(e) = self.init(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let AppState::Running { window, render } = &mut self.state else {
            return;
        };

        // Let egui handle the event first
        let egui_consumed = render.egui_state.on_window_event(window, &event).consumed;

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                render.renderer.resize(physical_size);
                let aspect_ratio = render.renderer.aspect_ratio();
                self.experience.set_aspect_ratio(aspect_ratio);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if !egui_consumed => match key_code {
                KeyCode::Escape => {
                    log::info!("Escape pressed, exiting...");
                    event_loop.exit();
                }
                KeyCode::KeyR => {
                    if self.experience.reset_camera() {
                        log::info!("Camera reset");
                    }
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::MouseInput { .. } | WindowEvent::CursorMoved { .. } | WindowEvent::MouseWheel { .. } => {
                // Releases always reach the controls so a drag never sticks
                let release = matches!(event, WindowEvent::MouseInput { state: ElementState::Released, .. });
                if !egui_consumed || release {
                    self.navigate(&event);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Running { window, .. } = &self.state else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };
        window.request_redraw();
    }
}

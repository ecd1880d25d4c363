//! Mesh renderer presenting to a window surface

use crate::device::{GpuContext, DEPTH_FORMAT};
use crate::lighting::LightingUniform;
use crate::mesh::{GpuMesh, MeshVertex};
use bytemuck::{Pod, Zeroable};
use nalgebra::Matrix4;
use showroom_core::{Error, Lighting, Point3f, Result, TriangleMesh};
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Camera uniform data for mesh rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshCameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

impl MeshCameraUniform {
    pub fn new(view: &Matrix4<f32>, proj: &Matrix4<f32>, eye: &Point3f) -> Self {
        Self {
            view_proj: (proj * view).into(),
            eye: [eye.x, eye.y, eye.z, 1.0],
        }
    }
}

/// Model matrix and the matrix used to transform normals
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn new(model: &Matrix4<f32>) -> Self {
        // Inverse transpose keeps normals perpendicular under non-uniform scale
        let normal = model
            .try_inverse()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            model: (*model).into(),
            normal: normal.into(),
        }
    }
}

/// Surface texture and encoder of the frame being drawn.
///
/// Overlays (the UI) record into `encoder` targeting `view` between
/// [`MeshRenderer::draw`] and [`MeshRenderer::present`].
pub struct Frame {
    output: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// Renders one triangle mesh with a model transform, a camera and a lighting rig
pub struct MeshRenderer {
    pub context: GpuContext,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    depth_view: wgpu::TextureView,
    camera_buffer: wgpu::Buffer,
    model_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    background: wgpu::Color,
}

impl MeshRenderer {
    /// Create a renderer drawing into `window`
    pub async fn new(window: Arc<Window>, lighting: &Lighting, background: [f64; 4]) -> Result<Self> {
        let size = window.inner_size();
        let (context, surface) = GpuContext::for_window(window).await?;

        let surface_caps = surface.get_capabilities(&context.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| Error::Gpu("Surface reports no supported formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        log::info!("Surface format: {:?}", surface_format);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&context.device, &surface_config);

        let depth_view = context.create_depth_view(surface_config.width, surface_config.height);

        let camera_uniform = MeshCameraUniform::new(&Matrix4::identity(), &Matrix4::identity(), &Point3f::origin());
        let camera_buffer = context.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::bytes_of(&camera_uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let model_uniform = ModelUniform::new(&Matrix4::identity());
        let model_buffer = context.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Buffer"),
            contents: bytemuck::bytes_of(&model_uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let lighting_uniform = LightingUniform::from_lighting(lighting);
        let lighting_buffer = context.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lighting Buffer"),
            contents: bytemuck::bytes_of(&lighting_uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = context.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[uniform_entry(0), uniform_entry(1), uniform_entry(2)],
            label: Some("mesh_bind_group_layout"),
        });

        let bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: model_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: lighting_buffer.as_entire_binding(),
                },
            ],
            label: Some("mesh_bind_group"),
        });

        let shader = context.create_shader_module("Mesh Shader", include_str!("shaders/mesh.wgsl"));
        let pipeline = Self::create_render_pipeline(&context.device, &bind_group_layout, &shader, surface_format);

        Ok(Self {
            context,
            surface,
            surface_config,
            pipeline,
            depth_view,
            camera_buffer,
            model_buffer,
            lighting_buffer,
            bind_group,
            background: to_wgpu_color(background),
        })
    }

    fn create_render_pipeline(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Render Pipeline Layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Render Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Imported models are not guaranteed to be closed or consistently wound
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
            multiview: None,
            cache: None,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.context.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.context.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.surface_config.width, self.surface_config.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.surface_config.width as f32 / self.surface_config.height.max(1) as f32
    }

    /// Resize renderer
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface.configure(&self.context.device, &self.surface_config);
            self.depth_view = self.context.create_depth_view(new_size.width, new_size.height);
        }
    }

    /// Update camera matrices and position
    pub fn update_camera(&self, view: &Matrix4<f32>, proj: &Matrix4<f32>, eye: &Point3f) {
        let uniform = MeshCameraUniform::new(view, proj, eye);
        self.context.queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Update the model matrix
    pub fn update_model(&self, model: &Matrix4<f32>) {
        let uniform = ModelUniform::new(model);
        self.context.queue.write_buffer(&self.model_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Replace the lighting rig
    pub fn set_lighting(&self, lighting: &Lighting) {
        let uniform = LightingUniform::from_lighting(lighting);
        self.context.queue.write_buffer(&self.lighting_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn set_background(&mut self, background: [f64; 4]) {
        self.background = to_wgpu_color(background);
    }

    /// Upload a mesh for drawing
    pub fn upload(&self, mesh: &TriangleMesh) -> GpuMesh {
        GpuMesh::upload(&self.context, mesh)
    }

    /// Acquire the next surface texture.
    ///
    /// Returns `Ok(None)` when the surface had to be reconfigured and the
    /// frame should be skipped.
    pub fn begin_frame(&mut self) -> Result<Option<Frame>> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.context.device, &self.surface_config);
                return Ok(None);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                return Ok(None);
            }
            Err(e) => return Err(Error::Gpu(format!("Failed to get surface texture: {}", e))),
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self.context.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Mesh Render Encoder"),
        });

        Ok(Some(Frame { output, view, encoder }))
    }

    /// Clear the frame and draw `mesh`, if any
    pub fn draw(&self, frame: &mut Frame, mesh: Option<&GpuMesh>) {
        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Mesh Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.background),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Some(mesh) = mesh.filter(|m| !m.is_empty()) {
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    /// Submit the recorded commands and show the frame
    pub fn present(&self, frame: Frame) {
        let Frame { output, encoder, .. } = frame;
        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

fn to_wgpu_color(rgba: [f64; 4]) -> wgpu::Color {
    wgpu::Color {
        r: rgba[0],
        g: rgba[1],
        b: rgba[2],
        a: rgba[3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<MeshCameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 128);
    }

    #[test]
    fn test_camera_uniform_multiplies_projection_first() {
        let view = Matrix4::new_translation(&Vector3::new(0.0, 0.0, -5.0));
        let proj = Matrix4::new_scaling(2.0);
        let uniform = MeshCameraUniform::new(&view, &proj, &Point3f::new(0.0, 0.0, 5.0));

        let expected: [[f32; 4]; 4] = (proj * view).into();
        assert_eq!(uniform.view_proj, expected);
        assert_eq!(uniform.eye, [0.0, 0.0, 5.0, 1.0]);
    }

    #[test]
    fn test_normal_matrix_undoes_non_uniform_scale() {
        let model = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 1.0, 1.0));
        let uniform = ModelUniform::new(&model);
        let normal = Matrix4::from(uniform.normal);
        assert_relative_eq!(normal[(0, 0)], 0.5);
        assert_relative_eq!(normal[(1, 1)], 1.0);
    }

    #[test]
    fn test_singular_model_falls_back_to_identity_normals() {
        let uniform = ModelUniform::new(&Matrix4::new_scaling(0.0));
        assert_eq!(Matrix4::from(uniform.normal), Matrix4::identity());
    }
}

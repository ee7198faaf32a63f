// crates/engine_render/src/passes/light_pass.rs

use glam::{Mat4, Vec3};

use crate::context::GraphicsContext;
use crate::error::RenderError;
use crate::mesh::{GpuMesh, ModelVertex};
use crate::uniform::{CameraBlock, LightBlock, MatrixBlock, SharedLayouts, UniformBuffer};

use super::{backbuffer_attachment, create_render_pipeline, PipelineParams};

/// Diffuse/specular wrapper: directional light with a Blinn-Phong specular
/// term, which is why it also needs the camera position.
pub struct LightPass {
    pipeline: wgpu::RenderPipeline,
    matrix_buffer: UniformBuffer<MatrixBlock>,
    light_buffer: UniformBuffer<LightBlock>,
    camera_buffer: UniformBuffer<CameraBlock>,
}

impl LightPass {
    pub fn new(ctx: &GraphicsContext, layouts: &SharedLayouts) -> Result<Self, RenderError> {
        let shader = ctx
            .device
            .create_shader_module(wgpu::include_wgsl!("../../../../assets/shaders/light.wgsl"));

        let pipeline = create_render_pipeline(
            &ctx.device,
            PipelineParams {
                label: "Light Pipeline",
                shader: &shader,
                bind_group_layouts: &[&layouts.uniform, &layouts.uniform, &layouts.uniform],
                vertex_layouts: &[ModelVertex::desc()],
                color_format: ctx.color_format,
                blend: None,
                depth: true,
                topology: wgpu::PrimitiveTopology::TriangleList,
            },
        );

        Ok(Self {
            pipeline,
            matrix_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Light Matrix Block"),
            light_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Light Block"),
            camera_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Light Camera Block"),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        ctx: &GraphicsContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth: wgpu::RenderPassDepthStencilAttachment<'_>,
        mesh: &GpuMesh,
        world: Mat4,
        view_matrix: Mat4,
        projection: Mat4,
        light: &LightBlock,
        camera_position: Vec3,
        clear: Option<wgpu::Color>,
    ) -> Result<(), RenderError> {
        self.matrix_buffer
            .upload(&ctx.queue, &MatrixBlock::pack(world, view_matrix, projection));
        self.light_buffer.upload(&ctx.queue, light);
        self.camera_buffer
            .upload(&ctx.queue, &CameraBlock::new(camera_position));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Light Pass"),
            color_attachments: &[Some(backbuffer_attachment(view, clear))],
            depth_stencil_attachment: Some(depth),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        self.matrix_buffer.bind(&mut pass, 0);
        self.light_buffer.bind(&mut pass, 1);
        self.camera_buffer.bind(&mut pass, 2);
        mesh.bind(&mut pass);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);

        Ok(())
    }
}

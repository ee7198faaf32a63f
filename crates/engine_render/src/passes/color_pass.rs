// crates/engine_render/src/passes/color_pass.rs

use glam::Mat4;

use crate::context::GraphicsContext;
use crate::error::RenderError;
use crate::mesh::{GpuMesh, ModelVertex};
use crate::uniform::{MatrixBlock, PixelBlock, SharedLayouts, UniformBuffer};

use super::{backbuffer_attachment, create_render_pipeline, PipelineParams};

/// Simplest wrapper: vertex color times a flat tint.
pub struct ColorPass {
    pipeline: wgpu::RenderPipeline,
    matrix_buffer: UniformBuffer<MatrixBlock>,
    pixel_buffer: UniformBuffer<PixelBlock>,
}

impl ColorPass {
    pub fn new(ctx: &GraphicsContext, layouts: &SharedLayouts) -> Result<Self, RenderError> {
        let shader = ctx
            .device
            .create_shader_module(wgpu::include_wgsl!("../../../../assets/shaders/color.wgsl"));

        let pipeline = create_render_pipeline(
            &ctx.device,
            PipelineParams {
                label: "Color Pipeline",
                shader: &shader,
                bind_group_layouts: &[&layouts.uniform, &layouts.uniform],
                vertex_layouts: &[ModelVertex::desc()],
                color_format: ctx.color_format,
                blend: None,
                depth: true,
                topology: wgpu::PrimitiveTopology::TriangleList,
            },
        );

        Ok(Self {
            pipeline,
            matrix_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Color Matrix Block"),
            pixel_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Pixel Block"),
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
        tint: PixelBlock,
        clear: Option<wgpu::Color>,
    ) -> Result<(), RenderError> {
        self.matrix_buffer
            .upload(&ctx.queue, &MatrixBlock::pack(world, view_matrix, projection));
        self.pixel_buffer.upload(&ctx.queue, &tint);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Color Pass"),
            color_attachments: &[Some(backbuffer_attachment(view, clear))],
            depth_stencil_attachment: Some(depth),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        self.matrix_buffer.bind(&mut pass, 0);
        self.pixel_buffer.bind(&mut pass, 1);
        mesh.bind(&mut pass);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);

        Ok(())
    }
}

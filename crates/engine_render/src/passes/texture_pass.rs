// crates/engine_render/src/passes/texture_pass.rs

use glam::Mat4;

use crate::context::GraphicsContext;
use crate::error::RenderError;
use crate::mesh::{GpuMesh, ModelVertex};
use crate::texture::{linear_repeat_sampler, Texture};
use crate::uniform::{MatrixBlock, SharedLayouts, UniformBuffer};

use super::{backbuffer_attachment, create_render_pipeline, PipelineParams};

/// Textured wrapper: samples one albedo texture, no lighting.
pub struct TexturePass {
    pipeline: wgpu::RenderPipeline,
    matrix_buffer: UniformBuffer<MatrixBlock>,
    sampler: wgpu::Sampler,
    texture_group: Option<wgpu::BindGroup>,
}

impl TexturePass {
    pub fn new(ctx: &GraphicsContext, layouts: &SharedLayouts) -> Result<Self, RenderError> {
        let shader = ctx.device.create_shader_module(wgpu::include_wgsl!(
            "../../../../assets/shaders/texture.wgsl"
        ));

        let pipeline = create_render_pipeline(
            &ctx.device,
            PipelineParams {
                label: "Texture Pipeline",
                shader: &shader,
                bind_group_layouts: &[&layouts.uniform, &layouts.texture],
                vertex_layouts: &[ModelVertex::desc()],
                color_format: ctx.color_format,
                blend: None,
                depth: true,
                topology: wgpu::PrimitiveTopology::TriangleList,
            },
        );

        Ok(Self {
            pipeline,
            matrix_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Texture Matrix Block"),
            sampler: linear_repeat_sampler(&ctx.device),
            texture_group: None,
        })
    }

    /// Binds the texture this wrapper samples. Call once per texture swap,
    /// not per frame.
    pub fn attach(&mut self, ctx: &GraphicsContext, layouts: &SharedLayouts, texture: &Texture) {
        self.texture_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture Pass Texture"),
            layout: &layouts.texture,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }));
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
        clear: Option<wgpu::Color>,
    ) -> Result<(), RenderError> {
        let texture_group = self
            .texture_group
            .as_ref()
            .ok_or(RenderError::NotInitialised {
                component: "texture pass texture",
            })?;

        self.matrix_buffer
            .upload(&ctx.queue, &MatrixBlock::pack(world, view_matrix, projection));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Texture Pass"),
            color_attachments: &[Some(backbuffer_attachment(view, clear))],
            depth_stencil_attachment: Some(depth),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        self.matrix_buffer.bind(&mut pass, 0);
        pass.set_bind_group(1, texture_group, &[]);
        mesh.bind(&mut pass);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);

        Ok(())
    }
}

// crates/engine_render/src/passes/terrain_pass.rs

use glam::Mat4;

use crate::context::GraphicsContext;
use crate::error::RenderError;
use crate::mesh::TerrainVertex;
use crate::terrain::Terrain;
use crate::uniform::{
    LightBlock, MatrixBlock, SharedLayouts, TerrainAreaBlock, UniformBuffer,
};

use super::{backbuffer_attachment, create_render_pipeline, PipelineParams};

/// Shader wrapper for the heightfield terrain: elevation-banded coloring
/// modulated by a directional light.
pub struct TerrainPass {
    pipeline: wgpu::RenderPipeline,
    matrix_buffer: UniformBuffer<MatrixBlock>,
    light_buffer: UniformBuffer<LightBlock>,
    area_buffer: UniformBuffer<TerrainAreaBlock>,
}

impl TerrainPass {
    pub fn new(ctx: &GraphicsContext, layouts: &SharedLayouts) -> Result<Self, RenderError> {
        let shader = ctx
            .device
            .create_shader_module(wgpu::include_wgsl!("../../../../assets/shaders/terrain.wgsl"));

        let pipeline = create_render_pipeline(
            &ctx.device,
            PipelineParams {
                label: "Terrain Pipeline",
                shader: &shader,
                bind_group_layouts: &[&layouts.uniform, &layouts.uniform, &layouts.uniform],
                vertex_layouts: &[TerrainVertex::desc()],
                color_format: ctx.color_format,
                blend: None,
                depth: true,
                topology: wgpu::PrimitiveTopology::TriangleList,
            },
        );

        Ok(Self {
            pipeline,
            matrix_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Terrain Matrix Block"),
            light_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Terrain Light Block"),
            area_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Terrain Area Block"),
        })
    }

    /// Records the terrain draw into `view`. The world matrix is the
    /// terrain's own centering/elevation offset.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        ctx: &GraphicsContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth: wgpu::RenderPassDepthStencilAttachment<'_>,
        terrain: &Terrain,
        view_matrix: Mat4,
        projection: Mat4,
        light: &LightBlock,
        clear: Option<wgpu::Color>,
    ) -> Result<(), RenderError> {
        let mesh = terrain.mesh()?;

        let world = Mat4::from_translation(terrain.offset());
        self.matrix_buffer
            .upload(&ctx.queue, &MatrixBlock::pack(world, view_matrix, projection));
        self.light_buffer.upload(&ctx.queue, light);
        self.area_buffer.upload(
            &ctx.queue,
            &TerrainAreaBlock {
                min_height: 0.0,
                max_height: (terrain.highest() - terrain.lowest()).max(1.0),
                ..Default::default()
            },
        );

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Terrain Pass"),
            color_attachments: &[Some(backbuffer_attachment(view, clear))],
            depth_stencil_attachment: Some(depth),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        self.matrix_buffer.bind(&mut pass, 0);
        self.light_buffer.bind(&mut pass, 1);
        self.area_buffer.bind(&mut pass, 2);
        mesh.bind(&mut pass);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);

        Ok(())
    }
}

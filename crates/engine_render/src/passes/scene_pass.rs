// crates/engine_render/src/passes/scene_pass.rs

use glam::Mat4;

use crate::context::GraphicsContext;
use crate::error::RenderError;
use crate::mesh::{GpuMesh, ModelVertex};
use crate::uniform::{ClipPlaneBlock, MatrixBlock, SharedLayouts, UniformBuffer};

use super::{create_render_pipeline, PipelineParams};

/// Shader wrapper for re-rendering scene geometry into the reflection and
/// refraction targets with a clip plane (fragments on the negative side are
/// discarded).
///
/// Uniform writes land at queue submit, so the frame driver keeps one
/// instance per offscreen pass (one for reflection with the mirrored view
/// matrix, one for refraction) rather than re-uploading a single instance
/// twice per frame.
pub struct ScenePass {
    pipeline: wgpu::RenderPipeline,
    matrix_buffer: UniformBuffer<MatrixBlock>,
    clip_buffer: UniformBuffer<ClipPlaneBlock>,
}

impl ScenePass {
    pub fn new(ctx: &GraphicsContext, layouts: &SharedLayouts) -> Result<Self, RenderError> {
        let shader = ctx.device.create_shader_module(wgpu::include_wgsl!(
            "../../../../assets/shaders/scene_clip.wgsl"
        ));

        let pipeline = create_render_pipeline(
            &ctx.device,
            PipelineParams {
                label: "Scene Clip Pipeline",
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
            matrix_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Scene Clip Matrix Block"),
            clip_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Clip Plane Block"),
        })
    }

    /// Uploads the camera and clip plane for this instance's offscreen pass.
    /// For reflection the caller supplies the mirrored view matrix; for
    /// refraction the main one.
    pub fn prepare(
        &self,
        ctx: &GraphicsContext,
        world: Mat4,
        view_matrix: Mat4,
        projection: Mat4,
        clip: ClipPlaneBlock,
    ) {
        self.matrix_buffer
            .upload(&ctx.queue, &MatrixBlock::pack(world, view_matrix, projection));
        self.clip_buffer.upload(&ctx.queue, &clip);
    }

    /// Records one mesh into an open offscreen pass (see
    /// `Water::begin_reflection` / `Water::begin_refraction`).
    pub fn draw<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        mesh: &'a GpuMesh,
    ) -> Result<(), RenderError> {
        pass.set_pipeline(&self.pipeline);
        self.matrix_buffer.bind(pass, 0);
        self.clip_buffer.bind(pass, 1);
        mesh.bind(pass);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        Ok(())
    }
}

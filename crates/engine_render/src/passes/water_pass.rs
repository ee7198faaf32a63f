// crates/engine_render/src/passes/water_pass.rs

use glam::{Mat4, Vec3};
use tracing::warn;

use crate::context::GraphicsContext;
use crate::error::{RenderError, WaterPassKind};
use crate::mesh::WaterVertex;
use crate::texture::{clamp_sampler, linear_repeat_sampler};
use crate::uniform::{CameraBlock, MatrixBlock, SharedLayouts, UniformBuffer, WaterBlock};
use crate::water::Water;

use super::{backbuffer_attachment, create_render_pipeline, PipelineParams};

/// Shader wrapper for the water surface.
///
/// Owns two pipelines over the same mesh: the height pipeline writes wave
/// displacement into the offscreen height target, and the surface pipeline
/// composites normal map, reflection, refraction and height with animated
/// distortion.
pub struct WaterPass {
    height_pipeline: wgpu::RenderPipeline,
    surface_pipeline: wgpu::RenderPipeline,
    matrix_buffer: UniformBuffer<MatrixBlock>,
    water_buffer: UniformBuffer<WaterBlock>,
    camera_buffer: UniformBuffer<CameraBlock>,
    texture_layout: wgpu::BindGroupLayout,
    repeat_sampler: wgpu::Sampler,
    clamp_sampler: wgpu::Sampler,
    surface_textures: Option<wgpu::BindGroup>,
}

impl WaterPass {
    pub fn new(ctx: &GraphicsContext, layouts: &SharedLayouts) -> Result<Self, RenderError> {
        let height_shader = ctx.device.create_shader_module(wgpu::include_wgsl!(
            "../../../../assets/shaders/water_height.wgsl"
        ));
        let surface_shader = ctx.device.create_shader_module(wgpu::include_wgsl!(
            "../../../../assets/shaders/water_surface.wgsl"
        ));

        // Normal map + the three offscreen results, with a repeat sampler for
        // the normal map and a clamp sampler for the screen-space targets.
        let texture_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Water Textures BindGroupLayout"),
                    entries: &[
                        texture_entry(0),
                        texture_entry(1),
                        texture_entry(2),
                        texture_entry(3),
                        sampler_entry(4),
                        sampler_entry(5),
                    ],
                });

        let height_pipeline = create_render_pipeline(
            &ctx.device,
            PipelineParams {
                label: "Water Height Pipeline",
                shader: &height_shader,
                bind_group_layouts: &[&layouts.uniform, &layouts.uniform],
                vertex_layouts: &[WaterVertex::desc()],
                color_format: ctx.color_format,
                blend: None,
                depth: false,
                topology: wgpu::PrimitiveTopology::TriangleList,
            },
        );

        let surface_pipeline = create_render_pipeline(
            &ctx.device,
            PipelineParams {
                label: "Water Surface Pipeline",
                shader: &surface_shader,
                bind_group_layouts: &[
                    &layouts.uniform,
                    &layouts.uniform,
                    &layouts.uniform,
                    &texture_layout,
                ],
                vertex_layouts: &[WaterVertex::desc()],
                color_format: ctx.color_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth: true,
                topology: wgpu::PrimitiveTopology::TriangleList,
            },
        );

        Ok(Self {
            height_pipeline,
            surface_pipeline,
            matrix_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Water Matrix Block"),
            water_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Water Block"),
            camera_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Water Camera Block"),
            repeat_sampler: linear_repeat_sampler(&ctx.device),
            clamp_sampler: clamp_sampler(&ctx.device),
            texture_layout,
            surface_textures: None,
        })
    }

    /// Builds the texture bind group from the water system's resources. Call
    /// once after `Water::initialise` and again after `Water::resize`
    /// (resizing recreates the target views).
    pub fn attach(&mut self, ctx: &GraphicsContext, water: &Water) -> Result<(), RenderError> {
        let gpu = water.gpu()?;
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Water Textures"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&gpu.normal_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(gpu.reflection.read_view()?),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(gpu.refraction.read_view()?),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(gpu.height.read_view()?),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.repeat_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&self.clamp_sampler),
                },
            ],
        });
        self.surface_textures = Some(bind_group);
        Ok(())
    }

    /// Uploads this frame's constant blocks once, shared by the height and
    /// surface draws. (Per-queue writes land at submit, so writing the same
    /// buffer twice in one frame would retroactively change earlier passes.)
    pub fn prepare_frame(
        &self,
        ctx: &GraphicsContext,
        water: &Water,
        view_matrix: Mat4,
        projection: Mat4,
        camera_position: Vec3,
    ) {
        let s = water.settings();
        let block = WaterBlock {
            uv_offset: water.uv_offset().to_array(),
            wave_height: s.wave_height,
            wave_scale: s.wave_scale,
            refraction_distortion: s.refraction_distortion,
            reflection_distortion: s.reflection_distortion,
            max_distortion_distance: s.max_distortion_distance,
            refraction_strength: s.refraction_strength,
            reflection_strength: s.reflection_strength,
            water_depth: s.water_depth,
            _pad: [0.0; 2],
        };

        self.matrix_buffer.upload(
            &ctx.queue,
            &MatrixBlock::pack(Mat4::IDENTITY, view_matrix, projection),
        );
        self.water_buffer.upload(&ctx.queue, &block);
        self.camera_buffer
            .upload(&ctx.queue, &CameraBlock::new(camera_position));
    }

    /// Height extraction: draws the displaced mesh into the height target.
    /// No color payload beyond the encoded displacement.
    pub fn draw_height(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        water: &mut Water,
    ) -> Result<(), RenderError> {
        let gpu = water.gpu_mut()?;
        {
            let mut pass = gpu.height.begin_write(encoder, None, wgpu::Color::BLACK);
            pass.set_pipeline(&self.height_pipeline);
            self.matrix_buffer.bind(&mut pass, 0);
            self.water_buffer.bind(&mut pass, 1);
            gpu.mesh.bind(&mut pass);
            pass.draw_indexed(0..gpu.mesh.index_count, 0, 0..1);
        }
        gpu.height.finish_write();
        water.mark_recorded(WaterPassKind::Height);
        Ok(())
    }

    /// Final composite into the backbuffer. Rejected unless the height,
    /// reflection and refraction passes all ran earlier this frame.
    pub fn draw_surface(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth: wgpu::RenderPassDepthStencilAttachment<'_>,
        water: &Water,
    ) -> Result<(), RenderError> {
        if let Err(err) = water.surface_ready() {
            // One object's failure should not take the frame down; the
            // caller skips the draw and keeps going.
            warn!(error = %err, "skipping water surface pass");
            return Err(err);
        }
        let textures = self
            .surface_textures
            .as_ref()
            .ok_or(RenderError::NotInitialised {
                component: "water pass textures",
            })?;
        let gpu = water.gpu()?;

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Water Surface Pass"),
            color_attachments: &[Some(backbuffer_attachment(view, None))],
            depth_stencil_attachment: Some(depth),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.surface_pipeline);
        self.matrix_buffer.bind(&mut pass, 0);
        self.water_buffer.bind(&mut pass, 1);
        self.camera_buffer.bind(&mut pass, 2);
        pass.set_bind_group(3, textures, &[]);
        gpu.mesh.bind(&mut pass);
        pass.draw_indexed(0..gpu.mesh.index_count, 0, 0..1);

        Ok(())
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

// crates/engine_render/src/passes/rain_pass.rs

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::context::GraphicsContext;
use crate::dynamic_buffer::DynamicVertexBuffer;
use crate::error::RenderError;
use crate::uniform::{MatrixBlock, SharedLayouts, UniformBuffer};

use super::backbuffer_attachment;

/// Per-drop instance data pulled by the rain shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct RainInstance {
    pub position: [f32; 3],
    /// Fall speed in units per millisecond; also scales the streak length.
    pub speed: f32,
}

impl RainInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// CPU-side rain emitter: a fixed population of drops falling through a box
/// volume, respawning at the ceiling with hashed jitter. Deterministic for a
/// given seed.
pub struct Rain {
    drops: Vec<RainInstance>,
    min: Vec3,
    max: Vec3,
    seed: u64,
    respawns: u32,
}

impl Rain {
    pub fn new(count: usize, min: Vec3, max: Vec3, seed: u64) -> Self {
        let mut rain = Self {
            drops: Vec::with_capacity(count),
            min,
            max,
            seed,
            respawns: 0,
        };
        for i in 0..count {
            let (x, z, s) = rain.jitter(i as u32);
            let y = rain.min.y + (rain.max.y - rain.min.y) * rain.hash01(i as u32, 3);
            rain.drops.push(RainInstance {
                position: [x, y, z],
                speed: s,
            });
        }
        rain
    }

    /// Advances every drop; drops leaving the floor respawn at the ceiling.
    pub fn update(&mut self, dt_ms: f32) {
        for i in 0..self.drops.len() {
            let drop = &mut self.drops[i];
            drop.position[1] -= drop.speed * dt_ms;
            if drop.position[1] < self.min.y {
                self.respawns = self.respawns.wrapping_add(1);
                let salt = (i as u32).wrapping_add(self.respawns);
                let (x, z, s) = self.jitter(salt);
                let drop = &mut self.drops[i];
                drop.position = [x, self.max.y, z];
                drop.speed = s;
            }
        }
    }

    pub fn drops(&self) -> &[RainInstance] {
        &self.drops
    }

    fn jitter(&self, salt: u32) -> (f32, f32, f32) {
        let x = self.min.x + (self.max.x - self.min.x) * self.hash01(salt, 0);
        let z = self.min.z + (self.max.z - self.min.z) * self.hash01(salt, 1);
        // 0.01..0.03 units/ms, i.e. 10..30 units/s.
        let s = 0.01 + 0.02 * self.hash01(salt, 2);
        (x, z, s)
    }

    fn hash01(&self, salt: u32, lane: u32) -> f32 {
        let mut x = self
            .seed
            .wrapping_add((salt as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
            .wrapping_add((lane as u64).wrapping_mul(0x1656_6791_9e37_79f9));
        x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        x ^= x >> 31;
        (x as f64 / u64::MAX as f64) as f32
    }
}

/// Instanced rain streak wrapper. The instance stream is rewritten per frame
/// through the overflow-guarded dynamic buffer; a population larger than the
/// configured maximum is rejected rather than truncated.
pub struct RainPass {
    pipeline: wgpu::RenderPipeline,
    matrix_buffer: UniformBuffer<MatrixBlock>,
    instances: DynamicVertexBuffer,
    max_drops: usize,
}

impl RainPass {
    pub fn new(
        ctx: &GraphicsContext,
        layouts: &SharedLayouts,
        max_drops: usize,
    ) -> Result<Self, RenderError> {
        let shader = ctx
            .device
            .create_shader_module(wgpu::include_wgsl!("../../../../assets/shaders/rain.wgsl"));

        let layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Rain Pipeline Layout"),
                bind_group_layouts: &[&layouts.uniform],
                push_constant_ranges: &[],
            });

        // Camera-facing streaks: strip quads, no culling, additive-ish alpha.
        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Rain Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[RainInstance::desc()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.color_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: crate::context::DEPTH_FORMAT,
                    // Rain reads depth but never occludes scene geometry.
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        let capacity = (max_drops * std::mem::size_of::<RainInstance>()) as u64;
        Ok(Self {
            pipeline,
            matrix_buffer: UniformBuffer::new(ctx, &layouts.uniform, "Rain Matrix Block"),
            instances: DynamicVertexBuffer::new(ctx, "Rain Instances", capacity),
            max_drops,
        })
    }

    pub fn max_drops(&self) -> usize {
        self.max_drops
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        ctx: &GraphicsContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth: wgpu::RenderPassDepthStencilAttachment<'_>,
        rain: &Rain,
        view_matrix: Mat4,
        projection: Mat4,
    ) -> Result<(), RenderError> {
        let drops = rain.drops();
        if drops.is_empty() {
            return Ok(());
        }

        self.instances.write(&ctx.queue, drops)?;
        self.matrix_buffer.upload(
            &ctx.queue,
            &MatrixBlock::pack(Mat4::IDENTITY, view_matrix, projection),
        );

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Rain Pass"),
            color_attachments: &[Some(backbuffer_attachment(view, None))],
            depth_stencil_attachment: Some(depth),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        self.matrix_buffer.bind(&mut pass, 0);
        pass.set_vertex_buffer(0, self.instances.slice());
        pass.draw(0..4, 0..drops.len() as u32);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_fall_and_respawn_within_bounds() {
        let min = Vec3::new(-5.0, 0.0, -5.0);
        let max = Vec3::new(5.0, 20.0, 5.0);
        let mut rain = Rain::new(64, min, max, 42);

        let before: Vec<f32> = rain.drops().iter().map(|d| d.position[1]).collect();
        rain.update(16.0);
        for (drop, y0) in rain.drops().iter().zip(before) {
            let [x, y, z] = drop.position;
            assert!(y < y0 || (y - max.y).abs() < 1e-6, "drop did not fall");
            assert!(x >= min.x && x <= max.x);
            assert!(z >= min.z && z <= max.z);
        }

        // Long simulation: every drop keeps cycling through the volume.
        for _ in 0..10_000 {
            rain.update(16.0);
        }
        for drop in rain.drops() {
            assert!(drop.position[1] >= min.y - 1.0);
            assert!(drop.position[1] <= max.y);
        }
    }

    #[test]
    fn emitter_is_deterministic_per_seed() {
        let min = Vec3::splat(-1.0);
        let max = Vec3::splat(1.0);
        let a = Rain::new(16, min, max, 7);
        let b = Rain::new(16, min, max, 7);
        for (da, db) in a.drops().iter().zip(b.drops()) {
            assert_eq!(da.position, db.position);
            assert_eq!(da.speed, db.speed);
        }
    }
}

// crates/engine_render/src/passes/mod.rs
//
// Per-effect shader wrappers. Each wrapper owns its pipeline(s) and constant
// buffers and exposes a draw entry point; geometry binding stays on the mesh
// types. Structurally the wrappers are all the same shape, parameterized per
// effect.

pub mod color_pass;
pub mod light_pass;
pub mod rain_pass;
pub mod scene_pass;
pub mod terrain_pass;
pub mod texture_pass;
pub mod water_pass;

pub use color_pass::ColorPass;
pub use light_pass::LightPass;
pub use rain_pass::{Rain, RainPass};
pub use scene_pass::ScenePass;
pub use terrain_pass::TerrainPass;
pub use texture_pass::TexturePass;
pub use water_pass::WaterPass;

use crate::context::DEPTH_FORMAT;

pub(crate) struct PipelineParams<'a> {
    pub label: &'static str,
    pub shader: &'a wgpu::ShaderModule,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub vertex_layouts: &'a [wgpu::VertexBufferLayout<'a>],
    pub color_format: wgpu::TextureFormat,
    pub blend: Option<wgpu::BlendState>,
    pub depth: bool,
    pub topology: wgpu::PrimitiveTopology,
}

/// Build a render pipeline with the layout conventions every wrapper shares.
pub(crate) fn create_render_pipeline(
    device: &wgpu::Device,
    params: PipelineParams<'_>,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(params.label),
        bind_group_layouts: params.bind_group_layouts,
        push_constant_ranges: &[],
    });

    let depth_stencil = params.depth.then(|| wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(params.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: params.shader,
            entry_point: "vs_main",
            buffers: params.vertex_layouts,
        },
        fragment: Some(wgpu::FragmentState {
            module: params.shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: params.color_format,
                blend: params.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: params.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

/// Color attachment for drawing into an already-acquired backbuffer view.
/// `clear` selects clear-versus-load; passes that follow others in the same
/// frame load.
pub(crate) fn backbuffer_attachment<'a>(
    view: &'a wgpu::TextureView,
    clear: Option<wgpu::Color>,
) -> wgpu::RenderPassColorAttachment<'a> {
    wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: match clear {
                Some(color) => wgpu::LoadOp::Clear(color),
                None => wgpu::LoadOp::Load,
            },
            store: wgpu::StoreOp::Store,
        },
    }
}

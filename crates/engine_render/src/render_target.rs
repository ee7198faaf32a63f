// crates/engine_render/src/render_target.rs

use crate::context::GraphicsContext;
use crate::error::RenderError;

/// Explicit read/write state for an offscreen target.
///
/// The graphics API cannot sample a texture that is still bound as a render
/// target; instead of trusting call order, the state is tracked here and a
/// read attempt while `Writable` is rejected as an error.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TargetState {
    Writable,
    Readable,
}

/// Offscreen color target plus its readable view.
///
/// Sized to the backbuffer, single mip, no multisampling. Recreated only on
/// `resize`, never per frame.
pub struct RenderTarget {
    label: &'static str,
    /// The underlying GPU texture that stores pixel data.
    pub texture: wgpu::Texture,
    view: wgpu::TextureView,
    state: TargetState,
    format: wgpu::TextureFormat,
}

impl RenderTarget {
    pub fn new(ctx: &GraphicsContext, label: &'static str) -> Self {
        let (texture, view) = create_color_target(ctx, label, ctx.color_format);
        Self {
            label,
            texture,
            view,
            // Nothing has been recorded into a fresh target, but nothing will
            // read stale data either until the first frame writes it.
            state: TargetState::Readable,
            format: ctx.color_format,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn state(&self) -> TargetState {
        self.state
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Transitions to `Writable` and opens a render pass targeting this
    /// texture. The clear is explicit; there is no clear-on-bind.
    ///
    /// Callers must drop the returned pass and then call
    /// [`RenderTarget::finish_write`] before anything samples the target.
    pub fn begin_write<'a>(
        &'a mut self,
        encoder: &'a mut wgpu::CommandEncoder,
        depth: Option<wgpu::RenderPassDepthStencilAttachment<'a>>,
        clear: wgpu::Color,
    ) -> wgpu::RenderPass<'a> {
        self.state = TargetState::Writable;
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: depth,
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    /// Marks the recorded write as complete, making the target samplable.
    pub fn finish_write(&mut self) {
        self.state = TargetState::Readable;
    }

    /// The read-only view other shaders sample. Refused while a write pass is
    /// still open on this target.
    pub fn read_view(&self) -> Result<&wgpu::TextureView, RenderError> {
        match self.state {
            TargetState::Readable => Ok(&self.view),
            TargetState::Writable => Err(RenderError::ReadWhileWritable { target: self.label }),
        }
    }

    /// Recreates the texture at the context's current size. Any bind group
    /// built from the old view must be rebuilt by the owner.
    pub fn resize(&mut self, ctx: &GraphicsContext) {
        let (texture, view) = create_color_target(ctx, self.label, self.format);
        self.texture = texture;
        self.view = view;
        self.state = TargetState::Readable;
    }
}

/// Helper to create an offscreen color texture + view usable as both a render
/// target and a sampled binding.
fn create_color_target(
    ctx: &GraphicsContext,
    label: &'static str,
    format: wgpu::TextureFormat,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: ctx.width,
            height: ctx.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

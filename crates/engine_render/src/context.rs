// crates/engine_render/src/context.rs

use crate::error::RenderError;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Framebuffer description the outer application negotiated (or, headless,
/// whatever the tests ask for).
#[derive(Copy, Clone, Debug)]
pub struct ContextDesc {
    pub width: u32,
    pub height: u32,
    pub color_format: wgpu::TextureFormat,
}

impl Default for ContextDesc {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            color_format: wgpu::TextureFormat::Bgra8UnormSrgb,
        }
    }
}

/// Device facade handed by reference into every component.
///
/// The device and queue are process-wide singletons: one outer application
/// owns this struct, every pass/renderable only borrows it for the duration
/// of a call. Nothing in this crate stores a clone of the device.
pub struct GraphicsContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub color_format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

impl GraphicsContext {
    /// Adopts a device the windowed application already created alongside its
    /// surface. Surface/swap-chain management stays outside this crate.
    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue, desc: ContextDesc) -> Self {
        Self {
            device,
            queue,
            color_format: desc.color_format,
            width: desc.width,
            height: desc.height,
        }
    }

    /// Instance -> adapter -> device chain without a surface.
    ///
    /// Used by offline tooling; the windowed path goes through
    /// [`GraphicsContext::from_device`] instead.
    pub fn create_headless(desc: ContextDesc) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::ResourceCreation {
            resource: "adapter",
            reason: "no compatible adapter found".into(),
        })?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
            },
            None,
        ))
        .map_err(|e| RenderError::ResourceCreation {
            resource: "device",
            reason: e.to_string(),
        })?;

        Ok(Self::from_device(device, queue, desc))
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
        }
    }
}

/// Depth buffer shared by the main pass and the offscreen passes.
///
/// Recreated on resize, never per frame.
pub struct DepthBuffer {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl DepthBuffer {
    pub fn new(ctx: &GraphicsContext) -> Self {
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("DepthBuffer"),
            size: wgpu::Extent3d {
                width: ctx.width,
                height: ctx.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Standard depth attachment, cleared to the far plane. Used by the
    /// first pass of a frame (or of an offscreen render).
    pub fn attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }

    /// Depth attachment preserving what earlier passes wrote this frame.
    pub fn attachment_load(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }
}

// crates/engine_render/src/uniform.rs
use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::context::GraphicsContext;

/// The single code path that converts a matrix into the byte layout the
/// shaders declare. Every parameter block containing matrices must go through
/// here; no wrapper repeats the conversion on its own.
///
/// WGSL matrices are column-major, so the packing is `to_cols_array_2d`.
pub fn pack_mat4(m: Mat4) -> [[f32; 4]; 4] {
    m.to_cols_array_2d()
}

/// World/view/projection block shared verbatim by every shader wrapper.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MatrixBlock {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_projection: [[f32; 4]; 4],
}

impl MatrixBlock {
    /// The only constructor. `view_projection` is derived here so callers
    /// cannot hand the shader an inconsistent composite.
    pub fn pack(world: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            world: pack_mat4(world),
            view: pack_mat4(view),
            projection: pack_mat4(projection),
            view_projection: pack_mat4(projection * view),
        }
    }
}

impl Default for MatrixBlock {
    fn default() -> Self {
        Self::pack(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

/// Directional light parameters for the diffuse/specular wrappers.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LightBlock {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    /// rgb = specular color, w = specular power.
    pub specular: [f32; 4],
    pub direction: [f32; 3],
    pub _pad: f32,
}

impl Default for LightBlock {
    fn default() -> Self {
        Self {
            ambient: [0.15, 0.15, 0.15, 1.0],
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0, 32.0],
            direction: [0.0, -1.0, 0.5],
            _pad: 0.0,
        }
    }
}

/// Camera position, needed by specular shading and water distortion falloff.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CameraBlock {
    pub position: [f32; 3],
    pub _pad: f32,
}

impl CameraBlock {
    pub fn new(position: Vec3) -> Self {
        Self {
            position: position.to_array(),
            _pad: 0.0,
        }
    }
}

/// Water shading knobs, consumed verbatim by the surface shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct WaterBlock {
    pub uv_offset: [f32; 2],
    pub wave_height: f32,
    pub wave_scale: f32,
    pub refraction_distortion: f32,
    pub reflection_distortion: f32,
    pub max_distortion_distance: f32,
    pub refraction_strength: f32,
    pub reflection_strength: f32,
    pub water_depth: f32,
    pub _pad: [f32; 2],
}

impl WaterBlock {
    pub fn uv_offset(&self) -> Vec2 {
        Vec2::from_array(self.uv_offset)
    }
}

/// Clip plane for the reflection/refraction scene passes (`xyz` = normal,
/// `w` = distance). Fragments on the negative side are discarded.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ClipPlaneBlock {
    pub plane: [f32; 4],
}

impl ClipPlaneBlock {
    /// Plane clipping everything below `water_y` (used for reflection).
    pub fn above(water_y: f32) -> Self {
        Self {
            plane: [0.0, 1.0, 0.0, -water_y],
        }
    }

    /// Plane clipping everything above `water_y` (used for refraction).
    pub fn below(water_y: f32) -> Self {
        Self {
            plane: [0.0, -1.0, 0.0, water_y],
        }
    }
}

/// Flat tint for the color wrapper.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PixelBlock {
    pub color: [f32; 4],
}

impl Default for PixelBlock {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Elevation band parameters for terrain coloring.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TerrainAreaBlock {
    pub low_color: [f32; 4],
    pub high_color: [f32; 4],
    pub min_height: f32,
    pub max_height: f32,
    pub _pad: [f32; 2],
}

impl Default for TerrainAreaBlock {
    fn default() -> Self {
        Self {
            low_color: [0.23, 0.42, 0.16, 1.0],
            high_color: [0.85, 0.85, 0.88, 1.0],
            min_height: 0.0,
            max_height: 16.0,
            _pad: [0.0; 2],
        }
    }
}

/// One GPU uniform buffer plus its bind group, typed to a single POD block.
///
/// Creation is one-shot; per-frame updates go through [`UniformBuffer::upload`],
/// which is a whole-buffer discard write (wgpu's equivalent of the classic
/// map/copy/unmap discipline). The GPU copy is the source of truth after
/// upload; no CPU mirror is kept here.
pub struct UniformBuffer<T: Pod + Zeroable> {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    _marker: PhantomData<T>,
}

impl<T: Pod + Zeroable> UniformBuffer<T> {
    pub fn new(ctx: &GraphicsContext, layout: &wgpu::BindGroupLayout, label: &'static str) -> Self {
        let buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&T::zeroed()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });

        Self {
            buffer,
            bind_group,
            _marker: PhantomData,
        }
    }

    /// Replace the whole block. Field order and padding of `T` must match the
    /// shader's declared struct bit-for-bit; a mismatch renders garbage
    /// rather than erroring, which is why the blocks above are `#[repr(C)]`
    /// with explicit padding.
    pub fn upload(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    /// Attach at bind group index `slot`.
    pub fn bind<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, slot: u32) {
        pass.set_bind_group(slot, &self.bind_group, &[]);
    }
}

/// Centralized bind group layout definitions shared across passes.
///
/// Single source of truth so every wrapper's pipeline layout agrees on what
/// a "uniform slot" and a "texture slot" look like.
pub struct SharedLayouts {
    pub uniform: wgpu::BindGroupLayout,
    pub texture: wgpu::BindGroupLayout,
}

impl SharedLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform BindGroupLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                // Blocks of several sizes share this layout, so no min size.
                // Matrix data is read in the vertex stage, shading knobs in
                // the fragment stage.
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture BindGroupLayout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self { uniform, texture }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn pack_matches_column_layout_bit_for_bit() {
        let m = Mat4::from_cols(
            Vec4::new(1.0, 2.0, 3.0, 4.0),
            Vec4::new(5.0, 6.0, 7.0, 8.0),
            Vec4::new(9.0, 10.0, 11.0, 12.0),
            Vec4::new(13.0, 14.0, 15.0, 16.0),
        );
        let packed = pack_mat4(m);
        assert_eq!(packed[0], [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(packed[3], [13.0, 14.0, 15.0, 16.0]);
        // Bit-exact round trip back through glam.
        assert_eq!(Mat4::from_cols_array_2d(&packed), m);
    }

    #[test]
    fn matrix_block_derives_view_projection() {
        let view = Mat4::from_translation(Vec3::new(0.0, -3.0, 10.0));
        let proj = Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0);
        let block = MatrixBlock::pack(Mat4::IDENTITY, view, proj);
        assert_eq!(block.view_projection, pack_mat4(proj * view));
    }

    #[test]
    fn blocks_are_16_byte_aligned() {
        use std::mem::size_of;
        assert_eq!(size_of::<MatrixBlock>() % 16, 0);
        assert_eq!(size_of::<LightBlock>() % 16, 0);
        assert_eq!(size_of::<CameraBlock>() % 16, 0);
        assert_eq!(size_of::<WaterBlock>() % 16, 0);
        assert_eq!(size_of::<ClipPlaneBlock>() % 16, 0);
        assert_eq!(size_of::<PixelBlock>() % 16, 0);
        assert_eq!(size_of::<TerrainAreaBlock>() % 16, 0);
    }

    #[test]
    fn clip_planes_face_opposite_ways() {
        let above = ClipPlaneBlock::above(2.0);
        let below = ClipPlaneBlock::below(2.0);
        // A point above the water plane passes `above` and fails `below`.
        let p = Vec4::new(0.0, 5.0, 0.0, 1.0);
        let da = Vec4::from_array(above.plane).dot(p);
        let db = Vec4::from_array(below.plane).dot(p);
        assert!(da > 0.0);
        assert!(db < 0.0);
    }
}

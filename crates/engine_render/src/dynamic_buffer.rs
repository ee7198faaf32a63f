// crates/engine_render/src/dynamic_buffer.rs

use bytemuck::Pod;

use crate::context::GraphicsContext;
use crate::error::RenderError;

/// Fixed-capacity, per-frame-rewritten vertex buffer.
///
/// Capacity is chosen once at creation. A write larger than the capacity is
/// rejected whole; nothing is written and the previous contents stay valid.
/// This is the guard idiom for every stream the caller sizes at runtime
/// (rain instances being the in-crate consumer).
pub struct DynamicVertexBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    used: u64,
}

impl DynamicVertexBuffer {
    pub fn new(ctx: &GraphicsContext, label: &'static str, capacity_bytes: u64) -> Self {
        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity_bytes,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            capacity: capacity_bytes,
            used: 0,
        }
    }

    /// Replace the buffer contents for this frame.
    pub fn write<T: Pod>(&mut self, queue: &wgpu::Queue, data: &[T]) -> Result<(), RenderError> {
        let bytes = bytemuck::cast_slice(data);
        ensure_fits(bytes.len() as u64, self.capacity)?;
        queue.write_buffer(&self.buffer, 0, bytes);
        self.used = bytes.len() as u64;
        Ok(())
    }

    /// Slice covering the bytes written this frame.
    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(0..self.used)
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn used(&self) -> u64 {
        self.used
    }
}

/// Whole-write capacity check: oversized input is an error, never a truncated
/// write.
fn ensure_fits(requested: u64, capacity: u64) -> Result<(), RenderError> {
    if requested > capacity {
        return Err(RenderError::Overflow {
            requested,
            capacity,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_at_and_below_capacity() {
        assert!(ensure_fits(0, 160).is_ok());
        assert!(ensure_fits(160, 160).is_ok());
    }

    #[test]
    fn rejects_overflow_whole() {
        // Capacity for 10 instances of 16 bytes; an 11th is rejected.
        let err = ensure_fits(11 * 16, 10 * 16).unwrap_err();
        match err {
            RenderError::Overflow {
                requested,
                capacity,
            } => {
                assert_eq!(requested, 176);
                assert_eq!(capacity, 160);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! The device/readback buffer pair backing one instrumented pipeline.

use crate::layout::BufferLayout;

/// Storage buffer the shader writes debug entries into, plus the MAP_READ
/// mirror the host copies it to. Both are sized once from the layout;
/// reconfiguring builds a new pair and drops this one.
pub struct ProbeBuffers {
    /// Shader write target, copy source.
    pub storage: wgpu::Buffer,
    /// Copy destination; mapped for reading after each capture.
    pub readback: wgpu::Buffer,
    pub byte_size: u64,
}

impl ProbeBuffers {
    pub fn new(device: &wgpu::Device, layout: &BufferLayout) -> Self {
        let byte_size = layout.total_bytes() as u64;
        log::debug!(
            "allocating debug buffers: unit_count={} capacity={} ({byte_size} bytes)",
            layout.unit_count,
            layout.capacity
        );
        let storage = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("wgsl-probe storage"),
            size: byte_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("wgsl-probe readback"),
            size: byte_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            storage,
            readback,
            byte_size,
        }
    }

    /// Enqueue the full device-to-host copy on `encoder`. Must land in the
    /// same submission as the instrumented dispatch being observed.
    pub fn enqueue_copy(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_buffer_to_buffer(&self.storage, 0, &self.readback, 0, self.byte_size);
    }
}

impl Drop for ProbeBuffers {
    fn drop(&mut self) {
        self.storage.destroy();
        self.readback.destroy();
    }
}

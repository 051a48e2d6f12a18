/// Buffer - Vulkan implementation of GpuBuffer / GpuBufferView

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::any::Any;
use std::sync::Arc;
use x2_engine::graphics_device::{Format, GpuBuffer, GpuBufferView, MemoryLocation};
use x2_engine::x2::Result;
use x2_engine::{engine_bail, engine_err};

use crate::vulkan_context::{GpuContext, SOURCE};

/// Vulkan buffer
pub struct Buffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
    location: MemoryLocation,
}

impl Buffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        buffer: vk::Buffer,
        allocation: Allocation,
        size: u64,
        location: MemoryLocation,
    ) -> Self {
        Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
            location,
        }
    }

    fn check_range(&self, offset: u64, len: u64) -> Result<()> {
        if offset.checked_add(len).map_or(true, |end| end > self.size) {
            engine_bail!(
                SOURCE,
                "Buffer access out of range: offset {} + {} bytes exceeds size {}",
                offset,
                len,
                self.size
            );
        }
        Ok(())
    }

    fn mapped_ptr(&self) -> Option<*mut u8> {
        self.allocation
            .as_ref()
            .and_then(|allocation| allocation.mapped_ptr())
            .map(|ptr| ptr.as_ptr() as *mut u8)
    }

    /// Write through a staging buffer (device-local buffers)
    fn upload(&self, offset: u64, data: &[u8]) -> Result<()> {
        let (staging, allocation) = self.ctx.create_staging_buffer(data)?;
        let region = vk::BufferCopy {
            src_offset: 0,
            dst_offset: offset,
            size: data.len() as u64,
        };
        let dst = self.buffer;
        let result = self.ctx.immediate_submit(|device, cb| unsafe {
            device.cmd_copy_buffer(cb, staging, dst, &[region]);
        });
        self.ctx.destroy_staging_buffer(staging, allocation);
        result
    }
}

impl GpuBuffer for Buffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        self.check_range(offset, data.len() as u64)?;
        if data.is_empty() {
            return Ok(());
        }

        match self.location {
            MemoryLocation::GpuOnly => self.upload(offset, data),
            MemoryLocation::CpuToGpu => {
                let mapped_ptr = self
                    .mapped_ptr()
                    .ok_or_else(|| engine_err!(SOURCE, "Buffer write failed: buffer is not CPU-accessible"))?;
                unsafe {
                    std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.add(offset as usize), data.len());
                }
                Ok(())
            }
        }
    }

    fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        self.check_range(offset, len)?;
        let mapped_ptr = self
            .mapped_ptr()
            .ok_or_else(|| engine_err!(SOURCE, "Buffer read failed: buffer is not CPU-accessible"))?;
        let mut data = vec![0u8; len as usize];
        unsafe {
            std::ptr::copy_nonoverlapping(mapped_ptr.add(offset as usize), data.as_mut_ptr(), len as usize);
        }
        Ok(data)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            self.ctx.free(allocation);
        }
        unsafe {
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}

/// Vulkan texel buffer view
pub struct BufferView {
    ctx: Arc<GpuContext>,
    pub(crate) view: vk::BufferView,
    format: Format,
}

impl BufferView {
    pub(crate) fn new(ctx: Arc<GpuContext>, view: vk::BufferView, format: Format) -> Self {
        Self { ctx, view, format }
    }
}

impl GpuBufferView for BufferView {
    fn format(&self) -> Format {
        self.format
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for BufferView {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_buffer_view(self.view, None);
        }
    }
}

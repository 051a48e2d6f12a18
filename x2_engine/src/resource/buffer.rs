/// Host-visible GPU buffer with an optional typed texel view.
///
/// Uniform blocks are plain `#[repr(C)]` structs deriving `bytemuck::Pod`;
/// `write_value` uploads one such block, `write` an array of them.

use std::sync::Arc;
use bytemuck::Pod;
use crate::context::GraphicsContext;
use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{BufferDesc, BufferUsage, Format, GpuBuffer, GpuBufferView, MemoryLocation};

pub struct Buffer {
    gpu: Arc<dyn GpuBuffer>,
    view: Option<Arc<dyn GpuBufferView>>,
    usage: BufferUsage,
    size: u64,
}

impl Buffer {
    /// Create a zero-filled buffer of `size` bytes
    pub fn new(ctx: &GraphicsContext, size: u64, usage: BufferUsage, location: MemoryLocation) -> Result<Self> {
        if size == 0 {
            engine_bail!("x2::Buffer", "Cannot create an empty buffer");
        }
        let gpu = ctx.device().create_buffer(&BufferDesc { size, usage, location })?;
        Ok(Self { gpu, view: None, usage, size })
    }

    /// Host-visible uniform buffer sized for one `T`
    pub fn uniform<T: Pod>(ctx: &GraphicsContext) -> Result<Self> {
        Self::new(ctx, std::mem::size_of::<T>() as u64, BufferUsage::UNIFORM, MemoryLocation::CpuToGpu)
    }

    /// Host-visible buffer initialized with `data`
    pub fn with_data<T: Pod>(ctx: &GraphicsContext, data: &[T], usage: BufferUsage) -> Result<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let buffer = Self::new(ctx, bytes.len() as u64, usage, MemoryLocation::CpuToGpu)?;
        buffer.gpu.write(0, bytes)?;
        Ok(buffer)
    }

    /// Create the typed view used by texel buffer descriptors
    pub fn create_view(&mut self, ctx: &GraphicsContext, format: Format) -> Result<()> {
        if !self.usage.intersects(BufferUsage::UNIFORM_TEXEL | BufferUsage::STORAGE_TEXEL) {
            engine_bail!("x2::Buffer", "Buffer usage {:?} does not allow a texel view", self.usage);
        }
        self.view = Some(ctx.device().create_buffer_view(self.gpu.as_ref(), format)?);
        Ok(())
    }

    /// Write `data` at byte `offset`
    pub fn write<T: Pod>(&self, offset: u64, data: &[T]) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if offset + bytes.len() as u64 > self.size {
            engine_bail!("x2::Buffer",
                "Write of {} bytes at offset {} exceeds buffer size {}", bytes.len(), offset, self.size);
        }
        self.gpu.write(offset, bytes)
    }

    /// Write one value at offset 0
    pub fn write_value<T: Pod>(&self, value: &T) -> Result<()> {
        self.write(0, std::slice::from_ref(value))
    }

    /// Read `len` bytes at `offset`
    pub fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        if offset + len > self.size {
            engine_bail!("x2::Buffer",
                "Read of {} bytes at offset {} exceeds buffer size {}", len, offset, self.size);
        }
        self.gpu.read(offset, len)
    }

    /// Read one value at `offset`
    pub fn read_value<T: Pod>(&self, offset: u64) -> Result<T> {
        let bytes = self.read(offset, std::mem::size_of::<T>() as u64)?;
        Ok(bytemuck::pod_read_unaligned(&bytes))
    }

    pub fn gpu_buffer(&self) -> &dyn GpuBuffer {
        self.gpu.as_ref()
    }

    pub fn view(&self) -> Option<&dyn GpuBufferView> {
        self.view.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;

/// Buffer handle trait and buffer descriptor

use std::any::Any;
use bitflags::bitflags;
use crate::error::Result;
use crate::graphics_device::Format;

bitflags! {
    /// Buffer usage (VkBufferUsageFlags)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const TRANSFER_SRC = 0x1;
        const TRANSFER_DST = 0x2;
        const UNIFORM_TEXEL = 0x4;
        const STORAGE_TEXEL = 0x8;
        const UNIFORM = 0x10;
        const STORAGE = 0x20;
        const INDEX = 0x40;
        const VERTEX = 0x80;
    }
}

/// Where the buffer memory lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemoryLocation {
    /// Host-visible, persistently mapped (uniforms, dynamic vertex data)
    #[default]
    CpuToGpu,
    /// Device-local, not mappable
    GpuOnly,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
    /// Memory location
    pub location: MemoryLocation,
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

/// Backend buffer
pub trait GpuBuffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Copy `data` into the buffer at `offset` (host-visible buffers only)
    fn write(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Read `len` bytes at `offset` (host-visible buffers only)
    fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>>;

    fn as_any(&self) -> &dyn Any;
}

/// Backend typed view over a texel buffer
pub trait GpuBufferView: Send + Sync {
    fn format(&self) -> Format;

    fn as_any(&self) -> &dyn Any;
}

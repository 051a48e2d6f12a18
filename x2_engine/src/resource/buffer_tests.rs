use super::*;
use bytemuck::{Pod, Zeroable};
use crate::graphics_device::mock_graphics_device::mock_context;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct Block {
    scale: [f32; 4],
    count: u32,
    _pad: [u32; 3],
}

#[test]
fn test_new_zero_size_fails() {
    let (_device, ctx) = mock_context();
    assert!(Buffer::new(&ctx, 0, BufferUsage::UNIFORM, MemoryLocation::CpuToGpu).is_err());
}

#[test]
fn test_uniform_sized_for_block() {
    let (device, ctx) = mock_context();
    let buffer = Buffer::uniform::<Block>(&ctx).unwrap();

    assert_eq!(buffer.size(), 32);
    assert_eq!(buffer.usage(), BufferUsage::UNIFORM);
    assert_eq!(device.count_events("create_buffer"), 1);
}

#[test]
fn test_write_value_then_read_value() {
    let (_device, ctx) = mock_context();
    let buffer = Buffer::uniform::<Block>(&ctx).unwrap();
    let block = Block { scale: [1.0, 2.0, 3.0, 4.0], count: 7, _pad: [0; 3] };

    buffer.write_value(&block).unwrap();
    assert_eq!(buffer.read_value::<Block>(0).unwrap(), block);
    assert_eq!(buffer.read_value::<u32>(16).unwrap(), 7);
}

#[test]
fn test_with_data_uploads() {
    let (_device, ctx) = mock_context();
    let buffer = Buffer::with_data(&ctx, &[1u32, 2, 3], BufferUsage::STORAGE).unwrap();

    assert_eq!(buffer.size(), 12);
    assert_eq!(buffer.read_value::<u32>(8).unwrap(), 3);
}

#[test]
fn test_write_out_of_bounds_fails() {
    let (_device, ctx) = mock_context();
    let buffer = Buffer::with_data(&ctx, &[0u32; 4], BufferUsage::STORAGE).unwrap();

    assert!(buffer.write(12, &[1u32, 2]).is_err());
    assert!(buffer.read(8, 16).is_err());
    assert!(buffer.write(12, &[9u32]).is_ok());
}

#[test]
fn test_create_view_requires_texel_usage() {
    let (_device, ctx) = mock_context();
    let mut uniform = Buffer::uniform::<Block>(&ctx).unwrap();
    assert!(uniform.create_view(&ctx, Format::R32_SFLOAT).is_err());
    assert!(uniform.view().is_none());

    let mut texel = Buffer::new(&ctx, 64, BufferUsage::UNIFORM_TEXEL, MemoryLocation::CpuToGpu).unwrap();
    texel.create_view(&ctx, Format::R32_SFLOAT).unwrap();
    assert_eq!(texel.view().unwrap().format(), Format::R32_SFLOAT);
}

/// Descriptor types, set layouts and descriptor writes

use std::any::Any;
use crate::graphics_device::{
    GpuBuffer, GpuBufferView, GpuImageView, GpuSampler, ImageLayout, ShaderStageFlags,
};

/// Descriptor type (VkDescriptorType)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    UniformBuffer,
    StorageBuffer,
    UniformBufferDynamic,
    StorageBufferDynamic,
    InputAttachment,
}

/// One binding of a descriptor set layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub count: u32,
    pub stages: ShaderStageFlags,
}

/// Resource written into one binding
pub enum DescriptorResource<'a> {
    Buffer {
        buffer: &'a dyn GpuBuffer,
        offset: u64,
        range: u64,
    },
    TexelBuffer(&'a dyn GpuBufferView),
    CombinedImageSampler {
        view: &'a dyn GpuImageView,
        sampler: &'a dyn GpuSampler,
        layout: ImageLayout,
    },
    StorageImage {
        view: &'a dyn GpuImageView,
    },
    InputAttachment {
        view: &'a dyn GpuImageView,
    },
}

/// One descriptor write
pub struct DescriptorWrite<'a> {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub resource: DescriptorResource<'a>,
}

/// Backend descriptor set layout
pub trait GpuDescriptorSetLayout: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Backend descriptor set (returned to its pool when the pool is destroyed)
pub trait GpuDescriptorSet: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

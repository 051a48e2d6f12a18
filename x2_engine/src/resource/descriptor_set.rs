/// Descriptor set allocated from a layout

use std::sync::Arc;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{DescriptorWrite, GpuDescriptorSet, GpuDescriptorSetLayout};

pub struct DescriptorSet {
    gpu: Arc<dyn GpuDescriptorSet>,
}

impl DescriptorSet {
    pub fn allocate(ctx: &GraphicsContext, layout: &dyn GpuDescriptorSetLayout) -> Result<Self> {
        Ok(Self { gpu: ctx.device().allocate_descriptor_set(layout)? })
    }

    /// Write descriptors immediately
    pub fn write(&self, ctx: &GraphicsContext, writes: &[DescriptorWrite]) -> Result<()> {
        ctx.device().update_descriptor_set(self.gpu.as_ref(), writes)
    }

    pub fn gpu_set(&self) -> &dyn GpuDescriptorSet {
        self.gpu.as_ref()
    }
}

/// Shader module, descriptor set layout and pipeline - Vulkan implementations

use ash::vk;
use std::any::Any;
use std::sync::Arc;
use x2_engine::graphics_device::{
    GpuDescriptorSetLayout, GpuPipeline, GpuShaderModule, PipelineBindPoint,
};

use crate::vulkan_context::GpuContext;

/// Vulkan shader module
pub struct ShaderModule {
    ctx: Arc<GpuContext>,
    pub(crate) module: vk::ShaderModule,
}

impl ShaderModule {
    pub(crate) fn new(ctx: Arc<GpuContext>, module: vk::ShaderModule) -> Self {
        Self { ctx, module }
    }
}

impl GpuShaderModule for ShaderModule {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Vulkan descriptor set layout
pub struct DescriptorSetLayout {
    ctx: Arc<GpuContext>,
    pub(crate) layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    pub(crate) fn new(ctx: Arc<GpuContext>, layout: vk::DescriptorSetLayout) -> Self {
        Self { ctx, layout }
    }
}

impl GpuDescriptorSetLayout for DescriptorSetLayout {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Vulkan pipeline (owns its pipeline layout)
pub struct Pipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
    bind_point: PipelineBindPoint,
}

impl Pipeline {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        pipeline: vk::Pipeline,
        layout: vk::PipelineLayout,
        bind_point: PipelineBindPoint,
    ) -> Self {
        Self {
            ctx,
            pipeline,
            layout,
            bind_point,
        }
    }
}

impl GpuPipeline for Pipeline {
    fn bind_point(&self) -> PipelineBindPoint {
        self.bind_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

/// Graphics device module - the backend contract
///
/// Every GPU object the engine creates goes through [`GraphicsDevice`]. The
/// Vulkan backend implements it on top of ash; tests use a recording mock.

pub mod format;
pub mod buffer;
pub mod image;
pub mod pipeline;
pub mod descriptor;
pub mod render_pass;
pub mod command_buffer;
pub mod reflection;
pub mod swapchain;

pub use format::*;
pub use buffer::*;
pub use image::*;
pub use pipeline::*;
pub use descriptor::*;
pub use render_pass::*;
pub use command_buffer::*;
pub use reflection::*;
pub use swapchain::*;

use std::sync::Arc;
use crate::error::Result;

/// Factory for all backend GPU objects
///
/// Handles are reference counted; the backend destroys the native object
/// when the last reference drops.
pub trait GraphicsDevice: Send + Sync {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn GpuBuffer>>;

    fn create_buffer_view(&self, buffer: &dyn GpuBuffer, format: Format) -> Result<Arc<dyn GpuBufferView>>;

    /// Create an image; uploads `desc.initial_data` when present
    fn create_image(&self, desc: &ImageDesc) -> Result<Arc<dyn GpuImage>>;

    fn create_image_view(
        &self,
        image: &dyn GpuImage,
        format: Format,
        desc: &ImageViewDesc,
    ) -> Result<Arc<dyn GpuImageView>>;

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Arc<dyn GpuSampler>>;

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn GpuRenderPass>>;

    fn create_framebuffer(
        &self,
        render_pass: &dyn GpuRenderPass,
        attachments: &[&dyn GpuImageView],
        extent: Extent2D,
        layers: u32,
    ) -> Result<Arc<dyn GpuFramebuffer>>;

    /// Reflect the interface of a SPIR-V module
    fn reflect_shader_module(&self, code: &[u8]) -> Result<ReflectedModule>;

    fn create_shader_module(&self, code: &[u8]) -> Result<Box<dyn GpuShaderModule>>;

    fn create_descriptor_set_layout(
        &self,
        bindings: &[DescriptorSetLayoutBinding],
    ) -> Result<Arc<dyn GpuDescriptorSetLayout>>;

    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc) -> Result<Arc<dyn GpuPipeline>>;

    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc) -> Result<Arc<dyn GpuPipeline>>;

    /// Allocate a set from the device's descriptor pool (grown on demand)
    fn allocate_descriptor_set(&self, layout: &dyn GpuDescriptorSetLayout) -> Result<Arc<dyn GpuDescriptorSet>>;

    /// Immediate descriptor update
    fn update_descriptor_set(&self, set: &dyn GpuDescriptorSet, writes: &[DescriptorWrite]) -> Result<()>;

    /// Create a primary command buffer with its own fence
    fn create_command_buffer(&self) -> Result<Box<dyn CommandBuffer>>;

    fn wait_idle(&self) -> Result<()>;
}

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;

/// Image, image view and sampler - Vulkan implementations

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::any::Any;
use std::sync::Arc;
use x2_engine::graphics_device::{GpuImage, GpuImageView, GpuSampler};

use crate::vulkan_context::GpuContext;

/// Vulkan image
///
/// Swapchain images are wrapped without an allocation and are never
/// destroyed here; the swapchain owns them.
pub struct Image {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    allocation: Option<Allocation>,
    owned: bool,
}

impl Image {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        image: vk::Image,
        allocation: Allocation,
    ) -> Self {
        Self {
            ctx,
            image,
            allocation: Some(allocation),
            owned: true,
        }
    }

    /// Wrap an image owned by a swapchain
    pub(crate) fn from_swapchain(ctx: Arc<GpuContext>, image: vk::Image) -> Self {
        Self {
            ctx,
            image,
            allocation: None,
            owned: false,
        }
    }
}

impl GpuImage for Image {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }
        if let Some(allocation) = self.allocation.take() {
            self.ctx.free(allocation);
        }
        unsafe {
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}

/// Vulkan image view
pub struct ImageView {
    ctx: Arc<GpuContext>,
    pub(crate) view: vk::ImageView,
}

impl ImageView {
    pub(crate) fn new(ctx: Arc<GpuContext>, view: vk::ImageView) -> Self {
        Self { ctx, view }
    }
}

impl GpuImageView for ImageView {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);
        }
    }
}

/// Vulkan sampler
pub struct Sampler {
    ctx: Arc<GpuContext>,
    pub(crate) sampler: vk::Sampler,
}

impl Sampler {
    pub(crate) fn new(ctx: Arc<GpuContext>, sampler: vk::Sampler) -> Self {
        Self { ctx, sampler }
    }
}

impl GpuSampler for Sampler {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_sampler(self.sampler, None);
        }
    }
}

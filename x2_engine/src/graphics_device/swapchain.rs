/// Swapchain trait - window presentation

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{Extent2D, Format, GpuImage, GpuSemaphore};

/// Swapchain for presenting rendered images to a window
///
/// Acquisition signals [`Swapchain::image_available`]; presentation waits on
/// [`Swapchain::render_finished`]. The present feature bridges the two with
/// its submission.
pub trait Swapchain: Send + Sync {
    /// Acquire the next image index
    fn acquire_next_image(&self) -> Result<u32>;

    /// Present the image at `image_index`; returns true when the swapchain is suboptimal
    fn present(&self, image_index: u32) -> Result<bool>;

    /// Swapchain image at `image_index`
    fn image(&self, image_index: u32) -> Result<Arc<dyn GpuImage>>;

    fn image_available(&self) -> &dyn GpuSemaphore;

    fn render_finished(&self) -> &dyn GpuSemaphore;

    /// Rebuild the swapchain images for a new window extent
    fn recreate(&self, extent: Extent2D) -> Result<()>;

    fn image_count(&self) -> u32;

    fn extent(&self) -> Extent2D;

    fn format(&self) -> Format;
}

/// Swapchain - Vulkan implementation of the engine Swapchain trait
///
/// Presentation goes through the graphics queue. One image-available and one
/// render-finished semaphore are shared by all frames, so callers wait for
/// the previous frame's command buffer before acquiring again.

use ash::vk;
use std::sync::{Arc, Mutex, MutexGuard};
use x2_engine::graphics_device::{Extent2D, Format, GpuImage, GpuSemaphore, Swapchain};
use x2_engine::x2::{Error, Result};
use x2_engine::{engine_bail, engine_debug, engine_err, engine_error, engine_info};

use crate::vulkan_command_buffer::Semaphore;
use crate::vulkan_context::{GpuContext, SOURCE};
use crate::vulkan_format::format_from_vk;
use crate::vulkan_image::Image;

/// Preferred surface formats, in order
const PREFERRED_FORMATS: [vk::Format; 4] = [
    vk::Format::B8G8R8A8_SRGB,
    vk::Format::R8G8B8A8_SRGB,
    vk::Format::B8G8R8A8_UNORM,
    vk::Format::R8G8B8A8_UNORM,
];

/// Pick the surface format; the first preferred format wins, then the first supported one
pub(crate) fn choose_surface_format(available: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    PREFERRED_FORMATS
        .iter()
        .find_map(|&preferred| available.iter().find(|f| f.format == preferred))
        .or_else(|| available.iter().find(|f| format_from_vk(f.format).is_some()))
        .copied()
}

/// Swapchain extent for a requested window extent
pub(crate) fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, requested: Extent2D) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: requested.width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: requested.height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

/// Image count: one more than the minimum, capped by the maximum (0 = unbounded)
pub(crate) fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

struct SwapchainState {
    swapchain: vk::SwapchainKHR,
    images: Vec<Arc<Image>>,
    extent: Extent2D,
}

/// Vulkan swapchain
pub struct VulkanSwapchain {
    ctx: Arc<GpuContext>,
    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
    swapchain_loader: ash::khr::swapchain::Device,
    surface_format: vk::SurfaceFormatKHR,
    format: Format,
    state: Mutex<SwapchainState>,
    image_available: Semaphore,
    render_finished: Semaphore,
}

impl VulkanSwapchain {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
        requested: Extent2D,
    ) -> Result<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);

        let surface_formats = unsafe {
            surface_loader
                .get_physical_device_surface_formats(ctx.physical_device, surface)
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to query surface formats: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
                })?
        };
        let surface_format = choose_surface_format(&surface_formats).ok_or_else(|| {
            engine_error!(SOURCE, "No supported surface format among {:?}", surface_formats);
            Error::InitializationFailed("No supported surface format".to_string())
        })?;
        let format = format_from_vk(surface_format.format).ok_or_else(|| {
            Error::InitializationFailed(format!("Unsupported surface format {:?}", surface_format.format))
        })?;

        let image_available = Semaphore::new(Arc::clone(&ctx))?;
        let render_finished = Semaphore::new(Arc::clone(&ctx))?;

        let state = Self::build(
            &ctx,
            &surface_loader,
            &swapchain_loader,
            surface,
            surface_format,
            requested,
            vk::SwapchainKHR::null(),
        )?;

        engine_info!(
            SOURCE,
            "Swapchain created: {} images, {}x{}, {:?}",
            state.images.len(),
            state.extent.width,
            state.extent.height,
            format
        );

        Ok(Self {
            ctx,
            surface,
            surface_loader,
            swapchain_loader,
            surface_format,
            format,
            state: Mutex::new(state),
            image_available,
            render_finished,
        })
    }

    fn build(
        ctx: &Arc<GpuContext>,
        surface_loader: &ash::khr::surface::Instance,
        swapchain_loader: &ash::khr::swapchain::Device,
        surface: vk::SurfaceKHR,
        surface_format: vk::SurfaceFormatKHR,
        requested: Extent2D,
        old_swapchain: vk::SwapchainKHR,
    ) -> Result<SwapchainState> {
        unsafe {
            let capabilities = surface_loader
                .get_physical_device_surface_capabilities(ctx.physical_device, surface)
                .map_err(|e| {
                    engine_error!(SOURCE, "Failed to get surface capabilities: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface capabilities: {:?}", e))
                })?;

            let extent = choose_extent(&capabilities, requested);

            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(surface)
                .min_image_count(choose_image_count(&capabilities))
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true)
                .old_swapchain(old_swapchain);

            let swapchain = swapchain_loader.create_swapchain(&create_info, None).map_err(|e| {
                engine_error!(SOURCE, "Failed to create swapchain: {:?}", e);
                Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
            })?;

            let images = match swapchain_loader.get_swapchain_images(swapchain) {
                Ok(images) => images,
                Err(e) => {
                    swapchain_loader.destroy_swapchain(swapchain, None);
                    engine_error!(SOURCE, "Failed to get swapchain images: {:?}", e);
                    return Err(Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e)));
                }
            };

            Ok(SwapchainState {
                swapchain,
                images: images
                    .into_iter()
                    .map(|image| Arc::new(Image::from_swapchain(Arc::clone(ctx), image)))
                    .collect(),
                extent: Extent2D::new(extent.width, extent.height),
            })
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, SwapchainState>> {
        self.state
            .lock()
            .map_err(|_| engine_err!(SOURCE, "Swapchain state lock poisoned"))
    }
}

impl Swapchain for VulkanSwapchain {
    fn acquire_next_image(&self) -> Result<u32> {
        let state = self.state()?;
        unsafe {
            let (image_index, suboptimal) = self
                .swapchain_loader
                .acquire_next_image(
                    state.swapchain,
                    u64::MAX,
                    self.image_available.semaphore,
                    vk::Fence::null(),
                )
                .map_err(|e| {
                    if e == vk::Result::ERROR_OUT_OF_DATE_KHR {
                        engine_err!(SOURCE, "Swapchain out of date during acquire")
                    } else {
                        engine_err!(SOURCE, "Failed to acquire next swapchain image: {:?}", e)
                    }
                })?;
            if suboptimal {
                engine_debug!(SOURCE, "Swapchain suboptimal during acquire");
            }
            Ok(image_index)
        }
    }

    fn present(&self, image_index: u32) -> Result<bool> {
        let state = self.state()?;
        if image_index as usize >= state.images.len() {
            engine_bail!(
                SOURCE,
                "present: image index {} out of range (count: {})",
                image_index,
                state.images.len()
            );
        }

        let swapchains = [state.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [self.render_finished.semaphore];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let queue = self
            .ctx
            .graphics_queue
            .lock()
            .map_err(|_| engine_err!(SOURCE, "Graphics queue lock poisoned"))?;

        match unsafe { self.swapchain_loader.queue_present(*queue, &present_info) } {
            Ok(suboptimal) => Ok(suboptimal),
            Err(vk::Result::SUBOPTIMAL_KHR) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(true),
            Err(e) => Err(engine_err!(SOURCE, "Failed to present swapchain image: {:?}", e)),
        }
    }

    fn image(&self, image_index: u32) -> Result<Arc<dyn GpuImage>> {
        let state = self.state()?;
        let image = state.images.get(image_index as usize).ok_or_else(|| {
            engine_err!(
                SOURCE,
                "Swapchain image index {} out of range (count: {})",
                image_index,
                state.images.len()
            )
        })?;
        Ok(Arc::clone(image) as Arc<dyn GpuImage>)
    }

    fn image_available(&self) -> &dyn GpuSemaphore {
        &self.image_available
    }

    fn render_finished(&self) -> &dyn GpuSemaphore {
        &self.render_finished
    }

    fn recreate(&self, extent: Extent2D) -> Result<()> {
        let mut state = self.state()?;
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!(SOURCE, "Failed to wait idle before swapchain recreate: {:?}", e))?;
        }

        let old_swapchain = state.swapchain;
        let new_state = Self::build(
            &self.ctx,
            &self.surface_loader,
            &self.swapchain_loader,
            self.surface,
            self.surface_format,
            extent,
            old_swapchain,
        )?;

        *state = new_state;
        unsafe {
            self.swapchain_loader.destroy_swapchain(old_swapchain, None);
        }

        engine_debug!(
            SOURCE,
            "Swapchain recreated: {}x{}",
            state.extent.width,
            state.extent.height
        );
        Ok(())
    }

    fn image_count(&self) -> u32 {
        self.state().map(|state| state.images.len() as u32).unwrap_or(0)
    }

    fn extent(&self) -> Extent2D {
        self.state().map(|state| state.extent).unwrap_or_default()
    }

    fn format(&self) -> Format {
        self.format
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
            if let Ok(state) = self.state.lock() {
                self.swapchain_loader.destroy_swapchain(state.swapchain, None);
            }
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;

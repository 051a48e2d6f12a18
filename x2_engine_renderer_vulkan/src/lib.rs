/*!
# X2 Engine - Vulkan Backend

Vulkan implementation of the x2_engine `GraphicsDevice` contract.

Built on ash for the Vulkan bindings, gpu-allocator for memory and spirq for
SPIR-V reflection. Every object created by [`VulkanDevice`] shares one GPU
context, so resources may outlive the device that created them.

```no_run
use std::sync::Arc;
use x2_engine::x2::GraphicsContext;
use x2_engine_renderer_vulkan::{RendererConfig, VulkanDevice};
# fn run(window: &winit::window::Window) -> x2_engine::x2::Result<()> {
let device = Arc::new(VulkanDevice::new(window, RendererConfig::default())?);
let swapchain = device.create_swapchain(window)?;
let context = GraphicsContext::new(device)?;
# let _ = (swapchain, context);
# Ok(())
# }
```
*/

mod vulkan;
mod vulkan_buffer;
mod vulkan_command_buffer;
mod vulkan_config;
mod vulkan_context;
mod vulkan_debug;
mod vulkan_descriptor;
mod vulkan_format;
mod vulkan_image;
mod vulkan_pipeline;
mod vulkan_reflection;
mod vulkan_render_pass;
mod vulkan_swapchain;

pub use vulkan::VulkanDevice;
pub use vulkan_swapchain::VulkanSwapchain;
pub use vulkan_config::{DebugSeverity, RendererConfig, ValidationStats};

// Validation layer statistics
pub use vulkan_debug::{get_validation_stats, print_validation_stats_report};

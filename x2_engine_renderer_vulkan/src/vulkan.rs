/// VulkanDevice - Vulkan implementation of the GraphicsDevice trait

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CString;
use std::sync::Arc;
use winit::window::Window;
use x2_engine::graphics_device::{
    BufferDesc, CommandBuffer as EngineCommandBuffer, ComputePipelineDesc, DescriptorResource,
    DescriptorSetLayoutBinding, DescriptorType, DescriptorWrite, Extent2D, Format, GpuBuffer,
    GpuBufferView, GpuDescriptorSet, GpuDescriptorSetLayout, GpuFramebuffer, GpuImage,
    GpuImageView, GpuPipeline, GpuRenderPass, GpuSampler, GpuShaderModule, GraphicsDevice,
    GraphicsPipelineDesc, ImageDesc, ImageLayout, ImageViewDesc, MemoryLocation,
    PipelineBindPoint, PushConstantRange, ReflectedModule, RenderPassDesc, SamplerDesc,
};
use x2_engine::x2::{Error, Result};
use x2_engine::{engine_bail_invalid, engine_debug, engine_err, engine_err_invalid, engine_error, engine_info};

use crate::vulkan_buffer::{Buffer, BufferView};
use crate::vulkan_command_buffer::CommandBuffer;
use crate::vulkan_config::RendererConfig;
use crate::vulkan_context::{downcast, GpuContext, SOURCE};
use crate::vulkan_debug::{reset_validation_state, severity_flags, vulkan_debug_callback};
use crate::vulkan_descriptor::{DescriptorAllocator, DescriptorSet};
use crate::vulkan_format::*;
use crate::vulkan_image::{Image, ImageView, Sampler};
use crate::vulkan_pipeline::{DescriptorSetLayout, Pipeline, ShaderModule};
use crate::vulkan_reflection::{reflect_module, spirv_words};
use crate::vulkan_render_pass::{Framebuffer, RenderPass, RenderPassInfo};
use crate::vulkan_swapchain::VulkanSwapchain;

fn init_failed(what: &str, e: impl std::fmt::Debug) -> Error {
    engine_error!(SOURCE, "{}: {:?}", what, e);
    Error::InitializationFailed(format!("{}: {:?}", what, e))
}

/// Vulkan graphics device
///
/// Owns the shared [`GpuContext`] and the growing descriptor allocator.
/// Every object it creates keeps the context alive, so the device itself
/// can be dropped before the resources it produced.
pub struct VulkanDevice {
    ctx: Arc<GpuContext>,
    descriptors: Arc<DescriptorAllocator>,
    config: RendererConfig,
}

impl VulkanDevice {
    /// Create the instance, pick a GPU able to present to `window` and create the device
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: RendererConfig) -> Result<Self> {
        let validation = config.validation_enabled();

        unsafe {
            let entry = ash::Entry::load().map_err(|e| init_failed("Failed to load Vulkan library", e))?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| init_failed("Invalid application name", e))?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"X2Engine")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let display_handle = window
                .display_handle()
                .map_err(|e| init_failed("Failed to get display handle", e))?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_failed("Failed to get required extensions", e))?
                .to_vec();
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| init_failed("Failed to create Vulkan instance", e))?;

            let (debug_utils_loader, debug_messenger) = if validation {
                reset_validation_state();
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(severity_flags(config.debug_severity))
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                    )
                    .pfn_user_callback(Some(vulkan_debug_callback));

                match debug_utils.create_debug_utils_messenger(&debug_info, None) {
                    Ok(messenger) => (Some(debug_utils), Some(messenger)),
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(init_failed("Failed to create debug messenger", e));
                    }
                }
            } else {
                (None, None)
            };

            let destroy_instance = |instance: &ash::Instance| {
                if let (Some(loader), Some(messenger)) = (&debug_utils_loader, debug_messenger) {
                    loader.destroy_debug_utils_messenger(messenger, None);
                }
                instance.destroy_instance(None);
            };

            // Temporary surface for present support queries
            let selection = Self::select_physical_device(&entry, &instance, window);
            let (physical_device, graphics_family) = match selection {
                Ok(selection) => selection,
                Err(e) => {
                    destroy_instance(&instance);
                    return Err(e);
                }
            };

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            engine_info!(SOURCE, "Using GPU '{}' (graphics queue family {})", device_name, graphics_family);

            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family)
                .queue_priorities(&queue_priorities)];
            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = match instance.create_device(physical_device, &device_create_info, None) {
                Ok(device) => device,
                Err(e) => {
                    destroy_instance(&instance);
                    return Err(init_failed("Failed to create logical device", e));
                }
            };

            let graphics_queue = device.get_device_queue(graphics_family, 0);

            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    device.destroy_device(None);
                    destroy_instance(&instance);
                    return Err(init_failed("Failed to create GPU allocator", e));
                }
            };

            let upload_pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let upload_command_pool = match device.create_command_pool(&upload_pool_info, None) {
                Ok(pool) => pool,
                Err(e) => {
                    drop(allocator);
                    device.destroy_device(None);
                    destroy_instance(&instance);
                    return Err(init_failed("Failed to create upload command pool", e));
                }
            };

            // From here on GpuContext owns destruction
            let ctx = Arc::new(GpuContext::new(
                entry,
                instance,
                physical_device,
                device,
                allocator,
                graphics_queue,
                graphics_family,
                upload_command_pool,
                debug_utils_loader,
                debug_messenger,
            ));

            let descriptors = Arc::new(DescriptorAllocator::new(
                Arc::clone(&ctx),
                config.descriptor_pool_size.max(1),
            )?);

            engine_debug!(
                SOURCE,
                "Vulkan device ready (validation: {}, descriptor pool size: {})",
                validation,
                config.descriptor_pool_size
            );

            Ok(Self {
                ctx,
                descriptors,
                config,
            })
        }
    }

    /// First GPU with a graphics queue family that can present to the window,
    /// discrete GPUs first
    unsafe fn select_physical_device<W: HasDisplayHandle + HasWindowHandle>(
        entry: &ash::Entry,
        instance: &ash::Instance,
        window: &W,
    ) -> Result<(vk::PhysicalDevice, u32)> {
        let surface = Self::create_surface(entry, instance, window)?;
        let surface_loader = ash::khr::surface::Instance::new(entry, instance);
        let result = Self::find_presenting_device(instance, &surface_loader, surface);
        surface_loader.destroy_surface(surface, None);
        result
    }

    unsafe fn find_presenting_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<(vk::PhysicalDevice, u32)> {
        let mut physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| init_failed("Failed to enumerate physical devices", e))?;
        physical_devices.sort_by_key(|&pd| {
            instance.get_physical_device_properties(pd).device_type != vk::PhysicalDeviceType::DISCRETE_GPU
        });

        for pd in physical_devices {
            let families = instance.get_physical_device_queue_family_properties(pd);
            for (index, family) in families.iter().enumerate() {
                let presents = surface_loader
                    .get_physical_device_surface_support(pd, index as u32, surface)
                    .unwrap_or(false);
                if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && presents {
                    return Ok((pd, index as u32));
                }
            }
        }

        engine_error!(SOURCE, "No GPU with a graphics queue that can present to the window");
        Err(Error::InitializationFailed("No suitable Vulkan GPU found".to_string()))
    }

    unsafe fn create_surface<W: HasDisplayHandle + HasWindowHandle>(
        entry: &ash::Entry,
        instance: &ash::Instance,
        window: &W,
    ) -> Result<vk::SurfaceKHR> {
        let display_handle = window
            .display_handle()
            .map_err(|e| init_failed("Failed to get display handle", e))?;
        let window_handle = window
            .window_handle()
            .map_err(|e| init_failed("Failed to get window handle", e))?;
        ash_window::create_surface(entry, instance, display_handle.as_raw(), window_handle.as_raw(), None)
            .map_err(|e| init_failed("Failed to create surface", e))
    }

    /// Create a swapchain presenting to `window`
    pub fn create_swapchain(&self, window: &Window) -> Result<Arc<VulkanSwapchain>> {
        let size = window.inner_size();
        unsafe {
            let surface = Self::create_surface(&self.ctx.entry, &self.ctx.instance, window)?;
            let surface_loader = ash::khr::surface::Instance::new(&self.ctx.entry, &self.ctx.instance);

            let supported = surface_loader
                .get_physical_device_surface_support(
                    self.ctx.physical_device,
                    self.ctx.graphics_queue_family,
                    surface,
                )
                .unwrap_or(false);
            if !supported {
                surface_loader.destroy_surface(surface, None);
                return Err(init_failed(
                    "Graphics queue cannot present to this window",
                    self.ctx.graphics_queue_family,
                ));
            }

            match VulkanSwapchain::new(
                Arc::clone(&self.ctx),
                surface,
                surface_loader.clone(),
                Extent2D::new(size.width, size.height),
            ) {
                Ok(swapchain) => Ok(Arc::new(swapchain)),
                Err(e) => {
                    surface_loader.destroy_surface(surface, None);
                    Err(e)
                }
            }
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Number of descriptor pools allocated so far
    pub fn descriptor_pool_count(&self) -> usize {
        self.descriptors.pool_count()
    }

    fn create_pipeline_layout(
        &self,
        set_layouts: &[&dyn GpuDescriptorSetLayout],
        push_constant_ranges: &[PushConstantRange],
    ) -> Result<vk::PipelineLayout> {
        let set_layouts = set_layouts
            .iter()
            .map(|layout| {
                downcast::<DescriptorSetLayout>(layout.as_any(), "Descriptor set layout")
                    .map(|layout| layout.layout)
            })
            .collect::<Result<Vec<_>>>()?;

        let push_constant_ranges: Vec<vk::PushConstantRange> = push_constant_ranges
            .iter()
            .map(|range| vk::PushConstantRange {
                stage_flags: shader_stages_to_vk(range.stages),
                offset: range.offset,
                size: range.size,
            })
            .collect();

        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        unsafe {
            self.ctx
                .device
                .create_pipeline_layout(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create pipeline layout: {:?}", e))
        }
    }

    /// Copy `data` into every layer of mip 0 and leave the image shader-readable
    fn upload_image(&self, image: vk::Image, desc: &ImageDesc, data: &[u8]) -> Result<()> {
        let mip_levels = desc.mip_levels.max(1);
        let array_layers = desc.array_layers.max(1);
        let layer_size = desc.extent.width as u64 * desc.extent.height as u64 * desc.format.bytes_per_pixel() as u64;
        let expected = layer_size * array_layers as u64;
        if data.len() as u64 != expected {
            engine_bail_invalid!(
                SOURCE,
                "Image data size mismatch: expected {} bytes ({} layers of {}x{} {:?}), got {}",
                expected,
                array_layers,
                desc.extent.width,
                desc.extent.height,
                desc.format,
                data.len()
            );
        }

        let range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: mip_levels,
            base_array_layer: 0,
            layer_count: array_layers,
        };
        let region = vk::BufferImageCopy::default()
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: array_layers,
            })
            .image_extent(vk::Extent3D {
                width: desc.extent.width,
                height: desc.extent.height,
                depth: 1,
            });

        let (staging, allocation) = self.ctx.create_staging_buffer(data)?;
        let result = self.ctx.immediate_submit(|device, cb| unsafe {
            let to_transfer = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(range);
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_transfer],
            );

            device.cmd_copy_buffer_to_image(
                cb,
                staging,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            let to_shader = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(range);
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER | vk::PipelineStageFlags::COMPUTE_SHADER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_shader],
            );
        });
        self.ctx.destroy_staging_buffer(staging, allocation);
        result
    }
}

/// Descriptor info backing one write
enum WriteInfo {
    Buffer(vk::DescriptorBufferInfo),
    Image(vk::DescriptorImageInfo),
    TexelBuffer(vk::BufferView),
}

fn write_info(write: &DescriptorWrite) -> Result<WriteInfo> {
    let info = match (&write.resource, write.descriptor_type) {
        (
            DescriptorResource::Buffer { buffer, offset, range },
            DescriptorType::UniformBuffer
            | DescriptorType::StorageBuffer
            | DescriptorType::UniformBufferDynamic
            | DescriptorType::StorageBufferDynamic,
        ) => {
            let buffer = downcast::<Buffer>(buffer.as_any(), "Buffer")?;
            WriteInfo::Buffer(vk::DescriptorBufferInfo {
                buffer: buffer.buffer,
                offset: *offset,
                range: *range,
            })
        }
        (
            DescriptorResource::TexelBuffer(view),
            DescriptorType::UniformTexelBuffer | DescriptorType::StorageTexelBuffer,
        ) => WriteInfo::TexelBuffer(downcast::<BufferView>(view.as_any(), "Buffer view")?.view),
        (
            DescriptorResource::CombinedImageSampler { view, sampler, layout },
            DescriptorType::CombinedImageSampler,
        ) => WriteInfo::Image(vk::DescriptorImageInfo {
            sampler: downcast::<Sampler>(sampler.as_any(), "Sampler")?.sampler,
            image_view: downcast::<ImageView>(view.as_any(), "Image view")?.view,
            image_layout: image_layout_to_vk(*layout),
        }),
        (DescriptorResource::StorageImage { view }, DescriptorType::StorageImage) => {
            WriteInfo::Image(vk::DescriptorImageInfo {
                sampler: vk::Sampler::null(),
                image_view: downcast::<ImageView>(view.as_any(), "Image view")?.view,
                image_layout: vk::ImageLayout::GENERAL,
            })
        }
        (DescriptorResource::InputAttachment { view }, DescriptorType::InputAttachment) => {
            WriteInfo::Image(vk::DescriptorImageInfo {
                sampler: vk::Sampler::null(),
                image_view: downcast::<ImageView>(view.as_any(), "Image view")?.view,
                image_layout: image_layout_to_vk(ImageLayout::ShaderReadOnlyOptimal),
            })
        }
        (_, descriptor_type) => engine_bail_invalid!(
            SOURCE,
            "Descriptor write at binding {}: resource does not match descriptor type {:?}",
            write.binding,
            descriptor_type
        ),
    };
    Ok(info)
}

impl GraphicsDevice for VulkanDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn GpuBuffer>> {
        if desc.size == 0 {
            engine_bail_invalid!(SOURCE, "create_buffer: size must be greater than 0");
        }

        let mut usage = buffer_usage_to_vk(desc.usage);
        if desc.location == MemoryLocation::GpuOnly {
            usage |= vk::BufferUsageFlags::TRANSFER_DST;
        }
        let location = match desc.location {
            MemoryLocation::CpuToGpu => gpu_allocator::MemoryLocation::CpuToGpu,
            MemoryLocation::GpuOnly => gpu_allocator::MemoryLocation::GpuOnly,
        };

        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = self
                .ctx
                .device
                .create_buffer(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create buffer ({} bytes): {:?}", desc.size, e))?;

            let allocation = match self.ctx.allocate_buffer_memory(buffer, "buffer", location) {
                Ok(allocation) => allocation,
                Err(e) => {
                    self.ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            Ok(Arc::new(Buffer::new(
                Arc::clone(&self.ctx),
                buffer,
                allocation,
                desc.size,
                desc.location,
            )))
        }
    }

    fn create_buffer_view(&self, buffer: &dyn GpuBuffer, format: Format) -> Result<Arc<dyn GpuBufferView>> {
        let vk_buffer = downcast::<Buffer>(buffer.as_any(), "Buffer")?.buffer;
        let create_info = vk::BufferViewCreateInfo::default()
            .buffer(vk_buffer)
            .format(format_to_vk(format))
            .offset(0)
            .range(vk::WHOLE_SIZE);

        unsafe {
            let view = self
                .ctx
                .device
                .create_buffer_view(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create buffer view ({:?}): {:?}", format, e))?;
            Ok(Arc::new(BufferView::new(Arc::clone(&self.ctx), view, format)))
        }
    }

    fn create_image(&self, desc: &ImageDesc) -> Result<Arc<dyn GpuImage>> {
        if desc.extent.width == 0 || desc.extent.height == 0 {
            engine_bail_invalid!(
                SOURCE,
                "create_image: extent {}x{} must be non-zero",
                desc.extent.width,
                desc.extent.height
            );
        }
        if desc.cube_compatible && desc.array_layers % 6 != 0 {
            engine_bail_invalid!(
                SOURCE,
                "create_image: cube-compatible image needs a multiple of 6 layers, got {}",
                desc.array_layers
            );
        }
        if desc.initial_data.is_some() && desc.format.is_depth() {
            engine_bail_invalid!(SOURCE, "create_image: initial data is not supported for {:?}", desc.format);
        }

        let mut usage = image_usage_to_vk(desc.usage);
        if desc.initial_data.is_some() {
            usage |= vk::ImageUsageFlags::TRANSFER_DST;
        }
        let flags = if desc.cube_compatible {
            vk::ImageCreateFlags::CUBE_COMPATIBLE
        } else {
            vk::ImageCreateFlags::empty()
        };

        let create_info = vk::ImageCreateInfo::default()
            .flags(flags)
            .image_type(vk::ImageType::TYPE_2D)
            .format(format_to_vk(desc.format))
            .extent(vk::Extent3D {
                width: desc.extent.width,
                height: desc.extent.height,
                depth: 1,
            })
            .mip_levels(desc.mip_levels.max(1))
            .array_layers(desc.array_layers.max(1))
            .samples(sample_count_to_vk(desc.samples))
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe {
            self.ctx
                .device
                .create_image(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create image ({:?}): {:?}", desc.format, e))?
        };

        let allocation = match self.ctx.allocate_image_memory(image, "image") {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { self.ctx.device.destroy_image(image, None) };
                return Err(e);
            }
        };

        // Owns the native image from here, so errors below release it
        let result = Arc::new(Image::new(Arc::clone(&self.ctx), image, allocation));

        if let Some(data) = &desc.initial_data {
            self.upload_image(image, desc, data)?;
        }

        Ok(result)
    }

    fn create_image_view(
        &self,
        image: &dyn GpuImage,
        format: Format,
        desc: &ImageViewDesc,
    ) -> Result<Arc<dyn GpuImageView>> {
        let vk_image = downcast::<Image>(image.as_any(), "Image")?.image;
        let create_info = vk::ImageViewCreateInfo::default()
            .image(vk_image)
            .view_type(image_view_type_to_vk(desc.view_type))
            .format(format_to_vk(format))
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect_to_vk(desc.aspect),
                base_mip_level: desc.base_mip_level,
                level_count: desc.mip_level_count,
                base_array_layer: desc.base_array_layer,
                layer_count: desc.array_layer_count,
            });

        unsafe {
            let view = self
                .ctx
                .device
                .create_image_view(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create image view ({:?}): {:?}", format, e))?;
            Ok(Arc::new(ImageView::new(Arc::clone(&self.ctx), view)))
        }
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Arc<dyn GpuSampler>> {
        let address_mode = address_mode_to_vk(desc.address_mode);
        let border_color = if desc.white_border {
            vk::BorderColor::FLOAT_OPAQUE_WHITE
        } else {
            vk::BorderColor::FLOAT_TRANSPARENT_BLACK
        };

        let mut create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter_to_vk(desc.mag_filter))
            .min_filter(filter_to_vk(desc.min_filter))
            .mipmap_mode(mipmap_mode_to_vk(desc.min_filter))
            .address_mode_u(address_mode)
            .address_mode_v(address_mode)
            .address_mode_w(address_mode)
            .mip_lod_bias(0.0)
            .anisotropy_enable(false)
            .min_lod(0.0)
            .max_lod(desc.max_lod)
            .border_color(border_color)
            .unnormalized_coordinates(false);
        if let Some(compare_op) = desc.compare_op {
            create_info = create_info
                .compare_enable(true)
                .compare_op(compare_op_to_vk(compare_op));
        }

        unsafe {
            let sampler = self
                .ctx
                .device
                .create_sampler(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create sampler: {:?}", e))?;
            Ok(Arc::new(Sampler::new(Arc::clone(&self.ctx), sampler)))
        }
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn GpuRenderPass>> {
        if desc.subpasses.is_empty() {
            engine_bail_invalid!(SOURCE, "create_render_pass: at least one subpass is required");
        }

        let info = RenderPassInfo::new(desc);
        let subpasses = info.subpasses();
        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&info.attachments)
            .subpasses(&subpasses)
            .dependencies(&info.dependencies);

        unsafe {
            let render_pass = self
                .ctx
                .device
                .create_render_pass(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create render pass: {:?}", e))?;
            Ok(Arc::new(RenderPass::new(Arc::clone(&self.ctx), render_pass)))
        }
    }

    fn create_framebuffer(
        &self,
        render_pass: &dyn GpuRenderPass,
        attachments: &[&dyn GpuImageView],
        extent: Extent2D,
        layers: u32,
    ) -> Result<Arc<dyn GpuFramebuffer>> {
        let vk_render_pass = downcast::<RenderPass>(render_pass.as_any(), "Render pass")?.render_pass;
        let views = attachments
            .iter()
            .map(|view| downcast::<ImageView>(view.as_any(), "Image view").map(|view| view.view))
            .collect::<Result<Vec<_>>>()?;

        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(vk_render_pass)
            .attachments(&views)
            .width(extent.width)
            .height(extent.height)
            .layers(layers.max(1));

        unsafe {
            let framebuffer = self
                .ctx
                .device
                .create_framebuffer(&create_info, None)
                .map_err(|e| {
                    engine_err!(
                        SOURCE,
                        "Failed to create framebuffer ({}x{}, {} attachments): {:?}",
                        extent.width,
                        extent.height,
                        views.len(),
                        e
                    )
                })?;
            Ok(Arc::new(Framebuffer::new(Arc::clone(&self.ctx), framebuffer)))
        }
    }

    fn reflect_shader_module(&self, code: &[u8]) -> Result<ReflectedModule> {
        reflect_module(code)
    }

    fn create_shader_module(&self, code: &[u8]) -> Result<Box<dyn GpuShaderModule>> {
        let words = spirv_words(code)?;
        let create_info = vk::ShaderModuleCreateInfo::default().code(&words);

        unsafe {
            let module = self
                .ctx
                .device
                .create_shader_module(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create shader module: {:?}", e))?;
            Ok(Box::new(ShaderModule::new(Arc::clone(&self.ctx), module)))
        }
    }

    fn create_descriptor_set_layout(
        &self,
        bindings: &[DescriptorSetLayoutBinding],
    ) -> Result<Arc<dyn GpuDescriptorSetLayout>> {
        let vk_bindings: Vec<vk::DescriptorSetLayoutBinding> = bindings
            .iter()
            .map(|binding| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(binding.binding)
                    .descriptor_type(descriptor_type_to_vk(binding.descriptor_type))
                    .descriptor_count(binding.count)
                    .stage_flags(shader_stages_to_vk(binding.stages))
            })
            .collect();

        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&vk_bindings);

        unsafe {
            let layout = self
                .ctx
                .device
                .create_descriptor_set_layout(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create descriptor set layout: {:?}", e))?;
            Ok(Arc::new(DescriptorSetLayout::new(Arc::clone(&self.ctx), layout)))
        }
    }

    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc) -> Result<Arc<dyn GpuPipeline>> {
        let render_pass = downcast::<RenderPass>(desc.render_pass.as_any(), "Render pass")?.render_pass;

        let entry_points = desc
            .stages
            .iter()
            .map(|stage| {
                CString::new(stage.entry_point)
                    .map_err(|_| engine_err_invalid!(SOURCE, "Invalid entry point name '{}'", stage.entry_point))
            })
            .collect::<Result<Vec<_>>>()?;

        let shader_stages = desc
            .stages
            .iter()
            .zip(&entry_points)
            .map(|(stage, entry_point)| {
                let module = downcast::<ShaderModule>(stage.module.as_any(), "Shader module")?;
                Ok(vk::PipelineShaderStageCreateInfo::default()
                    .stage(shader_stages_to_vk(stage.stage))
                    .module(module.module)
                    .name(entry_point))
            })
            .collect::<Result<Vec<_>>>()?;

        let vertex_bindings: Vec<vk::VertexInputBindingDescription> = desc
            .vertex_input
            .bindings
            .iter()
            .map(|binding| vk::VertexInputBindingDescription {
                binding: binding.binding,
                stride: binding.stride,
                input_rate: vk::VertexInputRate::VERTEX,
            })
            .collect();
        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc
            .vertex_input
            .attributes
            .iter()
            .map(|attribute| vk::VertexInputAttributeDescription {
                location: attribute.location,
                binding: attribute.binding,
                format: format_to_vk(attribute.format),
                offset: attribute.offset,
            })
            .collect();
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic; only the counts matter here
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let state = desc.state;
        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(cull_mode_to_vk(state.cull_mode))
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(state.depth_test_enable)
            .depth_write_enable(state.depth_write_enable)
            .depth_compare_op(compare_op_to_vk(state.depth_compare_op))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(color_write_mask_to_vk(state.color_write_mask))
            .blend_enable(state.blend_enable)
            .src_color_blend_factor(blend_factor_to_vk(state.src_color_blend_factor))
            .dst_color_blend_factor(blend_factor_to_vk(state.dst_color_blend_factor))
            .color_blend_op(blend_op_to_vk(state.color_blend_op))
            .src_alpha_blend_factor(blend_factor_to_vk(state.src_alpha_blend_factor))
            .dst_alpha_blend_factor(blend_factor_to_vk(state.dst_alpha_blend_factor))
            .alpha_blend_op(blend_op_to_vk(state.alpha_blend_op));
        let color_blend_attachments = vec![color_blend_attachment; desc.color_attachment_count as usize];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let layout = self.create_pipeline_layout(&desc.set_layouts, desc.push_constant_ranges)?;

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(desc.subpass);

        unsafe {
            match self
                .ctx
                .device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
            {
                Ok(pipelines) => Ok(Arc::new(Pipeline::new(
                    Arc::clone(&self.ctx),
                    pipelines[0],
                    layout,
                    PipelineBindPoint::Graphics,
                ))),
                Err((_, e)) => {
                    self.ctx.device.destroy_pipeline_layout(layout, None);
                    Err(engine_err!(
                        SOURCE,
                        "Failed to create graphics pipeline (subpass {}): {:?}",
                        desc.subpass,
                        e
                    ))
                }
            }
        }
    }

    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc) -> Result<Arc<dyn GpuPipeline>> {
        let module = downcast::<ShaderModule>(desc.stage.module.as_any(), "Shader module")?;
        let entry_point = CString::new(desc.stage.entry_point)
            .map_err(|_| engine_err_invalid!(SOURCE, "Invalid entry point name '{}'", desc.stage.entry_point))?;

        let stage = vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(module.module)
            .name(&entry_point);

        let layout = self.create_pipeline_layout(&desc.set_layouts, desc.push_constant_ranges)?;
        let create_info = vk::ComputePipelineCreateInfo::default().stage(stage).layout(layout);

        unsafe {
            match self
                .ctx
                .device
                .create_compute_pipelines(vk::PipelineCache::null(), &[create_info], None)
            {
                Ok(pipelines) => Ok(Arc::new(Pipeline::new(
                    Arc::clone(&self.ctx),
                    pipelines[0],
                    layout,
                    PipelineBindPoint::Compute,
                ))),
                Err((_, e)) => {
                    self.ctx.device.destroy_pipeline_layout(layout, None);
                    Err(engine_err!(SOURCE, "Failed to create compute pipeline: {:?}", e))
                }
            }
        }
    }

    fn allocate_descriptor_set(&self, layout: &dyn GpuDescriptorSetLayout) -> Result<Arc<dyn GpuDescriptorSet>> {
        let layout = downcast::<DescriptorSetLayout>(layout.as_any(), "Descriptor set layout")?;
        let set: DescriptorSet = self.descriptors.allocate(layout.layout)?;
        Ok(Arc::new(set))
    }

    fn update_descriptor_set(&self, set: &dyn GpuDescriptorSet, writes: &[DescriptorWrite]) -> Result<()> {
        let vk_set = downcast::<DescriptorSet>(set.as_any(), "Descriptor set")?.set;
        let infos = writes.iter().map(write_info).collect::<Result<Vec<_>>>()?;

        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .zip(&infos)
            .map(|(write, info)| {
                let vk_write = vk::WriteDescriptorSet::default()
                    .dst_set(vk_set)
                    .dst_binding(write.binding)
                    .dst_array_element(0)
                    .descriptor_type(descriptor_type_to_vk(write.descriptor_type));
                match info {
                    WriteInfo::Buffer(info) => vk_write.buffer_info(std::slice::from_ref(info)),
                    WriteInfo::Image(info) => vk_write.image_info(std::slice::from_ref(info)),
                    WriteInfo::TexelBuffer(view) => vk_write.texel_buffer_view(std::slice::from_ref(view)),
                }
            })
            .collect();

        unsafe {
            self.ctx.device.update_descriptor_sets(&vk_writes, &[]);
        }
        Ok(())
    }

    fn create_command_buffer(&self) -> Result<Box<dyn EngineCommandBuffer>> {
        Ok(Box::new(CommandBuffer::new(Arc::clone(&self.ctx))?))
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!(SOURCE, "Failed to wait for device idle: {:?}", e))
        }
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
        }
    }
}

/// GpuContext - shared Vulkan state for every backend object
///
/// Buffers, images, pipelines and command buffers each hold an
/// `Arc<GpuContext>`; the device and instance are destroyed when the last
/// object referencing them is gone.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use std::any::Any;
use std::mem::ManuallyDrop;
use std::sync::Mutex;
use x2_engine::x2::{Error, Result};
use x2_engine::{engine_err, engine_error};

pub(crate) const SOURCE: &str = "x2::vulkan";

/// Recover the Vulkan object behind an engine handle
pub(crate) fn downcast<'a, T: 'static>(object: &'a dyn Any, what: &str) -> Result<&'a T> {
    object
        .downcast_ref::<T>()
        .ok_or_else(|| engine_err!(SOURCE, "{} was not created by the Vulkan backend", what))
}

/// Shared GPU context
pub struct GpuContext {
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// Dropped before the device is destroyed
    pub(crate) allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Graphics queue; also used for presentation. Submissions are serialized.
    pub(crate) graphics_queue: Mutex<vk::Queue>,
    pub(crate) graphics_queue_family: u32,

    /// Pool for one-shot upload command buffers (TRANSIENT + RESET_COMMAND_BUFFER)
    upload_command_pool: Mutex<vk::CommandPool>,

    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl GpuContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        allocator: Allocator,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        upload_command_pool: vk::CommandPool,
        debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
        debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    ) -> Self {
        Self {
            entry,
            instance,
            physical_device,
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue: Mutex::new(graphics_queue),
            graphics_queue_family,
            upload_command_pool: Mutex::new(upload_command_pool),
            debug_utils_loader,
            debug_messenger,
        }
    }

    /// Allocate and bind memory for a buffer
    pub(crate) fn allocate_buffer_memory(
        &self,
        buffer: vk::Buffer,
        name: &str,
        location: MemoryLocation,
    ) -> Result<Allocation> {
        unsafe {
            let requirements = self.device.get_buffer_memory_requirements(buffer);
            let allocation = self
                .allocator
                .lock()
                .map_err(|_| engine_err!(SOURCE, "GPU allocator lock poisoned"))?
                .allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!(SOURCE, "Out of GPU memory for buffer '{}' ({:.2} MB)", name, size_mb);
                    Error::OutOfMemory
                })?;

            if let Err(e) = self
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
            {
                self.free(allocation);
                return Err(engine_err!(SOURCE, "Failed to bind buffer memory for '{}': {:?}", name, e));
            }
            Ok(allocation)
        }
    }

    /// Allocate and bind device-local memory for an image
    pub(crate) fn allocate_image_memory(&self, image: vk::Image, name: &str) -> Result<Allocation> {
        unsafe {
            let requirements = self.device.get_image_memory_requirements(image);
            let allocation = self
                .allocator
                .lock()
                .map_err(|_| engine_err!(SOURCE, "GPU allocator lock poisoned"))?
                .allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!(SOURCE, "Out of GPU memory for image '{}' ({:.2} MB)", name, size_mb);
                    Error::OutOfMemory
                })?;

            if let Err(e) = self
                .device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
            {
                self.free(allocation);
                return Err(engine_err!(SOURCE, "Failed to bind image memory for '{}': {:?}", name, e));
            }
            Ok(allocation)
        }
    }

    /// Return an allocation to the allocator (never panics)
    pub(crate) fn free(&self, allocation: Allocation) {
        if let Ok(mut allocator) = self.allocator.lock() {
            allocator.free(allocation).ok();
        }
    }

    /// Create a host-visible staging buffer filled with `data`
    pub(crate) fn create_staging_buffer(&self, data: &[u8]) -> Result<(vk::Buffer, Allocation)> {
        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(data.len() as u64)
                .usage(vk::BufferUsageFlags::TRANSFER_SRC)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = self
                .device
                .create_buffer(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create staging buffer: {:?}", e))?;

            let allocation = match self.allocate_buffer_memory(buffer, "staging_buffer", MemoryLocation::CpuToGpu) {
                Ok(allocation) => allocation,
                Err(e) => {
                    self.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            let Some(mapped_ptr) = allocation.mapped_ptr() else {
                self.free(allocation);
                self.device.destroy_buffer(buffer, None);
                return Err(engine_err!(SOURCE, "Staging buffer is not mapped"));
            };
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.as_ptr() as *mut u8, data.len());

            Ok((buffer, allocation))
        }
    }

    pub(crate) fn destroy_staging_buffer(&self, buffer: vk::Buffer, allocation: Allocation) {
        self.free(allocation);
        unsafe {
            self.device.destroy_buffer(buffer, None);
        }
    }

    /// Record commands into a one-shot command buffer, submit and wait for completion
    pub(crate) fn immediate_submit<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let pool = self
            .upload_command_pool
            .lock()
            .map_err(|_| engine_err!(SOURCE, "Upload command pool lock poisoned"))?;

        unsafe {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = self
                .device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| engine_err!(SOURCE, "Failed to allocate upload command buffer: {:?}", e))?[0];

            let result = self.record_and_wait(command_buffer, record);
            self.device.free_command_buffers(*pool, &[command_buffer]);
            result
        }
    }

    unsafe fn record_and_wait<F>(&self, command_buffer: vk::CommandBuffer, record: F) -> Result<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        self.device
            .begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| engine_err!(SOURCE, "Failed to begin upload command buffer: {:?}", e))?;

        record(&self.device, command_buffer);

        self.device
            .end_command_buffer(command_buffer)
            .map_err(|e| engine_err!(SOURCE, "Failed to end upload command buffer: {:?}", e))?;

        let fence = self
            .device
            .create_fence(&vk::FenceCreateInfo::default(), None)
            .map_err(|e| engine_err!(SOURCE, "Failed to create upload fence: {:?}", e))?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

        let submitted = match self.graphics_queue.lock() {
            Ok(queue) => self
                .device
                .queue_submit(*queue, &[submit_info], fence)
                .map_err(|e| engine_err!(SOURCE, "Failed to submit upload commands: {:?}", e)),
            Err(_) => Err(engine_err!(SOURCE, "Graphics queue lock poisoned")),
        };

        let result = submitted.and_then(|_| {
            self.device
                .wait_for_fences(&[fence], true, u64::MAX)
                .map_err(|e| engine_err!(SOURCE, "Failed to wait for upload fence: {:?}", e))
        });

        self.device.destroy_fence(fence, None);
        result
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            if let Ok(pool) = self.upload_command_pool.lock() {
                self.device.destroy_command_pool(*pool, None);
            }

            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);

            if let (Some(loader), Some(messenger)) = (&self.debug_utils_loader, self.debug_messenger) {
                loader.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

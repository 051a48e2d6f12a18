/// Descriptor allocation - growing list of descriptor pools
///
/// Sets are allocated from the newest pool; when it is exhausted a new pool
/// of the same size is appended. Pools are destroyed once the allocator and
/// every set allocated from it are gone.

use ash::vk;
use std::any::Any;
use std::sync::{Arc, Mutex};
use x2_engine::graphics_device::GpuDescriptorSet;
use x2_engine::x2::{Error, Result};
use x2_engine::{engine_debug, engine_err, engine_error};

use crate::vulkan_context::{GpuContext, SOURCE};

/// Descriptor counts per pool, relative to the pool's set capacity
const POOL_RATIOS: [(vk::DescriptorType, u32); 6] = [
    (vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 4),
    (vk::DescriptorType::UNIFORM_BUFFER, 2),
    (vk::DescriptorType::STORAGE_BUFFER, 1),
    (vk::DescriptorType::UNIFORM_TEXEL_BUFFER, 1),
    (vk::DescriptorType::STORAGE_IMAGE, 1),
    (vk::DescriptorType::INPUT_ATTACHMENT, 1),
];

/// Pool sizes for a pool holding `max_sets` sets
pub(crate) fn pool_sizes(max_sets: u32) -> Vec<vk::DescriptorPoolSize> {
    POOL_RATIOS
        .iter()
        .map(|&(ty, ratio)| vk::DescriptorPoolSize {
            ty,
            descriptor_count: max_sets.max(1) * ratio,
        })
        .collect()
}

/// Whether an allocation failure means "add a pool and retry"
pub(crate) fn is_pool_exhausted(result: vk::Result) -> bool {
    matches!(
        result,
        vk::Result::ERROR_OUT_OF_POOL_MEMORY | vk::Result::ERROR_FRAGMENTED_POOL
    )
}

/// Growing descriptor pool allocator
pub struct DescriptorAllocator {
    ctx: Arc<GpuContext>,
    pools: Mutex<Vec<vk::DescriptorPool>>,
    sets_per_pool: u32,
}

impl DescriptorAllocator {
    pub(crate) fn new(ctx: Arc<GpuContext>, sets_per_pool: u32) -> Result<Self> {
        let sets_per_pool = sets_per_pool.max(1);
        let pool = Self::create_pool(&ctx, sets_per_pool).map_err(|e| match e {
            Error::BackendError(message) => Error::InitializationFailed(message),
            other => other,
        })?;
        Ok(Self {
            ctx,
            pools: Mutex::new(vec![pool]),
            sets_per_pool,
        })
    }

    fn create_pool(ctx: &GpuContext, max_sets: u32) -> Result<vk::DescriptorPool> {
        let sizes = pool_sizes(max_sets);
        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&sizes)
            .max_sets(max_sets);

        unsafe {
            ctx.device
                .create_descriptor_pool(&info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create descriptor pool: {:?}", e))
        }
    }

    /// Number of pools created so far
    pub fn pool_count(&self) -> usize {
        self.pools.lock().map(|pools| pools.len()).unwrap_or(0)
    }

    /// Allocate one set with `layout`, growing the pool list when needed
    pub(crate) fn allocate(self: &Arc<Self>, layout: vk::DescriptorSetLayout) -> Result<DescriptorSet> {
        let mut pools = self
            .pools
            .lock()
            .map_err(|_| engine_err!(SOURCE, "Descriptor pool lock poisoned"))?;

        let layouts = [layout];
        let current = *pools
            .last()
            .ok_or_else(|| engine_err!(SOURCE, "Descriptor allocator has no pool"))?;

        let result = unsafe {
            let info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(current)
                .set_layouts(&layouts);
            self.ctx.device.allocate_descriptor_sets(&info)
        };

        let sets = match result {
            Ok(sets) => sets,
            Err(e) if is_pool_exhausted(e) => {
                let pool = Self::create_pool(&self.ctx, self.sets_per_pool)?;
                pools.push(pool);
                engine_debug!(SOURCE, "Descriptor pool exhausted, growing to {} pools", pools.len());

                unsafe {
                    let info = vk::DescriptorSetAllocateInfo::default()
                        .descriptor_pool(pool)
                        .set_layouts(&layouts);
                    self.ctx.device.allocate_descriptor_sets(&info).map_err(|e| {
                        engine_error!(SOURCE, "Failed to allocate descriptor set from a fresh pool: {:?}", e);
                        Error::OutOfMemory
                    })?
                }
            }
            Err(e) => return Err(engine_err!(SOURCE, "Failed to allocate descriptor set: {:?}", e)),
        };

        let set = sets
            .first()
            .copied()
            .ok_or_else(|| engine_err!(SOURCE, "Descriptor set allocation returned no set"))?;

        Ok(DescriptorSet {
            _allocator: Arc::clone(self),
            set,
        })
    }
}

impl Drop for DescriptorAllocator {
    fn drop(&mut self) {
        if let Ok(pools) = self.pools.lock() {
            for &pool in pools.iter() {
                unsafe {
                    self.ctx.device.destroy_descriptor_pool(pool, None);
                }
            }
        }
    }
}

/// Vulkan descriptor set (returned to its pool when the pool is destroyed)
pub struct DescriptorSet {
    _allocator: Arc<DescriptorAllocator>,
    pub(crate) set: vk::DescriptorSet,
}

impl GpuDescriptorSet for DescriptorSet {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "vulkan_descriptor_tests.rs"]
mod tests;

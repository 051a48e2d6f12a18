/// Graphics context shared by every engine object
///
/// Bundles the graphics device with the render pass cache. Resources,
/// shaders, materials and features receive an `Arc<GraphicsContext>` at
/// construction.

use std::sync::{Arc, Mutex, MutexGuard};
use crate::engine_err;
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::render_pass::{RenderPassLease, RenderPassManager, RenderPassSettings};

pub struct GraphicsContext {
    device: Arc<dyn GraphicsDevice>,
    render_passes: Arc<Mutex<RenderPassManager>>,
}

impl GraphicsContext {
    /// Create a context whose render pass cache knows every built-in pass
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Result<Arc<Self>> {
        Ok(Self::with_render_pass_manager(device, RenderPassManager::with_builtin_passes()?))
    }

    pub fn with_render_pass_manager(device: Arc<dyn GraphicsDevice>, manager: RenderPassManager) -> Arc<Self> {
        Arc::new(Self {
            device,
            render_passes: Arc::new(Mutex::new(manager)),
        })
    }

    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    pub fn device_arc(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    pub fn render_pass_manager(&self) -> &Arc<Mutex<RenderPassManager>> {
        &self.render_passes
    }

    /// Lock the render pass cache
    pub fn render_passes(&self) -> Result<MutexGuard<'_, RenderPassManager>> {
        self.render_passes
            .lock()
            .map_err(|_| engine_err!("x2::GraphicsContext", "RenderPassManager lock poisoned"))
    }

    /// Register an application render pass recipe
    pub fn register_render_pass<F>(&self, name: &str, populate: F) -> Result<()>
    where
        F: Fn(&mut RenderPassSettings) + Send + Sync + 'static,
    {
        self.render_passes()?.register(name, populate)
    }

    /// Load a render pass for as long as the returned lease lives
    pub fn lease_render_pass(&self, name: &str) -> Result<RenderPassLease> {
        RenderPassManager::lease(&self.render_passes, self.device.as_ref(), name)
    }

    /// Destroy unreferenced render passes
    pub fn collect_render_passes(&self) -> Result<usize> {
        Ok(self.render_passes()?.collect())
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

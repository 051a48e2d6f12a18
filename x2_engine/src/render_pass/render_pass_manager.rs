/// Render pass cache of the engine.
///
/// Render passes are registered by name as populate closures (recipes).
/// The first load of a name compiles the recipe; later loads return the
/// cached pass and increment its reference count. Entries with a zero count
/// stay cached until the next `collect`.

use std::ops::Deref;
use std::sync::{Arc, Mutex};
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::{engine_bail, engine_debug, engine_err, engine_warn};
use super::render_pass::{RenderPass, RenderPassSettings};

/// Populate closure declaring the content of a render pass
pub type RenderPassRecipe = Box<dyn Fn(&mut RenderPassSettings) + Send + Sync>;

struct RenderPassEntry {
    render_pass: Arc<RenderPass>,
    ref_count: u32,
}

/// Named, reference-counted render pass cache
pub struct RenderPassManager {
    recipes: FxHashMap<String, RenderPassRecipe>,
    entries: FxHashMap<String, RenderPassEntry>,
}

impl RenderPassManager {
    /// Create an empty manager (no recipe registered)
    pub fn new() -> Self {
        Self {
            recipes: FxHashMap::default(),
            entries: FxHashMap::default(),
        }
    }

    /// Create a manager with every built-in render pass registered
    pub fn with_builtin_passes() -> Result<Self> {
        let mut manager = Self::new();
        crate::features::register_builtin_render_passes(&mut manager)?;
        Ok(manager)
    }

    /// Register a render pass recipe under `name`
    ///
    /// # Errors
    ///
    /// Returns an error if a recipe with the same name already exists.
    pub fn register<F>(&mut self, name: &str, populate: F) -> Result<()>
    where
        F: Fn(&mut RenderPassSettings) + Send + Sync + 'static,
    {
        if self.recipes.contains_key(name) {
            engine_bail!("x2::RenderPassManager",
                "RenderPass '{}' already exists", name);
        }

        self.recipes.insert(name.to_string(), Box::new(populate));
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.recipes.contains_key(name)
    }

    /// Load the render pass registered under `name`
    ///
    /// Compiles it on first load, increments its reference count otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if no recipe is registered under `name` or if
    /// compilation fails.
    pub fn load(&mut self, device: &dyn GraphicsDevice, name: &str) -> Result<Arc<RenderPass>> {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.ref_count += 1;
            return Ok(entry.render_pass.clone());
        }

        let recipe = match self.recipes.get(name) {
            Some(recipe) => recipe,
            None => engine_bail!("x2::RenderPassManager",
                "RenderPass '{}' is not registered", name),
        };

        let mut settings = RenderPassSettings::new();
        recipe(&mut settings);
        let render_pass = Arc::new(RenderPass::compile(device, name, settings)?);
        engine_debug!("x2::RenderPassManager", "Compiled render pass '{}'", name);

        self.entries.insert(name.to_string(), RenderPassEntry {
            render_pass: render_pass.clone(),
            ref_count: 1,
        });
        Ok(render_pass)
    }

    /// Decrement the reference count of `name` without destroying it
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not loaded or already at zero.
    pub fn unload(&mut self, name: &str) -> Result<()> {
        match self.entries.get_mut(name) {
            Some(entry) if entry.ref_count > 0 => {
                entry.ref_count -= 1;
                Ok(())
            }
            Some(_) => Err(engine_err!("x2::RenderPassManager",
                "RenderPass '{}' unloaded more times than loaded", name)),
            None => Err(engine_err!("x2::RenderPassManager",
                "RenderPass '{}' is not loaded", name)),
        }
    }

    /// Decrement the reference count of an instance
    pub fn unload_instance(&mut self, render_pass: &RenderPass) -> Result<()> {
        self.unload(render_pass.name())
    }

    /// Destroy every cached render pass whose reference count is zero
    ///
    /// Returns the number of evicted entries.
    pub fn collect(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|name, entry| {
            if entry.ref_count > 0 {
                return true;
            }
            if Arc::strong_count(&entry.render_pass) > 1 {
                engine_warn!("x2::RenderPassManager",
                    "RenderPass '{}' collected while still referenced", name);
            }
            false
        });
        before - self.entries.len()
    }

    /// Current reference count of `name` (0 when not cached)
    pub fn ref_count(&self, name: &str) -> u32 {
        self.entries.get(name).map(|e| e.ref_count).unwrap_or(0)
    }

    /// Whether `name` has a compiled, cached render pass
    pub fn is_loaded(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn loaded_count(&self) -> usize {
        self.entries.len()
    }

    /// Load `name` and wrap it in a lease that unloads it when dropped
    pub fn lease(
        manager: &Arc<Mutex<RenderPassManager>>,
        device: &dyn GraphicsDevice,
        name: &str,
    ) -> Result<RenderPassLease> {
        let render_pass = manager
            .lock()
            .map_err(|_| engine_err!("x2::RenderPassManager", "RenderPassManager lock poisoned"))?
            .load(device, name)?;
        Ok(RenderPassLease {
            manager: manager.clone(),
            render_pass,
        })
    }
}

impl Default for RenderPassManager {
    fn default() -> Self {
        Self::new()
    }
}

// ===== LEASE =====

/// A loaded render pass, unloaded from its manager on drop
pub struct RenderPassLease {
    manager: Arc<Mutex<RenderPassManager>>,
    render_pass: Arc<RenderPass>,
}

impl RenderPassLease {
    pub fn render_pass(&self) -> &Arc<RenderPass> {
        &self.render_pass
    }
}

impl Deref for RenderPassLease {
    type Target = RenderPass;

    fn deref(&self) -> &RenderPass {
        &self.render_pass
    }
}

impl Drop for RenderPassLease {
    fn drop(&mut self) {
        match self.manager.lock() {
            Ok(mut manager) => {
                if let Err(e) = manager.unload(self.render_pass.name()) {
                    engine_warn!("x2::RenderPassLease", "Release failed: {}", e);
                }
            }
            Err(_) => engine_warn!("x2::RenderPassLease",
                "RenderPassManager lock poisoned, '{}' not released", self.render_pass.name()),
        }
    }
}

#[cfg(test)]
#[path = "render_pass_manager_tests.rs"]
mod tests;

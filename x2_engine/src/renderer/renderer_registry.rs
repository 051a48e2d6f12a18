/// Named renderer constructors.
///
/// A renderer is registered as a closure building a [`RendererBase`] from
/// the graphics context and [`RendererSettings`]; cameras instantiate
/// renderers by name.

use std::path::PathBuf;
use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::features::{
    AmbientOcclusionConfig, AoBlurConfig, AoCoverConfig, BackgroundConfig, ShadowCasterConfig,
    ShadowReceiverConfig,
};
use crate::graphics_device::Swapchain;
use crate::{engine_bail, engine_debug};
use super::renderer_base::RendererBase;

/// Configuration shared by every built-in renderer
#[derive(Clone)]
pub struct RendererSettings {
    /// Directory holding the built-in shader settings and bytecode
    pub shader_dir: PathBuf,
    pub background: BackgroundConfig,
    pub ambient_occlusion: AmbientOcclusionConfig,
    pub ao_blur: AoBlurConfig,
    pub ao_cover: AoCoverConfig,
    pub shadow_caster: ShadowCasterConfig,
    pub shadow_receiver: ShadowReceiverConfig,
    /// Present target; renderers without one leave the image in the
    /// camera color attachment
    pub swapchain: Option<Arc<dyn Swapchain>>,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from("assets/shaders"),
            background: BackgroundConfig::default(),
            ambient_occlusion: AmbientOcclusionConfig::default(),
            ao_blur: AoBlurConfig::default(),
            ao_cover: AoCoverConfig::default(),
            shadow_caster: ShadowCasterConfig::default(),
            shadow_receiver: ShadowReceiverConfig::default(),
            swapchain: None,
        }
    }
}

impl std::fmt::Debug for RendererSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererSettings")
            .field("shader_dir", &self.shader_dir)
            .field("background", &self.background)
            .field("ambient_occlusion", &self.ambient_occlusion)
            .field("ao_blur", &self.ao_blur)
            .field("ao_cover", &self.ao_cover)
            .field("shadow_caster", &self.shadow_caster)
            .field("shadow_receiver", &self.shadow_receiver)
            .field("swapchain", &self.swapchain.is_some())
            .finish()
    }
}

pub type RendererConstructor =
    Box<dyn Fn(&Arc<GraphicsContext>, &RendererSettings) -> Result<RendererBase> + Send + Sync>;

pub struct RendererRegistry {
    constructors: FxHashMap<String, RendererConstructor>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self { constructors: FxHashMap::default() }
    }

    /// Registry knowing "Deferred" and "Shadowed"
    pub fn with_builtin_renderers() -> Result<Self> {
        let mut registry = Self::new();
        super::deferred::register_builtin_renderers(&mut registry)?;
        Ok(registry)
    }

    /// # Errors
    ///
    /// Returns an error if a renderer with the same name already exists.
    pub fn register<F>(&mut self, name: &str, constructor: F) -> Result<()>
    where
        F: Fn(&Arc<GraphicsContext>, &RendererSettings) -> Result<RendererBase> + Send + Sync + 'static,
    {
        if self.constructors.contains_key(name) {
            engine_bail!("x2::RendererRegistry", "Renderer '{}' already exists", name);
        }
        self.constructors.insert(name.to_string(), Box::new(constructor));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Build the renderer registered under `name`
    pub fn create(&self, name: &str, ctx: &Arc<GraphicsContext>, settings: &RendererSettings) -> Result<RendererBase> {
        let constructor = match self.constructors.get(name) {
            Some(constructor) => constructor,
            None => engine_bail!("x2::RendererRegistry", "Unknown renderer '{}'", name),
        };
        let renderer = constructor(ctx, settings)?;
        engine_debug!("x2::RendererRegistry", "Created renderer '{}' ({} features)",
            name, renderer.feature_names().count());
        Ok(renderer)
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::new()
    }
}

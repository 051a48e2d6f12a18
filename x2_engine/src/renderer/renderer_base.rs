/// RendererBase: drives an ordered list of render features.
///
/// Features run in push order. Preliminary features run before the main
/// list on the first frame of each RendererData only; the first
/// `finish_renderer` marks them finished.

use std::sync::Arc;
use crate::camera::Camera;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::render_feature::{RenderFeature, RenderObject};
use crate::{engine_bail, engine_debug, engine_info};
use super::renderer_data::{RenderFeatureWrapper, RendererData};

/// Wires cross-feature inputs after every feature created its data and
/// before any feature resolves (again on every refresh)
pub type ResolveHook = Box<dyn Fn(&mut RendererData) -> Result<()> + Send + Sync>;

struct FeatureEntry {
    name: String,
    feature: Arc<dyn RenderFeature>,
}

pub struct RendererBase {
    name: String,
    ctx: Arc<GraphicsContext>,
    preliminary: Vec<FeatureEntry>,
    features: Vec<FeatureEntry>,
    resolve_hook: Option<ResolveHook>,
}

impl RendererBase {
    pub fn new(ctx: &Arc<GraphicsContext>, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ctx: ctx.clone(),
            preliminary: Vec::new(),
            features: Vec::new(),
            resolve_hook: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ===== COMPOSITION =====

    /// Add a feature that runs on the first frame only
    pub fn push_preliminary_render_feature(&mut self, name: &str, feature: Arc<dyn RenderFeature>) -> Result<()> {
        self.check_unique(name)?;
        self.preliminary.push(FeatureEntry { name: name.to_string(), feature });
        Ok(())
    }

    /// Add a feature that runs every frame
    pub fn push_render_feature(&mut self, name: &str, feature: Arc<dyn RenderFeature>) -> Result<()> {
        self.check_unique(name)?;
        self.features.push(FeatureEntry { name: name.to_string(), feature });
        Ok(())
    }

    pub fn set_resolve_hook<F>(&mut self, hook: F)
    where
        F: Fn(&mut RendererData) -> Result<()> + Send + Sync + 'static,
    {
        self.resolve_hook = Some(Box::new(hook));
    }

    fn check_unique(&self, name: &str) -> Result<()> {
        if self.entries().any(|entry| entry.name == name) {
            engine_bail!("x2::RendererBase",
                "Renderer '{}' already has a render feature named '{}'", self.name, name);
        }
        Ok(())
    }

    fn entries(&self) -> impl Iterator<Item = &FeatureEntry> {
        self.preliminary.iter().chain(self.features.iter())
    }

    pub fn feature(&self, name: &str) -> Option<&Arc<dyn RenderFeature>> {
        self.entries().find(|entry| entry.name == name).map(|entry| &entry.feature)
    }

    /// Feature names in execution order (preliminary first)
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.entries().map(|entry| entry.name.as_str())
    }

    // ===== PER-CAMERA DATA =====

    /// Create, wire and resolve the data of every feature for `camera`
    pub fn create_renderer_data(&self, camera: &Camera) -> Result<RendererData> {
        let mut data = RendererData::new(&self.name);

        for entry in self.entries() {
            let feature_data = entry.feature.create_data(camera)?;
            let command_buffer = self.ctx.device().create_command_buffer()?;
            data.insert(&entry.name, RenderFeatureWrapper { data: feature_data, command_buffer });
        }

        self.resolve(&mut data, camera)?;
        engine_info!("x2::RendererBase", "Renderer '{}' created data for camera '{}' ({} features)",
            self.name, camera.name(), data.feature_count());
        Ok(data)
    }

    /// Re-wire and re-resolve after the camera's attachments changed
    pub fn refresh_renderer_data(&self, data: &mut RendererData, camera: &Camera) -> Result<()> {
        engine_debug!("x2::RendererBase", "Renderer '{}' refreshing data for camera '{}'",
            self.name, camera.name());
        self.resolve(data, camera)
    }

    fn resolve(&self, data: &mut RendererData, camera: &Camera) -> Result<()> {
        if let Some(hook) = &self.resolve_hook {
            hook(data)?;
        }
        for entry in self.entries() {
            let wrapper = data.wrapper_mut(&entry.name)?;
            entry.feature.resolve_data(wrapper.data.as_mut(), camera)?;
        }
        Ok(())
    }

    /// Destroy every feature's data in reverse push order
    pub fn destroy_renderer_data(&self, mut data: RendererData) -> Result<()> {
        let entries: Vec<&FeatureEntry> = self.entries().collect();
        for entry in entries.into_iter().rev() {
            if let Some(wrapper) = data.remove(&entry.name) {
                entry.feature.destroy_data(wrapper.data)?;
            }
        }
        Ok(())
    }

    // ===== FRAME =====

    fn run_phase<F>(&self, data: &mut RendererData, mut phase: F) -> Result<()>
    where
        F: FnMut(&dyn RenderFeature, &mut RenderFeatureWrapper) -> Result<()>,
    {
        let preliminary: &[FeatureEntry] = if data.preliminary_finished() {
            &[]
        } else {
            &self.preliminary
        };
        for entry in preliminary.iter().chain(self.features.iter()) {
            phase(entry.feature.as_ref(), data.wrapper_mut(&entry.name)?)?;
        }
        Ok(())
    }

    pub fn prepare_renderer(&self, data: &mut RendererData, camera: &Camera) -> Result<()> {
        self.run_phase(data, |feature, wrapper| feature.prepare(wrapper.data.as_mut(), camera))
    }

    pub fn execute_renderer(&self, data: &mut RendererData, camera: &Camera, renderables: &[RenderObject]) -> Result<()> {
        self.run_phase(data, |feature, wrapper| {
            feature.execute(wrapper.data.as_mut(), wrapper.command_buffer.as_mut(), camera, renderables)
        })
    }

    pub fn submit_renderer(&self, data: &mut RendererData) -> Result<()> {
        self.run_phase(data, |feature, wrapper| {
            feature.submit(wrapper.data.as_mut(), wrapper.command_buffer.as_mut())
        })
    }

    /// Wait for every feature; the first call retires the preliminary features
    pub fn finish_renderer(&self, data: &mut RendererData) -> Result<()> {
        self.run_phase(data, |feature, wrapper| {
            feature.finish(wrapper.data.as_mut(), wrapper.command_buffer.as_mut())
        })?;
        data.mark_preliminary_finished();
        Ok(())
    }

    /// One full frame: prepare, execute, submit, finish
    pub fn render_frame(&self, data: &mut RendererData, camera: &Camera, renderables: &[RenderObject]) -> Result<()> {
        self.prepare_renderer(data, camera)?;
        self.execute_renderer(data, camera, renderables)?;
        self.submit_renderer(data)?;
        self.finish_renderer(data)
    }
}

#[cfg(test)]
#[path = "renderer_base_tests.rs"]
mod tests;

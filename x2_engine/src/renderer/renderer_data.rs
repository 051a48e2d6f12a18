/// Per-camera state of a renderer: one wrapper per feature name.

use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::graphics_device::CommandBuffer;
use crate::render_feature::{downcast_data, downcast_data_mut, RenderFeatureData};
use crate::engine_err;

/// Data and command buffer of one feature for one camera
pub struct RenderFeatureWrapper {
    pub data: Box<RenderFeatureData>,
    pub command_buffer: Box<dyn CommandBuffer>,
}

pub struct RendererData {
    renderer: String,
    wrappers: FxHashMap<String, RenderFeatureWrapper>,
    preliminary_finished: bool,
}

impl RendererData {
    pub(crate) fn new(renderer: &str) -> Self {
        Self {
            renderer: renderer.to_string(),
            wrappers: FxHashMap::default(),
            preliminary_finished: false,
        }
    }

    pub(crate) fn insert(&mut self, feature: &str, wrapper: RenderFeatureWrapper) {
        self.wrappers.insert(feature.to_string(), wrapper);
    }

    pub(crate) fn remove(&mut self, feature: &str) -> Option<RenderFeatureWrapper> {
        self.wrappers.remove(feature)
    }

    pub(crate) fn mark_preliminary_finished(&mut self) {
        self.preliminary_finished = true;
    }

    /// Name of the renderer this data was created by
    pub fn renderer(&self) -> &str {
        &self.renderer
    }

    /// Whether the preliminary features already ran their single cycle
    pub fn preliminary_finished(&self) -> bool {
        self.preliminary_finished
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.wrappers.contains_key(feature)
    }

    pub fn feature_count(&self) -> usize {
        self.wrappers.len()
    }

    pub fn wrapper(&self, feature: &str) -> Result<&RenderFeatureWrapper> {
        self.wrappers.get(feature).ok_or_else(|| engine_err!("x2::RendererData",
            "Renderer '{}' has no data for feature '{}'", self.renderer, feature))
    }

    pub fn wrapper_mut(&mut self, feature: &str) -> Result<&mut RenderFeatureWrapper> {
        let renderer = &self.renderer;
        self.wrappers.get_mut(feature).ok_or_else(|| engine_err!("x2::RendererData",
            "Renderer '{}' has no data for feature '{}'", renderer, feature))
    }

    /// Typed data of `feature`
    pub fn data<T: 'static>(&self, feature: &str) -> Result<&T> {
        downcast_data(self.wrapper(feature)?.data.as_ref(), feature)
    }

    pub fn data_mut<T: 'static>(&mut self, feature: &str) -> Result<&mut T> {
        downcast_data_mut(self.wrapper_mut(feature)?.data.as_mut(), feature)
    }
}

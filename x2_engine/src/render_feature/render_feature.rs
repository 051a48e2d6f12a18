/// RenderFeature trait and per-camera data helpers.
///
/// Lifecycle of one (feature, camera) pair, driven by the renderer:
///
/// ```text
/// create_data -> resolve_data -> { prepare -> execute -> submit -> finish }* -> destroy_data
///                     ^ again after every camera resize
/// ```

use std::any::Any;
use crate::camera::Camera;
use crate::error::Result;
use crate::graphics_device::CommandBuffer;
use crate::render_feature::RenderObject;
use crate::engine_err;

/// Per-camera mutable state of one feature
pub type RenderFeatureData = dyn Any + Send;

pub trait RenderFeature: Send + Sync {
    /// Allocate the camera's data; size-dependent resources wait for `resolve_data`
    fn create_data(&self, camera: &Camera) -> Result<Box<RenderFeatureData>>;

    /// (Re)allocate images, framebuffers and size uniforms from the camera's attachments
    fn resolve_data(&self, data: &mut RenderFeatureData, camera: &Camera) -> Result<()>;

    /// Release what the data owns
    fn destroy_data(&self, data: Box<RenderFeatureData>) -> Result<()> {
        drop(data);
        Ok(())
    }

    /// CPU-side updates before recording
    fn prepare(&self, _data: &mut RenderFeatureData, _camera: &Camera) -> Result<()> {
        Ok(())
    }

    /// Reset, begin, record and end `cmd`. Must not block.
    fn execute(
        &self,
        data: &mut RenderFeatureData,
        cmd: &mut dyn CommandBuffer,
        camera: &Camera,
        renderables: &[RenderObject],
    ) -> Result<()>;

    fn submit(&self, _data: &mut RenderFeatureData, cmd: &mut dyn CommandBuffer) -> Result<()> {
        cmd.submit(&[], &[])
    }

    /// Block until the submitted work completes
    fn finish(&self, _data: &mut RenderFeatureData, cmd: &mut dyn CommandBuffer) -> Result<()> {
        cmd.wait()
    }
}

/// Downcast feature data to its concrete type
pub fn downcast_data<'a, T: 'static>(data: &'a RenderFeatureData, feature: &str) -> Result<&'a T> {
    data.downcast_ref::<T>().ok_or_else(|| engine_err!("x2::RenderFeature",
        "Data of feature '{}' is not a {}", feature, std::any::type_name::<T>()))
}

pub fn downcast_data_mut<'a, T: 'static>(data: &'a mut RenderFeatureData, feature: &str) -> Result<&'a mut T> {
    data.downcast_mut::<T>().ok_or_else(|| engine_err!("x2::RenderFeature",
        "Data of feature '{}' is not a {}", feature, std::any::type_name::<T>()))
}

#[cfg(test)]
#[path = "render_feature_tests.rs"]
mod tests;

/// Background: clears the camera color attachment to a sky gradient.
///
/// The fragment shader rebuilds the view ray of each pixel from the inverse
/// view-projection and blends ground, horizon and zenith colors by its
/// elevation.

use std::path::Path;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use crate::camera::{Camera, COLOR_ATTACHMENT};
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{ClearValue, CommandBuffer};
use crate::render_feature::{downcast_data_mut, RenderFeature, RenderFeatureData, RenderObject};
use crate::resource::{FrameBuffer, FrameBufferAttachment, DEFAULT_VIEW};
use crate::shader::Shader;
use super::full_screen::{begin_recording, load_shader, resolved, shader_render_pass};

const FEATURE: &str = "Background";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundConfig {
    pub zenith_color: Vec4,
    pub horizon_color: Vec4,
    pub ground_color: Vec4,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            zenith_color: Vec4::new(0.18, 0.36, 0.68, 1.0),
            horizon_color: Vec4::new(0.75, 0.82, 0.90, 1.0),
            ground_color: Vec4::new(0.30, 0.28, 0.26, 1.0),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SkyConstants {
    inverse_view_projection: Mat4,
    zenith_color: Vec4,
    horizon_color: Vec4,
    ground_color: Vec4,
}

pub struct BackgroundData {
    framebuffer: Option<FrameBuffer>,
}

pub struct BackgroundFeature {
    ctx: Arc<GraphicsContext>,
    shader: Arc<Shader>,
    config: BackgroundConfig,
}

impl BackgroundFeature {
    pub fn new(ctx: &Arc<GraphicsContext>, shader_dir: &Path, config: BackgroundConfig) -> Result<Self> {
        Ok(Self {
            ctx: ctx.clone(),
            shader: load_shader(ctx, shader_dir, "background")?,
            config,
        })
    }

    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }
}

impl RenderFeature for BackgroundFeature {
    fn create_data(&self, _camera: &Camera) -> Result<Box<RenderFeatureData>> {
        Ok(Box::new(BackgroundData { framebuffer: None }))
    }

    fn resolve_data(&self, data: &mut RenderFeatureData, camera: &Camera) -> Result<()> {
        let data = downcast_data_mut::<BackgroundData>(data, FEATURE)?;
        let color = camera.attachment(COLOR_ATTACHMENT)?;
        data.framebuffer = Some(FrameBuffer::new(
            &self.ctx,
            shader_render_pass(&self.shader)?,
            &[FrameBufferAttachment::new(COLOR_ATTACHMENT, color, DEFAULT_VIEW)],
        )?);
        Ok(())
    }

    fn execute(
        &self,
        data: &mut RenderFeatureData,
        cmd: &mut dyn CommandBuffer,
        camera: &Camera,
        _renderables: &[RenderObject],
    ) -> Result<()> {
        let data = downcast_data_mut::<BackgroundData>(data, FEATURE)?;
        let framebuffer = resolved(&data.framebuffer, FEATURE, "framebuffer")?;

        begin_recording(cmd)?;
        framebuffer.begin(cmd, &[ClearValue::Color(self.config.horizon_color.to_array())])?;
        self.shader.bind(cmd)?;
        self.shader.push_constants(cmd, 0, &SkyConstants {
            inverse_view_projection: camera.view_projection().inverse(),
            zenith_color: self.config.zenith_color,
            horizon_color: self.config.horizon_color,
            ground_color: self.config.ground_color,
        })?;
        cmd.draw(3, 1, 0, 0)?;
        cmd.end_render_pass()?;
        cmd.end()
    }
}

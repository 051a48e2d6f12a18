/// Multiplies the camera color by the blurred occlusion, in place.
///
/// The shader outputs `mix(1, ao, intensity)`; the pipeline blends it with
/// `src * dst` (srcColorBlendFactor DST_COLOR, dstColorBlendFactor ZERO).

use std::path::Path;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use crate::camera::{Camera, COLOR_ATTACHMENT};
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{ClearValue, CommandBuffer};
use crate::render_feature::{downcast_data_mut, RenderFeature, RenderFeatureData, RenderObject, SharedImage};
use crate::resource::{Buffer, FrameBuffer, FrameBufferAttachment, ImageSampler, Material, DEFAULT_VIEW};
use crate::shader::Shader;
use super::full_screen::{begin_recording, draw_full_screen, load_shader, resolved, shader_render_pass};
use super::OCCLUSION_ATTACHMENT;

const FEATURE: &str = "AoCover";

pub const PARAMS_SLOT: &str = "Params";
pub const OCCLUSION_SLOT: &str = "Occlusion";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AoCoverConfig {
    /// 0 leaves the color untouched, 1 applies the full occlusion
    pub intensity: f32,
}

impl Default for AoCoverConfig {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CoverUniform {
    intensity: f32,
    _padding: [f32; 3],
}

pub struct AoCoverData {
    occlusion: SharedImage,
    params: Arc<Buffer>,
    material: Option<Material>,
    framebuffer: Option<FrameBuffer>,
}

impl AoCoverData {
    pub fn connect(&mut self, occlusion: &SharedImage) {
        self.occlusion = occlusion.clone();
    }
}

pub struct AoCoverFeature {
    ctx: Arc<GraphicsContext>,
    shader: Arc<Shader>,
    sampler: Arc<ImageSampler>,
    config: AoCoverConfig,
}

impl AoCoverFeature {
    pub fn new(ctx: &Arc<GraphicsContext>, shader_dir: &Path, config: AoCoverConfig) -> Result<Self> {
        Ok(Self {
            ctx: ctx.clone(),
            shader: load_shader(ctx, shader_dir, "ao_cover")?,
            sampler: Arc::new(ImageSampler::linear_clamp(ctx)?),
            config,
        })
    }

    pub fn config(&self) -> &AoCoverConfig {
        &self.config
    }
}

impl RenderFeature for AoCoverFeature {
    fn create_data(&self, _camera: &Camera) -> Result<Box<RenderFeatureData>> {
        let params = Buffer::uniform::<CoverUniform>(&self.ctx)?;
        params.write_value(&CoverUniform { intensity: self.config.intensity.clamp(0.0, 1.0), _padding: [0.0; 3] })?;
        Ok(Box::new(AoCoverData {
            occlusion: SharedImage::new(OCCLUSION_ATTACHMENT),
            params: Arc::new(params),
            material: None,
            framebuffer: None,
        }))
    }

    fn resolve_data(&self, data: &mut RenderFeatureData, camera: &Camera) -> Result<()> {
        let data = downcast_data_mut::<AoCoverData>(data, FEATURE)?;

        let mut material = Material::new(&self.ctx, &self.shader)?;
        material.set_uniform_buffer(PARAMS_SLOT, data.params.clone())?;
        material.set_texture2d(OCCLUSION_SLOT, data.occlusion.get()?, DEFAULT_VIEW, self.sampler.clone())?;

        data.framebuffer = Some(FrameBuffer::new(&self.ctx, shader_render_pass(&self.shader)?, &[
            FrameBufferAttachment::new(COLOR_ATTACHMENT, camera.attachment(COLOR_ATTACHMENT)?, DEFAULT_VIEW),
        ])?);
        data.material = Some(material);
        Ok(())
    }

    fn execute(
        &self,
        data: &mut RenderFeatureData,
        cmd: &mut dyn CommandBuffer,
        _camera: &Camera,
        _renderables: &[RenderObject],
    ) -> Result<()> {
        let data = downcast_data_mut::<AoCoverData>(data, FEATURE)?;
        let framebuffer = resolved(&data.framebuffer, FEATURE, "framebuffer")?;
        let material = resolved(&data.material, FEATURE, "material")?;

        begin_recording(cmd)?;
        draw_full_screen(cmd, framebuffer, &[ClearValue::Color([0.0; 4])], material)?;
        cmd.end()
    }
}

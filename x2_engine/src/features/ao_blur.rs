/// Separable, normal-aware blur of the occlusion image.
///
/// Each iteration runs a horizontal pass (occlusion -> scratch) then a
/// vertical pass (scratch -> occlusion), so the result lands back in the
/// occlusion image the cover feature reads.

use std::path::Path;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use crate::camera::Camera;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{ClearValue, CommandBuffer, ImageUsage};
use crate::render_feature::{downcast_data_mut, RenderFeature, RenderFeatureData, RenderObject, SharedImage};
use crate::resource::{Buffer, FrameBuffer, FrameBufferAttachment, Image, ImageSampler, Material, DEFAULT_VIEW};
use crate::shader::Shader;
use super::full_screen::{begin_recording, draw_full_screen, load_shader, resolved, shader_render_pass};
use super::{NORMAL_ATTACHMENT, OCCLUSION_ATTACHMENT, OCCLUSION_FORMAT};

const FEATURE: &str = "AoBlur";

pub const PARAMS_SLOT: &str = "Params";
pub const SOURCE_SLOT: &str = "Source";
pub const NORMAL_SLOT: &str = "Normal";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AoBlurConfig {
    /// Horizontal + vertical pass pairs per frame
    pub iterations: u32,
    /// Weight falloff with the normal difference of neighbours
    pub normal_sharpness: f32,
}

impl Default for AoBlurConfig {
    fn default() -> Self {
        Self { iterations: 1, normal_sharpness: 16.0 }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct BlurUniform {
    direction: Vec2,
    normal_sharpness: f32,
    _padding: f32,
}

struct BlurPass {
    material: Material,
    framebuffer: FrameBuffer,
}

pub struct AoBlurData {
    occlusion: SharedImage,
    normal: SharedImage,
    horizontal_params: Arc<Buffer>,
    vertical_params: Arc<Buffer>,
    passes: Option<[BlurPass; 2]>,
}

impl AoBlurData {
    /// Blur the image published through `occlusion`, weighting by `normal`
    pub fn connect(&mut self, occlusion: &SharedImage, normal: &SharedImage) {
        self.occlusion = occlusion.clone();
        self.normal = normal.clone();
    }
}

pub struct AoBlurFeature {
    ctx: Arc<GraphicsContext>,
    shader: Arc<Shader>,
    sampler: Arc<ImageSampler>,
    config: AoBlurConfig,
}

impl AoBlurFeature {
    pub fn new(ctx: &Arc<GraphicsContext>, shader_dir: &Path, config: AoBlurConfig) -> Result<Self> {
        Ok(Self {
            ctx: ctx.clone(),
            shader: load_shader(ctx, shader_dir, "ao_blur")?,
            sampler: Arc::new(ImageSampler::linear_clamp(ctx)?),
            config,
        })
    }

    pub fn config(&self) -> &AoBlurConfig {
        &self.config
    }

    fn params(&self, direction: Vec2) -> Result<Arc<Buffer>> {
        let buffer = Buffer::uniform::<BlurUniform>(&self.ctx)?;
        buffer.write_value(&BlurUniform {
            direction,
            normal_sharpness: self.config.normal_sharpness,
            _padding: 0.0,
        })?;
        Ok(Arc::new(buffer))
    }

    fn pass(&self, params: &Arc<Buffer>, source: Arc<Image>, normal: Arc<Image>, target: &Image) -> Result<BlurPass> {
        let mut material = Material::new(&self.ctx, &self.shader)?;
        material.set_uniform_buffer(PARAMS_SLOT, params.clone())?;
        material.set_texture2d_with_info(SOURCE_SLOT, source, DEFAULT_VIEW, self.sampler.clone())?;
        material.set_texture2d(NORMAL_SLOT, normal, DEFAULT_VIEW, self.sampler.clone())?;
        let framebuffer = FrameBuffer::new(&self.ctx, shader_render_pass(&self.shader)?, &[
            FrameBufferAttachment::new(OCCLUSION_ATTACHMENT, target, DEFAULT_VIEW),
        ])?;
        Ok(BlurPass { material, framebuffer })
    }
}

impl RenderFeature for AoBlurFeature {
    fn create_data(&self, _camera: &Camera) -> Result<Box<RenderFeatureData>> {
        Ok(Box::new(AoBlurData {
            occlusion: SharedImage::new(OCCLUSION_ATTACHMENT),
            normal: SharedImage::new(NORMAL_ATTACHMENT),
            horizontal_params: self.params(Vec2::X)?,
            vertical_params: self.params(Vec2::Y)?,
            passes: None,
        }))
    }

    fn resolve_data(&self, data: &mut RenderFeatureData, camera: &Camera) -> Result<()> {
        let data = downcast_data_mut::<AoBlurData>(data, FEATURE)?;
        let occlusion = data.occlusion.get()?;
        let normal = data.normal.get()?;
        let scratch = Arc::new(Image::attachment(&self.ctx, camera.extent(), OCCLUSION_FORMAT, ImageUsage::empty())?);

        let horizontal = self.pass(&data.horizontal_params, occlusion.clone(), normal.clone(), &scratch)?;
        let vertical = self.pass(&data.vertical_params, scratch, normal, &occlusion)?;
        data.passes = Some([horizontal, vertical]);
        Ok(())
    }

    fn execute(
        &self,
        data: &mut RenderFeatureData,
        cmd: &mut dyn CommandBuffer,
        _camera: &Camera,
        _renderables: &[RenderObject],
    ) -> Result<()> {
        let data = downcast_data_mut::<AoBlurData>(data, FEATURE)?;
        let passes = resolved(&data.passes, FEATURE, "passes")?;

        begin_recording(cmd)?;
        for _ in 0..self.config.iterations {
            for pass in passes {
                draw_full_screen(cmd, &pass.framebuffer, &[ClearValue::Color([1.0; 4])], &pass.material)?;
            }
        }
        cmd.end()
    }
}

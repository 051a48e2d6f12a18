/// Ambient occlusion: SSAO, HBAO or GTAO into a single-channel image.
///
/// Reads the camera depth and the geometry feature's view-space normal and
/// position images, plus a 4x4 rotation noise texture uploaded once. The
/// result is published as the `Occlusion` [`SharedImage`] for the blur and
/// cover features.

use std::path::Path;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use rand::{rng, Rng};
use crate::camera::{Camera, DEPTH_ATTACHMENT};
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{
    ClearValue, CommandBuffer, Extent2D, Filter, Format, ImageDesc, ImageUsage, SamplerDesc,
};
use crate::render_feature::{downcast_data_mut, RenderFeature, RenderFeatureData, RenderObject, SharedImage};
use crate::resource::{Buffer, FrameBuffer, FrameBufferAttachment, Image, ImageSampler, Material, DEFAULT_VIEW};
use crate::shader::Shader;
use crate::{engine_bail_invalid, engine_debug};
use super::full_screen::{begin_recording, draw_full_screen, load_shader, resolved, shader_render_pass};
use super::{NORMAL_ATTACHMENT, OCCLUSION_ATTACHMENT, OCCLUSION_FORMAT, POSITION_ATTACHMENT};

const FEATURE: &str = "AmbientOcclusion";

/// Largest SSAO kernel
pub const MAX_KERNEL_SIZE: usize = 64;
/// Side of the rotation noise texture
pub const NOISE_SIZE: u32 = 4;

// ===== CONFIGURATION =====

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsaoParams {
    /// Hemisphere samples, at most [`MAX_KERNEL_SIZE`]
    pub kernel_size: u32,
    pub bias: f32,
}

impl Default for SsaoParams {
    fn default() -> Self {
        Self { kernel_size: 32, bias: 0.025 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HbaoParams {
    pub direction_count: u32,
    pub step_count: u32,
    /// Horizon angle ignored below this bias (radians)
    pub angle_bias: f32,
}

impl Default for HbaoParams {
    fn default() -> Self {
        Self { direction_count: 8, step_count: 4, angle_bias: 0.3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GtaoParams {
    pub slice_count: u32,
    pub step_count: u32,
    /// Fraction of the radius over which occluders fade out
    pub falloff: f32,
}

impl Default for GtaoParams {
    fn default() -> Self {
        Self { slice_count: 4, step_count: 8, falloff: 0.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AoTechnique {
    Ssao(SsaoParams),
    Hbao(HbaoParams),
    Gtao(GtaoParams),
}

impl AoTechnique {
    /// Settings file stem of the technique's shader
    pub fn shader_name(&self) -> &'static str {
        match self {
            AoTechnique::Ssao(_) => "ssao",
            AoTechnique::Hbao(_) => "hbao",
            AoTechnique::Gtao(_) => "gtao",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientOcclusionConfig {
    pub technique: AoTechnique,
    /// Sampling radius in view space
    pub radius: f32,
    /// Exponent applied to the occlusion
    pub power: f32,
}

impl Default for AmbientOcclusionConfig {
    fn default() -> Self {
        Self {
            technique: AoTechnique::Ssao(SsaoParams::default()),
            radius: 0.5,
            power: 1.5,
        }
    }
}

// ===== UNIFORM BLOCKS =====

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SsaoUniform {
    projection: Mat4,
    kernel: [Vec4; MAX_KERNEL_SIZE],
    sample_count: u32,
    radius: f32,
    bias: f32,
    power: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct HbaoUniform {
    projection: Mat4,
    direction_count: u32,
    step_count: u32,
    radius: f32,
    angle_bias: f32,
    power: f32,
    _padding: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GtaoUniform {
    projection: Mat4,
    slice_count: u32,
    step_count: u32,
    radius: f32,
    falloff: f32,
    power: f32,
    _padding: [f32; 3],
}

/// Hemisphere kernel along +Z, denser near the origin
pub fn ssao_kernel(size: usize) -> Vec<Vec4> {
    let mut rng = rng();
    (0..size)
        .map(|i| {
            let sample = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(0.0..1.0),
            )
            .normalize_or(Vec3::Z) * rng.random::<f32>();
            let t = i as f32 / size as f32;
            let scale = 0.1 + t * t * 0.9;
            (sample * scale).extend(0.0)
        })
        .collect()
}

/// Random rotation vectors in the XY plane, RGBA32F texels
pub fn noise_texels() -> Vec<f32> {
    let mut rng = rng();
    (0..NOISE_SIZE * NOISE_SIZE)
        .flat_map(|_| [rng.random_range(-1.0f32..1.0), rng.random_range(-1.0f32..1.0), 0.0, 0.0])
        .collect()
}

// ===== FEATURE =====

pub const PARAMS_SLOT: &str = "Params";
pub const DEPTH_SLOT: &str = "Depth";
pub const NORMAL_SLOT: &str = "Normal";
pub const POSITION_SLOT: &str = "Position";
pub const NOISE_SLOT: &str = "Noise";

pub struct AmbientOcclusionData {
    normal: SharedImage,
    position: SharedImage,
    occlusion: SharedImage,
    params: Arc<Buffer>,
    material: Option<Material>,
    framebuffer: Option<FrameBuffer>,
}

impl AmbientOcclusionData {
    /// Read the geometry outputs published through `normal` and `position`
    pub fn connect(&mut self, normal: &SharedImage, position: &SharedImage) {
        self.normal = normal.clone();
        self.position = position.clone();
    }

    /// Occlusion image (published on resolve)
    pub fn occlusion(&self) -> &SharedImage {
        &self.occlusion
    }

    pub fn params(&self) -> &Buffer {
        &self.params
    }
}

pub struct AmbientOcclusionFeature {
    ctx: Arc<GraphicsContext>,
    shader: Arc<Shader>,
    config: AmbientOcclusionConfig,
    kernel: Vec<Vec4>,
    noise: Arc<Image>,
    noise_sampler: Arc<ImageSampler>,
    gbuffer_sampler: Arc<ImageSampler>,
}

impl AmbientOcclusionFeature {
    pub fn new(ctx: &Arc<GraphicsContext>, shader_dir: &Path, config: AmbientOcclusionConfig) -> Result<Self> {
        let kernel = match config.technique {
            AoTechnique::Ssao(params) => {
                if params.kernel_size == 0 || params.kernel_size as usize > MAX_KERNEL_SIZE {
                    engine_bail_invalid!("x2::AmbientOcclusion",
                        "SSAO kernel size {} outside 1..={}", params.kernel_size, MAX_KERNEL_SIZE);
                }
                ssao_kernel(params.kernel_size as usize)
            }
            _ => Vec::new(),
        };

        let mut noise_desc = ImageDesc::new_2d(
            Extent2D::new(NOISE_SIZE, NOISE_SIZE),
            Format::R32G32B32A32_SFLOAT,
            ImageUsage::SAMPLED | ImageUsage::TRANSFER_DST,
        );
        noise_desc.initial_data = Some(bytemuck::cast_slice::<f32, u8>(&noise_texels()).to_vec());
        let noise = Arc::new(Image::new(ctx, noise_desc)?);

        let gbuffer_sampler = ImageSampler::new(ctx, SamplerDesc {
            mag_filter: Filter::Nearest,
            min_filter: Filter::Nearest,
            ..SamplerDesc::default()
        })?;

        engine_debug!("x2::AmbientOcclusion", "Technique {}", config.technique.shader_name());
        Ok(Self {
            ctx: ctx.clone(),
            shader: load_shader(ctx, shader_dir, config.technique.shader_name())?,
            config,
            kernel,
            noise,
            noise_sampler: Arc::new(ImageSampler::nearest_repeat(ctx)?),
            gbuffer_sampler: Arc::new(gbuffer_sampler),
        })
    }

    pub fn config(&self) -> &AmbientOcclusionConfig {
        &self.config
    }

    fn create_params(&self) -> Result<Buffer> {
        match self.config.technique {
            AoTechnique::Ssao(_) => Buffer::uniform::<SsaoUniform>(&self.ctx),
            AoTechnique::Hbao(_) => Buffer::uniform::<HbaoUniform>(&self.ctx),
            AoTechnique::Gtao(_) => Buffer::uniform::<GtaoUniform>(&self.ctx),
        }
    }

    fn write_params(&self, params: &Buffer, projection: Mat4) -> Result<()> {
        let radius = self.config.radius;
        let power = self.config.power;
        match self.config.technique {
            AoTechnique::Ssao(ssao) => {
                let mut kernel = [Vec4::ZERO; MAX_KERNEL_SIZE];
                kernel[..self.kernel.len()].copy_from_slice(&self.kernel);
                params.write_value(&SsaoUniform {
                    projection,
                    kernel,
                    sample_count: ssao.kernel_size,
                    radius,
                    bias: ssao.bias,
                    power,
                })
            }
            AoTechnique::Hbao(hbao) => params.write_value(&HbaoUniform {
                projection,
                direction_count: hbao.direction_count,
                step_count: hbao.step_count,
                radius,
                angle_bias: hbao.angle_bias,
                power,
                _padding: [0.0; 3],
            }),
            AoTechnique::Gtao(gtao) => params.write_value(&GtaoUniform {
                projection,
                slice_count: gtao.slice_count,
                step_count: gtao.step_count,
                radius,
                falloff: gtao.falloff,
                power,
                _padding: [0.0; 3],
            }),
        }
    }
}

impl RenderFeature for AmbientOcclusionFeature {
    fn create_data(&self, _camera: &Camera) -> Result<Box<RenderFeatureData>> {
        Ok(Box::new(AmbientOcclusionData {
            normal: SharedImage::new(NORMAL_ATTACHMENT),
            position: SharedImage::new(POSITION_ATTACHMENT),
            occlusion: SharedImage::new(OCCLUSION_ATTACHMENT),
            params: Arc::new(self.create_params()?),
            material: None,
            framebuffer: None,
        }))
    }

    fn resolve_data(&self, data: &mut RenderFeatureData, camera: &Camera) -> Result<()> {
        let data = downcast_data_mut::<AmbientOcclusionData>(data, FEATURE)?;
        let occlusion = Arc::new(Image::attachment(&self.ctx, camera.extent(), OCCLUSION_FORMAT, ImageUsage::empty())?);

        let mut material = Material::new(&self.ctx, &self.shader)?;
        material.set_uniform_buffer(PARAMS_SLOT, data.params.clone())?;
        material.set_texture2d(DEPTH_SLOT, camera.attachment(DEPTH_ATTACHMENT)?.clone(), DEFAULT_VIEW, self.gbuffer_sampler.clone())?;
        material.set_texture2d(NORMAL_SLOT, data.normal.get()?, DEFAULT_VIEW, self.gbuffer_sampler.clone())?;
        material.set_texture2d_with_info(POSITION_SLOT, data.position.get()?, DEFAULT_VIEW, self.gbuffer_sampler.clone())?;
        material.set_texture2d(NOISE_SLOT, self.noise.clone(), DEFAULT_VIEW, self.noise_sampler.clone())?;

        data.framebuffer = Some(FrameBuffer::new(&self.ctx, shader_render_pass(&self.shader)?, &[
            FrameBufferAttachment::new(OCCLUSION_ATTACHMENT, &occlusion, DEFAULT_VIEW),
        ])?);
        data.material = Some(material);
        data.occlusion.set(occlusion)?;
        self.write_params(&data.params, *camera.projection())
    }

    fn prepare(&self, data: &mut RenderFeatureData, camera: &Camera) -> Result<()> {
        let data = downcast_data_mut::<AmbientOcclusionData>(data, FEATURE)?;
        self.write_params(&data.params, *camera.projection())
    }

    fn execute(
        &self,
        data: &mut RenderFeatureData,
        cmd: &mut dyn CommandBuffer,
        _camera: &Camera,
        _renderables: &[RenderObject],
    ) -> Result<()> {
        let data = downcast_data_mut::<AmbientOcclusionData>(data, FEATURE)?;
        let framebuffer = resolved(&data.framebuffer, FEATURE, "framebuffer")?;
        let material = resolved(&data.material, FEATURE, "material")?;

        begin_recording(cmd)?;
        draw_full_screen(cmd, framebuffer, &[ClearValue::Color([1.0; 4])], material)?;
        cmd.end()
    }
}

#[cfg(test)]
#[path = "ambient_occlusion_tests.rs"]
mod tests;

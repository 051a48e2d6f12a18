/// Shadow receiver: darkens the camera color where the cascades are occluded.
///
/// Reads the view-space G-buffer positions, moves them to world space with
/// the inverse camera view, picks the cascade from the view depth and
/// compares against the matching layer of the shadow map. The shader
/// outputs `mix(1, visibility, strength)`, multiplied into the color by the
/// blend state like the occlusion cover.

use std::path::Path;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use crate::camera::{Camera, COLOR_ATTACHMENT};
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{ClearValue, CommandBuffer};
use crate::render_feature::{downcast_data_mut, RenderFeature, RenderFeatureData, RenderObject, SharedImage};
use crate::resource::{Buffer, FrameBuffer, FrameBufferAttachment, ImageSampler, Material, DEFAULT_VIEW};
use crate::shader::Shader;
use crate::{engine_bail_invalid, engine_err_invalid};
use super::full_screen::{begin_recording, draw_full_screen, load_shader, resolved, shader_render_pass};
use super::shadow_caster::SHADOW_MAP;
use super::{POSITION_ATTACHMENT, SHADOW_RECEIVER_PASS};

const FEATURE: &str = "ShadowReceiver";

pub const PARAMS_SLOT: &str = "Params";
pub const SHADOW_SLOT: &str = "Shadow";
pub const POSITION_SLOT: &str = "Position";
pub const SHADOW_MAP_SLOT: &str = "ShadowMap";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowReceiverConfig {
    /// 0 leaves the color untouched, 1 turns shadowed texels black
    pub strength: f32,
}

impl Default for ShadowReceiverConfig {
    fn default() -> Self {
        Self { strength: 0.6 }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ReceiverUniform {
    pub inverse_view: Mat4,
    pub strength: f32,
    pub _padding: [f32; 3],
}

pub struct ShadowReceiverData {
    position: SharedImage,
    shadow_map: SharedImage,
    shadow: Option<Arc<Buffer>>,
    params: Arc<Buffer>,
    material: Option<Material>,
    framebuffer: Option<FrameBuffer>,
}

impl ShadowReceiverData {
    /// Hand over the G-buffer positions and the caster outputs
    pub fn connect(&mut self, position: &SharedImage, shadow_map: &SharedImage, shadow: &Arc<Buffer>) {
        self.position = position.clone();
        self.shadow_map = shadow_map.clone();
        self.shadow = Some(shadow.clone());
    }

    /// Material built on resolve
    pub fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    pub fn params(&self) -> &Buffer {
        &self.params
    }
}

pub struct ShadowReceiverFeature {
    ctx: Arc<GraphicsContext>,
    shader: Arc<Shader>,
    position_sampler: Arc<ImageSampler>,
    shadow_sampler: Arc<ImageSampler>,
    config: ShadowReceiverConfig,
}

impl ShadowReceiverFeature {
    pub fn new(ctx: &Arc<GraphicsContext>, shader_dir: &Path, config: ShadowReceiverConfig) -> Result<Self> {
        let shader = load_shader(ctx, shader_dir, "shadow_receiver")?;
        if shader_render_pass(&shader)?.name() != SHADOW_RECEIVER_PASS {
            engine_bail_invalid!("x2::ShadowReceiver",
                "Shader '{}' does not target the '{}' render pass", shader.name(), SHADOW_RECEIVER_PASS);
        }
        Ok(Self {
            ctx: ctx.clone(),
            shader,
            position_sampler: Arc::new(ImageSampler::nearest_repeat(ctx)?),
            shadow_sampler: Arc::new(ImageSampler::shadow(ctx)?),
            config,
        })
    }

    pub fn config(&self) -> &ShadowReceiverConfig {
        &self.config
    }
}

impl RenderFeature for ShadowReceiverFeature {
    fn create_data(&self, _camera: &Camera) -> Result<Box<RenderFeatureData>> {
        Ok(Box::new(ShadowReceiverData {
            position: SharedImage::new(POSITION_ATTACHMENT),
            shadow_map: SharedImage::new(SHADOW_MAP),
            shadow: None,
            params: Arc::new(Buffer::uniform::<ReceiverUniform>(&self.ctx)?),
            material: None,
            framebuffer: None,
        }))
    }

    fn resolve_data(&self, data: &mut RenderFeatureData, camera: &Camera) -> Result<()> {
        let data = downcast_data_mut::<ShadowReceiverData>(data, FEATURE)?;
        let shadow = data.shadow.clone().ok_or_else(|| engine_err_invalid!("x2::ShadowReceiver",
            "Receiver resolved before the shadow uniform was connected"))?;

        let mut material = Material::new(&self.ctx, &self.shader)?;
        material.set_uniform_buffer(PARAMS_SLOT, data.params.clone())?;
        material.set_uniform_buffer(SHADOW_SLOT, shadow)?;
        material.set_texture2d(POSITION_SLOT, data.position.get()?, DEFAULT_VIEW, self.position_sampler.clone())?;
        material.set_texture2d(SHADOW_MAP_SLOT, data.shadow_map.get()?, DEFAULT_VIEW, self.shadow_sampler.clone())?;

        data.framebuffer = Some(FrameBuffer::new(&self.ctx, shader_render_pass(&self.shader)?, &[
            FrameBufferAttachment::new(COLOR_ATTACHMENT, camera.attachment(COLOR_ATTACHMENT)?, DEFAULT_VIEW),
        ])?);
        data.material = Some(material);
        Ok(())
    }

    fn prepare(&self, data: &mut RenderFeatureData, camera: &Camera) -> Result<()> {
        let data = downcast_data_mut::<ShadowReceiverData>(data, FEATURE)?;
        data.params.write_value(&ReceiverUniform {
            inverse_view: camera.view().inverse(),
            strength: self.config.strength.clamp(0.0, 1.0),
            _padding: [0.0; 3],
        })
    }

    fn execute(
        &self,
        data: &mut RenderFeatureData,
        cmd: &mut dyn CommandBuffer,
        _camera: &Camera,
        _renderables: &[RenderObject],
    ) -> Result<()> {
        let data = downcast_data_mut::<ShadowReceiverData>(data, FEATURE)?;
        let framebuffer = resolved(&data.framebuffer, FEATURE, "framebuffer")?;
        let material = resolved(&data.material, FEATURE, "material")?;

        begin_recording(cmd)?;
        draw_full_screen(cmd, framebuffer, &[ClearValue::Color([0.0; 4])], material)?;
        cmd.end()
    }
}

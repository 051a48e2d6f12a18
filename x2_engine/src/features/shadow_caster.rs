/// Shadow caster: renders cascaded directional-light shadow maps.
///
/// Every camera gets a [`CASCADE_COUNT`]-layer depth array image. `prepare`
/// fits the cascades to the camera frustum and fills the receiver uniform;
/// `execute` renders the shadow casters of each cascade into its layer.
/// Receivers sample the shadow map through [`ShadowCasterData::shadow_map`]
/// and [`ShadowCasterData::uniform`].

use std::path::Path;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};
use crate::camera::{Camera, DEPTH_ATTACHMENT};
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{ClearValue, CommandBuffer, Extent2D, ImageDesc, ImageUsage};
use crate::render_feature::{downcast_data_mut, RenderFeature, RenderFeatureData, RenderObject, SharedImage};
use crate::resource::{Buffer, FrameBuffer, FrameBufferAttachment, Image};
use crate::shader::Shader;
use crate::{engine_bail_invalid, engine_debug, engine_trace};
use super::cascade::{camera_cascades, Cascade, CASCADE_COUNT};
use super::full_screen::{begin_recording, load_shader, resolved, shader_render_pass};
use super::{SHADOW_CASTER_PASS, SHADOW_MAP_FORMAT};

const FEATURE: &str = "ShadowCaster";

/// Name of the published shadow map
pub const SHADOW_MAP: &str = "ShadowMap";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCasterConfig {
    /// Width and height of each cascade layer
    pub resolution: u32,
    /// Direction the light travels in (world space)
    pub light_direction: Vec3,
    /// End of each cascade as a fraction of the near-to-far range, increasing,
    /// the last one 1.0
    pub split_ratios: [f32; CASCADE_COUNT],
    /// Fraction of the previous cascade a cascade reaches back into
    pub overlap: f32,
    /// Extra distance behind each cascade sphere for casters outside the view
    pub standoff: f32,
    /// Snap the light view to whole shadow-map texels
    pub stabilize: bool,
    /// Constant and slope-scaled receiver bias per cascade
    pub biases: [Vec2; CASCADE_COUNT],
}

impl Default for ShadowCasterConfig {
    fn default() -> Self {
        Self {
            resolution: 2048,
            light_direction: Vec3::new(-0.4, -1.0, -0.3),
            split_ratios: [0.067, 0.2, 0.467, 1.0],
            overlap: 0.1,
            standoff: 50.0,
            stabilize: false,
            biases: [
                Vec2::new(0.0005, 0.002),
                Vec2::new(0.001, 0.003),
                Vec2::new(0.0015, 0.004),
                Vec2::new(0.002, 0.006),
            ],
        }
    }
}

impl ShadowCasterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            engine_bail_invalid!("x2::ShadowCaster", "Shadow map resolution must be non-zero");
        }
        if self.light_direction.length_squared() <= f32::EPSILON || !self.light_direction.is_finite() {
            engine_bail_invalid!("x2::ShadowCaster", "Invalid light direction {:?}", self.light_direction);
        }
        let mut previous = 0.0;
        for ratio in self.split_ratios {
            if ratio <= previous || ratio > 1.0 {
                engine_bail_invalid!("x2::ShadowCaster",
                    "Split ratios {:?} must increase within (0, 1]", self.split_ratios);
            }
            previous = ratio;
        }
        if (self.split_ratios[CASCADE_COUNT - 1] - 1.0).abs() > f32::EPSILON {
            engine_bail_invalid!("x2::ShadowCaster", "Last split ratio must be 1.0, got {}",
                self.split_ratios[CASCADE_COUNT - 1]);
        }
        if !(0.0..1.0).contains(&self.overlap) {
            engine_bail_invalid!("x2::ShadowCaster", "Cascade overlap {} outside [0, 1)", self.overlap);
        }
        if self.standoff < 0.0 {
            engine_bail_invalid!("x2::ShadowCaster", "Negative standoff {}", self.standoff);
        }
        Ok(())
    }
}

/// Receiver uniform block (std140)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowUniform {
    pub view_projections: [Mat4; CASCADE_COUNT],
    pub split_depths: Vec4,
    pub texel_sizes: Vec4,
    /// (constant, slope) of cascades 0-1 then 2-3
    pub biases: [Vec4; 2],
}

impl ShadowUniform {
    pub fn new(cascades: &[Cascade; CASCADE_COUNT], biases: &[Vec2; CASCADE_COUNT]) -> Self {
        Self {
            view_projections: std::array::from_fn(|i| cascades[i].view_projection),
            split_depths: Vec4::from_array(std::array::from_fn(|i| cascades[i].split_depth)),
            texel_sizes: Vec4::from_array(std::array::from_fn(|i| cascades[i].texel_size)),
            biases: [
                Vec4::new(biases[0].x, biases[0].y, biases[1].x, biases[1].y),
                Vec4::new(biases[2].x, biases[2].y, biases[3].x, biases[3].y),
            ],
        }
    }
}

/// Vertex push constants of the shadow shader
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ShadowConstants {
    model_view_projection: Mat4,
}

pub fn layer_view_name(cascade: usize) -> String {
    format!("Cascade{}", cascade)
}

pub struct ShadowCasterData {
    shadow_map: SharedImage,
    uniform: Arc<Buffer>,
    framebuffers: Vec<FrameBuffer>,
    cascades: Option<[Cascade; CASCADE_COUNT]>,
    drawn: [usize; CASCADE_COUNT],
}

impl ShadowCasterData {
    /// Depth array image, one layer per cascade
    pub fn shadow_map(&self) -> &SharedImage {
        &self.shadow_map
    }

    /// Receiver uniform ([`ShadowUniform`])
    pub fn uniform(&self) -> &Arc<Buffer> {
        &self.uniform
    }

    /// Cascades fitted by the last prepare
    pub fn cascades(&self) -> Option<&[Cascade; CASCADE_COUNT]> {
        self.cascades.as_ref()
    }

    /// Casters drawn per cascade by the last execute
    pub fn drawn(&self) -> [usize; CASCADE_COUNT] {
        self.drawn
    }
}

pub struct ShadowCasterFeature {
    ctx: Arc<GraphicsContext>,
    shader: Arc<Shader>,
    config: ShadowCasterConfig,
}

impl ShadowCasterFeature {
    pub fn new(ctx: &Arc<GraphicsContext>, shader_dir: &Path, config: ShadowCasterConfig) -> Result<Self> {
        config.validate()?;
        let shader = load_shader(ctx, shader_dir, "shadow")?;
        if shader_render_pass(&shader)?.name() != SHADOW_CASTER_PASS {
            engine_bail_invalid!("x2::ShadowCaster",
                "Shader '{}' does not target the '{}' render pass", shader.name(), SHADOW_CASTER_PASS);
        }
        engine_debug!("x2::ShadowCaster", "{} cascades at {}x{}", CASCADE_COUNT, config.resolution, config.resolution);
        Ok(Self { ctx: ctx.clone(), shader, config })
    }

    pub fn config(&self) -> &ShadowCasterConfig {
        &self.config
    }

    fn create_shadow_map(&self) -> Result<Image> {
        let mut desc = ImageDesc::new_2d(
            Extent2D::new(self.config.resolution, self.config.resolution),
            SHADOW_MAP_FORMAT,
            ImageUsage::DEPTH_STENCIL_ATTACHMENT | ImageUsage::SAMPLED,
        );
        desc.array_layers = CASCADE_COUNT as u32;
        let mut image = Image::new(&self.ctx, desc)?;
        for cascade in 0..CASCADE_COUNT {
            image.create_layer_view(&self.ctx, &layer_view_name(cascade), cascade as u32)?;
        }
        Ok(image)
    }
}

impl RenderFeature for ShadowCasterFeature {
    fn create_data(&self, _camera: &Camera) -> Result<Box<RenderFeatureData>> {
        let shadow_map = Arc::new(self.create_shadow_map()?);
        let render_pass = shader_render_pass(&self.shader)?;
        let framebuffers = (0..CASCADE_COUNT)
            .map(|cascade| {
                FrameBuffer::new(&self.ctx, render_pass, &[
                    FrameBufferAttachment::new(DEPTH_ATTACHMENT, &shadow_map, &layer_view_name(cascade)),
                ])
            })
            .collect::<Result<Vec<_>>>()?;

        let published = SharedImage::new(SHADOW_MAP);
        published.set(shadow_map)?;
        Ok(Box::new(ShadowCasterData {
            shadow_map: published,
            uniform: Arc::new(Buffer::uniform::<ShadowUniform>(&self.ctx)?),
            framebuffers,
            cascades: None,
            drawn: [0; CASCADE_COUNT],
        }))
    }

    fn resolve_data(&self, data: &mut RenderFeatureData, _camera: &Camera) -> Result<()> {
        // The shadow map does not depend on the camera extent
        let data = downcast_data_mut::<ShadowCasterData>(data, FEATURE)?;
        data.cascades = None;
        Ok(())
    }

    fn prepare(&self, data: &mut RenderFeatureData, camera: &Camera) -> Result<()> {
        let data = downcast_data_mut::<ShadowCasterData>(data, FEATURE)?;
        let cascades = camera_cascades(camera, &self.config);
        data.uniform.write_value(&ShadowUniform::new(&cascades, &self.config.biases))?;
        data.cascades = Some(cascades);
        Ok(())
    }

    fn execute(
        &self,
        data: &mut RenderFeatureData,
        cmd: &mut dyn CommandBuffer,
        _camera: &Camera,
        renderables: &[RenderObject],
    ) -> Result<()> {
        let data = downcast_data_mut::<ShadowCasterData>(data, FEATURE)?;
        let cascades = resolved(&data.cascades, FEATURE, "cascades")?;

        begin_recording(cmd)?;
        for (index, (cascade, framebuffer)) in cascades.iter().zip(&data.framebuffers).enumerate() {
            let frustum = cascade.frustum();
            framebuffer.begin(cmd, &[ClearValue::DepthStencil { depth: 1.0, stencil: 0 }])?;
            self.shader.bind(cmd)?;

            let mut drawn = 0;
            for object in renderables.iter().filter(|object| object.cast_shadows) {
                if !frustum.intersects_aabb(&object.world_bounds()) {
                    continue;
                }
                self.shader.push_constants(cmd, 0, &ShadowConstants {
                    model_view_projection: cascade.view_projection * object.model,
                })?;
                object.mesh.draw(cmd)?;
                drawn += 1;
            }
            cmd.end_render_pass()?;
            data.drawn[index] = drawn;
        }
        cmd.end()?;
        engine_trace!("x2::ShadowCaster", "Casters per cascade {:?}", data.drawn);
        Ok(())
    }
}

#[cfg(test)]
#[path = "shadow_caster_tests.rs"]
mod tests;

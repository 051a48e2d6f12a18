/// Geometry: draws every visible renderable into the G-buffer.
///
/// Outputs the lit color into the camera color attachment, view-space
/// normals and positions into the feature's own images (published as
/// [`SharedImage`]s) and depth into the camera depth attachment. Material
/// shaders must target the geometry render pass and may declare a vertex
/// push-constant block of [`GeometryConstants`].

use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use crate::camera::{Camera, COLOR_ATTACHMENT, DEPTH_ATTACHMENT};
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{ClearValue, CommandBuffer, ImageUsage};
use crate::render_feature::{downcast_data_mut, RenderFeature, RenderFeatureData, RenderObject, SharedImage};
use crate::render_pass::RenderPassLease;
use crate::resource::{FrameBuffer, FrameBufferAttachment, Image, DEFAULT_VIEW};
use crate::{engine_bail_invalid, engine_trace};
use super::full_screen::{begin_recording, resolved};
use super::{GBUFFER_FORMAT, GEOMETRY_PASS, NORMAL_ATTACHMENT, POSITION_ATTACHMENT};

const FEATURE: &str = "Geometry";

/// Per-object vertex push constants
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GeometryConstants {
    pub model_view: Mat4,
    pub model_view_projection: Mat4,
}

pub struct GeometryData {
    normal: SharedImage,
    position: SharedImage,
    framebuffer: Option<FrameBuffer>,
    drawn: usize,
}

impl GeometryData {
    /// View-space normals (published on resolve)
    pub fn normal(&self) -> &SharedImage {
        &self.normal
    }

    /// View-space positions (published on resolve)
    pub fn position(&self) -> &SharedImage {
        &self.position
    }

    /// Renderables drawn by the last execute
    pub fn drawn(&self) -> usize {
        self.drawn
    }
}

pub struct GeometryFeature {
    ctx: Arc<GraphicsContext>,
    render_pass: RenderPassLease,
}

impl GeometryFeature {
    pub fn new(ctx: &Arc<GraphicsContext>) -> Result<Self> {
        Ok(Self {
            ctx: ctx.clone(),
            render_pass: ctx.lease_render_pass(GEOMETRY_PASS)?,
        })
    }
}

impl RenderFeature for GeometryFeature {
    fn create_data(&self, _camera: &Camera) -> Result<Box<RenderFeatureData>> {
        Ok(Box::new(GeometryData {
            normal: SharedImage::new(NORMAL_ATTACHMENT),
            position: SharedImage::new(POSITION_ATTACHMENT),
            framebuffer: None,
            drawn: 0,
        }))
    }

    fn resolve_data(&self, data: &mut RenderFeatureData, camera: &Camera) -> Result<()> {
        let data = downcast_data_mut::<GeometryData>(data, FEATURE)?;
        let extent = camera.extent();
        let normal = Arc::new(Image::attachment(&self.ctx, extent, GBUFFER_FORMAT, ImageUsage::empty())?);
        let position = Arc::new(Image::attachment(&self.ctx, extent, GBUFFER_FORMAT, ImageUsage::empty())?);

        data.framebuffer = Some(FrameBuffer::new(&self.ctx, self.render_pass.render_pass(), &[
            FrameBufferAttachment::new(COLOR_ATTACHMENT, camera.attachment(COLOR_ATTACHMENT)?, DEFAULT_VIEW),
            FrameBufferAttachment::new(NORMAL_ATTACHMENT, &normal, DEFAULT_VIEW),
            FrameBufferAttachment::new(POSITION_ATTACHMENT, &position, DEFAULT_VIEW),
            FrameBufferAttachment::new(DEPTH_ATTACHMENT, camera.attachment(DEPTH_ATTACHMENT)?, DEFAULT_VIEW),
        ])?);
        data.normal.set(normal)?;
        data.position.set(position)?;
        Ok(())
    }

    fn execute(
        &self,
        data: &mut RenderFeatureData,
        cmd: &mut dyn CommandBuffer,
        camera: &Camera,
        renderables: &[RenderObject],
    ) -> Result<()> {
        let data = downcast_data_mut::<GeometryData>(data, FEATURE)?;
        let framebuffer = resolved(&data.framebuffer, FEATURE, "framebuffer")?;
        let frustum = camera.frustum();
        let view_projection = camera.view_projection();

        begin_recording(cmd)?;
        framebuffer.begin(cmd, &[
            ClearValue::Color([0.0; 4]),
            ClearValue::Color([0.0; 4]),
            ClearValue::Color([0.0; 4]),
            ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
        ])?;

        let mut drawn = 0;
        for object in renderables {
            if !frustum.intersects_aabb(&object.world_bounds()) {
                continue;
            }
            let shader = object.material.shader();
            if shader.render_pass().map(|pass| pass.name()) != Some(GEOMETRY_PASS) {
                engine_bail_invalid!("x2::Geometry",
                    "Shader '{}' does not target the '{}' render pass", shader.name(), GEOMETRY_PASS);
            }

            shader.bind(cmd)?;
            object.material.bind(cmd)?;
            if !shader.push_constant_ranges().is_empty() {
                shader.push_constants(cmd, 0, &GeometryConstants {
                    model_view: *camera.view() * object.model,
                    model_view_projection: view_projection * object.model,
                })?;
            }
            object.mesh.draw(cmd)?;
            drawn += 1;
        }

        cmd.end_render_pass()?;
        cmd.end()?;
        engine_trace!("x2::Geometry", "Drew {}/{} renderables", drawn, renderables.len());
        data.drawn = drawn;
        Ok(())
    }
}

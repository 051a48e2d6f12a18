/// Framebuffer binding image views to the attachments of a render pass.
///
/// Attachments are given by render pass attachment name; the framebuffer
/// orders them by attachment index. Its extent is the largest extent among
/// the bound views (at their base mip).

use std::sync::Arc;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{
    ClearValue, CommandBuffer, Extent2D, GpuFramebuffer, GpuImageView, Rect2D, Viewport,
};
use crate::render_pass::RenderPass;
use crate::resource::Image;
use crate::engine_bail_invalid;

/// One named attachment binding
pub struct FrameBufferAttachment<'a> {
    /// Attachment name in the render pass
    pub name: &'a str,
    pub image: &'a Image,
    /// View name in `image`
    pub view: &'a str,
}

impl<'a> FrameBufferAttachment<'a> {
    pub fn new(name: &'a str, image: &'a Image, view: &'a str) -> Self {
        Self { name, image, view }
    }
}

pub struct FrameBuffer {
    gpu: Arc<dyn GpuFramebuffer>,
    render_pass: Arc<RenderPass>,
    extent: Extent2D,
}

impl FrameBuffer {
    /// Bind one view per render pass attachment
    ///
    /// # Errors
    ///
    /// Returns an error if an attachment of the pass is missing, an unknown
    /// attachment name is given, or a view does not exist.
    pub fn new(
        ctx: &GraphicsContext,
        render_pass: &Arc<RenderPass>,
        attachments: &[FrameBufferAttachment],
    ) -> Result<Self> {
        let mut slots: Vec<Option<(&dyn GpuImageView, Extent2D)>> = vec![None; render_pass.attachment_count()];

        for attachment in attachments {
            let index = match render_pass.attachment_index(attachment.name) {
                Some(index) => index,
                None => engine_bail_invalid!("x2::FrameBuffer",
                    "Render pass '{}' has no attachment '{}'", render_pass.name(), attachment.name),
            };
            let view = attachment.image.view(attachment.view)?;
            let extent = attachment.image.mip_extent(view.desc().base_mip_level);
            slots[index] = Some((view.gpu_view(), extent));
        }

        let mut views = Vec::with_capacity(slots.len());
        let mut extent = Extent2D::default();
        for (slot, name) in slots.iter().zip(render_pass.attachment_names()) {
            match slot {
                Some((view, view_extent)) => {
                    views.push(*view);
                    extent = extent.max(*view_extent);
                }
                None => engine_bail_invalid!("x2::FrameBuffer",
                    "Attachment '{}' of render pass '{}' is not bound", name, render_pass.name()),
            }
        }

        Self::with_extent(ctx, render_pass, &views, extent)
    }

    /// Bind views in attachment index order with an explicit extent
    /// (swapchain targets)
    pub fn with_extent(
        ctx: &GraphicsContext,
        render_pass: &Arc<RenderPass>,
        views: &[&dyn GpuImageView],
        extent: Extent2D,
    ) -> Result<Self> {
        if views.len() != render_pass.attachment_count() {
            engine_bail_invalid!("x2::FrameBuffer",
                "Render pass '{}' expects {} attachments, got {}",
                render_pass.name(), render_pass.attachment_count(), views.len());
        }
        let gpu = ctx.device().create_framebuffer(render_pass.gpu_render_pass(), views, extent, 1)?;
        Ok(Self { gpu, render_pass: render_pass.clone(), extent })
    }

    /// Begin the render pass on this framebuffer and cover it with the
    /// viewport and scissor
    pub fn begin(&self, cmd: &mut dyn CommandBuffer, clear_values: &[ClearValue]) -> Result<()> {
        cmd.begin_render_pass(self.render_pass.gpu_render_pass(), self.gpu.as_ref(), self.extent, clear_values)?;
        cmd.set_viewport(Viewport::from_extent(self.extent))?;
        cmd.set_scissor(Rect2D::from_extent(self.extent))
    }

    pub fn gpu_framebuffer(&self) -> &dyn GpuFramebuffer {
        self.gpu.as_ref()
    }

    pub fn render_pass(&self) -> &Arc<RenderPass> {
        &self.render_pass
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }
}

#[cfg(test)]
#[path = "frame_buffer_tests.rs"]
mod tests;

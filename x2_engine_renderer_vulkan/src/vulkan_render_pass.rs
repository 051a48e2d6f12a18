/// Render pass and framebuffer - Vulkan implementations

use ash::vk;
use std::any::Any;
use std::sync::Arc;
use x2_engine::graphics_device::{
    AttachmentRef, GpuFramebuffer, GpuRenderPass, RenderPassDesc,
};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{
    access_to_vk, bind_point_to_vk, format_to_vk, image_layout_to_vk, load_op_to_vk,
    pipeline_stages_to_vk, sample_count_to_vk, store_op_to_vk,
};

/// Vulkan render pass
pub struct RenderPass {
    ctx: Arc<GpuContext>,
    pub(crate) render_pass: vk::RenderPass,
}

impl RenderPass {
    pub(crate) fn new(ctx: Arc<GpuContext>, render_pass: vk::RenderPass) -> Self {
        Self { ctx, render_pass }
    }
}

impl GpuRenderPass for RenderPass {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

/// Vulkan framebuffer
pub struct Framebuffer {
    ctx: Arc<GpuContext>,
    pub(crate) framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    pub(crate) fn new(ctx: Arc<GpuContext>, framebuffer: vk::Framebuffer) -> Self {
        Self { ctx, framebuffer }
    }
}

impl GpuFramebuffer for Framebuffer {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

fn attachment_ref_to_vk(reference: &AttachmentRef) -> vk::AttachmentReference {
    vk::AttachmentReference::default()
        .attachment(reference.attachment)
        .layout(image_layout_to_vk(reference.layout))
}

/// Attachment, reference and dependency arrays of a render pass
///
/// Subpass descriptions borrow the reference arrays, so they are kept
/// together until `vkCreateRenderPass` returns.
pub(crate) struct RenderPassInfo {
    pub(crate) attachments: Vec<vk::AttachmentDescription>,
    color_refs: Vec<Vec<vk::AttachmentReference>>,
    input_refs: Vec<Vec<vk::AttachmentReference>>,
    depth_refs: Vec<Option<vk::AttachmentReference>>,
    bind_points: Vec<vk::PipelineBindPoint>,
    pub(crate) dependencies: Vec<vk::SubpassDependency>,
}

impl RenderPassInfo {
    pub(crate) fn new(desc: &RenderPassDesc) -> Self {
        let attachments = desc
            .attachments
            .iter()
            .map(|attachment| {
                vk::AttachmentDescription::default()
                    .format(format_to_vk(attachment.format))
                    .samples(sample_count_to_vk(attachment.samples))
                    .load_op(load_op_to_vk(attachment.load_op))
                    .store_op(store_op_to_vk(attachment.store_op))
                    .stencil_load_op(load_op_to_vk(attachment.stencil_load_op))
                    .stencil_store_op(store_op_to_vk(attachment.stencil_store_op))
                    .initial_layout(image_layout_to_vk(attachment.initial_layout))
                    .final_layout(image_layout_to_vk(attachment.final_layout))
            })
            .collect();

        let color_refs = desc
            .subpasses
            .iter()
            .map(|subpass| subpass.color_attachments.iter().map(attachment_ref_to_vk).collect())
            .collect();
        let input_refs = desc
            .subpasses
            .iter()
            .map(|subpass| subpass.input_attachments.iter().map(attachment_ref_to_vk).collect())
            .collect();
        let depth_refs = desc
            .subpasses
            .iter()
            .map(|subpass| subpass.depth_stencil_attachment.as_ref().map(attachment_ref_to_vk))
            .collect();
        let bind_points = desc
            .subpasses
            .iter()
            .map(|subpass| bind_point_to_vk(subpass.bind_point))
            .collect();

        let dependencies = desc
            .dependencies
            .iter()
            .map(|dependency| {
                let flags = if dependency.by_region {
                    vk::DependencyFlags::BY_REGION
                } else {
                    vk::DependencyFlags::empty()
                };
                vk::SubpassDependency::default()
                    .src_subpass(dependency.src_subpass)
                    .dst_subpass(dependency.dst_subpass)
                    .src_stage_mask(pipeline_stages_to_vk(dependency.src_stage))
                    .dst_stage_mask(pipeline_stages_to_vk(dependency.dst_stage))
                    .src_access_mask(access_to_vk(dependency.src_access))
                    .dst_access_mask(access_to_vk(dependency.dst_access))
                    .dependency_flags(flags)
            })
            .collect();

        Self {
            attachments,
            color_refs,
            input_refs,
            depth_refs,
            bind_points,
            dependencies,
        }
    }

    pub(crate) fn subpasses(&self) -> Vec<vk::SubpassDescription<'_>> {
        (0..self.bind_points.len())
            .map(|i| {
                let mut subpass = vk::SubpassDescription::default()
                    .pipeline_bind_point(self.bind_points[i])
                    .color_attachments(&self.color_refs[i])
                    .input_attachments(&self.input_refs[i]);
                if let Some(depth_ref) = &self.depth_refs[i] {
                    subpass = subpass.depth_stencil_attachment(depth_ref);
                }
                subpass
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "vulkan_render_pass_tests.rs"]
mod tests;

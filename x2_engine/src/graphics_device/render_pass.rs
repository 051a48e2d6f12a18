/// Index-based render pass description consumed by the backend
///
/// The engine-level, name-based description lives in `crate::render_pass`;
/// it compiles down to this form.

use std::any::Any;
use crate::graphics_device::{
    AccessFlags, Format, ImageLayout, LoadOp, PipelineBindPoint, PipelineStage, SampleCount, StoreOp,
};

/// Subpass index meaning "outside the render pass" (VK_SUBPASS_EXTERNAL)
pub const SUBPASS_EXTERNAL: u32 = !0;

/// One attachment of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDesc {
    pub format: Format,
    pub samples: SampleCount,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

/// Reference to an attachment from a subpass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentRef {
    pub attachment: u32,
    pub layout: ImageLayout,
}

/// One subpass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubpassDesc {
    pub bind_point: PipelineBindPoint,
    pub color_attachments: Vec<AttachmentRef>,
    pub depth_stencil_attachment: Option<AttachmentRef>,
    pub input_attachments: Vec<AttachmentRef>,
}

/// Execution/memory dependency between two subpasses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpassDependencyDesc {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage: PipelineStage,
    pub dst_stage: PipelineStage,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub by_region: bool,
}

/// Complete render pass description
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderPassDesc {
    pub attachments: Vec<AttachmentDesc>,
    pub subpasses: Vec<SubpassDesc>,
    pub dependencies: Vec<SubpassDependencyDesc>,
}

/// Backend render pass
pub trait GpuRenderPass: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Backend framebuffer
pub trait GpuFramebuffer: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Command buffer trait - records and submits GPU work
///
/// One command buffer exists per (render feature, camera). A feature resets
/// and records it in `execute`, submits it in `submit` and waits for its fence
/// in `finish`.

use std::any::Any;
use crate::error::Result;
use crate::graphics_device::{
    AccessFlags, Extent2D, GpuBuffer, GpuDescriptorSet, GpuFramebuffer, GpuImage, GpuPipeline,
    GpuRenderPass, ImageAspect, ImageLayout, IndexType, PipelineStage, ShaderStageFlags,
};

/// Clear value for one attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

/// Viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering `extent` with depth range 0..1
    pub fn from_extent(extent: Extent2D) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Scissor rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn from_extent(extent: Extent2D) -> Self {
        Self { x: 0, y: 0, width: extent.width, height: extent.height }
    }
}

/// Image layout transition plus execution/memory dependency
pub struct ImageBarrier<'a> {
    pub image: &'a dyn GpuImage,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub src_stage: PipelineStage,
    pub dst_stage: PipelineStage,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub aspect: ImageAspect,
    pub base_array_layer: u32,
    pub array_layer_count: u32,
}

/// Backend semaphore (GPU-GPU synchronization, used for presentation)
pub trait GpuSemaphore: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Command buffer with its own fence
pub trait CommandBuffer: Send {
    /// Reset the command buffer to the initial state
    fn reset(&mut self) -> Result<()>;

    /// Begin recording (one-time submit)
    fn begin(&mut self) -> Result<()>;

    /// Finish recording
    fn end(&mut self) -> Result<()>;

    /// Begin a render pass on `framebuffer`; one clear value per attachment
    fn begin_render_pass(
        &mut self,
        render_pass: &dyn GpuRenderPass,
        framebuffer: &dyn GpuFramebuffer,
        extent: Extent2D,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    fn end_render_pass(&mut self) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    fn bind_pipeline(&mut self, pipeline: &dyn GpuPipeline) -> Result<()>;

    /// Bind `set` at `set_index` using the layout of `pipeline`
    fn bind_descriptor_set(
        &mut self,
        pipeline: &dyn GpuPipeline,
        set_index: u32,
        set: &dyn GpuDescriptorSet,
    ) -> Result<()>;

    fn push_constants(
        &mut self,
        pipeline: &dyn GpuPipeline,
        stages: ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) -> Result<()>;

    fn bind_vertex_buffer(&mut self, buffer: &dyn GpuBuffer, offset: u64) -> Result<()>;

    fn bind_index_buffer(&mut self, buffer: &dyn GpuBuffer, offset: u64, index_type: IndexType) -> Result<()>;

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) -> Result<()>;

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()>;

    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) -> Result<()>;

    fn pipeline_barrier(&mut self, barriers: &[ImageBarrier]) -> Result<()>;

    /// Linear-filtered color blit of mip 0 / layer 0.
    /// `src` must be in TransferSrcOptimal and `dst` in TransferDstOptimal.
    fn blit_image(
        &mut self,
        src: &dyn GpuImage,
        src_extent: Extent2D,
        dst: &dyn GpuImage,
        dst_extent: Extent2D,
    ) -> Result<()>;

    /// Submit to the graphics queue, signalling this buffer's fence
    fn submit(&mut self, wait: &[&dyn GpuSemaphore], signal: &[&dyn GpuSemaphore]) -> Result<()>;

    /// Block until the last submission completes (infinite timeout)
    fn wait(&mut self) -> Result<()>;
}

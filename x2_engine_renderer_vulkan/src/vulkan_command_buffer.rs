/// CommandBuffer - Vulkan implementation of the engine CommandBuffer trait
///
/// Each command buffer owns its pool and fence, so features can record and
/// submit independently.

use ash::vk;
use std::any::Any;
use std::sync::Arc;
use x2_engine::graphics_device::{
    ClearValue, CommandBuffer as EngineCommandBuffer, Extent2D, GpuBuffer, GpuDescriptorSet,
    GpuFramebuffer, GpuImage, GpuPipeline, GpuRenderPass, GpuSemaphore, ImageBarrier, IndexType,
    PipelineStage, Rect2D, ShaderStageFlags, Viewport,
};
use x2_engine::x2::Result;
use x2_engine::{engine_bail, engine_err};

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::{downcast, GpuContext, SOURCE};
use crate::vulkan_descriptor::DescriptorSet;
use crate::vulkan_format::{
    access_to_vk, aspect_to_vk, bind_point_to_vk, image_layout_to_vk, index_type_to_vk,
    pipeline_stages_to_vk, shader_stages_to_vk,
};
use crate::vulkan_image::Image;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::{Framebuffer, RenderPass};

/// Vulkan semaphore
pub struct Semaphore {
    ctx: Arc<GpuContext>,
    pub(crate) semaphore: vk::Semaphore,
}

impl Semaphore {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let semaphore = unsafe {
            ctx.device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create semaphore: {:?}", e))?
        };
        Ok(Self { ctx, semaphore })
    }
}

impl GpuSemaphore for Semaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Vulkan clear value
pub(crate) fn clear_value_to_vk(value: &ClearValue) -> vk::ClearValue {
    match *value {
        ClearValue::Color(float32) => vk::ClearValue {
            color: vk::ClearColorValue { float32 },
        },
        ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
        },
    }
}

/// Vulkan command buffer
pub struct CommandBuffer {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    fence: vk::Fence,
    is_recording: bool,
    in_render_pass: bool,
    /// A submission is pending on `fence`
    submitted: bool,
}

impl CommandBuffer {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = ctx
                .device
                .create_command_pool(&pool_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create command pool: {:?}", e))?;

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = match ctx.device.allocate_command_buffers(&allocate_info) {
                Ok(buffers) => buffers[0],
                Err(e) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    engine_bail!(SOURCE, "Failed to allocate command buffer: {:?}", e);
                }
            };

            let fence = match ctx.device.create_fence(&vk::FenceCreateInfo::default(), None) {
                Ok(fence) => fence,
                Err(e) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    engine_bail!(SOURCE, "Failed to create command buffer fence: {:?}", e);
                }
            };

            Ok(Self {
                ctx,
                command_pool,
                command_buffer,
                fence,
                is_recording: false,
                in_render_pass: false,
                submitted: false,
            })
        }
    }

    fn require_recording(&self, operation: &str) -> Result<()> {
        if !self.is_recording {
            engine_bail!(SOURCE, "{}: command buffer is not recording", operation);
        }
        Ok(())
    }
}

impl EngineCommandBuffer for CommandBuffer {
    fn reset(&mut self) -> Result<()> {
        if self.submitted {
            engine_bail!(SOURCE, "Cannot reset a command buffer whose submission was not waited for");
        }
        unsafe {
            self.ctx
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!(SOURCE, "Failed to reset command buffer: {:?}", e))?;
        }
        self.is_recording = false;
        self.in_render_pass = false;
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            engine_bail!(SOURCE, "Command buffer already recording");
        }
        unsafe {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.ctx
                .device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| engine_err!(SOURCE, "Failed to begin command buffer: {:?}", e))?;
        }
        self.is_recording = true;
        self.in_render_pass = false;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording("end")?;
        if self.in_render_pass {
            engine_bail!(SOURCE, "Render pass not ended before ending command buffer");
        }
        unsafe {
            self.ctx
                .device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| engine_err!(SOURCE, "Failed to end command buffer: {:?}", e))?;
        }
        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &dyn GpuRenderPass,
        framebuffer: &dyn GpuFramebuffer,
        extent: Extent2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_recording("begin_render_pass")?;
        if self.in_render_pass {
            engine_bail!(SOURCE, "Already inside a render pass");
        }

        let render_pass = downcast::<RenderPass>(render_pass.as_any(), "Render pass")?;
        let framebuffer = downcast::<Framebuffer>(framebuffer.as_any(), "Framebuffer")?;
        let clear_values: Vec<vk::ClearValue> = clear_values.iter().map(clear_value_to_vk).collect();

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass.render_pass)
            .framebuffer(framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: extent.width,
                    height: extent.height,
                },
            })
            .clear_values(&clear_values);

        unsafe {
            self.ctx
                .device
                .cmd_begin_render_pass(self.command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_recording("end_render_pass")?;
        if !self.in_render_pass {
            engine_bail!(SOURCE, "end_render_pass called outside a render pass");
        }
        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording("set_viewport")?;
        let viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_recording("set_scissor")?;
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D {
                width: scissor.width,
                height: scissor.height,
            },
        };
        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &dyn GpuPipeline) -> Result<()> {
        self.require_recording("bind_pipeline")?;
        let vk_pipeline = downcast::<Pipeline>(pipeline.as_any(), "Pipeline")?;
        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                bind_point_to_vk(pipeline.bind_point()),
                vk_pipeline.pipeline,
            );
        }
        Ok(())
    }

    fn bind_descriptor_set(
        &mut self,
        pipeline: &dyn GpuPipeline,
        set_index: u32,
        set: &dyn GpuDescriptorSet,
    ) -> Result<()> {
        self.require_recording("bind_descriptor_set")?;
        let vk_pipeline = downcast::<Pipeline>(pipeline.as_any(), "Pipeline")?;
        let set = downcast::<DescriptorSet>(set.as_any(), "Descriptor set")?;
        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                bind_point_to_vk(pipeline.bind_point()),
                vk_pipeline.layout,
                set_index,
                &[set.set],
                &[],
            );
        }
        Ok(())
    }

    fn push_constants(
        &mut self,
        pipeline: &dyn GpuPipeline,
        stages: ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) -> Result<()> {
        self.require_recording("push_constants")?;
        let pipeline = downcast::<Pipeline>(pipeline.as_any(), "Pipeline")?;
        unsafe {
            self.ctx.device.cmd_push_constants(
                self.command_buffer,
                pipeline.layout,
                shader_stages_to_vk(stages),
                offset,
                data,
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn GpuBuffer, offset: u64) -> Result<()> {
        self.require_recording("bind_vertex_buffer")?;
        let buffer = downcast::<Buffer>(buffer.as_any(), "Vertex buffer")?;
        unsafe {
            self.ctx
                .device
                .cmd_bind_vertex_buffers(self.command_buffer, 0, &[buffer.buffer], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &dyn GpuBuffer, offset: u64, index_type: IndexType) -> Result<()> {
        self.require_recording("bind_index_buffer")?;
        let buffer = downcast::<Buffer>(buffer.as_any(), "Index buffer")?;
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) -> Result<()> {
        self.require_recording("draw")?;
        unsafe {
            self.ctx.device.cmd_draw(
                self.command_buffer,
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            );
        }
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        self.require_recording("draw_indexed")?;
        unsafe {
            self.ctx.device.cmd_draw_indexed(
                self.command_buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
        Ok(())
    }

    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) -> Result<()> {
        self.require_recording("dispatch")?;
        if self.in_render_pass {
            engine_bail!(SOURCE, "dispatch is not allowed inside a render pass");
        }
        unsafe {
            self.ctx
                .device
                .cmd_dispatch(self.command_buffer, group_count_x, group_count_y, group_count_z);
        }
        Ok(())
    }

    fn pipeline_barrier(&mut self, barriers: &[ImageBarrier]) -> Result<()> {
        self.require_recording("pipeline_barrier")?;
        if barriers.is_empty() {
            return Ok(());
        }

        let mut src_stage = PipelineStage::empty();
        let mut dst_stage = PipelineStage::empty();
        let mut image_barriers = Vec::with_capacity(barriers.len());

        for barrier in barriers {
            let image = downcast::<Image>(barrier.image.as_any(), "Barrier image")?;
            src_stage |= barrier.src_stage;
            dst_stage |= barrier.dst_stage;
            image_barriers.push(
                vk::ImageMemoryBarrier::default()
                    .old_layout(image_layout_to_vk(barrier.old_layout))
                    .new_layout(image_layout_to_vk(barrier.new_layout))
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(image.image)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: aspect_to_vk(barrier.aspect),
                        base_mip_level: 0,
                        level_count: vk::REMAINING_MIP_LEVELS,
                        base_array_layer: barrier.base_array_layer,
                        layer_count: barrier.array_layer_count,
                    })
                    .src_access_mask(access_to_vk(barrier.src_access))
                    .dst_access_mask(access_to_vk(barrier.dst_access)),
            );
        }

        unsafe {
            self.ctx.device.cmd_pipeline_barrier(
                self.command_buffer,
                pipeline_stages_to_vk(src_stage),
                pipeline_stages_to_vk(dst_stage),
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &image_barriers,
            );
        }
        Ok(())
    }

    fn blit_image(
        &mut self,
        src: &dyn GpuImage,
        src_extent: Extent2D,
        dst: &dyn GpuImage,
        dst_extent: Extent2D,
    ) -> Result<()> {
        self.require_recording("blit_image")?;
        let src = downcast::<Image>(src.as_any(), "Blit source")?;
        let dst = downcast::<Image>(dst.as_any(), "Blit destination")?;

        let layers = vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        };
        let blit = vk::ImageBlit::default()
            .src_subresource(layers)
            .src_offsets([
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D {
                    x: src_extent.width as i32,
                    y: src_extent.height as i32,
                    z: 1,
                },
            ])
            .dst_subresource(layers)
            .dst_offsets([
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D {
                    x: dst_extent.width as i32,
                    y: dst_extent.height as i32,
                    z: 1,
                },
            ]);

        unsafe {
            self.ctx.device.cmd_blit_image(
                self.command_buffer,
                src.image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[blit],
                vk::Filter::LINEAR,
            );
        }
        Ok(())
    }

    fn submit(&mut self, wait: &[&dyn GpuSemaphore], signal: &[&dyn GpuSemaphore]) -> Result<()> {
        if self.is_recording {
            engine_bail!(SOURCE, "Cannot submit a command buffer that is still recording");
        }
        if self.submitted {
            engine_bail!(SOURCE, "Command buffer submitted twice without waiting");
        }

        let wait_semaphores = wait
            .iter()
            .map(|semaphore| downcast::<Semaphore>(semaphore.as_any(), "Wait semaphore").map(|s| s.semaphore))
            .collect::<Result<Vec<_>>>()?;
        let signal_semaphores = signal
            .iter()
            .map(|semaphore| downcast::<Semaphore>(semaphore.as_any(), "Signal semaphore").map(|s| s.semaphore))
            .collect::<Result<Vec<_>>>()?;
        let wait_stages = vec![
            vk::PipelineStageFlags::TRANSFER | vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
            wait_semaphores.len()
        ];
        let command_buffers = [self.command_buffer];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx
                .device
                .reset_fences(&[self.fence])
                .map_err(|e| engine_err!(SOURCE, "Failed to reset command buffer fence: {:?}", e))?;

            let queue = self
                .ctx
                .graphics_queue
                .lock()
                .map_err(|_| engine_err!(SOURCE, "Graphics queue lock poisoned"))?;
            self.ctx
                .device
                .queue_submit(*queue, &[submit_info], self.fence)
                .map_err(|e| engine_err!(SOURCE, "Failed to submit commands to GPU queue: {:?}", e))?;
        }
        self.submitted = true;
        Ok(())
    }

    fn wait(&mut self) -> Result<()> {
        if !self.submitted {
            return Ok(());
        }
        unsafe {
            self.ctx
                .device
                .wait_for_fences(&[self.fence], true, u64::MAX)
                .map_err(|e| engine_err!(SOURCE, "Failed to wait for command buffer fence: {:?}", e))?;
        }
        self.submitted = false;
        Ok(())
    }
}

impl Drop for CommandBuffer {
    fn drop(&mut self) {
        unsafe {
            if self.submitted {
                self.ctx.device.wait_for_fences(&[self.fence], true, u64::MAX).ok();
            }
            self.ctx.device.destroy_fence(self.fence, None);
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

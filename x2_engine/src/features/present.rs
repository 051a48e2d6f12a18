/// Present: copies the camera color attachment to a swapchain image.
///
/// Acquires in `prepare`, blits in `execute`, bridges acquisition and
/// presentation with the swapchain semaphores in `submit`, and presents
/// after the fence wait in `finish`.

use std::sync::Arc;
use crate::camera::{Camera, COLOR_ATTACHMENT};
use crate::error::Result;
use crate::graphics_device::{
    AccessFlags, CommandBuffer, GpuImage, ImageAspect, ImageBarrier, ImageLayout, PipelineStage, Swapchain,
};
use crate::render_feature::{downcast_data_mut, RenderFeature, RenderFeatureData, RenderObject};
use crate::{engine_bail, engine_warn};
use super::full_screen::begin_recording;

const FEATURE: &str = "Present";

#[derive(Debug, Default)]
pub struct PresentData {
    image_index: Option<u32>,
    suboptimal: bool,
}

impl PresentData {
    /// Swapchain image acquired for the current frame
    pub fn image_index(&self) -> Option<u32> {
        self.image_index
    }

    /// Whether the last present reported a suboptimal swapchain
    pub fn suboptimal(&self) -> bool {
        self.suboptimal
    }
}

pub struct PresentFeature {
    swapchain: Arc<dyn Swapchain>,
}

impl PresentFeature {
    pub fn new(swapchain: Arc<dyn Swapchain>) -> Self {
        Self { swapchain }
    }

    pub fn swapchain(&self) -> &Arc<dyn Swapchain> {
        &self.swapchain
    }

    fn acquired(data: &PresentData) -> Result<u32> {
        match data.image_index {
            Some(index) => Ok(index),
            None => engine_bail!("x2::Present", "No swapchain image acquired for this frame"),
        }
    }
}

fn color_barrier<'a>(
    image: &'a dyn GpuImage,
    old_layout: ImageLayout,
    new_layout: ImageLayout,
    src: (PipelineStage, AccessFlags),
    dst: (PipelineStage, AccessFlags),
) -> ImageBarrier<'a> {
    ImageBarrier {
        image,
        old_layout,
        new_layout,
        src_stage: src.0,
        dst_stage: dst.0,
        src_access: src.1,
        dst_access: dst.1,
        aspect: ImageAspect::COLOR,
        base_array_layer: 0,
        array_layer_count: 1,
    }
}

impl RenderFeature for PresentFeature {
    fn create_data(&self, _camera: &Camera) -> Result<Box<RenderFeatureData>> {
        Ok(Box::new(PresentData::default()))
    }

    fn resolve_data(&self, data: &mut RenderFeatureData, _camera: &Camera) -> Result<()> {
        downcast_data_mut::<PresentData>(data, FEATURE)?.image_index = None;
        Ok(())
    }

    fn prepare(&self, data: &mut RenderFeatureData, _camera: &Camera) -> Result<()> {
        let data = downcast_data_mut::<PresentData>(data, FEATURE)?;
        data.image_index = Some(self.swapchain.acquire_next_image()?);
        Ok(())
    }

    fn execute(
        &self,
        data: &mut RenderFeatureData,
        cmd: &mut dyn CommandBuffer,
        camera: &Camera,
        _renderables: &[RenderObject],
    ) -> Result<()> {
        let data = downcast_data_mut::<PresentData>(data, FEATURE)?;
        let index = Self::acquired(data)?;
        let color = camera.attachment(COLOR_ATTACHMENT)?;
        let target = self.swapchain.image(index)?;
        let attachment_write = (PipelineStage::COLOR_ATTACHMENT_OUTPUT, AccessFlags::COLOR_ATTACHMENT_WRITE);
        let transfer_read = (PipelineStage::TRANSFER, AccessFlags::TRANSFER_READ);
        let transfer_write = (PipelineStage::TRANSFER, AccessFlags::TRANSFER_WRITE);

        begin_recording(cmd)?;
        cmd.pipeline_barrier(&[
            color_barrier(color.gpu_image(), ImageLayout::ColorAttachmentOptimal, ImageLayout::TransferSrcOptimal,
                attachment_write, transfer_read),
            color_barrier(target.as_ref(), ImageLayout::Undefined, ImageLayout::TransferDstOptimal,
                (PipelineStage::TOP_OF_PIPE, AccessFlags::empty()), transfer_write),
        ])?;
        cmd.blit_image(color.gpu_image(), color.extent(), target.as_ref(), self.swapchain.extent())?;
        cmd.pipeline_barrier(&[
            color_barrier(color.gpu_image(), ImageLayout::TransferSrcOptimal, ImageLayout::ColorAttachmentOptimal,
                transfer_read, attachment_write),
            color_barrier(target.as_ref(), ImageLayout::TransferDstOptimal, ImageLayout::PresentSrc,
                transfer_write, (PipelineStage::BOTTOM_OF_PIPE, AccessFlags::empty())),
        ])?;
        cmd.end()
    }

    fn submit(&self, _data: &mut RenderFeatureData, cmd: &mut dyn CommandBuffer) -> Result<()> {
        cmd.submit(&[self.swapchain.image_available()], &[self.swapchain.render_finished()])
    }

    fn finish(&self, data: &mut RenderFeatureData, cmd: &mut dyn CommandBuffer) -> Result<()> {
        cmd.wait()?;
        let data = downcast_data_mut::<PresentData>(data, FEATURE)?;
        let index = Self::acquired(data)?;
        data.suboptimal = self.swapchain.present(index)?;
        if data.suboptimal {
            engine_warn!("x2::Present", "Swapchain is suboptimal, recreate it and refresh the renderer");
        }
        data.image_index = None;
        Ok(())
    }
}

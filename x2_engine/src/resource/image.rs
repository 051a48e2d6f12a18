/// GPU image with named views.
///
/// Every image owns a [`DEFAULT_VIEW`] covering all mips and layers (Cube for
/// cube-compatible 6-layer images, 2D array for layered images, 2D
/// otherwise). Additional views (one layer, one mip range) are created by
/// name and looked up by name when binding.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{
    Extent2D, Format, GpuImage, GpuImageView, ImageAspect, ImageDesc, ImageUsage, ImageViewDesc,
    ImageViewType,
};
use crate::{engine_bail, engine_bail_invalid};

/// Name of the view created with every image
pub const DEFAULT_VIEW: &str = "Default";

/// A named view of an [`Image`]
#[derive(Clone)]
pub struct ImageView {
    gpu: Arc<dyn GpuImageView>,
    desc: ImageViewDesc,
}

impl ImageView {
    pub fn gpu_view(&self) -> &dyn GpuImageView {
        self.gpu.as_ref()
    }

    pub fn desc(&self) -> &ImageViewDesc {
        &self.desc
    }
}

pub struct Image {
    gpu: Arc<dyn GpuImage>,
    desc: ImageDesc,
    views: FxHashMap<String, ImageView>,
}

impl Image {
    /// Create an image and its default view
    ///
    /// `desc.initial_data`, when set, is uploaded by the device and not kept.
    pub fn new(ctx: &GraphicsContext, mut desc: ImageDesc) -> Result<Self> {
        if desc.extent.width == 0 || desc.extent.height == 0 {
            engine_bail!("x2::Image", "Cannot create an image of extent {}x{}",
                desc.extent.width, desc.extent.height);
        }
        if desc.cube_compatible && desc.array_layers != 6 {
            engine_bail!("x2::Image", "Cube images need 6 layers, got {}", desc.array_layers);
        }

        let gpu = ctx.device().create_image(&desc)?;
        desc.initial_data = None;
        let mut image = Self { gpu, desc, views: FxHashMap::default() };

        let view_type = if image.desc.cube_compatible {
            ImageViewType::Cube
        } else if image.desc.array_layers > 1 {
            ImageViewType::D2Array
        } else {
            ImageViewType::D2
        };
        let default_view = ImageViewDesc {
            view_type,
            aspect: image.default_aspect(),
            base_mip_level: 0,
            mip_level_count: image.desc.mip_levels,
            base_array_layer: 0,
            array_layer_count: image.desc.array_layers,
        };
        image.create_view(ctx, DEFAULT_VIEW, default_view)?;
        Ok(image)
    }

    /// Sampled attachment image of `format`
    ///
    /// Usage is COLOR_ATTACHMENT or DEPTH_STENCIL_ATTACHMENT (from the format)
    /// plus SAMPLED and TRANSFER_SRC, plus `extra_usage`.
    pub fn attachment(ctx: &GraphicsContext, extent: Extent2D, format: Format, extra_usage: ImageUsage) -> Result<Self> {
        let attachment_usage = if format.is_depth() {
            ImageUsage::DEPTH_STENCIL_ATTACHMENT
        } else {
            ImageUsage::COLOR_ATTACHMENT
        };
        let usage = attachment_usage | ImageUsage::SAMPLED | ImageUsage::TRANSFER_SRC | extra_usage;
        Self::new(ctx, ImageDesc::new_2d(extent, format, usage))
    }

    /// Wrap an image owned elsewhere (swapchain images); no view is created
    pub fn from_gpu(gpu: Arc<dyn GpuImage>, desc: ImageDesc) -> Self {
        Self { gpu, desc, views: FxHashMap::default() }
    }

    /// Create a named view
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the ranges exceed the image.
    pub fn create_view(&mut self, ctx: &GraphicsContext, name: &str, desc: ImageViewDesc) -> Result<()> {
        if self.views.contains_key(name) {
            engine_bail_invalid!("x2::Image", "View '{}' already exists", name);
        }
        let mip_end = desc.base_mip_level.checked_add(desc.mip_level_count);
        let layer_end = desc.base_array_layer.checked_add(desc.array_layer_count);
        if mip_end.map_or(true, |end| end > self.desc.mip_levels)
            || layer_end.map_or(true, |end| end > self.desc.array_layers)
        {
            engine_bail_invalid!("x2::Image",
                "View '{}' (mips {}+{}, layers {}+{}) exceeds image (mips {}, layers {})",
                name, desc.base_mip_level, desc.mip_level_count,
                desc.base_array_layer, desc.array_layer_count,
                self.desc.mip_levels, self.desc.array_layers);
        }

        let gpu = ctx.device().create_image_view(self.gpu.as_ref(), self.desc.format, &desc)?;
        self.views.insert(name.to_string(), ImageView { gpu, desc });
        Ok(())
    }

    /// Create a 2D view of a single array layer
    pub fn create_layer_view(&mut self, ctx: &GraphicsContext, name: &str, layer: u32) -> Result<()> {
        let aspect = self.default_aspect();
        self.create_view(ctx, name, ImageViewDesc {
            view_type: ImageViewType::D2,
            aspect,
            base_mip_level: 0,
            mip_level_count: 1,
            base_array_layer: layer,
            array_layer_count: 1,
        })
    }

    /// Look up a view by name
    pub fn view(&self, name: &str) -> Result<&ImageView> {
        match self.views.get(name) {
            Some(view) => Ok(view),
            None => engine_bail_invalid!("x2::Image", "Image has no view '{}'", name),
        }
    }

    pub fn default_view(&self) -> Result<&ImageView> {
        self.view(DEFAULT_VIEW)
    }

    pub fn has_view(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    pub fn gpu_image(&self) -> &dyn GpuImage {
        self.gpu.as_ref()
    }

    pub fn desc(&self) -> &ImageDesc {
        &self.desc
    }

    pub fn format(&self) -> Format {
        self.desc.format
    }

    pub fn extent(&self) -> Extent2D {
        self.desc.extent
    }

    /// Extent of mip `level`
    pub fn mip_extent(&self, level: u32) -> Extent2D {
        self.desc.extent.mip(level)
    }

    pub fn array_layers(&self) -> u32 {
        self.desc.array_layers
    }

    fn default_aspect(&self) -> ImageAspect {
        if self.desc.format.is_depth() {
            ImageAspect::DEPTH
        } else {
            ImageAspect::COLOR
        }
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;

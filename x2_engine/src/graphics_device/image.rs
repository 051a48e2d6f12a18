/// Image, image view and sampler handle traits and descriptors

use std::any::Any;
use bitflags::bitflags;
use crate::graphics_device::{CompareOp, Extent2D, Format, ImageAspect, SampleCount};

bitflags! {
    /// Image usage (VkImageUsageFlags)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const TRANSFER_SRC = 0x1;
        const TRANSFER_DST = 0x2;
        const SAMPLED = 0x4;
        const STORAGE = 0x8;
        const COLOR_ATTACHMENT = 0x10;
        const DEPTH_STENCIL_ATTACHMENT = 0x20;
        const INPUT_ATTACHMENT = 0x80;
    }
}

/// Descriptor for creating an image
#[derive(Debug, Clone)]
pub struct ImageDesc {
    pub extent: Extent2D,
    pub format: Format,
    pub usage: ImageUsage,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub samples: SampleCount,
    /// Create the image cube-compatible (`array_layers` must be a multiple of 6)
    pub cube_compatible: bool,
    /// Initial pixel data for mip 0 of every layer, tightly packed.
    /// When present the image is uploaded and left in `ShaderReadOnlyOptimal`.
    pub initial_data: Option<Vec<u8>>,
}

impl ImageDesc {
    /// Single-mip, single-layer 2D image
    pub fn new_2d(extent: Extent2D, format: Format, usage: ImageUsage) -> Self {
        Self {
            extent,
            format,
            usage,
            mip_levels: 1,
            array_layers: 1,
            samples: SampleCount::S1,
            cube_compatible: false,
            initial_data: None,
        }
    }
}

/// Image view dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageViewType {
    D2,
    D2Array,
    Cube,
}

/// Descriptor for an image view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageViewDesc {
    pub view_type: ImageViewType,
    pub aspect: ImageAspect,
    pub base_mip_level: u32,
    pub mip_level_count: u32,
    pub base_array_layer: u32,
    pub array_layer_count: u32,
}

/// Texture filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Texture coordinate addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Descriptor for a sampler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDesc {
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub address_mode: AddressMode,
    /// Depth comparison (shadow samplers)
    pub compare_op: Option<CompareOp>,
    pub max_lod: f32,
    /// Opaque white border instead of transparent black
    pub white_border: bool,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            mag_filter: Filter::Linear,
            min_filter: Filter::Linear,
            address_mode: AddressMode::ClampToEdge,
            compare_op: None,
            max_lod: 0.0,
            white_border: false,
        }
    }
}

/// Backend image
pub trait GpuImage: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Backend image view
pub trait GpuImageView: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Backend sampler
pub trait GpuSampler: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

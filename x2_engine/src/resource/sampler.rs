/// Image sampler

use std::sync::Arc;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{AddressMode, CompareOp, Filter, GpuSampler, SamplerDesc};

pub struct ImageSampler {
    gpu: Arc<dyn GpuSampler>,
    desc: SamplerDesc,
}

impl ImageSampler {
    pub fn new(ctx: &GraphicsContext, desc: SamplerDesc) -> Result<Self> {
        let gpu = ctx.device().create_sampler(&desc)?;
        Ok(Self { gpu, desc })
    }

    /// Bilinear, clamped to edge
    pub fn linear_clamp(ctx: &GraphicsContext) -> Result<Self> {
        Self::new(ctx, SamplerDesc::default())
    }

    /// Point sampling, repeating (noise textures)
    pub fn nearest_repeat(ctx: &GraphicsContext) -> Result<Self> {
        Self::new(ctx, SamplerDesc {
            mag_filter: Filter::Nearest,
            min_filter: Filter::Nearest,
            address_mode: AddressMode::Repeat,
            ..SamplerDesc::default()
        })
    }

    /// Depth comparison sampler; outside the map reads as lit
    pub fn shadow(ctx: &GraphicsContext) -> Result<Self> {
        Self::new(ctx, SamplerDesc {
            address_mode: AddressMode::ClampToBorder,
            compare_op: Some(CompareOp::LessOrEqual),
            white_border: true,
            ..SamplerDesc::default()
        })
    }

    pub fn gpu_sampler(&self) -> &dyn GpuSampler {
        self.gpu.as_ref()
    }

    pub fn desc(&self) -> &SamplerDesc {
        &self.desc
    }
}

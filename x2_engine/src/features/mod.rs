//! Built-in render features and the render passes they draw with.
//!
//! Frame chain of the deferred renderer:
//!
//! ```text
//! Background -> Geometry -> AmbientOcclusion -> AoBlur -> AoCover -> Present
//!  (Color)      (Color, Normal,  (Occlusion)      (Occlusion) (Color)   (swapchain)
//!               Position, Depth)
//! ```
//!
//! The shadowed renderer runs ShadowCaster first and ShadowReceiver after
//! AoCover, reading the caster outputs and the G-buffer positions.

pub mod ambient_occlusion;
pub mod ao_blur;
pub mod ao_cover;
pub mod background;
pub mod cascade;
pub mod full_screen;
pub mod geometry;
pub mod present;
pub mod shadow_caster;
pub mod shadow_receiver;

#[cfg(test)]
pub(crate) mod test_shaders;

pub use ambient_occlusion::{
    AmbientOcclusionConfig, AmbientOcclusionData, AmbientOcclusionFeature, AoTechnique, GtaoParams,
    HbaoParams, SsaoParams,
};
pub use ao_blur::{AoBlurConfig, AoBlurData, AoBlurFeature};
pub use ao_cover::{AoCoverConfig, AoCoverData, AoCoverFeature};
pub use background::{BackgroundConfig, BackgroundData, BackgroundFeature};
pub use cascade::{BoundingSphere, Cascade, CASCADE_COUNT};
pub use geometry::{GeometryData, GeometryFeature};
pub use present::{PresentData, PresentFeature};
pub use shadow_caster::{ShadowCasterConfig, ShadowCasterData, ShadowCasterFeature};
pub use shadow_receiver::{ShadowReceiverConfig, ShadowReceiverData, ShadowReceiverFeature};

use crate::camera::{COLOR_ATTACHMENT, COLOR_FORMAT, DEPTH_ATTACHMENT, DEPTH_FORMAT};
use crate::error::Result;
use crate::graphics_device::{Format, ImageLayout, LoadOp};
use crate::render_pass::{AttachmentDescriptor, RenderPassManager, RenderPassSettings, SubpassDescriptor};

// ===== RENDER PASS NAMES =====

pub const BACKGROUND_PASS: &str = "Background";
pub const GEOMETRY_PASS: &str = "Geometry";
pub const AMBIENT_OCCLUSION_PASS: &str = "AmbientOcclusion";
pub const AO_BLUR_PASS: &str = "AoBlur";
pub const AO_COVER_PASS: &str = "AoCover";
pub const SHADOW_CASTER_PASS: &str = "ShadowCaster";
pub const SHADOW_RECEIVER_PASS: &str = "ShadowReceiver";

pub const BUILTIN_RENDER_PASSES: [&str; 7] = [
    BACKGROUND_PASS,
    GEOMETRY_PASS,
    AMBIENT_OCCLUSION_PASS,
    AO_BLUR_PASS,
    AO_COVER_PASS,
    SHADOW_CASTER_PASS,
    SHADOW_RECEIVER_PASS,
];

/// Subpass every built-in pass draws in
pub const MAIN_SUBPASS: &str = "Main";

// ===== ATTACHMENT NAMES AND FORMATS =====

pub const NORMAL_ATTACHMENT: &str = "Normal";
pub const POSITION_ATTACHMENT: &str = "Position";
pub const OCCLUSION_ATTACHMENT: &str = "Occlusion";

pub const GBUFFER_FORMAT: Format = Format::R16G16B16A16_SFLOAT;
pub const OCCLUSION_FORMAT: Format = Format::R8_UNORM;
pub const SHADOW_MAP_FORMAT: Format = Format::D32_SFLOAT;

/// Register the recipe of every built-in render pass
pub fn register_builtin_render_passes(manager: &mut RenderPassManager) -> Result<()> {
    manager.register(BACKGROUND_PASS, |settings: &mut RenderPassSettings| {
        settings
            .add_attachment(COLOR_ATTACHMENT, AttachmentDescriptor::color(COLOR_FORMAT)
                .with_layouts(ImageLayout::Undefined, ImageLayout::ColorAttachmentOptimal))
            .add_subpass(MAIN_SUBPASS, SubpassDescriptor::graphics(&[COLOR_ATTACHMENT], None))
            .add_external_dependencies(MAIN_SUBPASS);
    })?;

    manager.register(GEOMETRY_PASS, |settings: &mut RenderPassSettings| {
        settings
            .add_attachment(COLOR_ATTACHMENT, AttachmentDescriptor::color(COLOR_FORMAT)
                .with_load_op(LoadOp::Load)
                .with_layouts(ImageLayout::ColorAttachmentOptimal, ImageLayout::ColorAttachmentOptimal))
            .add_attachment(NORMAL_ATTACHMENT, AttachmentDescriptor::color(GBUFFER_FORMAT))
            .add_attachment(POSITION_ATTACHMENT, AttachmentDescriptor::color(GBUFFER_FORMAT))
            .add_attachment(DEPTH_ATTACHMENT, AttachmentDescriptor::depth(DEPTH_FORMAT))
            .add_subpass(MAIN_SUBPASS, SubpassDescriptor::graphics(
                &[COLOR_ATTACHMENT, NORMAL_ATTACHMENT, POSITION_ATTACHMENT],
                Some(DEPTH_ATTACHMENT),
            ))
            .add_external_dependencies(MAIN_SUBPASS);
    })?;

    manager.register(AMBIENT_OCCLUSION_PASS, |settings: &mut RenderPassSettings| {
        settings
            .add_attachment(OCCLUSION_ATTACHMENT, AttachmentDescriptor::color(OCCLUSION_FORMAT))
            .add_subpass(MAIN_SUBPASS, SubpassDescriptor::graphics(&[OCCLUSION_ATTACHMENT], None))
            .add_external_dependencies(MAIN_SUBPASS);
    })?;

    manager.register(AO_BLUR_PASS, |settings: &mut RenderPassSettings| {
        settings
            .add_attachment(OCCLUSION_ATTACHMENT, AttachmentDescriptor::color(OCCLUSION_FORMAT)
                .with_load_op(LoadOp::DontCare))
            .add_subpass(MAIN_SUBPASS, SubpassDescriptor::graphics(&[OCCLUSION_ATTACHMENT], None))
            .add_external_dependencies(MAIN_SUBPASS);
    })?;

    manager.register(AO_COVER_PASS, |settings: &mut RenderPassSettings| {
        settings
            .add_attachment(COLOR_ATTACHMENT, AttachmentDescriptor::color(COLOR_FORMAT)
                .with_load_op(LoadOp::Load)
                .with_layouts(ImageLayout::ColorAttachmentOptimal, ImageLayout::ColorAttachmentOptimal))
            .add_subpass(MAIN_SUBPASS, SubpassDescriptor::graphics(&[COLOR_ATTACHMENT], None))
            .add_external_dependencies(MAIN_SUBPASS);
    })?;

    manager.register(SHADOW_RECEIVER_PASS, |settings: &mut RenderPassSettings| {
        settings
            .add_attachment(COLOR_ATTACHMENT, AttachmentDescriptor::color(COLOR_FORMAT)
                .with_load_op(LoadOp::Load)
                .with_layouts(ImageLayout::ColorAttachmentOptimal, ImageLayout::ColorAttachmentOptimal))
            .add_subpass(MAIN_SUBPASS, SubpassDescriptor::graphics(&[COLOR_ATTACHMENT], None))
            .add_external_dependencies(MAIN_SUBPASS);
    })?;
    manager.register(SHADOW_CASTER_PASS, |settings: &mut RenderPassSettings| {
        settings
            .add_attachment(DEPTH_ATTACHMENT, AttachmentDescriptor::depth(SHADOW_MAP_FORMAT))
            .add_subpass(MAIN_SUBPASS, SubpassDescriptor::graphics(&[], Some(DEPTH_ATTACHMENT)))
            .add_external_dependencies(MAIN_SUBPASS);
    })?;

    Ok(())
}

#[cfg(test)]
#[path = "features_tests.rs"]
mod tests;

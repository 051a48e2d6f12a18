/// Built-in renderers.
///
/// "Deferred": Background, Geometry, AmbientOcclusion, AoBlur, AoCover, then
/// Present when the settings carry a swapchain.
///
/// "Shadowed": ShadowCaster, the deferred chain, then ShadowReceiver darkening
/// the covered color before Present. The caster runs every frame since its
/// cascades follow the camera.

use std::sync::Arc;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::features::{
    AmbientOcclusionData, AmbientOcclusionFeature, AoBlurData, AoBlurFeature, AoCoverData, AoCoverFeature,
    BackgroundFeature, GeometryData, GeometryFeature, PresentFeature, ShadowCasterData, ShadowCasterFeature,
    ShadowReceiverData, ShadowReceiverFeature,
};
use super::renderer_base::RendererBase;
use super::renderer_data::RendererData;
use super::renderer_registry::{RendererRegistry, RendererSettings};

pub const DEFERRED_RENDERER: &str = "Deferred";
pub const SHADOWED_RENDERER: &str = "Shadowed";

// ===== FEATURE NAMES =====

pub const BACKGROUND: &str = "Background";
pub const GEOMETRY: &str = "Geometry";
pub const AMBIENT_OCCLUSION: &str = "AmbientOcclusion";
pub const AO_BLUR: &str = "AoBlur";
pub const AO_COVER: &str = "AoCover";
pub const PRESENT: &str = "Present";
pub const SHADOW_CASTER: &str = "ShadowCaster";
pub const SHADOW_RECEIVER: &str = "ShadowReceiver";

pub fn register_builtin_renderers(registry: &mut RendererRegistry) -> Result<()> {
    registry.register(DEFERRED_RENDERER, create_deferred)?;
    registry.register(SHADOWED_RENDERER, create_shadowed)
}

pub fn create_deferred(ctx: &Arc<GraphicsContext>, settings: &RendererSettings) -> Result<RendererBase> {
    let mut renderer = RendererBase::new(ctx, DEFERRED_RENDERER);
    push_deferred_chain(&mut renderer, ctx, settings)?;
    push_present(&mut renderer, settings)?;
    renderer.set_resolve_hook(connect_deferred_chain);
    Ok(renderer)
}

pub fn create_shadowed(ctx: &Arc<GraphicsContext>, settings: &RendererSettings) -> Result<RendererBase> {
    let mut renderer = RendererBase::new(ctx, SHADOWED_RENDERER);
    renderer.push_render_feature(SHADOW_CASTER, Arc::new(
        ShadowCasterFeature::new(ctx, &settings.shader_dir, settings.shadow_caster)?))?;
    push_deferred_chain(&mut renderer, ctx, settings)?;
    renderer.push_render_feature(SHADOW_RECEIVER, Arc::new(
        ShadowReceiverFeature::new(ctx, &settings.shader_dir, settings.shadow_receiver)?))?;
    push_present(&mut renderer, settings)?;
    renderer.set_resolve_hook(connect_shadowed_chain);
    Ok(renderer)
}

fn push_deferred_chain(renderer: &mut RendererBase, ctx: &Arc<GraphicsContext>, settings: &RendererSettings) -> Result<()> {
    let dir = settings.shader_dir.as_path();
    renderer.push_render_feature(BACKGROUND, Arc::new(BackgroundFeature::new(ctx, dir, settings.background)?))?;
    renderer.push_render_feature(GEOMETRY, Arc::new(GeometryFeature::new(ctx)?))?;
    renderer.push_render_feature(AMBIENT_OCCLUSION, Arc::new(
        AmbientOcclusionFeature::new(ctx, dir, settings.ambient_occlusion)?))?;
    renderer.push_render_feature(AO_BLUR, Arc::new(AoBlurFeature::new(ctx, dir, settings.ao_blur)?))?;
    renderer.push_render_feature(AO_COVER, Arc::new(AoCoverFeature::new(ctx, dir, settings.ao_cover)?))
}

fn push_present(renderer: &mut RendererBase, settings: &RendererSettings) -> Result<()> {
    if let Some(swapchain) = &settings.swapchain {
        renderer.push_render_feature(PRESENT, Arc::new(PresentFeature::new(swapchain.clone())))?;
    }
    Ok(())
}

/// G-buffer -> occlusion -> blur (in place) -> cover
fn connect_deferred_chain(data: &mut RendererData) -> Result<()> {
    let (normal, position) = {
        let geometry = data.data::<GeometryData>(GEOMETRY)?;
        (geometry.normal().clone(), geometry.position().clone())
    };

    let ambient_occlusion = data.data_mut::<AmbientOcclusionData>(AMBIENT_OCCLUSION)?;
    ambient_occlusion.connect(&normal, &position);
    let occlusion = ambient_occlusion.occlusion().clone();

    data.data_mut::<AoBlurData>(AO_BLUR)?.connect(&occlusion, &normal);
    data.data_mut::<AoCoverData>(AO_COVER)?.connect(&occlusion);
    Ok(())
}

/// Deferred chain, plus G-buffer positions and caster outputs -> receiver
fn connect_shadowed_chain(data: &mut RendererData) -> Result<()> {
    connect_deferred_chain(data)?;

    let position = data.data::<GeometryData>(GEOMETRY)?.position().clone();
    let (shadow_map, shadow) = {
        let caster = data.data::<ShadowCasterData>(SHADOW_CASTER)?;
        (caster.shadow_map().clone(), caster.uniform().clone())
    };
    data.data_mut::<ShadowReceiverData>(SHADOW_RECEIVER)?.connect(&position, &shadow_map, &shadow);
    Ok(())
}

#[cfg(test)]
#[path = "deferred_tests.rs"]
mod tests;

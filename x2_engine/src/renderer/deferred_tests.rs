use std::sync::Arc;
use glam::{Mat4, Vec3};
use super::*;
use crate::camera::Camera;
use crate::features::test_shaders::{builtin_shader_dir, ShaderDir};
use crate::features::{AoTechnique, HbaoParams, PresentData, ShadowCasterData, ShadowReceiverData};
use crate::graphics_device::mock_graphics_device::{mock_context, MockGraphicsDevice, MockSwapchain};
use crate::graphics_device::Extent2D;
use crate::render_feature::RenderObject;
use crate::resource::{Buffer, Material, Mesh};

fn settings(device: &MockGraphicsDevice, test: &str) -> (ShaderDir, RendererSettings) {
    let dir = builtin_shader_dir(device, test);
    let settings = RendererSettings { shader_dir: dir.path().to_path_buf(), ..RendererSettings::default() };
    (dir, settings)
}

fn camera(ctx: &GraphicsContext) -> Camera {
    let mut camera = Camera::new(ctx, "Main", Extent2D::new(64, 32)).unwrap();
    camera.look_at(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y);
    camera
}

fn cube(ctx: &Arc<GraphicsContext>, settings: &RendererSettings) -> RenderObject {
    let shader = crate::features::full_screen::load_shader(ctx, &settings.shader_dir, "geometry_default").unwrap();
    let mut material = Material::new(ctx, &shader).unwrap();
    material.set_uniform_buffer("Surface", Arc::new(Buffer::uniform::<[f32; 8]>(ctx).unwrap())).unwrap();
    RenderObject::new(Arc::new(Mesh::cube(ctx).unwrap()), Arc::new(material), Mat4::IDENTITY)
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_builtin_renderers_registered() {
    let registry = RendererRegistry::with_builtin_renderers().unwrap();

    assert!(registry.contains(DEFERRED_RENDERER));
    assert!(registry.contains(SHADOWED_RENDERER));
    assert_eq!(registry.names().count(), 2);
}

#[test]
fn test_duplicate_and_unknown_renderers_fail() {
    let (device, ctx) = mock_context();
    let (_dir, settings) = settings(&device, "registry_errors");
    let mut registry = RendererRegistry::with_builtin_renderers().unwrap();

    assert!(registry.register(DEFERRED_RENDERER, create_deferred).is_err());
    assert!(registry.create("Forward", &ctx, &settings).is_err());
}

#[test]
fn test_custom_renderer_registration() {
    let (device, ctx) = mock_context();
    let (_dir, settings) = settings(&device, "registry_custom");
    let mut registry = RendererRegistry::new();
    registry.register("Empty", |ctx, _settings| Ok(RendererBase::new(ctx, "Empty"))).unwrap();

    let renderer = registry.create("Empty", &ctx, &settings).unwrap();
    assert_eq!(renderer.name(), "Empty");
    assert_eq!(renderer.feature_names().count(), 0);
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn test_deferred_feature_order() {
    let (device, ctx) = mock_context();
    let (_dir, settings) = settings(&device, "deferred_order");
    let renderer = create_deferred(&ctx, &settings).unwrap();

    let names: Vec<&str> = renderer.feature_names().collect();
    assert_eq!(names, vec![BACKGROUND, GEOMETRY, AMBIENT_OCCLUSION, AO_BLUR, AO_COVER]);
}

#[test]
fn test_swapchain_appends_present() {
    let (device, ctx) = mock_context();
    let (_dir, mut settings) = settings(&device, "deferred_present");
    settings.swapchain = Some(Arc::new(MockSwapchain::new(2, Extent2D::new(64, 32))));

    let renderer = create_deferred(&ctx, &settings).unwrap();

    assert_eq!(renderer.feature_names().last(), Some(PRESENT));
}

#[test]
fn test_shadowed_runs_caster_first() {
    let (device, ctx) = mock_context();
    let (_dir, settings) = settings(&device, "shadowed_order");
    let renderer = create_shadowed(&ctx, &settings).unwrap();

    let names: Vec<&str> = renderer.feature_names().collect();
    assert_eq!(names[0], SHADOW_CASTER);
    assert_eq!(&names[1..], &[BACKGROUND, GEOMETRY, AMBIENT_OCCLUSION, AO_BLUR, AO_COVER, SHADOW_RECEIVER]);
}

#[test]
fn test_shadowed_presents_after_receiver() {
    let (device, ctx) = mock_context();
    let (_dir, mut settings) = settings(&device, "shadowed_present");
    settings.swapchain = Some(Arc::new(MockSwapchain::new(2, Extent2D::new(64, 32))));

    let renderer = create_shadowed(&ctx, &settings).unwrap();

    let names: Vec<&str> = renderer.feature_names().collect();
    assert_eq!(&names[names.len() - 2..], &[SHADOW_RECEIVER, PRESENT]);
}

#[test]
fn test_technique_is_selectable() {
    let (device, ctx) = mock_context();
    let (_dir, mut settings) = settings(&device, "deferred_hbao");
    settings.ambient_occlusion.technique = AoTechnique::Hbao(HbaoParams::default());
    let camera = camera(&ctx);

    let renderer = create_deferred(&ctx, &settings).unwrap();
    let data = renderer.create_renderer_data(&camera).unwrap();

    assert!(data.contains(AMBIENT_OCCLUSION));
}

// ============================================================================
// Per-camera data
// ============================================================================

#[test]
fn test_create_wires_occlusion_chain() {
    let (device, ctx) = mock_context();
    let (_dir, settings) = settings(&device, "deferred_wiring");
    let camera = camera(&ctx);
    let renderer = create_deferred(&ctx, &settings).unwrap();

    let data = renderer.create_renderer_data(&camera).unwrap();

    let geometry = data.data::<GeometryData>(GEOMETRY).unwrap();
    let occlusion = data.data::<AmbientOcclusionData>(AMBIENT_OCCLUSION).unwrap().occlusion().get().unwrap();
    assert!(geometry.normal().is_set());
    assert_eq!(occlusion.extent(), camera.extent());
    assert_eq!(data.feature_count(), 5);
}

#[test]
fn test_refresh_follows_camera_resize() {
    let (device, ctx) = mock_context();
    let (_dir, settings) = settings(&device, "deferred_resize");
    let mut camera = camera(&ctx);
    let renderer = create_deferred(&ctx, &settings).unwrap();
    let mut data = renderer.create_renderer_data(&camera).unwrap();

    camera.resize(&ctx, Extent2D::new(128, 96)).unwrap();
    renderer.refresh_renderer_data(&mut data, &camera).unwrap();

    let occlusion = data.data::<AmbientOcclusionData>(AMBIENT_OCCLUSION).unwrap().occlusion().get().unwrap();
    let position = data.data::<GeometryData>(GEOMETRY).unwrap().position().get().unwrap();
    assert_eq!(occlusion.extent(), Extent2D::new(128, 96));
    assert_eq!(position.extent(), Extent2D::new(128, 96));
}

#[test]
fn test_frame_reaches_the_swapchain() {
    let (device, ctx) = mock_context();
    let (_dir, mut settings) = settings(&device, "deferred_frame");
    let swapchain = MockSwapchain::new(3, Extent2D::new(64, 32));
    let swapchain_events = swapchain.events.clone();
    settings.swapchain = Some(Arc::new(swapchain));
    let camera = camera(&ctx);
    let renderer = create_deferred(&ctx, &settings).unwrap();
    let objects = vec![cube(&ctx, &settings)];

    let mut data = renderer.create_renderer_data(&camera).unwrap();
    device.clear_commands();
    renderer.render_frame(&mut data, &camera, &objects).unwrap();

    let commands = device.commands();
    assert_eq!(commands.iter().filter(|c| c.starts_with("draw_indexed")).count(), 1);
    assert!(commands.contains(&"blit_image(64x32 -> 64x32)".to_string()));
    assert_eq!(commands.iter().filter(|c| c.starts_with("submit")).count(), 6);
    assert_eq!(commands.iter().filter(|c| c.as_str() == "wait").count(), 6);
    assert_eq!(swapchain_events.lock().unwrap().clone(), vec!["acquire(0)", "present(0)"]);
    assert_eq!(data.data::<PresentData>(PRESENT).unwrap().image_index(), None);
}

#[test]
fn test_shadowed_frame_fits_cascades() {
    let (device, ctx) = mock_context();
    let (_dir, settings) = settings(&device, "shadowed_frame");
    let camera = camera(&ctx);
    let renderer = create_shadowed(&ctx, &settings).unwrap();
    let objects = vec![cube(&ctx, &settings)];

    let mut data = renderer.create_renderer_data(&camera).unwrap();
    renderer.render_frame(&mut data, &camera, &objects).unwrap();

    let shadow = data.data::<ShadowCasterData>(SHADOW_CASTER).unwrap();
    assert!(shadow.cascades().is_some());
    assert_eq!(shadow.drawn()[0], 1);
}

#[test]
fn test_receiver_samples_caster_outputs() {
    let (device, ctx) = mock_context();
    let (_dir, settings) = settings(&device, "shadowed_receiver");
    let camera = camera(&ctx);
    let renderer = create_shadowed(&ctx, &settings).unwrap();

    let data = renderer.create_renderer_data(&camera).unwrap();

    let caster = data.data::<ShadowCasterData>(SHADOW_CASTER).unwrap();
    let position = data.data::<GeometryData>(GEOMETRY).unwrap().position().get().unwrap();
    let material = data.data::<ShadowReceiverData>(SHADOW_RECEIVER).unwrap().material().unwrap();
    let shadow_map = material.get_texture2d("ShadowMap").unwrap().unwrap();
    let shadow = material.get_uniform_buffer("Shadow").unwrap().unwrap();
    assert!(Arc::ptr_eq(&shadow_map.image, &caster.shadow_map().get().unwrap()));
    assert!(Arc::ptr_eq(shadow, caster.uniform()));
    assert!(Arc::ptr_eq(&material.get_texture2d("Position").unwrap().unwrap().image, &position));
    assert!(material.is_complete());
}

#[test]
fn test_deferred_has_no_receiver() {
    let (device, ctx) = mock_context();
    let (_dir, settings) = settings(&device, "deferred_no_receiver");
    let camera = camera(&ctx);
    let renderer = create_deferred(&ctx, &settings).unwrap();

    let data = renderer.create_renderer_data(&camera).unwrap();

    assert!(!data.contains(SHADOW_RECEIVER));
    assert!(!data.contains(SHADOW_CASTER));
}

#[test]
fn test_destroy_consumes_data() {
    let (device, ctx) = mock_context();
    let (_dir, settings) = settings(&device, "deferred_destroy");
    let camera = camera(&ctx);
    let renderer = create_deferred(&ctx, &settings).unwrap();

    let data = renderer.create_renderer_data(&camera).unwrap();
    assert!(renderer.destroy_renderer_data(data).is_ok());
}

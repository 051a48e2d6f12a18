use super::*;
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::{mock_context, MockImageView};

fn color_desc(width: u32, height: u32) -> ImageDesc {
    ImageDesc::new_2d(Extent2D::new(width, height), Format::R8G8B8A8_UNORM, ImageUsage::SAMPLED)
}

#[test]
fn test_new_creates_default_2d_view() {
    let (device, ctx) = mock_context();
    let image = Image::new(&ctx, color_desc(64, 32)).unwrap();

    let view = image.default_view().unwrap();
    assert_eq!(view.desc().view_type, ImageViewType::D2);
    assert_eq!(view.desc().aspect, ImageAspect::COLOR);
    assert_eq!(device.count_events("create_image"), 1);
    assert_eq!(device.count_events("create_image_view"), 1);
}

#[test]
fn test_default_view_type_follows_layers() {
    let (_device, ctx) = mock_context();

    let mut array = color_desc(16, 16);
    array.array_layers = 4;
    let array = Image::new(&ctx, array).unwrap();
    assert_eq!(array.default_view().unwrap().desc().view_type, ImageViewType::D2Array);
    assert_eq!(array.default_view().unwrap().desc().array_layer_count, 4);

    let mut cube = color_desc(16, 16);
    cube.array_layers = 6;
    cube.cube_compatible = true;
    let cube = Image::new(&ctx, cube).unwrap();
    assert_eq!(cube.default_view().unwrap().desc().view_type, ImageViewType::Cube);
}

#[test]
fn test_cube_requires_six_layers() {
    let (_device, ctx) = mock_context();
    let mut desc = color_desc(16, 16);
    desc.cube_compatible = true;
    assert!(Image::new(&ctx, desc).is_err());
}

#[test]
fn test_zero_extent_fails() {
    let (_device, ctx) = mock_context();
    assert!(Image::new(&ctx, color_desc(0, 16)).is_err());
}

#[test]
fn test_depth_attachment_uses_depth_aspect() {
    let (_device, ctx) = mock_context();
    let image = Image::attachment(&ctx, Extent2D::new(8, 8), Format::D32_SFLOAT, ImageUsage::empty()).unwrap();

    assert!(image.desc().usage.contains(ImageUsage::DEPTH_STENCIL_ATTACHMENT | ImageUsage::SAMPLED));
    assert_eq!(image.default_view().unwrap().desc().aspect, ImageAspect::DEPTH);
}

#[test]
fn test_initial_data_uploaded_not_kept() {
    let (device, ctx) = mock_context();
    let mut desc = color_desc(2, 2);
    desc.initial_data = Some(vec![0u8; 16]);

    let image = Image::new(&ctx, desc).unwrap();
    assert!(image.desc().initial_data.is_none());
    assert_eq!(device.count_events("upload_image"), 1);
}

#[test]
fn test_named_views() {
    let (_device, ctx) = mock_context();
    let mut desc = color_desc(16, 16);
    desc.array_layers = 4;
    let mut image = Image::new(&ctx, desc).unwrap();

    image.create_layer_view(&ctx, "Layer2", 2).unwrap();
    let layer = image.view("Layer2").unwrap();
    assert_eq!(layer.desc().base_array_layer, 2);
    assert_eq!(layer.desc().array_layer_count, 1);
    assert!(layer.gpu_view().as_any().downcast_ref::<MockImageView>().is_some());

    assert!(image.create_layer_view(&ctx, "Layer2", 1).is_err());
    assert!(image.create_layer_view(&ctx, "Layer9", 9).is_err());
    assert!(image.view("Missing").is_err());
    assert!(image.has_view(DEFAULT_VIEW));
}

#[test]
fn test_mip_extents() {
    let (_device, ctx) = mock_context();
    let mut desc = color_desc(64, 16);
    desc.mip_levels = 4;
    let image = Image::new(&ctx, desc).unwrap();

    assert_eq!(image.mip_extent(0), Extent2D::new(64, 16));
    assert_eq!(image.mip_extent(2), Extent2D::new(16, 4));
    assert_eq!(image.mip_extent(3), Extent2D::new(8, 2));
}

#[test]
fn test_view_range_overflow_is_rejected() {
    let (_device, ctx) = mock_context();
    let mut desc = color_desc(16, 16);
    desc.array_layers = 4;
    let mut image = Image::new(&ctx, desc).unwrap();
    let base = *image.default_view().unwrap().desc();

    let layers = ImageViewDesc { base_array_layer: 2, array_layer_count: u32::MAX, ..base };
    assert!(matches!(image.create_view(&ctx, "Layers", layers), Err(Error::InvalidResource(_))));

    let mips = ImageViewDesc { base_mip_level: u32::MAX, mip_level_count: 1, ..base };
    assert!(matches!(image.create_view(&ctx, "Mips", mips), Err(Error::InvalidResource(_))));
    assert!(!image.has_view("Layers"));
}

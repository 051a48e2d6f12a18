use super::*;
use crate::graphics_device::mock_graphics_device::mock_context;
use crate::graphics_device::{Extent2D, Format, ImageUsage};

#[test]
fn test_get_before_set_fails() {
    let shared = SharedImage::new("Normal");
    assert!(shared.get().is_err());
    assert!(!shared.is_set());
}

#[test]
fn test_clones_see_producer_image() {
    let (_device, ctx) = mock_context();
    let producer = SharedImage::new("Normal");
    let consumer = producer.clone();
    let image = Arc::new(Image::attachment(&ctx, Extent2D::new(4, 4), Format::R16G16B16A16_SFLOAT, ImageUsage::empty()).unwrap());

    producer.set(image.clone()).unwrap();

    assert!(Arc::ptr_eq(&consumer.get().unwrap(), &image));
    assert!(consumer.same_slot(&producer));
    assert!(!consumer.same_slot(&SharedImage::new("Normal")));
}

use super::*;
use crate::graphics_device::mock_graphics_device::mock_context;

fn atlas(width: u32, height: u32) -> FontAtlas {
    let pixels = (0..width * height * 4).map(|i| i as f32 * 0.25).collect();
    FontAtlas { atlas_type: 2, width, height, pixels }
}

fn cache_dir(test: &str) -> PathBuf {
    std::env::temp_dir().join(format!("x2_font_atlas_{}_{}", test, std::process::id()))
}

#[test]
fn test_file_name() {
    assert_eq!(FontAtlasCache::file_name("Roboto", 18), "Roboto-18.hfa");
}

#[test]
fn test_encode_header_little_endian() {
    let bytes = atlas(2, 1).encode();
    assert_eq!(&bytes[0..12], &[2, 0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0]);
    assert_eq!(bytes.len(), 12 + 2 * 16);
    assert_eq!(&bytes[16..20], &0.25f32.to_le_bytes());
}

#[test]
fn test_decode_rejects_bad_sizes() {
    assert!(FontAtlas::decode(&[0u8; 8]).is_err());

    let mut bytes = atlas(2, 2).encode();
    bytes.pop();
    assert!(FontAtlas::decode(&bytes).is_err());
}

#[test]
fn test_store_then_load() {
    let dir = cache_dir("store");
    let cache = FontAtlasCache::new(&dir);
    let original = atlas(3, 2);

    assert!(cache.load("Mono", 12).unwrap().is_none());
    cache.store("Mono", 12, &original).unwrap();
    assert_eq!(cache.load("Mono", 12).unwrap(), Some(original));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_store_rejects_inconsistent_atlas() {
    let cache = FontAtlasCache::new(cache_dir("inconsistent"));
    let mut bad = atlas(2, 2);
    bad.pixels.truncate(3);
    assert!(cache.store("Mono", 12, &bad).is_err());
}

#[test]
fn test_create_image_uploads_rgba32f() {
    let (device, ctx) = mock_context();
    let image = atlas(4, 4).create_image(&ctx).unwrap();

    assert_eq!(image.format(), Format::R32G32B32A32_SFLOAT);
    assert_eq!(image.extent(), Extent2D::new(4, 4));
    assert_eq!(device.count_events("upload_image"), 1);
}

/// On-disk cache of generated font atlases (`.hfa` files).
///
/// File layout, little-endian:
/// - header: `atlas_type: u32`, `width: u32`, `height: u32`
/// - body: `width * height` RGBA texels, 4 x f32 each
///
/// Files are named `"{font_name}-{font_size}.hfa"` inside the cache directory.

use std::fs;
use std::path::{Path, PathBuf};
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{Extent2D, Format, ImageDesc, ImageUsage};
use crate::resource::Image;
use crate::{engine_bail_invalid, engine_debug};

const HEADER_SIZE: usize = 12;
const TEXEL_SIZE: usize = 16;

/// A decoded font atlas
#[derive(Debug, Clone, PartialEq)]
pub struct FontAtlas {
    pub atlas_type: u32,
    pub width: u32,
    pub height: u32,
    /// RGBA32F texels, row-major
    pub pixels: Vec<f32>,
}

impl FontAtlas {
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.pixels.len() * 4);
        bytes.extend_from_slice(&self.atlas_type.to_le_bytes());
        bytes.extend_from_slice(&self.width.to_le_bytes());
        bytes.extend_from_slice(&self.height.to_le_bytes());
        for value in &self.pixels {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            engine_bail_invalid!("x2::FontAtlasCache", "Atlas file truncated ({} bytes)", bytes.len());
        }
        let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        let (atlas_type, width, height) = (word(0), word(4), word(8));

        let expected = HEADER_SIZE + width as usize * height as usize * TEXEL_SIZE;
        if bytes.len() != expected {
            engine_bail_invalid!("x2::FontAtlasCache",
                "Atlas {}x{} expects {} bytes, file has {}", width, height, expected, bytes.len());
        }

        let pixels = bytes[HEADER_SIZE..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { atlas_type, width, height, pixels })
    }

    /// Upload the atlas as a sampled RGBA32F image
    pub fn create_image(&self, ctx: &GraphicsContext) -> Result<Image> {
        let mut desc = ImageDesc::new_2d(
            Extent2D::new(self.width, self.height),
            Format::R32G32B32A32_SFLOAT,
            ImageUsage::SAMPLED | ImageUsage::TRANSFER_DST,
        );
        desc.initial_data = Some(bytemuck::cast_slice(&self.pixels).to_vec());
        Image::new(ctx, desc)
    }
}

/// Directory of cached atlases
pub struct FontAtlasCache {
    directory: PathBuf,
}

impl FontAtlasCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    pub fn file_name(font_name: &str, font_size: u32) -> String {
        format!("{}-{}.hfa", font_name, font_size)
    }

    pub fn path(&self, font_name: &str, font_size: u32) -> PathBuf {
        self.directory.join(Self::file_name(font_name, font_size))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Load a cached atlas; `Ok(None)` when no file exists
    pub fn load(&self, font_name: &str, font_size: u32) -> Result<Option<FontAtlas>> {
        let path = self.path(font_name, font_size);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        FontAtlas::decode(&bytes).map(Some)
    }

    /// Write an atlas, creating the cache directory if needed
    pub fn store(&self, font_name: &str, font_size: u32, atlas: &FontAtlas) -> Result<()> {
        if atlas.pixels.len() != atlas.width as usize * atlas.height as usize * 4 {
            engine_bail_invalid!("x2::FontAtlasCache",
                "Atlas {}x{} has {} floats", atlas.width, atlas.height, atlas.pixels.len());
        }
        fs::create_dir_all(&self.directory)?;
        let path = self.path(font_name, font_size);
        fs::write(&path, atlas.encode())?;
        engine_debug!("x2::FontAtlasCache", "Stored {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
#[path = "font_atlas_cache_tests.rs"]
mod tests;

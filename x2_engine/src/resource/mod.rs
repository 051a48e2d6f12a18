//! GPU resource layer
//!
//! Buffers, images and samplers own their device handles; framebuffers and
//! materials bind them to render passes and shaders.

pub mod buffer;
pub mod descriptor_set;
pub mod font_atlas_cache;
pub mod frame_buffer;
pub mod image;
pub mod material;
pub mod mesh;
pub mod sampler;

pub use buffer::Buffer;
pub use descriptor_set::DescriptorSet;
pub use font_atlas_cache::{FontAtlas, FontAtlasCache};
pub use frame_buffer::{FrameBuffer, FrameBufferAttachment};
pub use image::{Image, ImageView, DEFAULT_VIEW};
pub use material::{ImageBinding, ImageInfo, Material, SlotResource, TextureBinding};
pub use mesh::{Mesh, Vertex, VertexField};
pub use sampler::ImageSampler;

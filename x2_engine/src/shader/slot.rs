/// Shader slots: one descriptor set = one named, typed parameter.
///
/// The binding at index 0 of a set names the slot. The slot type is
/// derived from the ordered binding list of the whole set:
///
/// | bindings of the set               | slot type                |
/// |-----------------------------------|--------------------------|
/// | uniform buffer                    | UniformBuffer            |
/// | storage buffer                    | StorageBuffer            |
/// | uniform texel buffer              | UniformTexelBuffer       |
/// | storage texel buffer              | StorageTexelBuffer       |
/// | combined image sampler 2D         | Texture2D                |
/// | combined image sampler 2D, UBO    | Texture2DWithInfo        |
/// | storage image                     | StorageTexture2D         |
/// | storage image, UBO                | StorageTexture2DWithInfo |
/// | combined image sampler Cube       | TextureCube              |
/// | input attachment                  | InputAttachment          |
///
/// Any other combination is a configuration error.

use crate::graphics_device::{DescriptorType, ImageDim};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderSlotType {
    UniformBuffer,
    StorageBuffer,
    UniformTexelBuffer,
    StorageTexelBuffer,
    Texture2D,
    Texture2DWithInfo,
    StorageTexture2D,
    StorageTexture2DWithInfo,
    TextureCube,
    InputAttachment,
}

impl ShaderSlotType {
    /// Whether binding 1 of the set is the image info uniform buffer
    pub fn has_info(&self) -> bool {
        matches!(self, ShaderSlotType::Texture2DWithInfo | ShaderSlotType::StorageTexture2DWithInfo)
    }
}

/// A named parameter of a shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDescriptor {
    pub name: String,
    pub set: u32,
    pub slot_type: ShaderSlotType,
    /// Descriptor type of every binding, in binding order
    pub descriptor_types: Vec<DescriptorType>,
}

/// Classify the ordered binding list of one set
///
/// Returns `None` when no row of the table matches.
pub fn classify_slot(bindings: &[(DescriptorType, Option<ImageDim>)]) -> Option<ShaderSlotType> {
    use DescriptorType as D;

    let is_2d = |dim: &Option<ImageDim>| matches!(dim, None | Some(ImageDim::D2));

    match bindings {
        [(D::UniformBuffer, _)] => Some(ShaderSlotType::UniformBuffer),
        [(D::StorageBuffer, _)] => Some(ShaderSlotType::StorageBuffer),
        [(D::UniformTexelBuffer, _)] => Some(ShaderSlotType::UniformTexelBuffer),
        [(D::StorageTexelBuffer, _)] => Some(ShaderSlotType::StorageTexelBuffer),
        [(D::CombinedImageSampler, Some(ImageDim::Cube))] => Some(ShaderSlotType::TextureCube),
        [(D::CombinedImageSampler, dim)] if is_2d(dim) => Some(ShaderSlotType::Texture2D),
        [(D::CombinedImageSampler, dim), (D::UniformBuffer, _)] if is_2d(dim) => {
            Some(ShaderSlotType::Texture2DWithInfo)
        }
        [(D::StorageImage, dim)] if is_2d(dim) => Some(ShaderSlotType::StorageTexture2D),
        [(D::StorageImage, dim), (D::UniformBuffer, _)] if is_2d(dim) => {
            Some(ShaderSlotType::StorageTexture2DWithInfo)
        }
        [(D::InputAttachment, _)] => Some(ShaderSlotType::InputAttachment),
        _ => None,
    }
}

#[cfg(test)]
#[path = "slot_tests.rs"]
mod tests;

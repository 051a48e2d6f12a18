/// Shader interface as reported by SPIR-V reflection
///
/// Backends fill these from bytecode; the engine derives vertex layouts,
/// output matching and descriptor slots from them.

use crate::graphics_device::{DescriptorType, ShaderStageFlags};

/// Shader stage of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessellationControl,
    TessellationEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    /// The single stage bit of this stage
    pub fn flags(&self) -> ShaderStageFlags {
        match self {
            ShaderStage::Vertex => ShaderStageFlags::VERTEX,
            ShaderStage::TessellationControl => ShaderStageFlags::TESSELLATION_CONTROL,
            ShaderStage::TessellationEvaluation => ShaderStageFlags::TESSELLATION_EVALUATION,
            ShaderStage::Geometry => ShaderStageFlags::GEOMETRY,
            ShaderStage::Fragment => ShaderStageFlags::FRAGMENT,
            ShaderStage::Compute => ShaderStageFlags::COMPUTE,
        }
    }
}

/// Dimensionality of a reflected image binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageDim {
    D1,
    D2,
    D3,
    Cube,
    Buffer,
    SubpassData,
}

/// A stage input or output variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedVariable {
    pub name: String,
    pub location: u32,
}

/// A descriptor binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedBinding {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    /// Image dimensionality for image-typed descriptors
    pub image_dim: Option<ImageDim>,
    pub count: u32,
}

/// A push constant block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflectedPushConstant {
    pub offset: u32,
    pub size: u32,
}

/// Reflected interface of one shader module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedModule {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub inputs: Vec<ReflectedVariable>,
    pub outputs: Vec<ReflectedVariable>,
    pub bindings: Vec<ReflectedBinding>,
    pub push_constants: Vec<ReflectedPushConstant>,
}

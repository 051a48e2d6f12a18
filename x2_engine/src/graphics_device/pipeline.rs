/// Pipeline descriptors, fixed-function state and pipeline handle traits
///
/// Fixed-function enums carry Vulkan's native numeric encodings, which is
/// also how shader settings documents spell them.

use std::any::Any;
use bitflags::bitflags;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use crate::graphics_device::{Format, GpuDescriptorSetLayout, GpuRenderPass};

/// Declares a fieldless enum whose discriminants are native API values,
/// (de)serialized as plain integers.
macro_rules! native_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u32", into = "u32")]
        #[repr(u32)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl TryFrom<u32> for $name {
            type Error = String;

            fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
                match value {
                    $(v if v == $value => Ok($name::$variant),)+
                    _ => Err(format!("invalid {} value {}", stringify!($name), value)),
                }
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> u32 {
                value as u32
            }
        }
    };
}

native_enum! {
    /// Face culling (VkCullModeFlags)
    CullMode {
        None = 0,
        Front = 1,
        Back = 2,
        FrontAndBack = 3,
    }
}

native_enum! {
    /// Blend factor (VkBlendFactor)
    BlendFactor {
        Zero = 0,
        One = 1,
        SrcColor = 2,
        OneMinusSrcColor = 3,
        DstColor = 4,
        OneMinusDstColor = 5,
        SrcAlpha = 6,
        OneMinusSrcAlpha = 7,
        DstAlpha = 8,
        OneMinusDstAlpha = 9,
    }
}

native_enum! {
    /// Blend operation (VkBlendOp)
    BlendOp {
        Add = 0,
        Subtract = 1,
        ReverseSubtract = 2,
        Min = 3,
        Max = 4,
    }
}

native_enum! {
    /// Depth comparison (VkCompareOp)
    CompareOp {
        Never = 0,
        Less = 1,
        Equal = 2,
        LessOrEqual = 3,
        Greater = 4,
        NotEqual = 5,
        GreaterOrEqual = 6,
        Always = 7,
    }
}

bitflags! {
    /// Color write mask (VkColorComponentFlags)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWriteMask: u32 {
        const R = 0x1;
        const G = 0x2;
        const B = 0x4;
        const A = 0x8;
    }
}

impl Serialize for ColorWriteMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for ColorWriteMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        ColorWriteMask::from_bits(bits)
            .ok_or_else(|| de::Error::custom(format!("invalid color write mask {}", bits)))
    }
}

bitflags! {
    /// Shader stages (VkShaderStageFlags)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 0x1;
        const TESSELLATION_CONTROL = 0x2;
        const TESSELLATION_EVALUATION = 0x4;
        const GEOMETRY = 0x8;
        const FRAGMENT = 0x10;
        const COMPUTE = 0x20;
    }
}

/// Pipeline bind point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineBindPoint {
    #[default]
    Graphics,
    Compute,
}

/// Rasterizer, blend and depth state of a graphics pipeline
///
/// Field names follow the shader settings document (camelCase).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixedFunctionState {
    pub cull_mode: CullMode,
    pub blend_enable: bool,
    pub src_color_blend_factor: BlendFactor,
    pub dst_color_blend_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub src_alpha_blend_factor: BlendFactor,
    pub dst_alpha_blend_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
    pub color_write_mask: ColorWriteMask,
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
}

impl Default for FixedFunctionState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            blend_enable: false,
            src_color_blend_factor: BlendFactor::One,
            dst_color_blend_factor: BlendFactor::Zero,
            color_blend_op: BlendOp::Add,
            src_alpha_blend_factor: BlendFactor::One,
            dst_alpha_blend_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
            color_write_mask: ColorWriteMask::all(),
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare_op: CompareOp::Less,
        }
    }
}

/// Push constant range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushConstantRange {
    pub stages: ShaderStageFlags,
    pub offset: u32,
    pub size: u32,
}

/// One vertex buffer binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBindingDesc {
    pub binding: u32,
    pub stride: u32,
}

/// One vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttributeDesc {
    pub location: u32,
    pub binding: u32,
    pub format: Format,
    pub offset: u32,
}

/// Vertex input state of a graphics pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexInputLayout {
    pub bindings: Vec<VertexBindingDesc>,
    pub attributes: Vec<VertexAttributeDesc>,
}

/// Backend shader module (transient, dropped once the pipeline exists)
pub trait GpuShaderModule: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// One programmable stage of a pipeline
pub struct PipelineStageDesc<'a> {
    pub stage: ShaderStageFlags,
    pub module: &'a dyn GpuShaderModule,
    pub entry_point: &'a str,
}

/// Everything needed to build a graphics pipeline
///
/// Input assembly is always a triangle list; viewport and scissor are dynamic.
pub struct GraphicsPipelineDesc<'a> {
    pub stages: Vec<PipelineStageDesc<'a>>,
    pub vertex_input: &'a VertexInputLayout,
    pub set_layouts: Vec<&'a dyn GpuDescriptorSetLayout>,
    pub push_constant_ranges: &'a [PushConstantRange],
    pub state: &'a FixedFunctionState,
    /// Number of color blend attachments (matched fragment outputs)
    pub color_attachment_count: u32,
    pub render_pass: &'a dyn GpuRenderPass,
    pub subpass: u32,
}

/// Everything needed to build a compute pipeline
pub struct ComputePipelineDesc<'a> {
    pub stage: PipelineStageDesc<'a>,
    pub set_layouts: Vec<&'a dyn GpuDescriptorSetLayout>,
    pub push_constant_ranges: &'a [PushConstantRange],
}

/// Backend pipeline (owns its pipeline layout)
pub trait GpuPipeline: Send + Sync {
    fn bind_point(&self) -> PipelineBindPoint;

    fn as_any(&self) -> &dyn Any;
}

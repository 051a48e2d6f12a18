//! Unit tests for Vulkan conversion functions
//!
//! Pure mappings, no GPU required.

use super::*;

const ALL_FORMATS: [Format; 16] = [
    Format::UNDEFINED,
    Format::R8_UNORM,
    Format::R8G8B8A8_UNORM,
    Format::R8G8B8A8_SRGB,
    Format::B8G8R8A8_UNORM,
    Format::B8G8R8A8_SRGB,
    Format::R16_SFLOAT,
    Format::R16G16B16A16_SFLOAT,
    Format::R32_SFLOAT,
    Format::R32G32_SFLOAT,
    Format::R32G32B32_SFLOAT,
    Format::R32G32B32A32_SFLOAT,
    Format::D16_UNORM,
    Format::D32_SFLOAT,
    Format::D24_UNORM_S8_UINT,
    Format::D32_SFLOAT_S8_UINT,
];

// ============================================================================
// FORMATS
// ============================================================================

#[test]
fn test_every_format_maps_back() {
    for format in ALL_FORMATS {
        assert_eq!(format_from_vk(format_to_vk(format)), Some(format), "{:?}", format);
    }
}

#[test]
fn test_color_and_depth_formats() {
    assert_eq!(format_to_vk(Format::R16G16B16A16_SFLOAT), vk::Format::R16G16B16A16_SFLOAT);
    assert_eq!(format_to_vk(Format::D32_SFLOAT), vk::Format::D32_SFLOAT);
    assert_eq!(format_to_vk(Format::B8G8R8A8_SRGB), vk::Format::B8G8R8A8_SRGB);
}

#[test]
fn test_unknown_vk_format_is_none() {
    assert_eq!(format_from_vk(vk::Format::BC7_SRGB_BLOCK), None);
    assert_eq!(format_from_vk(vk::Format::A2B10G10R10_UNORM_PACK32), None);
}

// ============================================================================
// LAYOUTS AND ATTACHMENT OPS
// ============================================================================

#[test]
fn test_image_layouts() {
    assert_eq!(image_layout_to_vk(ImageLayout::Undefined), vk::ImageLayout::UNDEFINED);
    assert_eq!(
        image_layout_to_vk(ImageLayout::ShaderReadOnlyOptimal),
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
    );
    assert_eq!(
        image_layout_to_vk(ImageLayout::DepthStencilAttachmentOptimal),
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
    );
    assert_eq!(image_layout_to_vk(ImageLayout::PresentSrc), vk::ImageLayout::PRESENT_SRC_KHR);
}

#[test]
fn test_load_store_ops() {
    assert_eq!(load_op_to_vk(LoadOp::Clear), vk::AttachmentLoadOp::CLEAR);
    assert_eq!(load_op_to_vk(LoadOp::Load), vk::AttachmentLoadOp::LOAD);
    assert_eq!(load_op_to_vk(LoadOp::DontCare), vk::AttachmentLoadOp::DONT_CARE);
    assert_eq!(store_op_to_vk(StoreOp::Store), vk::AttachmentStoreOp::STORE);
    assert_eq!(store_op_to_vk(StoreOp::DontCare), vk::AttachmentStoreOp::DONT_CARE);
}

#[test]
fn test_sample_counts() {
    assert_eq!(sample_count_to_vk(SampleCount::S1), vk::SampleCountFlags::TYPE_1);
    assert_eq!(sample_count_to_vk(SampleCount::S8), vk::SampleCountFlags::TYPE_8);
}

// ============================================================================
// DESCRIPTORS AND SAMPLERS
// ============================================================================

#[test]
fn test_descriptor_types() {
    assert_eq!(
        descriptor_type_to_vk(DescriptorType::CombinedImageSampler),
        vk::DescriptorType::COMBINED_IMAGE_SAMPLER
    );
    assert_eq!(descriptor_type_to_vk(DescriptorType::UniformBuffer), vk::DescriptorType::UNIFORM_BUFFER);
    assert_eq!(
        descriptor_type_to_vk(DescriptorType::UniformTexelBuffer),
        vk::DescriptorType::UNIFORM_TEXEL_BUFFER
    );
    assert_eq!(descriptor_type_to_vk(DescriptorType::InputAttachment), vk::DescriptorType::INPUT_ATTACHMENT);
}

#[test]
fn test_sampler_modes() {
    assert_eq!(filter_to_vk(Filter::Nearest), vk::Filter::NEAREST);
    assert_eq!(mipmap_mode_to_vk(Filter::Linear), vk::SamplerMipmapMode::LINEAR);
    assert_eq!(address_mode_to_vk(AddressMode::ClampToBorder), vk::SamplerAddressMode::CLAMP_TO_BORDER);
    assert_eq!(address_mode_to_vk(AddressMode::MirroredRepeat), vk::SamplerAddressMode::MIRRORED_REPEAT);
}

#[test]
fn test_view_types() {
    assert_eq!(image_view_type_to_vk(ImageViewType::D2Array), vk::ImageViewType::TYPE_2D_ARRAY);
    assert_eq!(image_view_type_to_vk(ImageViewType::Cube), vk::ImageViewType::CUBE);
}

// ============================================================================
// NATIVE VALUES AND BIT FLAGS
// ============================================================================

#[test]
fn test_native_enums_keep_their_value() {
    assert_eq!(cull_mode_to_vk(CullMode::Back), vk::CullModeFlags::BACK);
    assert_eq!(cull_mode_to_vk(CullMode::None), vk::CullModeFlags::NONE);
    assert_eq!(blend_factor_to_vk(BlendFactor::DstColor), vk::BlendFactor::DST_COLOR);
    assert_eq!(blend_factor_to_vk(BlendFactor::OneMinusSrcAlpha), vk::BlendFactor::ONE_MINUS_SRC_ALPHA);
    assert_eq!(blend_op_to_vk(BlendOp::ReverseSubtract), vk::BlendOp::REVERSE_SUBTRACT);
    assert_eq!(compare_op_to_vk(CompareOp::LessOrEqual), vk::CompareOp::LESS_OR_EQUAL);
    assert_eq!(compare_op_to_vk(CompareOp::Always), vk::CompareOp::ALWAYS);
}

#[test]
fn test_flags_share_vulkan_bits() {
    assert_eq!(
        shader_stages_to_vk(ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT),
        vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
    );
    assert_eq!(
        pipeline_stages_to_vk(PipelineStage::COLOR_ATTACHMENT_OUTPUT | PipelineStage::TRANSFER),
        vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::TRANSFER
    );
    assert_eq!(
        access_to_vk(AccessFlags::SHADER_READ | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE),
        vk::AccessFlags::SHADER_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
    );
    assert_eq!(
        aspect_to_vk(ImageAspect::DEPTH | ImageAspect::STENCIL),
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    );
    assert_eq!(
        buffer_usage_to_vk(BufferUsage::VERTEX | BufferUsage::INDEX),
        vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::INDEX_BUFFER
    );
    assert_eq!(
        image_usage_to_vk(ImageUsage::SAMPLED | ImageUsage::DEPTH_STENCIL_ATTACHMENT),
        vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
    );
    assert_eq!(color_write_mask_to_vk(ColorWriteMask::all()), vk::ColorComponentFlags::RGBA);
}

#[test]
fn test_index_types() {
    assert_eq!(index_type_to_vk(IndexType::U16), vk::IndexType::UINT16);
    assert_eq!(index_type_to_vk(IndexType::U32), vk::IndexType::UINT32);
}

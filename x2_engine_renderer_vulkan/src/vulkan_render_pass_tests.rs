use super::*;
use x2_engine::graphics_device::{
    AccessFlags, AttachmentDesc, Format, ImageLayout, LoadOp, PipelineBindPoint, PipelineStage,
    SampleCount, StoreOp, SubpassDependencyDesc, SubpassDesc, SUBPASS_EXTERNAL,
};

fn attachment(format: Format, final_layout: ImageLayout) -> AttachmentDesc {
    AttachmentDesc {
        format,
        samples: SampleCount::S1,
        load_op: LoadOp::Clear,
        store_op: StoreOp::Store,
        stencil_load_op: LoadOp::DontCare,
        stencil_store_op: StoreOp::DontCare,
        initial_layout: ImageLayout::Undefined,
        final_layout,
    }
}

fn two_subpass_desc() -> RenderPassDesc {
    RenderPassDesc {
        attachments: vec![
            attachment(Format::R16G16B16A16_SFLOAT, ImageLayout::ShaderReadOnlyOptimal),
            attachment(Format::D32_SFLOAT, ImageLayout::ShaderReadOnlyOptimal),
            attachment(Format::R8G8B8A8_UNORM, ImageLayout::ShaderReadOnlyOptimal),
        ],
        subpasses: vec![
            SubpassDesc {
                bind_point: PipelineBindPoint::Graphics,
                color_attachments: vec![AttachmentRef {
                    attachment: 0,
                    layout: ImageLayout::ColorAttachmentOptimal,
                }],
                depth_stencil_attachment: Some(AttachmentRef {
                    attachment: 1,
                    layout: ImageLayout::DepthStencilAttachmentOptimal,
                }),
                input_attachments: vec![],
            },
            SubpassDesc {
                bind_point: PipelineBindPoint::Graphics,
                color_attachments: vec![AttachmentRef {
                    attachment: 2,
                    layout: ImageLayout::ColorAttachmentOptimal,
                }],
                depth_stencil_attachment: None,
                input_attachments: vec![AttachmentRef {
                    attachment: 0,
                    layout: ImageLayout::ShaderReadOnlyOptimal,
                }],
            },
        ],
        dependencies: vec![
            SubpassDependencyDesc {
                src_subpass: SUBPASS_EXTERNAL,
                dst_subpass: 0,
                src_stage: PipelineStage::FRAGMENT_SHADER,
                dst_stage: PipelineStage::COLOR_ATTACHMENT_OUTPUT,
                src_access: AccessFlags::SHADER_READ,
                dst_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
                by_region: false,
            },
            SubpassDependencyDesc {
                src_subpass: 0,
                dst_subpass: 1,
                src_stage: PipelineStage::COLOR_ATTACHMENT_OUTPUT,
                dst_stage: PipelineStage::FRAGMENT_SHADER,
                src_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
                dst_access: AccessFlags::INPUT_ATTACHMENT_READ,
                by_region: true,
            },
        ],
    }
}

#[test]
fn test_attachments_converted_in_order() {
    let info = RenderPassInfo::new(&two_subpass_desc());

    assert_eq!(info.attachments.len(), 3);
    assert_eq!(info.attachments[0].format, vk::Format::R16G16B16A16_SFLOAT);
    assert_eq!(info.attachments[1].format, vk::Format::D32_SFLOAT);
    assert_eq!(info.attachments[1].load_op, vk::AttachmentLoadOp::CLEAR);
    assert_eq!(info.attachments[2].final_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
}

#[test]
fn test_subpass_references() {
    let info = RenderPassInfo::new(&two_subpass_desc());
    let subpasses = info.subpasses();

    assert_eq!(subpasses.len(), 2);
    assert_eq!(subpasses[0].color_attachment_count, 1);
    assert!(!subpasses[0].p_depth_stencil_attachment.is_null());
    assert_eq!(subpasses[0].input_attachment_count, 0);

    assert_eq!(subpasses[1].color_attachment_count, 1);
    assert!(subpasses[1].p_depth_stencil_attachment.is_null());
    assert_eq!(subpasses[1].input_attachment_count, 1);
    assert_eq!(subpasses[1].pipeline_bind_point, vk::PipelineBindPoint::GRAPHICS);
}

#[test]
fn test_dependencies_keep_external_and_region_flag() {
    let info = RenderPassInfo::new(&two_subpass_desc());

    assert_eq!(info.dependencies.len(), 2);
    assert_eq!(info.dependencies[0].src_subpass, vk::SUBPASS_EXTERNAL);
    assert_eq!(info.dependencies[0].dependency_flags, vk::DependencyFlags::empty());
    assert_eq!(info.dependencies[1].dependency_flags, vk::DependencyFlags::BY_REGION);
    assert_eq!(
        info.dependencies[1].dst_access_mask,
        vk::AccessFlags::INPUT_ATTACHMENT_READ
    );
}

#[test]
fn test_empty_render_pass() {
    let info = RenderPassInfo::new(&RenderPassDesc::default());
    assert!(info.attachments.is_empty());
    assert!(info.subpasses().is_empty());
    assert!(info.dependencies.is_empty());
}

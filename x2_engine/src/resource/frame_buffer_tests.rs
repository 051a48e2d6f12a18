use super::*;
use crate::graphics_device::mock_graphics_device::{mock_context, MockFramebuffer, MockGraphicsDevice};
use crate::graphics_device::{Format, ImageUsage};
use crate::render_pass::{AttachmentDescriptor, RenderPassSettings, SubpassDescriptor};
use crate::resource::DEFAULT_VIEW;

fn color_depth_pass(device: &MockGraphicsDevice) -> Arc<RenderPass> {
    let mut settings = RenderPassSettings::new();
    settings
        .add_attachment("Color", AttachmentDescriptor::color(Format::R8G8B8A8_UNORM))
        .add_attachment("Depth", AttachmentDescriptor::depth(Format::D32_SFLOAT))
        .add_subpass("Main", SubpassDescriptor::graphics(&["Color"], Some("Depth")));
    Arc::new(RenderPass::compile(device, "ColorDepth", settings).unwrap())
}

fn attachment(ctx: &GraphicsContext, width: u32, height: u32, format: Format) -> Image {
    Image::attachment(ctx, Extent2D::new(width, height), format, ImageUsage::empty()).unwrap()
}

#[test]
fn test_attachments_ordered_by_render_pass_index() {
    let (device, ctx) = mock_context();
    let pass = color_depth_pass(&device);
    let color = attachment(&ctx, 32, 32, Format::R8G8B8A8_UNORM);
    let depth = attachment(&ctx, 32, 32, Format::D32_SFLOAT);

    // Given depth first on purpose
    let fb = FrameBuffer::new(&ctx, &pass, &[
        FrameBufferAttachment::new("Depth", &depth, DEFAULT_VIEW),
        FrameBufferAttachment::new("Color", &color, DEFAULT_VIEW),
    ]).unwrap();

    let mock = fb.gpu_framebuffer().as_any().downcast_ref::<MockFramebuffer>().unwrap();
    let color_view = color.default_view().unwrap().gpu_view().as_any()
        .downcast_ref::<crate::graphics_device::mock_graphics_device::MockImageView>().unwrap().id;
    assert_eq!(mock.attachment_ids[0], color_view);
    assert_eq!(mock.attachment_ids.len(), 2);
}

#[test]
fn test_extent_is_max_of_attachments() {
    let (device, ctx) = mock_context();
    let pass = color_depth_pass(&device);
    let color = attachment(&ctx, 64, 16, Format::R8G8B8A8_UNORM);
    let depth = attachment(&ctx, 32, 48, Format::D32_SFLOAT);

    let fb = FrameBuffer::new(&ctx, &pass, &[
        FrameBufferAttachment::new("Color", &color, DEFAULT_VIEW),
        FrameBufferAttachment::new("Depth", &depth, DEFAULT_VIEW),
    ]).unwrap();

    assert_eq!(fb.extent(), Extent2D::new(64, 48));
}

#[test]
fn test_missing_attachment_fails() {
    let (device, ctx) = mock_context();
    let pass = color_depth_pass(&device);
    let color = attachment(&ctx, 8, 8, Format::R8G8B8A8_UNORM);

    let result = FrameBuffer::new(&ctx, &pass, &[FrameBufferAttachment::new("Color", &color, DEFAULT_VIEW)]);
    assert!(result.is_err());
    assert_eq!(device.count_events("create_framebuffer"), 0);
}

#[test]
fn test_unknown_attachment_or_view_fails() {
    let (device, ctx) = mock_context();
    let pass = color_depth_pass(&device);
    let color = attachment(&ctx, 8, 8, Format::R8G8B8A8_UNORM);
    let depth = attachment(&ctx, 8, 8, Format::D32_SFLOAT);

    assert!(FrameBuffer::new(&ctx, &pass, &[
        FrameBufferAttachment::new("Color", &color, DEFAULT_VIEW),
        FrameBufferAttachment::new("Depth", &depth, DEFAULT_VIEW),
        FrameBufferAttachment::new("Normal", &color, DEFAULT_VIEW),
    ]).is_err());
    assert!(FrameBuffer::new(&ctx, &pass, &[
        FrameBufferAttachment::new("Color", &color, "Layer0"),
        FrameBufferAttachment::new("Depth", &depth, DEFAULT_VIEW),
    ]).is_err());
}

#[test]
fn test_begin_records_pass_viewport_scissor() {
    let (device, ctx) = mock_context();
    let pass = color_depth_pass(&device);
    let color = attachment(&ctx, 20, 10, Format::R8G8B8A8_UNORM);
    let depth = attachment(&ctx, 20, 10, Format::D32_SFLOAT);
    let fb = FrameBuffer::new(&ctx, &pass, &[
        FrameBufferAttachment::new("Color", &color, DEFAULT_VIEW),
        FrameBufferAttachment::new("Depth", &depth, DEFAULT_VIEW),
    ]).unwrap();

    let mut cmd = ctx.device().create_command_buffer().unwrap();
    fb.begin(cmd.as_mut(), &[
        ClearValue::Color([0.0; 4]),
        ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
    ]).unwrap();

    let commands = device.commands();
    assert!(commands[0].starts_with("begin_render_pass("));
    assert!(commands[0].contains("20x10"));
    assert_eq!(commands[1], "set_viewport(20x10)");
    assert_eq!(commands[2], "set_scissor(20x10)");
}

#[test]
fn test_with_extent_checks_count() {
    let (device, ctx) = mock_context();
    let pass = color_depth_pass(&device);
    let color = attachment(&ctx, 8, 8, Format::R8G8B8A8_UNORM);
    let view = color.default_view().unwrap().gpu_view();

    assert!(FrameBuffer::with_extent(&ctx, &pass, &[view], Extent2D::new(8, 8)).is_err());
}

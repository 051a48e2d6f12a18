/// Helpers shared by features drawing a single full-screen triangle.

use std::path::Path;
use std::sync::Arc;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{ClearValue, CommandBuffer};
use crate::render_pass::RenderPass;
use crate::resource::{FrameBuffer, Material};
use crate::shader::Shader;
use crate::engine_err_invalid;

/// Load `<shader_dir>/<name>.json`
pub fn load_shader(ctx: &GraphicsContext, shader_dir: &Path, name: &str) -> Result<Arc<Shader>> {
    Ok(Arc::new(Shader::load(ctx, &shader_dir.join(format!("{}.json", name)))?))
}

/// Render pass a graphic shader was built against
pub fn shader_render_pass(shader: &Shader) -> Result<&Arc<RenderPass>> {
    shader.render_pass().ok_or_else(|| engine_err_invalid!("x2::RenderFeature",
        "Shader '{}' is not bound to a render pass", shader.name()))
}

/// Reset and begin recording
pub fn begin_recording(cmd: &mut dyn CommandBuffer) -> Result<()> {
    cmd.reset()?;
    cmd.begin()
}

/// Draw one full-screen triangle into `framebuffer` with `material`
pub fn draw_full_screen(
    cmd: &mut dyn CommandBuffer,
    framebuffer: &FrameBuffer,
    clear_values: &[ClearValue],
    material: &Material,
) -> Result<()> {
    framebuffer.begin(cmd, clear_values)?;
    material.shader().bind(cmd)?;
    material.bind(cmd)?;
    cmd.draw(3, 1, 0, 0)?;
    cmd.end_render_pass()
}

/// `value` or an error naming what has not been resolved yet
pub fn resolved<'a, T>(value: &'a Option<T>, feature: &str, what: &str) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| engine_err_invalid!("x2::RenderFeature",
        "Feature '{}' executed before its {} was resolved", feature, what))
}

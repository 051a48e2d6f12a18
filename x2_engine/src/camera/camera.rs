/// Camera: view/projection state plus the attachment images features render into.
///
/// The camera owns its attachments (attachment-role name -> Image). Render
/// features reference them through `Arc` and never own them. After
/// [`Camera::resize`] the renderer data of the camera must be refreshed.

use std::sync::Arc;
use glam::{Mat4, Vec3, Vec4};
use rustc_hash::FxHashMap;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{Extent2D, Format, ImageUsage};
use crate::resource::Image;
use crate::{engine_bail_invalid, engine_debug, engine_err_invalid};
use super::frustum::Frustum;

/// Role name of the main color attachment
pub const COLOR_ATTACHMENT: &str = "Color";
/// Role name of the depth attachment
pub const DEPTH_ATTACHMENT: &str = "Depth";

pub const COLOR_FORMAT: Format = Format::R8G8B8A8_UNORM;
pub const DEPTH_FORMAT: Format = Format::D32_SFLOAT;

/// Perspective camera
pub struct Camera {
    name: String,
    view: Mat4,
    projection: Mat4,
    position: Vec3,
    fov_y: f32,
    near: f32,
    far: f32,
    extent: Extent2D,
    attachments: FxHashMap<String, Arc<Image>>,
}

impl Camera {
    /// Camera looking down -Z from the origin, with color and depth attachments
    pub fn new(ctx: &GraphicsContext, name: &str, extent: Extent2D) -> Result<Self> {
        if extent.width == 0 || extent.height == 0 {
            engine_bail_invalid!("x2::Camera", "Camera '{}' has a zero extent", name);
        }

        let mut camera = Self {
            name: name.to_string(),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            position: Vec3::ZERO,
            fov_y: 60f32.to_radians(),
            near: 0.1,
            far: 100.0,
            extent,
            attachments: FxHashMap::default(),
        };
        camera.update_projection();
        camera.create_default_attachments(ctx)?;
        Ok(camera)
    }

    /// (Re)create the color and depth attachments at the current extent
    pub fn create_default_attachments(&mut self, ctx: &GraphicsContext) -> Result<()> {
        let color = Image::attachment(ctx, self.extent, COLOR_FORMAT, ImageUsage::INPUT_ATTACHMENT)?;
        let depth = Image::attachment(ctx, self.extent, DEPTH_FORMAT, ImageUsage::empty())?;
        self.attachments.insert(COLOR_ATTACHMENT.to_string(), Arc::new(color));
        self.attachments.insert(DEPTH_ATTACHMENT.to_string(), Arc::new(depth));
        Ok(())
    }

    // ===== TRANSFORM =====

    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.position = eye;
        self.view = Mat4::look_at_rh(eye, target, up);
    }

    /// Perspective projection; the aspect ratio follows the extent
    pub fn set_perspective(&mut self, fov_y: f32, near: f32, far: f32) {
        self.fov_y = fov_y;
        self.near = near;
        self.far = far;
        self.update_projection();
    }

    fn update_projection(&mut self) {
        let aspect = self.extent.width as f32 / self.extent.height as f32;
        let mut projection = Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far);
        // Vulkan clip space has Y pointing down
        projection.y_axis.y = -projection.y_axis.y;
        self.projection = projection;
    }

    // ===== ATTACHMENTS =====

    /// Add or replace the attachment for `role`
    pub fn add_attachment(&mut self, role: &str, image: Arc<Image>) {
        self.attachments.insert(role.to_string(), image);
    }

    pub fn attachment(&self, role: &str) -> Result<&Arc<Image>> {
        self.attachments.get(role).ok_or_else(|| engine_err_invalid!("x2::Camera",
            "Camera '{}' has no attachment '{}'", self.name, role))
    }

    pub fn has_attachment(&self, role: &str) -> bool {
        self.attachments.contains_key(role)
    }

    pub fn attachment_roles(&self) -> impl Iterator<Item = &str> {
        self.attachments.keys().map(|k| k.as_str())
    }

    /// Recreate every attachment at `extent` (same format and usage)
    ///
    /// Renderer data resolved against the old attachments must be refreshed.
    pub fn resize(&mut self, ctx: &GraphicsContext, extent: Extent2D) -> Result<()> {
        if extent.width == 0 || extent.height == 0 {
            engine_bail_invalid!("x2::Camera", "Camera '{}' cannot resize to a zero extent", self.name);
        }

        let mut resized = FxHashMap::default();
        for (role, image) in &self.attachments {
            let mut desc = image.desc().clone();
            desc.extent = extent;
            desc.initial_data = None;
            resized.insert(role.clone(), Arc::new(Image::new(ctx, desc)?));
        }

        engine_debug!("x2::Camera", "Camera '{}' resized to {}x{}", self.name, extent.width, extent.height);
        self.attachments = resized;
        self.extent = extent;
        self.update_projection();
        Ok(())
    }

    // ===== FRUSTUM =====

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// World-space frustum corners: near face then far face,
    /// each (-1,-1), (1,-1), (1,1), (-1,1) in NDC
    pub fn frustum_corners(&self) -> [Vec3; 8] {
        let inverse = self.view_projection().inverse();
        let mut corners = [Vec3::ZERO; 8];
        let ndc = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        for (face, depth) in [0.0f32, 1.0].into_iter().enumerate() {
            for (i, (x, y)) in ndc.iter().enumerate() {
                let point = inverse * Vec4::new(*x, *y, depth, 1.0);
                corners[face * 4 + i] = point.truncate() / point.w;
            }
        }
        corners
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }

    // ===== GETTERS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Replace the view matrix; `position` must match its inverse translation
    pub fn set_view(&mut self, view: Mat4, position: Vec3) {
        self.view = view;
        self.position = position;
    }

    pub fn set_projection(&mut self, projection: Mat4, near: f32, far: f32) {
        self.projection = projection;
        self.near = near;
        self.far = far;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }
}

impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("extent", &self.extent)
            .field("attachments", &self.attachments.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;

/// Something to draw: a mesh, the material it is drawn with and its placement.

use std::sync::Arc;
use glam::Mat4;
use crate::camera::Aabb;
use crate::resource::{Material, Mesh};

#[derive(Clone)]
pub struct RenderObject {
    pub mesh: Arc<Mesh>,
    pub material: Arc<Material>,
    pub model: Mat4,
    pub cast_shadows: bool,
}

impl RenderObject {
    pub fn new(mesh: Arc<Mesh>, material: Arc<Material>, model: Mat4) -> Self {
        Self { mesh, material, model, cast_shadows: true }
    }

    /// Mesh bounds in world space
    pub fn world_bounds(&self) -> Aabb {
        self.mesh.bounds().transformed(&self.model)
    }
}

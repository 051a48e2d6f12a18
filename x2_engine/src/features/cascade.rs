/// Cascade fitting for directional-light shadow maps.
///
/// The camera frustum is cut into [`CASCADE_COUNT`] slices along its
/// near-to-far corner edges. Each slice is enclosed in a bounding sphere and
/// rendered from an orthographic light camera centred on that sphere, so a
/// cascade's footprint does not change size while the camera rotates.

use glam::{Mat4, Vec3, Vec4};
use crate::camera::{Camera, Frustum};
use super::shadow_caster::ShadowCasterConfig;

pub const CASCADE_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Smallest sphere centred on the axis of a frustum slice that holds
    /// all 8 corners (near face first, far face second)
    ///
    /// The centre sits at distance `x` from the near-face centre where a near
    /// corner and a far corner are equidistant:
    /// `x = (L² + (df/2)² - (dn/2)²) / 2L`, clamped to the slice.
    pub fn from_corners(corners: &[Vec3; 8]) -> Self {
        let near_center = face_center(&corners[0..4]);
        let far_center = face_center(&corners[4..8]);
        let near_half_diagonal = corners[0].distance(corners[2]) * 0.5;
        let far_half_diagonal = corners[4].distance(corners[6]) * 0.5;

        let axis = far_center - near_center;
        let length = axis.length();
        let center = if length > f32::EPSILON {
            let x = (length * length + far_half_diagonal * far_half_diagonal
                - near_half_diagonal * near_half_diagonal)
                / (2.0 * length);
            near_center + axis / length * x.clamp(0.0, length)
        } else {
            near_center
        };

        let radius = corners
            .iter()
            .map(|corner| corner.distance(center))
            .fold(0.0f32, f32::max);
        Self { center, radius }
    }

    pub fn contains(&self, point: Vec3, tolerance: f32) -> bool {
        point.distance(self.center) <= self.radius + tolerance
    }
}

fn face_center(face: &[Vec3]) -> Vec3 {
    face.iter().copied().sum::<Vec3>() / face.len() as f32
}

/// Corners of the slice `[start, end]` (fractions of the near-to-far edges)
pub fn split_corners(corners: &[Vec3; 8], start: f32, end: f32) -> [Vec3; 8] {
    let mut slice = [Vec3::ZERO; 8];
    for i in 0..4 {
        slice[i] = corners[i].lerp(corners[i + 4], start);
        slice[i + 4] = corners[i].lerp(corners[i + 4], end);
    }
    slice
}

/// Start and end fractions of every cascade
///
/// Cascade `i` starts `overlap` of the previous cascade's length before the
/// previous split, so neighbouring cascades can be blended.
pub fn split_ranges(split_ratios: &[f32; CASCADE_COUNT], overlap: f32) -> [(f32, f32); CASCADE_COUNT] {
    let mut ranges = [(0.0, 0.0); CASCADE_COUNT];
    let mut previous_start = 0.0f32;
    let mut previous_end = 0.0f32;
    for (i, end) in split_ratios.iter().copied().enumerate() {
        let start = if i == 0 {
            0.0
        } else {
            (previous_end - overlap * (previous_end - previous_start)).max(0.0)
        };
        ranges[i] = (start, end);
        previous_start = start;
        previous_end = end;
    }
    ranges
}

/// Up vector for a light looking along `direction`
fn light_up(direction: Vec3) -> Vec3 {
    if direction.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y }
}

#[derive(Debug, Clone, Copy)]
pub struct Cascade {
    /// World-space slice corners, near face first
    pub corners: [Vec3; 8],
    pub sphere: BoundingSphere,
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    /// View-space distance where the cascade ends
    pub split_depth: f32,
    /// World-space size of one shadow-map texel
    pub texel_size: f32,
}

impl Cascade {
    /// Fit the light camera of one slice
    pub fn fit(corners: [Vec3; 8], split_depth: f32, config: &ShadowCasterConfig) -> Self {
        let mut sphere = BoundingSphere::from_corners(&corners);
        let resolution = config.resolution as f32;
        if config.stabilize {
            // Quantised radius keeps the texel size constant between frames
            sphere.radius = (sphere.radius * 16.0).ceil() / 16.0;
        }
        let radius = sphere.radius;

        let direction = config.light_direction.normalize_or(Vec3::NEG_Y);
        let eye = sphere.center - direction * (radius + config.standoff);
        let view = Mat4::look_at_rh(eye, sphere.center, light_up(direction));
        let mut projection = Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.0, 2.0 * radius + config.standoff);

        if config.stabilize {
            let origin = projection * view * Vec4::W;
            let texel_origin = origin.truncate().truncate() * (resolution * 0.5);
            let offset = (texel_origin.round() - texel_origin) * (2.0 / resolution);
            projection.w_axis.x += offset.x;
            projection.w_axis.y += offset.y;
        }

        Self {
            corners,
            sphere,
            view,
            projection,
            view_projection: projection * view,
            split_depth,
            texel_size: 2.0 * radius / resolution,
        }
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection)
    }
}

/// Fit every cascade to a frustum given by its 8 corners and depth range
pub fn compute_cascades(
    corners: &[Vec3; 8],
    near: f32,
    far: f32,
    config: &ShadowCasterConfig,
) -> [Cascade; CASCADE_COUNT] {
    let ranges = split_ranges(&config.split_ratios, config.overlap);
    std::array::from_fn(|i| {
        let (start, end) = ranges[i];
        Cascade::fit(split_corners(corners, start, end), near + (far - near) * end, config)
    })
}

/// Fit every cascade to the camera's current frustum
pub fn camera_cascades(camera: &Camera, config: &ShadowCasterConfig) -> [Cascade; CASCADE_COUNT] {
    compute_cascades(&camera.frustum_corners(), camera.near(), camera.far(), config)
}

#[cfg(test)]
#[path = "cascade_tests.rs"]
mod tests;

use glam::{Mat4, Vec3, Vec4};
use super::*;

const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

fn camera_corners(eye: Vec3, target: Vec3) -> [Vec3; 8] {
    let projection = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, NEAR, FAR);
    let view = Mat4::look_at_rh(eye, target, Vec3::Y);
    let inverse = (projection * view).inverse();
    let ndc = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    let mut corners = [Vec3::ZERO; 8];
    for (face, depth) in [0.0f32, 1.0].into_iter().enumerate() {
        for (i, (x, y)) in ndc.iter().enumerate() {
            let point = inverse * Vec4::new(*x, *y, depth, 1.0);
            corners[face * 4 + i] = point.truncate() / point.w;
        }
    }
    corners
}

fn default_cascades() -> [Cascade; CASCADE_COUNT] {
    let corners = camera_corners(Vec3::new(3.0, 4.0, 10.0), Vec3::new(-2.0, 0.0, -5.0));
    compute_cascades(&corners, NEAR, FAR, &ShadowCasterConfig::default())
}

// ============================================================================
// Bounding sphere
// ============================================================================

#[test]
fn test_sphere_contains_all_corners() {
    for cascade in default_cascades() {
        for corner in cascade.corners {
            assert!(cascade.sphere.contains(corner, 1e-3),
                "corner {:?} outside sphere {:?}", corner, cascade.sphere);
        }
    }
}

#[test]
fn test_sphere_of_a_cube_is_centred() {
    let corners = [
        Vec3::new(-1.0, -1.0, 1.0), Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0), Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0), Vec3::new(-1.0, 1.0, -1.0),
    ];
    let sphere = BoundingSphere::from_corners(&corners);

    assert!(sphere.center.length() < 1e-5);
    assert!((sphere.radius - 3f32.sqrt()).abs() < 1e-5);
}

#[test]
fn test_sphere_centre_clamped_to_far_face() {
    // Tiny near face, huge far face: the equidistant point lies beyond the far face
    let mut corners = [Vec3::ZERO; 8];
    let square = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    for (i, (x, y)) in square.iter().enumerate() {
        corners[i] = Vec3::new(x * 0.01, y * 0.01, 0.0);
        corners[i + 4] = Vec3::new(x * 50.0, y * 50.0, -1.0);
    }
    let sphere = BoundingSphere::from_corners(&corners);

    assert!((sphere.center - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    for corner in corners {
        assert!(sphere.contains(corner, 1e-3));
    }
}

// ============================================================================
// Splits
// ============================================================================

#[test]
fn test_split_ranges_are_monotonic_and_overlap() {
    let ranges = split_ranges(&[0.1, 0.3, 0.6, 1.0], 0.2);

    assert_eq!(ranges[0].0, 0.0);
    assert_eq!(ranges[CASCADE_COUNT - 1].1, 1.0);
    for i in 1..CASCADE_COUNT {
        let (start, end) = ranges[i];
        let (previous_start, previous_end) = ranges[i - 1];
        assert!(start > previous_start);
        assert!(end > previous_end);
        assert!(start < previous_end, "cascade {} does not overlap its predecessor", i);
    }
    // 0.3 - 0.2 * (0.3 - 0.08)
    assert!((ranges[2].0 - 0.256).abs() < 1e-5);
}

#[test]
fn test_split_ranges_without_overlap_tile_the_frustum() {
    let ratios = [0.1, 0.3, 0.6, 1.0];
    let ranges = split_ranges(&ratios, 0.0);
    for i in 1..CASCADE_COUNT {
        assert_eq!(ranges[i].0, ratios[i - 1]);
    }
}

#[test]
fn test_split_depths_increase_to_far() {
    let cascades = default_cascades();
    for pair in cascades.windows(2) {
        assert!(pair[1].split_depth > pair[0].split_depth);
    }
    assert!((cascades[CASCADE_COUNT - 1].split_depth - FAR).abs() < 1e-3);
}

#[test]
fn test_split_corners_lerp_edges() {
    let corners = camera_corners(Vec3::ZERO, Vec3::NEG_Z);
    let slice = split_corners(&corners, 0.0, 1.0);
    assert_eq!(slice, corners);

    let half = split_corners(&corners, 0.5, 0.5);
    for i in 0..4 {
        assert_eq!(half[i], half[i + 4]);
        assert!((half[i] - (corners[i] + corners[i + 4]) * 0.5).length() < 1e-4);
    }
}

// ============================================================================
// Light camera
// ============================================================================

#[test]
fn test_light_camera_sits_behind_sphere() {
    let config = ShadowCasterConfig::default();
    let direction = config.light_direction.normalize();
    for cascade in default_cascades() {
        let center = cascade.view.transform_point3(cascade.sphere.center);
        // Light looks down -Z in view space
        assert!(center.truncate().length() < 1e-3);
        assert!((center.z + cascade.sphere.radius + config.standoff).abs() < 1e-2);

        let forward = cascade.view.transform_vector3(direction);
        assert!((forward - Vec3::NEG_Z).length() < 1e-4);
    }
}

#[test]
fn test_cascade_frustum_contains_slice() {
    for cascade in default_cascades() {
        let frustum = cascade.frustum();
        for corner in cascade.corners {
            let inside = cascade.sphere.center + (corner - cascade.sphere.center) * 0.999;
            assert!(frustum.contains_point(inside));
        }
    }
}

#[test]
fn test_texel_size_matches_resolution() {
    let config = ShadowCasterConfig::default();
    for cascade in default_cascades() {
        let expected = 2.0 * cascade.sphere.radius / config.resolution as f32;
        assert!((cascade.texel_size - expected).abs() < 1e-6);
    }
}

#[test]
fn test_vertical_light_direction_is_well_defined() {
    let config = ShadowCasterConfig { light_direction: Vec3::NEG_Y, ..ShadowCasterConfig::default() };
    let corners = camera_corners(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO);
    for cascade in compute_cascades(&corners, NEAR, FAR, &config) {
        assert!(cascade.view_projection.is_finite());
    }
}

#[test]
fn test_stabilize_snaps_origin_to_texels() {
    let config = ShadowCasterConfig { stabilize: true, ..ShadowCasterConfig::default() };
    let half_resolution = config.resolution as f32 * 0.5;

    for offset in [0.0f32, 0.013, 0.37] {
        let corners = camera_corners(Vec3::new(offset, 1.0, 5.0), Vec3::new(offset, 0.0, 0.0));
        for cascade in compute_cascades(&corners, NEAR, FAR, &config) {
            let origin = cascade.view_projection * Vec4::W;
            let texel = origin.truncate().truncate() * half_resolution;
            assert!((texel - texel.round()).length() < 1e-2, "origin {:?} off the texel grid", texel);
        }
    }
}

#[test]
fn test_stabilize_keeps_radius_quantised() {
    let config = ShadowCasterConfig { stabilize: true, ..ShadowCasterConfig::default() };
    let corners = camera_corners(Vec3::new(1.0, 1.0, 5.0), Vec3::ZERO);
    for cascade in compute_cascades(&corners, NEAR, FAR, &config) {
        let scaled = cascade.sphere.radius * 16.0;
        assert!((scaled - scaled.round()).abs() < 1e-3);
    }
}

//! Camera module: camera, frustum and bounding boxes.
//!
//! A camera owns its attachment images and is the unit per-camera render
//! feature data is created for. Cameras are owned and driven by the caller.

mod camera;
mod frustum;

pub use camera::{Camera, COLOR_ATTACHMENT, COLOR_FORMAT, DEPTH_ATTACHMENT, DEPTH_FORMAT};
pub use frustum::{
    Aabb, Frustum,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};

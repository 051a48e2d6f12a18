//! Render features: self-contained units of per-frame GPU work.
//!
//! A [`RenderFeature`] owns camera-independent resources. Its per-camera
//! state lives in a boxed [`RenderFeatureData`] created, resolved and
//! destroyed by the renderer.

pub mod render_feature;
pub mod render_object;
pub mod shared_image;

pub use render_feature::*;
pub use render_object::RenderObject;
pub use shared_image::SharedImage;

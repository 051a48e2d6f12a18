//! Renderers: ordered compositions of render features, instantiated per camera.

pub mod deferred;
pub mod renderer_base;
pub mod renderer_data;
pub mod renderer_registry;

pub use renderer_base::{RendererBase, ResolveHook};
pub use renderer_data::{RenderFeatureWrapper, RendererData};
pub use renderer_registry::{RendererConstructor, RendererRegistry, RendererSettings};

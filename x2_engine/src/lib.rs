/*!
# X2 Engine

Backend-agnostic core of the X2 rendering engine.

Rendering is expressed as render features (self-contained units of GPU work
with per-camera data) composed into renderers. Everything GPU-facing goes
through the [`GraphicsDevice`](graphics_device::GraphicsDevice) contract; the
Vulkan implementation lives in `x2_engine_renderer_vulkan`.

## Architecture

- **GraphicsContext**: device + render pass cache, passed to every GPU object
- **RenderPass / RenderPassManager**: named recipes compiled on first use
- **Shader**: pipeline built from reflected SPIR-V and a JSON settings document
- **Material**: one descriptor set per shader slot, written immediately
- **RenderFeature**: stateless feature + per-camera data, four-phase frame
- **RendererBase**: ordered features, preliminary features, resolve hook
- **Camera**: view/projection, extent and named attachment images
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod camera;
pub mod context;
pub mod features;
pub mod graphics_device;
pub mod render_feature;
pub mod render_pass;
pub mod renderer;
pub mod resource;
pub mod shader;

// Main x2 namespace module
pub mod x2 {
    // Error types
    pub use crate::error::{Error, Result};

    // Process-wide services (logger)
    pub use crate::engine::Engine;

    pub use crate::context::GraphicsContext;

    // Logging sub-module (types only; the engine_* macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }
}

// Re-export math library at crate root
pub use glam;

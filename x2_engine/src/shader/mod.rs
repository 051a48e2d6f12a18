//! Shaders built from reflected SPIR-V and a JSON settings document

pub mod shader;
pub mod shader_settings;
pub mod slot;
pub mod vertex_layout;

pub use shader::{PipelineKind, Shader};
pub use shader_settings::ShaderSettings;
pub use slot::{classify_slot, ShaderSlotType, SlotDescriptor};
pub use vertex_layout::{build_vertex_input, vertex_field_for};

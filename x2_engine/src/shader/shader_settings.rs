/// Shader settings document
///
/// ```json
/// {
///     "shaderPaths": ["geometry.vert.spv", "geometry.frag.spv"],
///     "renderPass": "GeometryPass",
///     "subpass": "Geometry",
///     "cullMode": 2,
///     "depthCompareOp": 1
/// }
/// ```
///
/// Fixed-function values use Vulkan's numeric encodings; omitted ones take
/// the `FixedFunctionState` defaults.

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::engine_err_invalid;
use crate::error::Result;
use crate::graphics_device::FixedFunctionState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShaderSettings {
    /// Bytecode files, relative to the settings file
    pub shader_paths: Vec<String>,
    /// Render pass name (graphic pipelines)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_pass: Option<String>,
    /// Subpass name; the first subpass when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpass: Option<String>,
    #[serde(flatten)]
    pub state: FixedFunctionState,
}

impl ShaderSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| engine_err_invalid!("x2::ShaderSettings", "Malformed shader settings: {}", e))
    }

    /// Read and parse a settings file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| engine_err_invalid!("x2::ShaderSettings",
                "Cannot read shader settings '{}': {}", path.display(), e))?;
        serde_json::from_str(&json)
            .map_err(|e| engine_err_invalid!("x2::ShaderSettings",
                "Malformed shader settings '{}': {}", path.display(), e))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| engine_err_invalid!("x2::ShaderSettings", "Cannot serialize shader settings: {}", e))
    }
}

#[cfg(test)]
#[path = "shader_settings_tests.rs"]
mod tests;

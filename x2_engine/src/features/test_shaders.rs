//! Built-in shader settings backed by mock bytecode.
//!
//! The settings documents are the shipped JSON files; each bytecode file
//! holds its own file name and the mock device answers reflection with the
//! interface of the matching GLSL source.

use std::path::{Path, PathBuf};
use crate::graphics_device::mock_graphics_device::*;
use crate::graphics_device::{
    DescriptorType, ImageDim, ReflectedBinding, ReflectedModule, ReflectedPushConstant, ShaderStage,
};

const SETTINGS: [(&str, &str); 9] = [
    ("background.json", include_str!("../../assets/shaders/background.json")),
    ("geometry_default.json", include_str!("../../assets/shaders/geometry_default.json")),
    ("ssao.json", include_str!("../../assets/shaders/ssao.json")),
    ("hbao.json", include_str!("../../assets/shaders/hbao.json")),
    ("gtao.json", include_str!("../../assets/shaders/gtao.json")),
    ("ao_blur.json", include_str!("../../assets/shaders/ao_blur.json")),
    ("ao_cover.json", include_str!("../../assets/shaders/ao_cover.json")),
    ("shadow.json", include_str!("../../assets/shaders/shadow.json")),
    ("shadow_receiver.json", include_str!("../../assets/shaders/shadow_receiver.json")),
];

/// Temporary shader directory, removed on drop
pub struct ShaderDir {
    path: PathBuf,
}

impl ShaderDir {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ShaderDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn push_constants(size: u32) -> Vec<ReflectedPushConstant> {
    vec![ReflectedPushConstant { offset: 0, size }]
}

fn sampler(name: &str, set: u32) -> ReflectedBinding {
    binding(name, set, 0, DescriptorType::CombinedImageSampler, Some(ImageDim::D2))
}

fn uniform(name: &str, set: u32, index: u32) -> ReflectedBinding {
    binding(name, set, index, DescriptorType::UniformBuffer, None)
}

fn ambient_occlusion_fragment() -> ReflectedModule {
    fragment_module(&["Occlusion"], vec![
        uniform("Params", 0, 0),
        sampler("Depth", 1),
        sampler("Normal", 2),
        sampler("Position", 3),
        uniform("PositionInfo", 3, 1),
        sampler("Noise", 4),
    ])
}

/// Reflection of every built-in bytecode file
pub fn builtin_modules() -> Vec<(&'static str, ReflectedModule)> {
    let mut background = fragment_module(&["Color"], Vec::new());
    background.push_constants = push_constants(112);

    let mut geometry_vertex = mesh_vertex_module();
    geometry_vertex.push_constants = push_constants(128);

    let mut shadow_vertex = reflected_module(ShaderStage::Vertex);
    shadow_vertex.inputs = vec![variable("inPosition", 0)];
    shadow_vertex.push_constants = push_constants(64);

    vec![
        ("full_screen.vert.spv", full_screen_vertex_module()),
        ("background.frag.spv", background),
        ("geometry_default.vert.spv", geometry_vertex),
        ("geometry_default.frag.spv", fragment_module(&["Color", "Normal", "Position"], vec![
            uniform("Surface", 0, 0),
        ])),
        ("ssao.frag.spv", ambient_occlusion_fragment()),
        ("hbao.frag.spv", ambient_occlusion_fragment()),
        ("gtao.frag.spv", ambient_occlusion_fragment()),
        ("ao_blur.frag.spv", fragment_module(&["Occlusion"], vec![
            uniform("Params", 0, 0),
            sampler("Source", 1),
            uniform("SourceInfo", 1, 1),
            sampler("Normal", 2),
        ])),
        ("ao_cover.frag.spv", fragment_module(&["Color"], vec![
            uniform("Params", 0, 0),
            sampler("Occlusion", 1),
        ])),
        ("shadow.vert.spv", shadow_vertex),
        ("shadow_receiver.frag.spv", fragment_module(&["Color"], vec![
            uniform("Params", 0, 0),
            uniform("Shadow", 1, 0),
            sampler("Position", 2),
            sampler("ShadowMap", 3),
        ])),
    ]
}

/// Write the built-in shaders to a fresh directory and register their
/// reflection with `device`
pub fn builtin_shader_dir(device: &MockGraphicsDevice, test: &str) -> ShaderDir {
    let path = std::env::temp_dir().join(format!("x2_shaders_{}_{}", test, std::process::id()));
    let _ = std::fs::remove_dir_all(&path);
    std::fs::create_dir_all(&path).unwrap();

    for (file, json) in SETTINGS {
        std::fs::write(path.join(file), json).unwrap();
    }
    for (file, module) in builtin_modules() {
        let code = file.as_bytes();
        std::fs::write(path.join(file), code).unwrap();
        device.register_module(code, module);
    }
    ShaderDir { path }
}

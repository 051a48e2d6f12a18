use super::*;
use crate::graphics_device::{BlendFactor, BlendOp, ColorWriteMask, CompareOp, CullMode};

#[test]
fn test_defaults_for_omitted_fields() {
    let settings = ShaderSettings::from_json(r#"{ "shaderPaths": ["a.vert.spv"] }"#).unwrap();

    assert_eq!(settings.shader_paths, vec!["a.vert.spv".to_string()]);
    assert_eq!(settings.render_pass, None);
    assert_eq!(settings.subpass, None);
    assert_eq!(settings.state, FixedFunctionState::default());
    assert_eq!(settings.state.cull_mode, CullMode::Back);
    assert_eq!(settings.state.color_write_mask, ColorWriteMask::all());
    assert!(settings.state.depth_test_enable);
    assert_eq!(settings.state.depth_compare_op, CompareOp::Less);
}

#[test]
fn test_native_encodings() {
    let json = r#"{
        "shaderPaths": ["cover.vert.spv", "cover.frag.spv"],
        "renderPass": "AoCoverPass",
        "subpass": "Cover",
        "cullMode": 0,
        "blendEnable": true,
        "srcColorBlendFactor": 4,
        "dstColorBlendFactor": 0,
        "colorBlendOp": 0,
        "colorWriteMask": 7,
        "depthTestEnable": false,
        "depthWriteEnable": false,
        "depthCompareOp": 3
    }"#;
    let settings = ShaderSettings::from_json(json).unwrap();

    assert_eq!(settings.render_pass.as_deref(), Some("AoCoverPass"));
    assert_eq!(settings.subpass.as_deref(), Some("Cover"));
    assert_eq!(settings.state.cull_mode, CullMode::None);
    assert!(settings.state.blend_enable);
    assert_eq!(settings.state.src_color_blend_factor, BlendFactor::DstColor);
    assert_eq!(settings.state.dst_color_blend_factor, BlendFactor::Zero);
    assert_eq!(settings.state.color_blend_op, BlendOp::Add);
    assert_eq!(settings.state.color_write_mask, ColorWriteMask::R | ColorWriteMask::G | ColorWriteMask::B);
    assert!(!settings.state.depth_test_enable);
    assert_eq!(settings.state.depth_compare_op, CompareOp::LessOrEqual);
}

#[test]
fn test_out_of_range_enum_fails() {
    assert!(ShaderSettings::from_json(r#"{ "shaderPaths": [], "cullMode": 9 }"#).is_err());
}

#[test]
fn test_malformed_json_fails() {
    assert!(ShaderSettings::from_json("{ shaderPaths: ").is_err());
    assert!(ShaderSettings::from_json(r#"{ "renderPass": "X" }"#).is_err());
}

#[test]
fn test_missing_file_fails() {
    let result = ShaderSettings::load(Path::new("/nonexistent/x2/shader.json"));
    assert!(matches!(result, Err(crate::error::Error::InvalidResource(_))));
}

#[test]
fn test_json_round_trip_keeps_native_values() {
    let settings = ShaderSettings::from_json(r#"{ "shaderPaths": ["a"], "cullMode": 1 }"#).unwrap();
    let json = settings.to_json().unwrap();

    assert!(json.contains("\"cullMode\": 1"));
    assert_eq!(ShaderSettings::from_json(&json).unwrap(), settings);
}

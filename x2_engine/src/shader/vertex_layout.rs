/// Vertex input layout derived from reflected vertex shader inputs.
///
/// Input names are matched case-insensitively by substring against the
/// [`Vertex`] fields. "bitangent" is tested before "tangent".

use crate::engine_bail_invalid;
use crate::error::Result;
use crate::graphics_device::{ReflectedVariable, VertexAttributeDesc, VertexBindingDesc, VertexInputLayout};
use crate::resource::{Vertex, VertexField};

const FIELD_PATTERNS: [(&str, VertexField); 5] = [
    ("position", VertexField::Position),
    ("texcoord", VertexField::TexCoord),
    ("normal", VertexField::Normal),
    ("bitangent", VertexField::Bitangent),
    ("tangent", VertexField::Tangent),
];

/// Vertex field read by an input named `name`
pub fn vertex_field_for(name: &str) -> Option<VertexField> {
    let lower = name.to_lowercase();
    FIELD_PATTERNS
        .iter()
        .find(|(pattern, _)| lower.contains(pattern))
        .map(|(_, field)| *field)
}

/// One binding (stride = `size_of::<Vertex>()`) and one attribute per input,
/// sorted by location
pub fn build_vertex_input(inputs: &[ReflectedVariable]) -> Result<VertexInputLayout> {
    let mut attributes = Vec::with_capacity(inputs.len());

    for input in inputs {
        let field = match vertex_field_for(&input.name) {
            Some(field) => field,
            None => engine_bail_invalid!("x2::Shader",
                "Vertex input '{}' (location {}) matches no vertex field", input.name, input.location),
        };
        attributes.push(VertexAttributeDesc {
            location: input.location,
            binding: 0,
            format: field.format(),
            offset: field.offset(),
        });
    }
    attributes.sort_by_key(|a| a.location);

    Ok(VertexInputLayout {
        bindings: vec![VertexBindingDesc { binding: 0, stride: Vertex::STRIDE }],
        attributes,
    })
}

#[cfg(test)]
#[path = "vertex_layout_tests.rs"]
mod tests;

//! Interleaved vertex format and indexed triangle meshes.
//!
//! Every graphic pipeline reads vertices from a single binding laid out as
//! [`Vertex`]; shader vertex inputs are matched to its fields by name.

use std::mem::{offset_of, size_of};
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use crate::camera::Aabb;
use crate::context::GraphicsContext;
use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{BufferUsage, CommandBuffer, Format, IndexType};
use crate::resource::Buffer;

// ============================================================================
// VERTEX
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub texcoord: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

/// A field of [`Vertex`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexField {
    Position,
    TexCoord,
    Normal,
    Tangent,
    Bitangent,
}

impl VertexField {
    pub fn offset(&self) -> u32 {
        let offset = match self {
            VertexField::Position => offset_of!(Vertex, position),
            VertexField::TexCoord => offset_of!(Vertex, texcoord),
            VertexField::Normal => offset_of!(Vertex, normal),
            VertexField::Tangent => offset_of!(Vertex, tangent),
            VertexField::Bitangent => offset_of!(Vertex, bitangent),
        };
        offset as u32
    }

    pub fn format(&self) -> Format {
        match self {
            VertexField::TexCoord => Format::R32G32_SFLOAT,
            _ => Format::R32G32B32_SFLOAT,
        }
    }
}

impl Vertex {
    pub const STRIDE: u32 = size_of::<Vertex>() as u32;

    pub fn new(position: Vec3, texcoord: Vec2, normal: Vec3) -> Self {
        Self { position, texcoord, normal, ..Self::default() }
    }
}

// ============================================================================
// MESH
// ============================================================================

/// Indexed triangle list in host-visible buffers
pub struct Mesh {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
    bounds: Aabb,
}

impl Mesh {
    pub fn new(ctx: &GraphicsContext, vertices: &[Vertex], indices: &[u32]) -> Result<Self> {
        if vertices.is_empty() || indices.is_empty() {
            engine_bail!("x2::Mesh", "Mesh needs vertices and indices");
        }
        if indices.len() % 3 != 0 {
            engine_bail!("x2::Mesh", "Index count {} is not a multiple of 3", indices.len());
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            engine_bail!("x2::Mesh", "Index {} out of range ({} vertices)", bad, vertices.len());
        }

        Ok(Self {
            vertex_buffer: Buffer::with_data(ctx, vertices, BufferUsage::VERTEX)?,
            index_buffer: Buffer::with_data(ctx, indices, BufferUsage::INDEX)?,
            index_count: indices.len() as u32,
            bounds: Aabb::from_points(vertices.iter().map(|v| v.position)),
        })
    }

    /// Unit cube centred on the origin, outward normals
    pub fn cube(ctx: &GraphicsContext) -> Result<Self> {
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, tangent, bitangent) in faces {
            let base = vertices.len() as u32;
            for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                let position = (normal + tangent * (u * 2.0 - 1.0) + bitangent * (v * 2.0 - 1.0)) * 0.5;
                vertices.push(Vertex {
                    position,
                    texcoord: Vec2::new(u, 1.0 - v),
                    normal,
                    tangent,
                    bitangent,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(ctx, &vertices, &indices)
    }

    /// Bind the buffers and draw every index once
    pub fn draw(&self, cmd: &mut dyn CommandBuffer) -> Result<()> {
        cmd.bind_vertex_buffer(self.vertex_buffer.gpu_buffer(), 0)?;
        cmd.bind_index_buffer(self.index_buffer.gpu_buffer(), 0, IndexType::U32)?;
        cmd.draw_indexed(self.index_count, 1, 0, 0, 0)
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Object-space bounds
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;

use bytemuck::{Pod, Zeroable};

use crate::gpu::{AttributeFormat, Primitive, VertexLayoutDesc};

/// Interleaved vertex as uploaded: position, normal, texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, normal, uv }
    }

    /// Locations 0, 1, 2 for position, normal, uv.
    pub fn layout() -> VertexLayoutDesc {
        VertexLayoutDesc::packed(&[
            AttributeFormat::Float32x3,
            AttributeFormat::Float32x3,
            AttributeFormat::Float32x2,
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    /// Drawn with `draw_elements` when present, `draw_arrays` otherwise.
    pub indices: Option<Vec<u32>>,
    pub primitive: Primitive,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Option<Vec<u32>>) -> Self {
        Self { vertices, indices, primitive: Primitive::Triangles }
    }

    /// Number of elements a draw call covers.
    pub fn draw_count(&self) -> u32 {
        match &self.indices {
            Some(indices) => indices.len() as u32,
            None => self.vertices.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_struct() {
        let layout = Vertex::layout();
        assert_eq!(layout.stride as usize, std::mem::size_of::<Vertex>());
        assert_eq!(layout.attributes[1].offset as usize, std::mem::offset_of!(Vertex, normal));
        assert_eq!(layout.attributes[2].offset as usize, std::mem::offset_of!(Vertex, uv));
    }

    #[test]
    fn draw_count_prefers_indices() {
        let v = Vertex::new([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]);
        let unindexed = MeshData::new(vec![v; 3], None);
        assert_eq!(unindexed.draw_count(), 3);
        let indexed = MeshData::new(vec![v; 3], Some(vec![0, 1, 2, 2, 1, 0]));
        assert_eq!(indexed.draw_count(), 6);
    }
}

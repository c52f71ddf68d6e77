use std::fmt;
use std::num::NonZeroU32;

/// Opaque backend-assigned resource identifier.
///
/// Zero is never a valid handle; backends start numbering at one.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Handle(NonZeroU32);

impl Handle {
    #[inline]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Handle)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which kind of GPU object a handle refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Buffer,
    VertexLayout,
    Texture,
    ShaderProgram,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::VertexLayout => "vertex layout",
            ResourceKind::Texture => "texture",
            ResourceKind::ShaderProgram => "shader program",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    Vertex,
    /// `u32` indices.
    Index,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
}

// ── vertex layout ─────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
}

impl AttributeFormat {
    pub const fn size(self) -> u32 {
        match self {
            AttributeFormat::Float32 => 4,
            AttributeFormat::Float32x2 => 8,
            AttributeFormat::Float32x3 => 12,
            AttributeFormat::Float32x4 => 16,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    pub format: AttributeFormat,
    /// Byte offset inside one vertex.
    pub offset: u32,
}

/// Interleaved vertex layout: one stride, any number of attributes.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VertexLayoutDesc {
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayoutDesc {
    /// Packs `formats` back to back at locations `0..n`.
    pub fn packed(formats: &[AttributeFormat]) -> Self {
        let mut offset = 0;
        let attributes = formats
            .iter()
            .enumerate()
            .map(|(i, &format)| {
                let attr = VertexAttribute { location: i as u32, format, offset };
                offset += format.size();
                attr
            })
            .collect();
        Self { stride: offset, attributes }
    }
}

// ── shader programs ───────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Geometry => "geometry",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    Int,
    Float,
    Vec3,
    Vec4,
    Mat4,
}

/// A uniform the program declares, in declaration order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformDecl {
    pub name: String,
    pub kind: UniformKind,
}

impl UniformDecl {
    pub fn new(name: impl Into<String>, kind: UniformKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// Source text for every stage of a program plus its uniform declarations.
///
/// Backends that reflect uniforms from the source may ignore `uniforms`;
/// backends that cannot (wgpu) lay out their uniform block from it.
#[derive(Debug, Clone, Default)]
pub struct ProgramSource {
    pub label: String,
    pub vertex: String,
    pub fragment: String,
    pub geometry: Option<String>,
    pub uniforms: Vec<UniformDecl>,
}

impl ProgramSource {
    pub fn new(label: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            vertex: vertex.into(),
            fragment: fragment.into(),
            geometry: None,
            uniforms: Vec::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: impl Into<String>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    pub fn uniform(mut self, name: impl Into<String>, kind: UniformKind) -> Self {
        self.uniforms.push(UniformDecl::new(name, kind));
        self
    }
}

/// Backend-resolved uniform slot inside one program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_handle() {
        assert!(Handle::new(0).is_none());
        assert_eq!(Handle::new(7).map(Handle::raw), Some(7));
    }

    #[test]
    fn packed_layout_accumulates_offsets() {
        let desc = VertexLayoutDesc::packed(&[
            AttributeFormat::Float32x3,
            AttributeFormat::Float32x3,
            AttributeFormat::Float32x2,
        ]);
        assert_eq!(desc.stride, 32);
        let offsets: Vec<u32> = desc.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        assert_eq!(desc.attributes[2].location, 2);
    }
}

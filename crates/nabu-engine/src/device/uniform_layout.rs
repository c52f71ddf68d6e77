use crate::gpu::{UniformDecl, UniformKind, UniformLocation};

/// Byte layout of a program's uniform struct under WGSL uniform address space
/// rules, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformLayout {
    slots: Vec<Slot>,
    size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    name: String,
    kind: UniformKind,
    offset: u32,
}

/// `(align, size)` of a member.
const fn align_and_size(kind: UniformKind) -> (u32, u32) {
    match kind {
        UniformKind::Int | UniformKind::Float => (4, 4),
        UniformKind::Vec3 => (16, 12),
        UniformKind::Vec4 => (16, 16),
        UniformKind::Mat4 => (16, 64),
    }
}

pub(crate) const fn align_to(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

impl UniformLayout {
    pub(crate) fn new(decls: &[UniformDecl]) -> Self {
        let mut offset = 0;
        let slots = decls
            .iter()
            .map(|d| {
                let (align, size) = align_and_size(d.kind);
                let slot = Slot { name: d.name.clone(), kind: d.kind, offset: align_to(offset, align) };
                offset = slot.offset + size;
                slot
            })
            .collect();
        // Uniform structs are bound in 16-byte units; an empty block still binds one.
        Self { slots, size: align_to(offset, 16).max(16) }
    }

    /// Bound size of the struct in bytes.
    pub(crate) fn size(&self) -> u32 {
        self.size
    }

    pub(crate) fn location(&self, name: &str) -> Option<UniformLocation> {
        self.slots
            .iter()
            .position(|s| s.name == name)
            .map(|i| UniformLocation(i as u32))
    }

    /// `(kind, byte offset)` of the slot at `location`.
    pub(crate) fn slot(&self, location: UniformLocation) -> Option<(UniformKind, u32)> {
        self.slots.get(location.0 as usize).map(|s| (s.kind, s.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(kinds: &[(&str, UniformKind)]) -> UniformLayout {
        let decls: Vec<_> = kinds.iter().map(|(n, k)| UniformDecl::new(*n, *k)).collect();
        UniformLayout::new(&decls)
    }

    fn offsets(layout: &UniformLayout) -> Vec<u32> {
        layout.slots.iter().map(|s| s.offset).collect()
    }

    #[test]
    fn lit_program_layout() {
        let l = layout(&[
            ("model", UniformKind::Mat4),
            ("view", UniformKind::Mat4),
            ("projection", UniformKind::Mat4),
            ("light.color", UniformKind::Vec3),
            ("light.position", UniformKind::Vec3),
            ("light.ambient_strength", UniformKind::Float),
            ("light.specular_strength", UniformKind::Float),
            ("light.hardness", UniformKind::Float),
        ]);
        // A scalar packs into the tail of the preceding vec3.
        assert_eq!(offsets(&l), vec![0, 64, 128, 192, 208, 220, 224, 228]);
        assert_eq!(l.size(), 240);
    }

    #[test]
    fn vec3_after_scalar_realigns_to_16() {
        let l = layout(&[("a", UniformKind::Float), ("b", UniformKind::Vec3), ("c", UniformKind::Vec4)]);
        assert_eq!(offsets(&l), vec![0, 16, 32]);
        assert_eq!(l.size(), 48);
    }

    #[test]
    fn empty_block_still_has_a_binding_size() {
        assert_eq!(layout(&[]).size(), 16);
    }

    #[test]
    fn locations_follow_declaration_order() {
        let l = layout(&[("view", UniformKind::Mat4), ("time", UniformKind::Float)]);
        assert_eq!(l.location("time"), Some(UniformLocation(1)));
        assert_eq!(l.location("fog"), None);
        assert_eq!(l.slot(UniformLocation(1)), Some((UniformKind::Float, 64)));
        assert_eq!(l.slot(UniformLocation(2)), None);
    }

    #[test]
    fn align_to_rounds_up() {
        assert_eq!(align_to(0, 256), 0);
        assert_eq!(align_to(1, 256), 256);
        assert_eq!(align_to(240, 16), 240);
    }
}

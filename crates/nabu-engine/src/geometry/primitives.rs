use crate::math::Vec3;

use super::{MeshData, Vertex};

/// (normal, u axis, v axis) per face, with `u × v = normal`.
const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
];

/// Axis-aligned cube of edge `size` centred on the origin, 24 vertices, 36 indices.
pub fn cube(size: f32) -> MeshData {
    let half = size * 0.5;
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in CUBE_FACES {
        let base = vertices.len() as u32;
        push_quad(&mut vertices, Vec3::from(normal) * half, Vec3::from(u) * half, Vec3::from(v) * half, normal);
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    MeshData::new(vertices, Some(indices))
}

/// Square of edge `size` in the XZ plane facing +Y.
pub fn plane(size: f32) -> MeshData {
    let half = size * 0.5;
    let mut vertices = Vec::with_capacity(4);
    push_quad(
        &mut vertices,
        Vec3::ZERO,
        Vec3::X * half,
        Vec3::Z * -half,
        [0.0, 1.0, 0.0],
    );
    MeshData::new(vertices, Some(vec![0, 1, 2, 2, 3, 0]))
}

/// Corners counter-clockwise from (-u, -v), uv origin bottom-left.
fn push_quad(out: &mut Vec<Vertex>, centre: Vec3, u: Vec3, v: Vec3, normal: [f32; 3]) {
    let corners = [
        (centre - u - v, [0.0, 1.0]),
        (centre + u - v, [1.0, 1.0]),
        (centre + u + v, [1.0, 0.0]),
        (centre - u + v, [0.0, 0.0]),
    ];
    for (p, uv) in corners {
        out.push(Vertex::new(p.to_array(), normal, uv));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_outward_winding(mesh: &MeshData) {
        let indices = mesh.indices.as_ref().unwrap();
        for tri in indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let (pa, pb, pc) = (Vec3::from(a.position), Vec3::from(b.position), Vec3::from(c.position));
            let face_normal = (pb - pa).cross(pc - pa);
            assert!(face_normal.dot(Vec3::from(a.normal)) > 0.0, "triangle {tri:?} winds inward");
        }
    }

    #[test]
    fn cube_counts_and_extent() {
        let mesh = cube(2.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.draw_count(), 36);
        for v in &mesh.vertices {
            assert!(v.position.iter().all(|c| c.abs() == 1.0));
        }
    }

    #[test]
    fn cube_triangles_face_outward() {
        assert_outward_winding(&cube(1.0));
    }

    #[test]
    fn plane_faces_up() {
        let mesh = plane(4.0);
        assert_eq!(mesh.vertices.len(), 4);
        assert!(mesh.vertices.iter().all(|v| v.position[1] == 0.0));
        assert_outward_winding(&mesh);
    }
}

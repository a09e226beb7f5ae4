use glam::{Vec2, Vec3};

use crate::resources::geometry::{Geometry, Vertex};

/// Outward normal and the two in-plane axes (right, up) of each box face,
/// chosen so that `right × up = normal` and the faces wind counter-clockwise.
const FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
];

/// Axis-aligned box centered on the origin with 24 vertices (4 per face) so
/// that every face gets its own flat normal.
#[must_use]
pub fn create_box(width: f32, height: f32, depth: f32) -> Geometry {
    let half = Vec3::new(width, height, depth) / 2.0;

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, right, up) in FACES {
        let base = vertices.len() as u32;
        // Corners in CCW order: bottom-left, bottom-right, top-right, top-left.
        // UV v grows downwards, matching image row order.
        for (sx, sy, uv) in [
            (-1.0, -1.0, Vec2::new(0.0, 1.0)),
            (1.0, -1.0, Vec2::new(1.0, 1.0)),
            (1.0, 1.0, Vec2::new(1.0, 0.0)),
            (-1.0, 1.0, Vec2::new(0.0, 0.0)),
        ] {
            let position = (normal + right * sx + up * sy) * half;
            vertices.push(Vertex::new(position, normal, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Geometry::new(vertices, &indices)
}

use glam::{Vec2, Vec3};

use crate::resources::geometry::{Geometry, Vertex};

/// A single counter-clockwise triangle facing +Z with its corners at
/// `(-s, -s)`, `(s, -s)` and `(0, s)` where `s = size / 2`.
#[must_use]
pub fn create_triangle(size: f32) -> Geometry {
    let s = size / 2.0;
    let vertices = vec![
        Vertex::new(Vec3::new(-s, -s, 0.0), Vec3::Z, Vec2::new(0.0, 1.0)),
        Vertex::new(Vec3::new(s, -s, 0.0), Vec3::Z, Vec2::new(1.0, 1.0)),
        Vertex::new(Vec3::new(0.0, s, 0.0), Vec3::Z, Vec2::new(0.5, 0.0)),
    ];
    Geometry::new(vertices, &[0, 1, 2])
}

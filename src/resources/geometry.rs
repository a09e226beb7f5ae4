use glam::{Mat4, Vec2, Vec3, Vec4};

/// A single mesh vertex in object space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    /// Normalized RGBA vertex color.
    pub color: Vec4,
}

impl Vertex {
    #[must_use]
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
            color: Vec4::ONE,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO)
    }
}

/// Three vertices in counter-clockwise order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    #[must_use]
    pub fn new(a: Vertex, b: Vertex, c: Vertex) -> Self {
        Self { vertices: [a, b, c] }
    }

    /// Geometric normal of the triangle plane, following the winding order.
    ///
    /// Degenerate triangles yield `Vec3::ZERO`.
    #[must_use]
    pub fn face_normal(&self) -> Vec3 {
        let [a, b, c] = self.vertices.map(|v| v.position);
        (b - a).cross(c - a).normalize_or_zero()
    }

    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter().map(|v| v.position))
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// An inverted box that acts as the identity for [`BoundingBox::union`].
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, |bbox, p| bbox.expand(p))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn expand(&self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Transforms all eight corners and returns their bounds.
    #[must_use]
    pub fn transform(&self, matrix: &Mat4) -> Self {
        if self.is_empty() {
            return *self;
        }
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];
        Self::from_points(corners.map(|p| matrix.transform_point3(p)))
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Indexed triangle list held on the CPU.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    vertices: Vec<Vertex>,
    indices: Vec<[u32; 3]>,
    bounding_box: BoundingBox,
}

impl Geometry {
    /// Builds a geometry from a vertex list and a flat index list.
    ///
    /// Indices are consumed three at a time; a trailing partial triangle is
    /// ignored.
    #[must_use]
    pub fn new(vertices: Vec<Vertex>, indices: &[u32]) -> Self {
        let indices = indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect();
        let mut geo = Self {
            vertices,
            indices,
            bounding_box: BoundingBox::EMPTY,
        };
        geo.compute_bounding_volume();
        geo
    }

    /// Builds an unindexed geometry from a triangle soup.
    #[must_use]
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let vertices = triangles.iter().flat_map(|t| t.vertices).collect::<Vec<_>>();
        let indices = (0..vertices.len() as u32).collect::<Vec<_>>();
        Self::new(vertices, &indices)
    }

    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    #[inline]
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.indices.len()
    }

    /// Object-space bounding box.
    #[inline]
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Iterates the triangles of this geometry. Triangles referencing a vertex
    /// outside the vertex list are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices.iter().filter_map(|&[a, b, c]| {
            let v = |i: u32| self.vertices.get(i as usize).copied();
            Some(Triangle::new(v(a)?, v(b)?, v(c)?))
        })
    }

    pub fn compute_bounding_volume(&mut self) {
        self.bounding_box = BoundingBox::from_points(self.vertices.iter().map(|v| v.position));
    }

    /// Sets every vertex color.
    pub fn set_color(&mut self, color: Vec4) {
        for v in &mut self.vertices {
            v.color = color;
        }
    }

    /// Recenters the geometry on the origin and rescales it so that its
    /// largest extent spans `[-1, 1]`.
    pub fn normalize(&mut self) {
        if self.bounding_box.is_empty() {
            return;
        }
        let center = self.bounding_box.center();
        let extent = self.bounding_box.size().max_element();
        let scale = if extent > f32::EPSILON { 2.0 / extent } else { 1.0 };
        for v in &mut self.vertices {
            v.position = (v.position - center) * scale;
        }
        self.compute_bounding_volume();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32, z: f32) -> Vertex {
        Vertex::new(Vec3::new(x, y, z), Vec3::Z, Vec2::ZERO)
    }

    #[test]
    fn face_normal_follows_winding() {
        let tri = Triangle::new(v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0));
        assert_eq!(tri.face_normal(), Vec3::Z);
        let flipped = Triangle::new(v(0.0, 0.0, 0.0), v(0.0, 1.0, 0.0), v(1.0, 0.0, 0.0));
        assert_eq!(flipped.face_normal(), -Vec3::Z);
    }

    #[test]
    fn triangles_skip_out_of_range_indices() {
        let geo = Geometry::new(vec![v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0)], &[0, 1, 2, 0, 1, 7, 2]);
        assert_eq!(geo.num_triangles(), 2);
        assert_eq!(geo.triangles().count(), 1);
    }

    #[test]
    fn bounding_box_transform_and_union() {
        let bbox = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let moved = bbox.transform(&Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(moved.center(), Vec3::new(10.0, 0.0, 0.0));
        let both = bbox.union(&moved);
        assert_eq!(both.min, Vec3::splat(-1.0));
        assert_eq!(both.max, Vec3::new(11.0, 1.0, 1.0));
        assert!(BoundingBox::EMPTY.is_empty());
        assert_eq!(BoundingBox::EMPTY.union(&bbox), bbox);
    }

    #[test]
    fn normalize_fits_unit_cube() {
        let mut geo = Geometry::new(vec![v(2.0, 2.0, 2.0), v(6.0, 2.0, 2.0), v(2.0, 4.0, 2.0)], &[0, 1, 2]);
        geo.normalize();
        let bbox = geo.bounding_box();
        assert!((bbox.min.x + 1.0).abs() < 1e-6);
        assert!((bbox.max.x - 1.0).abs() < 1e-6);
        assert!(bbox.center().length() < 1e-6);
    }
}

//! Triangle rasterization.
//!
//! For each triangle of a mesh the material's vertex stage runs once per
//! vertex. The clip-space triangle is mapped to screen space through the
//! viewport matrix and scanned over its clamped bounding box at pixel centers.
//! Depth is interpolated linearly in screen space; every other attribute is
//! interpolated perspective-correctly through `1 / w`.
//!
//! Each covered pixel is depth-tested before any attribute is interpolated
//! or shaded, and committed with [`FrameBuffer::set`], which re-checks the
//! depth under the pixel's lock.
//!
//! # Limitations
//!
//! There is no near-plane clipping. A triangle with any vertex at or behind
//! the eye plane (clip `w <= 1e-6`) is dropped whole, so geometry crossing the
//! camera plane disappears instead of being cut. Fragments whose depth falls
//! outside `[0, 1]` are rejected per pixel.

use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};

use crate::renderer::fragment::{FragmentInfo, interpolate_attributes};
use crate::renderer::framebuffer::FrameBuffer;
use crate::resources::color;
use crate::resources::geometry::Triangle;
use crate::resources::material::{Material, ShadedVertex, ShadingContext};
use crate::resources::mesh::Mesh;
use crate::resources::uniforms::Uniforms;

/// Vertices with `w` at or below this are treated as behind the eye.
const MIN_W: f32 = 1e-6;

/// Draws every triangle of `mesh` into `fb`.
///
/// With `shading` the fragment stage runs per fragment and the shaded color
/// is committed (forward). Without it, fragments are committed with their
/// interpolated vertex color for a later screen pass (deferred).
///
/// Returns the number of fragments committed. Meshes that are invisible or
/// have no material draw nothing.
pub fn draw_mesh(fb: &FrameBuffer, mesh: &Mesh, uniforms: &Uniforms, shading: Option<&ShadingContext>) -> usize {
    let Some(material) = mesh.material.as_ref().filter(|_| mesh.visible) else {
        log::debug!("skipping mesh '{}': not drawable", mesh.name);
        return 0;
    };
    mesh.geometry
        .triangles()
        .map(|tri| draw_triangle(fb, &tri, material, uniforms, shading))
        .sum()
}

/// Rasterizes a single triangle. See [`draw_mesh`].
pub fn draw_triangle(
    fb: &FrameBuffer,
    triangle: &Triangle,
    material: &Arc<Material>,
    uniforms: &Uniforms,
    shading: Option<&ShadingContext>,
) -> usize {
    let shaded = triangle.vertices.map(|v| material.vertex_shader(&v, uniforms));
    let Some(setup) = Setup::new(&shaded, uniforms, material.cull_back_faces()) else {
        return 0;
    };
    let face_normal = uniforms.normal.transform_vector3(triangle.face_normal()).normalize_or_zero();

    let (x0, y0, x1, y1) = setup.pixel_bounds(fb.width(), fb.height());
    let mut committed = 0;
    for y in y0..y1 {
        for x in x0..x1 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let bary = setup.barycentric(p);
            if bary.min_element() < 0.0 {
                continue;
            }
            let depth = bary.dot(setup.depths);
            if !(0.0..=1.0).contains(&depth) || !fb.depth_test(x, y, depth) {
                continue;
            }

            let weights = setup.perspective(bary);
            let uv = setup.uv(weights);
            let ddx = setup.uv(setup.perspective(setup.barycentric(p + Vec2::X))) - uv;
            let ddy = setup.uv(setup.perspective(setup.barycentric(p + Vec2::Y))) - uv;

            let [a, b, c] = &shaded;
            let w = weights.to_array();
            let mut info = FragmentInfo {
                ok: true,
                x,
                y,
                depth,
                uv,
                du: ddx.x.abs().max(ddy.x.abs()),
                dv: ddx.y.abs().max(ddy.y.abs()),
                normal: (a.normal * w[0] + b.normal * w[1] + c.normal * w[2]).normalize_or_zero(),
                face_normal,
                color: color::from_vec4(a.color * w[0] + b.color * w[1] + c.color * w[2]),
                material: Some(Arc::clone(material)),
                attributes: interpolate_attributes([&a.attributes, &b.attributes, &c.attributes], w),
            };

            if let Some(context) = shading {
                let out = material.fragment_shader(&info, context);
                if color::is_discard(out) {
                    continue;
                }
                info.color = out;
            }
            if fb.set(x, y, info) {
                committed += 1;
            }
        }
    }
    committed
}

/// Screen-space triangle ready for scanning.
struct Setup {
    screen: [Vec2; 3],
    depths: Vec3,
    inv_w: Vec3,
    uvs: [Vec2; 3],
    inv_area: f32,
}

impl Setup {
    /// Returns `None` for triangles crossing behind the eye, degenerate
    /// triangles and, when `cull_back` is set, back faces.
    fn new(shaded: &[ShadedVertex; 3], uniforms: &Uniforms, cull_back: bool) -> Option<Self> {
        let clip: [Vec4; 3] = [shaded[0].position, shaded[1].position, shaded[2].position];
        if clip.iter().any(|p| p.w <= MIN_W || !p.is_finite()) {
            return None;
        }
        let ndc = clip.map(|p| p.truncate() / p.w);

        if cull_back {
            let [a, b, c] = ndc;
            if (b - a).truncate().perp_dot((c - a).truncate()) <= 0.0 {
                return None;
            }
        }

        let screen3 = ndc.map(|p| uniforms.viewport.transform_point3(p));
        let screen = screen3.map(|p| p.truncate());
        let area = edge(screen[0], screen[1], screen[2]);
        if area.abs() <= f32::EPSILON {
            return None;
        }

        Some(Self {
            screen,
            depths: Vec3::new(screen3[0].z, screen3[1].z, screen3[2].z),
            inv_w: Vec3::new(1.0 / clip[0].w, 1.0 / clip[1].w, 1.0 / clip[2].w),
            uvs: [shaded[0].uv, shaded[1].uv, shaded[2].uv],
            inv_area: 1.0 / area,
        })
    }

    /// Clamped half-open pixel range `(x0, y0, x1, y1)` of the bounding box.
    fn pixel_bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let min = self.screen[0].min(self.screen[1]).min(self.screen[2]);
        let max = self.screen[0].max(self.screen[1]).max(self.screen[2]);
        let (w, h) = (width as f32, height as f32);
        let x0 = min.x.floor().clamp(0.0, w) as u32;
        let y0 = min.y.floor().clamp(0.0, h) as u32;
        let x1 = max.x.ceil().clamp(0.0, w) as u32;
        let y1 = max.y.ceil().clamp(0.0, h) as u32;
        (x0, y0, x1, y1)
    }

    /// Screen-space barycentric weights of `p`. Components are all
    /// non-negative inside the triangle, whatever its winding.
    fn barycentric(&self, p: Vec2) -> Vec3 {
        let [a, b, c] = self.screen;
        Vec3::new(edge(b, c, p), edge(c, a, p), edge(a, b, p)) * self.inv_area
    }

    /// Converts screen-space weights into perspective-correct ones.
    fn perspective(&self, bary: Vec3) -> Vec3 {
        let weighted = bary * self.inv_w;
        let sum = weighted.x + weighted.y + weighted.z;
        if sum.abs() <= f32::EPSILON { bary } else { weighted / sum }
    }

    fn uv(&self, weights: Vec3) -> Vec2 {
        self.uvs[0] * weights.x + self.uvs[1] * weights.y + self.uvs[2] * weights.z
    }
}

#[inline]
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

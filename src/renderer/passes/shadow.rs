//! Shadow Mapping Pass
//!
//! Darkens the pixels the scene's first directional light cannot reach.
//!
//! # Algorithm
//!
//! 1. An orthographic light frustum is fitted around the world-space bounds
//!    of the scene, looking along the light's direction.
//! 2. Every drawable mesh is rasterized, unshaded, into a square
//!    [`FrameBuffer`] of [`RendererSettings::shadow_map_size`] texels. Only its
//!    depths are read.
//! 3. A screen pass projects the world position of every pixel whose material
//!    has [`MaterialFlags::RECEIVE_SHADOW`] into the map. A stored depth
//!    nearer than the pixel's own (by more than `bias`) means something sits
//!    between the pixel and the light.
//!
//! Every drawable mesh casts shadows. The map uses the same reverse-Z
//! convention as cameras: larger depth is nearer the light.
//!
//! [`RendererSettings::shadow_map_size`]: crate::renderer::RendererSettings::shadow_map_size
//! [`MaterialFlags::RECEIVE_SHADOW`]: crate::resources::material::MaterialFlags::RECEIVE_SHADOW

use glam::{Mat4, Vec3};
use image::RgbaImage;

use crate::renderer::context::FrameContext;
use crate::renderer::framebuffer::FrameBuffer;
use crate::renderer::passes::{RenderNode, draw_meshes, drawable_meshes};
use crate::resources::color;
use crate::resources::geometry::BoundingBox;
use crate::resources::material::WORLD_POSITION;
use crate::resources::uniforms::{Uniforms, viewport_matrix};
use crate::scene::LightKind;

#[derive(Debug, Clone, Copy)]
pub struct ShadowPass {
    /// Fraction of the color removed from shadowed pixels, in `[0, 1]`.
    pub strength: f32,
    /// Depth tolerance against self-shadowing, in normalized map depth.
    pub bias: f32,
}

impl Default for ShadowPass {
    fn default() -> Self {
        Self {
            strength: 0.5,
            bias: 0.02,
        }
    }
}

impl RenderNode for ShadowPass {
    fn name(&self) -> &'static str {
        "Shadow Pass"
    }

    fn run(&self, ctx: &FrameContext<'_>, target: &mut RgbaImage) {
        let Some(light) = ctx.shading.lights.iter().find(|l| l.kind == LightKind::Directional) else {
            return;
        };
        let receivers = drawable_meshes(ctx.scene)
            .iter()
            .filter(|(mesh, _)| mesh.material.as_ref().is_some_and(|m| m.receive_shadow()))
            .count();
        if receivers == 0 {
            return;
        }
        let bounds = ctx.scene.bounding_box();
        if bounds.is_empty() {
            return;
        }

        let size = ctx.settings.shadow_map_size.max(1);
        let (view, projection) = light_matrices(light.direction, &bounds);
        let map = FrameBuffer::new(size, size);
        let committed = draw_meshes(
            ctx.pool,
            ctx.scene,
            &map,
            |world| Uniforms::new(world, view, projection, size, size),
            None,
        );
        log::debug!("shadow map {size}x{size}: {committed} texels, {receivers} receivers");

        let to_map = viewport_matrix(size, size) * projection * view;
        let keep = 1.0 - self.strength.clamp(0.0, 1.0);
        let fb = ctx.frame_buffer;
        ctx.screen_pass().run(target, |x, y, current| {
            let receiver = fb
                .inspect(x, y, |f| {
                    let receives = f.ok && f.material.as_ref().is_some_and(|m| m.receive_shadow());
                    if receives { f.attribute(WORLD_POSITION).and_then(|v| v.as_vec3()) } else { None }
                })
                .flatten();
            let Some(world) = receiver else {
                return color::DISCARD;
            };

            let p = to_map.project_point3(world);
            if !p.is_finite() || p.x < 0.0 || p.y < 0.0 {
                return color::DISCARD;
            }
            match map.depth(p.x as u32, p.y as u32) {
                Some(occluder) if occluder > p.z + self.bias => color::scale_rgb(current, keep),
                _ => color::DISCARD,
            }
        });
    }
}

/// View and reverse-Z orthographic projection of a light travelling along
/// `direction`, tightly enclosing `bounds`.
fn light_matrices(direction: Vec3, bounds: &BoundingBox) -> (Mat4, Mat4) {
    let dir = direction.try_normalize().unwrap_or(Vec3::NEG_Z);
    let up = if dir.y.abs() > 0.99 { Vec3::X } else { Vec3::Y };
    let center = bounds.center();
    let view = Mat4::look_at_rh(center - dir, center, up);

    let light_space = bounds.transform(&view);
    let pad = (bounds.size().max_element() * 0.01).max(1e-3);
    let (min, max) = (light_space.min, light_space.max);
    let near = -max.z - pad;
    let far = -min.z + pad;
    let projection = Mat4::orthographic_rh(min.x - pad, max.x + pad, min.y - pad, max.y + pad, far, near);
    (view, projection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_frustum_encloses_bounds() {
        let bounds = BoundingBox::new(Vec3::new(-2.0, -1.0, 0.0), Vec3::new(2.0, 1.0, 0.5));
        let (view, projection) = light_matrices(Vec3::new(1.0, 0.0, -1.0), &bounds);
        let clip = projection * view;
        for corner in [bounds.min, bounds.max, Vec3::new(-2.0, 1.0, 0.5), Vec3::new(2.0, -1.0, 0.0)] {
            let p = clip.project_point3(corner);
            assert!(p.x.abs() < 1.0 && p.y.abs() < 1.0, "{corner} -> {p}");
            assert!((0.0..=1.0).contains(&p.z), "{corner} -> {p}");
        }
    }

    #[test]
    fn light_depth_is_reverse_z() {
        let bounds = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let (view, projection) = light_matrices(Vec3::NEG_Z, &bounds);
        let clip = projection * view;
        // The light travels towards -Z, so +Z faces are nearer.
        let near = clip.project_point3(Vec3::new(0.0, 0.0, 1.0)).z;
        let far = clip.project_point3(Vec3::new(0.0, 0.0, -1.0)).z;
        assert!(near > far);
    }

    #[test]
    fn vertical_light_picks_another_up_axis() {
        let bounds = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let (view, projection) = light_matrices(Vec3::NEG_Y, &bounds);
        assert!((projection * view).is_finite());
    }
}

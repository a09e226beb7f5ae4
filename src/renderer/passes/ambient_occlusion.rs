//! Screen-Space Ambient Occlusion Pass
//!
//! Darkens creases and contact areas using only the framebuffer's depths.
//!
//! For every pixel whose material has
//! [`MaterialFlags::AMBIENT_OCCLUSION`](crate::resources::material::MaterialFlags::AMBIENT_OCCLUSION),
//! neighbours are sampled along eight directions at half and full `radius`.
//! A sample occludes when it holds a fragment nearer the camera than the
//! center pixel by more than `bias`. The pixel's RGB is scaled by
//! `1 - strength * occluded / sampled`. Samples outside the framebuffer are
//! not counted.

use glam::Vec2;
use image::RgbaImage;

use crate::renderer::context::FrameContext;
use crate::renderer::framebuffer::FrameBuffer;
use crate::renderer::passes::{RenderNode, drawable_meshes};
use crate::resources::color;

/// Unit sampling directions: the four axes and the four diagonals.
const DIRECTIONS: [Vec2; 8] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(0.0, -1.0),
    Vec2::new(std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2),
    Vec2::new(-std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2),
    Vec2::new(std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2),
    Vec2::new(-std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2),
];

#[derive(Debug, Clone, Copy)]
pub struct AmbientOcclusionPass {
    /// Sampling radius in render-size pixels.
    pub radius: u32,
    /// Darkening of a fully occluded pixel, in `[0, 1]`.
    pub strength: f32,
    /// Minimum depth lead a neighbour needs to occlude.
    pub bias: f32,
}

impl AmbientOcclusionPass {
    /// Default pass with its radius scaled for a supersampled target.
    #[must_use]
    pub fn for_supersampling(factor: u32) -> Self {
        let base = Self::default();
        Self {
            radius: base.radius * factor.max(1),
            ..base
        }
    }

    /// Fraction of in-bounds samples around `(x, y)` that occlude it.
    /// `None` if the pixel is unwritten or nothing was sampled.
    fn occlusion(&self, fb: &FrameBuffer, x: u32, y: u32) -> Option<f32> {
        let center = fb.depth(x, y)?;
        let radius = self.radius.max(1) as f32;
        let steps = [(radius / 2.0).max(1.0), radius];

        let origin = Vec2::new(x as f32, y as f32);
        let mut sampled = 0u32;
        let mut occluded = 0u32;
        for dir in DIRECTIONS {
            for step in steps {
                let p = (origin + dir * step).round();
                if p.x < 0.0 || p.y < 0.0 || p.x >= fb.width() as f32 || p.y >= fb.height() as f32 {
                    continue;
                }
                sampled += 1;
                if fb.depth(p.x as u32, p.y as u32).is_some_and(|d| d - center > self.bias) {
                    occluded += 1;
                }
            }
        }
        (sampled > 0).then(|| occluded as f32 / sampled as f32)
    }
}

impl Default for AmbientOcclusionPass {
    fn default() -> Self {
        Self {
            radius: 6,
            strength: 0.6,
            bias: 1e-3,
        }
    }
}

impl RenderNode for AmbientOcclusionPass {
    fn name(&self) -> &'static str {
        "Ambient Occlusion Pass"
    }

    fn run(&self, ctx: &FrameContext<'_>, target: &mut RgbaImage) {
        let enabled = drawable_meshes(ctx.scene)
            .iter()
            .any(|(mesh, _)| mesh.material.as_ref().is_some_and(|m| m.ambient_occlusion()));
        if !enabled {
            return;
        }

        let fb = ctx.frame_buffer;
        let strength = self.strength.clamp(0.0, 1.0);
        ctx.screen_pass().run(target, |x, y, current| {
            let opted_in = fb
                .inspect(x, y, |f| f.ok && f.material.as_ref().is_some_and(|m| m.ambient_occlusion()))
                .unwrap_or(false);
            if !opted_in {
                return color::DISCARD;
            }
            match self.occlusion(fb, x, y) {
                Some(amount) if amount > 0.0 => color::scale_rgb(current, 1.0 - strength * amount),
                _ => color::DISCARD,
            }
        });
    }
}

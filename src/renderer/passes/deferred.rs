//! Deferred Shading Pass
//!
//! Splits the frame into a geometry step and a shading step:
//!
//! ```text
//! Scene → draw jobs (unshaded) → FrameBuffer (one fragment per pixel)
//!       → ScreenPass (fragment stage per pixel) → target
//! ```
//!
//! The fragment stage runs exactly once per covered pixel.

use image::RgbaImage;

use crate::renderer::context::FrameContext;
use crate::renderer::passes::{RenderNode, draw_scene};
use crate::resources::color;

/// Deferred geometry pass.
///
/// All meshes are first rasterized without shading, leaving one depth-tested
/// fragment per pixel in the framebuffer. A single screen pass then runs each
/// surviving fragment through its material's fragment stage, so every pixel
/// is shaded at most once regardless of overdraw. Translucent results are
/// blended over the background.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferredPass;

impl RenderNode for DeferredPass {
    fn name(&self) -> &'static str {
        "Deferred Pass"
    }

    fn run(&self, ctx: &FrameContext<'_>, target: &mut RgbaImage) {
        draw_scene(ctx, None);

        let fb = ctx.frame_buffer;
        *target = RgbaImage::from_pixel(fb.width(), fb.height(), ctx.settings.background_color());
        let shading = &ctx.shading;
        ctx.screen_pass().run(target, |x, y, background| {
            let info = fb.at(x, y);
            match (&info.material, info.ok) {
                (Some(material), true) => color::alpha_blend(material.fragment_shader(&info, shading), background),
                _ => color::DISCARD,
            }
        });
    }
}

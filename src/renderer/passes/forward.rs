//! Forward Shading Pass
//!
//! Rasterizes and shades in one step: every fragment that wins the depth test
//! is run through its material's fragment stage before being committed.
//! Overdraw therefore costs extra shader calls, bounded by the number of
//! covering fragments that win the test at the time they are drawn.
//!
//! ```text
//! Scene → draw jobs (one per mesh) → FrameBuffer (shaded) → target
//! ```

use image::RgbaImage;

use crate::renderer::context::FrameContext;
use crate::renderer::passes::{RenderNode, draw_scene};
use crate::resources::color;

/// Forward geometry pass.
///
/// Each fragment is shaded as soon as it wins the depth test, then the
/// resolved color image is copied into the target. Translucent pixels are
/// blended over the background and every pixel no fragment reached is filled
/// with the background color.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForwardPass;

impl RenderNode for ForwardPass {
    fn name(&self) -> &'static str {
        "Forward Pass"
    }

    fn run(&self, ctx: &FrameContext<'_>, target: &mut RgbaImage) {
        draw_scene(ctx, Some(&ctx.shading));

        let fb = ctx.frame_buffer;
        *target = fb.color_image();
        let background = ctx.settings.background_color();
        ctx.screen_pass().run(target, |x, y, current| {
            if fb.is_written(x, y) { color::alpha_blend(current, background) } else { background }
        });
    }
}

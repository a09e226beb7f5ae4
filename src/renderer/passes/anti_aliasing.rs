//! Supersampling Anti-Aliasing Resolve Pass
//!
//! When `msaa > 1` the whole frame is rendered at `msaa` times the output
//! size in each axis. This pass is the box-filter resolve back to the output
//! size and must run after every pass that reads the framebuffer, since the
//! target and the framebuffer stop sharing coordinates once it has run.
//!
//! ```text
//! Geometry → Shadow → Ambient Occlusion → AntiAliasingPass → Gamma
//! ```

use image::RgbaImage;

use crate::renderer::context::FrameContext;
use crate::renderer::passes::RenderNode;
use crate::resources::color;

/// Supersampling resolve.
///
/// Shrinks a target of `width * factor × height * factor` pixels to
/// `width × height` by averaging each `factor × factor` block.
#[derive(Debug, Clone, Copy)]
pub struct AntiAliasingPass {
    pub factor: u32,
}

impl AntiAliasingPass {
    #[must_use]
    pub fn new(factor: u32) -> Self {
        Self { factor: factor.max(1) }
    }
}

impl RenderNode for AntiAliasingPass {
    fn name(&self) -> &'static str {
        "Anti-Aliasing Pass"
    }

    fn run(&self, ctx: &FrameContext<'_>, target: &mut RgbaImage) {
        let k = self.factor.max(1);
        if k == 1 {
            return;
        }
        let (width, height) = (target.width() / k, target.height() / k);
        let source = std::mem::replace(target, RgbaImage::new(width, height));
        ctx.screen_pass().run(target, |x, y, _| {
            color::average((0..k * k).map(|i| *source.get_pixel(x * k + i % k, y * k + i / k)))
        });
    }
}

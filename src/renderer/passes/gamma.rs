//! Gamma Correction Pass
//!
//! The last step of a frame when `gamma_correction` is enabled. Shading works
//! in linear space; this pass encodes the resolved target for display through
//! a 256-entry lookup table built once per frame.

use image::{Rgba, RgbaImage};

use crate::renderer::context::FrameContext;
use crate::renderer::passes::RenderNode;

/// Encodes linear colors for display: `c^(1 / gamma)` on RGB, alpha kept.
#[derive(Debug, Clone, Copy)]
pub struct GammaPass {
    pub gamma: f32,
}

impl GammaPass {
    #[must_use]
    pub fn new(gamma: f32) -> Self {
        Self { gamma }
    }

    /// Lookup table from linear 8-bit values to encoded ones.
    fn table(&self) -> [u8; 256] {
        let inv = 1.0 / self.gamma;
        std::array::from_fn(|i| ((i as f32 / 255.0).powf(inv) * 255.0).round() as u8)
    }
}

impl Default for GammaPass {
    fn default() -> Self {
        Self::new(2.2)
    }
}

impl RenderNode for GammaPass {
    fn name(&self) -> &'static str {
        "Gamma Pass"
    }

    fn run(&self, ctx: &FrameContext<'_>, target: &mut RgbaImage) {
        let table = self.table();
        ctx.screen_pass().run(target, |_, _, Rgba([r, g, b, a])| {
            Rgba([table[r as usize], table[g as usize], table[b as usize], a])
        });
    }
}

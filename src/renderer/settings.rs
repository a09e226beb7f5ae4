//! Renderer Settings & Render Path Configuration
//!
//! [`RendererSettings`] is the single explicit configuration the renderer is
//! built from: output size, supersampling factor, tile size, concurrency
//! limit, background color and the geometry path.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tessera::renderer::{RendererSettings, RenderPath};
//!
//! let settings = RendererSettings {
//!     width: 640,
//!     height: 480,
//!     msaa: 2,
//!     path: RenderPath::Deferred,
//!     ..Default::default()
//! };
//! let renderer = tessera::Renderer::new(settings)?;
//! ```
//!
//! Settings can also be loaded from JSON; absent fields keep their defaults:
//!
//! ```rust,ignore
//! let settings = RendererSettings::from_json(r#"{ "width": 320, "height": 200 }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TesseraError};

// ---------------------------------------------------------------------------
// RenderPath
// ---------------------------------------------------------------------------

/// How geometry is turned into shaded pixels.
///
/// | Path       | Shading runs                          | Cost driver            |
/// |------------|---------------------------------------|------------------------|
/// | `Forward`  | during rasterization, per fragment    | overdraw × shader cost |
/// | `Deferred` | once per surviving pixel, after depth | pixels × shader cost   |
///
/// Both paths produce identical images when no two triangles overlap on
/// screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPath {
    /// Shade each fragment as soon as it passes the depth test.
    #[default]
    Forward,
    /// Rasterize attributes for all objects first, then shade each pixel in a
    /// screen pass.
    Deferred,
}

// ---------------------------------------------------------------------------
// RendererSettings
// ---------------------------------------------------------------------------

/// Global configuration for the software renderer.
///
/// # Fields
///
/// | Field              | Description                                   | Default        |
/// |--------------------|-----------------------------------------------|----------------|
/// | `width`, `height`  | Output image size in pixels                   | 800 × 600      |
/// | `msaa`             | Per-axis supersampling factor                 | 1              |
/// | `block_size`       | Screen pass tile edge in pixels               | 32             |
/// | `concurrency`      | Worker pool limit, 0 = available parallelism  | 0              |
/// | `background`       | RGBA8 color of uncovered pixels               | opaque black   |
/// | `path`             | Forward or deferred shading                   | `Forward`      |
/// | `gamma_correction` | Apply a gamma pass at the end of the frame    | `false`        |
/// | `gamma`            | Display gamma used by the gamma pass          | 2.2            |
/// | `shadow_map_size`  | Edge of the square shadow map in texels       | 512            |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    // === Output ===
    pub width: u32,
    pub height: u32,

    /// Supersampling factor per axis. The framebuffer is
    /// `width * msaa × height * msaa` and is averaged down by the
    /// anti-aliasing pass.
    pub msaa: u32,

    // === Scheduling ===
    pub block_size: u32,
    pub concurrency: usize,

    // === Shading ===
    pub background: [u8; 4],
    pub path: RenderPath,
    pub gamma_correction: bool,
    pub gamma: f32,

    // === Shadows ===
    pub shadow_map_size: u32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            msaa: 1,
            block_size: 32,
            concurrency: 0,
            background: [0, 0, 0, 255],
            path: RenderPath::Forward,
            gamma_correction: false,
            gamma: 2.2,
            shadow_map_size: 512,
        }
    }
}

impl RendererSettings {
    /// Parses settings from JSON and validates them.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TesseraError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.msaa == 0 {
            return Err(TesseraError::InvalidMultisample(self.msaa));
        }
        // The supersampled framebuffer must stay addressable with u32.
        if self.width.checked_mul(self.msaa).is_none() || self.height.checked_mul(self.msaa).is_none() {
            return Err(TesseraError::InvalidMultisample(self.msaa));
        }
        if self.block_size == 0 {
            return Err(TesseraError::InvalidBlockSize(self.block_size));
        }
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(TesseraError::InvalidGamma(self.gamma));
        }
        if self.shadow_map_size == 0 {
            return Err(TesseraError::InvalidSize {
                width: self.shadow_map_size,
                height: self.shadow_map_size,
            });
        }
        Ok(())
    }

    /// Size of the supersampled framebuffer. Saturates on settings that
    /// [`validate`](Self::validate) rejects.
    #[inline]
    #[must_use]
    pub fn render_size(&self) -> (u32, u32) {
        (self.width.saturating_mul(self.msaa), self.height.saturating_mul(self.msaa))
    }

    #[inline]
    #[must_use]
    pub fn background_color(&self) -> image::Rgba<u8> {
        image::Rgba(self.background)
    }
}

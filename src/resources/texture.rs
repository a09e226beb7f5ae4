//! CPU textures.
//!
//! A [`Texture`] owns one or more RGBA8 levels. Level 0 is the source image;
//! further levels, when requested, form an isotropic mip chain where each level
//! halves the previous one. Sampling uses repeat addressing and bilinear
//! filtering inside the selected level.

use glam::{Vec2, Vec4};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::errors::{Result, TesseraError};
use crate::resources::color;

#[derive(Debug, Clone)]
pub struct Texture {
    levels: Vec<RgbaImage>,
}

impl Texture {
    /// Wraps `image` as a single-level texture.
    #[must_use]
    pub fn new(image: RgbaImage) -> Self {
        Self { levels: vec![image] }
    }

    /// Wraps `image` and builds its full mip chain down to 1×1.
    #[must_use]
    pub fn with_mipmaps(image: RgbaImage) -> Self {
        let mut levels = vec![image];
        loop {
            let Some(last) = levels.last() else { break };
            let (w, h) = last.dimensions();
            if w <= 1 && h <= 1 {
                break;
            }
            let next = imageops::resize(last, (w / 2).max(1), (h / 2).max(1), FilterType::Triangle);
            levels.push(next);
        }
        log::debug!("built {} mip levels", levels.len());
        Self { levels }
    }

    /// Builds a single-level texture from tightly packed RGBA8 bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let len = data.len();
        RgbaImage::from_raw(width, height, data)
            .map(Self::new)
            .ok_or(TesseraError::InvalidTextureData { width, height, len })
    }

    /// A 1×1 texture of a single color.
    #[must_use]
    pub fn from_color(color: Rgba<u8>) -> Self {
        Self::new(RgbaImage::from_pixel(1, 1, color))
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.levels[0].width()
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.levels[0].height()
    }

    #[inline]
    #[must_use]
    pub fn mip_levels(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn level(&self, index: usize) -> Option<&RgbaImage> {
        self.levels.get(index)
    }

    /// Level of detail for a fragment whose UV changes by `du`/`dv` per pixel.
    #[must_use]
    pub fn lod(&self, du: f32, dv: f32) -> f32 {
        let footprint = (du * self.width() as f32).max(dv * self.height() as f32);
        if footprint <= 1.0 || !footprint.is_finite() {
            0.0
        } else {
            footprint.log2()
        }
    }

    /// Samples a normalized color at `uv` from the level nearest to `lod`.
    #[must_use]
    pub fn sample(&self, uv: Vec2, lod: f32) -> Vec4 {
        let max_level = (self.levels.len() - 1) as f32;
        let index = lod.round().clamp(0.0, max_level) as usize;
        bilinear(&self.levels[index], uv)
    }
}

fn bilinear(image: &RgbaImage, uv: Vec2) -> Vec4 {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || !uv.is_finite() {
        return Vec4::ZERO;
    }
    let x = uv.x * w as f32 - 0.5;
    let y = uv.y * h as f32 - 0.5;
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);

    let fetch = |px: f32, py: f32| {
        let px = (px as i64).rem_euclid(i64::from(w)) as u32;
        let py = (py as i64).rem_euclid(i64::from(h)) as u32;
        color::to_vec4(*image.get_pixel(px, py))
    };

    let top = fetch(x0, y0).lerp(fetch(x0 + 1.0, y0), fx);
    let bottom = fetch(x0, y0 + 1.0).lerp(fetch(x0 + 1.0, y0 + 1.0), fx);
    top.lerp(bottom, fy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let tex = Texture::with_mipmaps(RgbaImage::from_pixel(16, 4, Rgba([255, 0, 0, 255])));
        assert_eq!(tex.mip_levels(), 5);
        assert_eq!(tex.level(4).map(RgbaImage::dimensions), Some((1, 1)));
    }

    #[test]
    fn from_raw_rejects_short_buffers() {
        assert!(Texture::from_raw(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            Texture::from_raw(2, 2, vec![0; 15]),
            Err(TesseraError::InvalidTextureData { len: 15, .. })
        ));
    }

    #[test]
    fn sampling_uniform_texture_is_constant() {
        let tex = Texture::from_color(Rgba([255, 0, 255, 255]));
        for uv in [Vec2::ZERO, Vec2::new(0.3, 0.7), Vec2::new(-2.5, 9.1)] {
            assert!((tex.sample(uv, 0.0) - Vec4::new(1.0, 0.0, 1.0, 1.0)).length() < 1e-6);
        }
    }

    #[test]
    fn lod_grows_with_footprint() {
        let tex = Texture::new(RgbaImage::new(256, 256));
        assert_eq!(tex.lod(0.001, 0.001), 0.0);
        assert!((tex.lod(4.0 / 256.0, 1.0 / 256.0) - 2.0).abs() < 1e-5);
    }
}

//! Color helpers shared by shaders and passes.
//!
//! Colors travel through the pipeline in two shapes: `image::Rgba<u8>` for
//! anything stored in an image, and normalized `glam::Vec4` for shading math.

use glam::Vec4;
use image::Rgba;

/// Sentinel returned by a shader to leave the pixel untouched.
///
/// Fully transparent black is reserved for this purpose; a shader that wants
/// to write transparent black must use a non-zero color channel.
pub const DISCARD: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Opaque white.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Opaque black.
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Returns `true` if `color` is the [`DISCARD`] sentinel.
#[inline]
#[must_use]
pub fn is_discard(color: Rgba<u8>) -> bool {
    color == DISCARD
}

/// Converts an 8-bit color to a normalized vector.
#[inline]
#[must_use]
pub fn to_vec4(color: Rgba<u8>) -> Vec4 {
    let [r, g, b, a] = color.0;
    Vec4::new(r.into(), g.into(), b.into(), a.into()) / 255.0
}

/// Converts a normalized vector to an 8-bit color, clamping each channel.
#[inline]
#[must_use]
pub fn from_vec4(color: Vec4) -> Rgba<u8> {
    let c = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    Rgba([c.x as u8, c.y as u8, c.z as u8, c.w as u8])
}

/// Composites `src` over `dst` with straight (non-premultiplied) alpha.
///
/// An opaque `src` is returned unchanged; a fully transparent `src` returns
/// `dst`.
#[must_use]
pub fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match src.0[3] {
        255 => return src,
        0 => return dst,
        _ => {}
    }
    let s = to_vec4(src);
    let d = to_vec4(dst);
    let alpha = s.w + d.w * (1.0 - s.w);
    let rgb = (s.truncate() * s.w + d.truncate() * d.w * (1.0 - s.w)) / alpha;
    from_vec4(rgb.extend(alpha))
}

/// Multiplies the RGB channels by `factor`, keeping alpha.
#[inline]
#[must_use]
pub fn scale_rgb(color: Rgba<u8>, factor: f32) -> Rgba<u8> {
    let c = to_vec4(color);
    from_vec4((c.truncate() * factor).extend(c.w))
}

/// Averages a set of colors channel by channel.
///
/// Returns [`DISCARD`] for an empty set.
#[must_use]
pub fn average<I>(colors: I) -> Rgba<u8>
where
    I: IntoIterator<Item = Rgba<u8>>,
{
    let mut sum = [0u32; 4];
    let mut count = 0u32;
    for color in colors {
        for (acc, channel) in sum.iter_mut().zip(color.0) {
            *acc += u32::from(channel);
        }
        count += 1;
    }
    if count == 0 {
        return DISCARD;
    }
    // Round to nearest.
    let avg = sum.map(|s| ((s + count / 2) / count) as u8);
    Rgba(avg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec4_conversion_clamps() {
        assert_eq!(from_vec4(Vec4::new(2.0, -1.0, 0.5, 1.0)), Rgba([255, 0, 128, 255]));
        assert_eq!(to_vec4(WHITE), Vec4::ONE);
    }

    #[test]
    fn alpha_blend_composites_over() {
        let red = Rgba([255, 0, 0, 255]);
        assert_eq!(alpha_blend(red, WHITE), red);
        assert_eq!(alpha_blend(Rgba([9, 9, 9, 0]), red), red);
        assert_eq!(alpha_blend(Rgba([255, 255, 255, 128]), BLACK), Rgba([128, 128, 128, 255]));

        // Two half-transparent layers.
        let gray = Rgba([128, 128, 128, 128]);
        let out = alpha_blend(gray, gray);
        assert_eq!(&out.0[..3], &[128, 128, 128]);
        assert_eq!(out.0[3], 192);
    }

    #[test]
    fn scale_rgb_keeps_alpha() {
        assert_eq!(scale_rgb(Rgba([200, 100, 0, 77]), 0.5), Rgba([100, 50, 0, 77]));
        assert_eq!(scale_rgb(WHITE, 1.0), WHITE);
    }

    #[test]
    fn average_rounds_per_channel() {
        let avg = average([Rgba([0, 10, 255, 255]), Rgba([255, 11, 255, 255])]);
        assert_eq!(avg, Rgba([128, 11, 255, 255]));
        assert_eq!(average(std::iter::empty()), DISCARD);
    }
}

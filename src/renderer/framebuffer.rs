//! Depth-tested framebuffer with per-pixel locking.
//!
//! Each pixel owns one [`parking_lot::Mutex`] guarding its fragment, its color
//! and its encoded depth, so the three are always updated together and
//! writers to distinct pixels never contend. Next to every lock sits an atomic
//! depth hint, read without locking, that lets most losing fragments be
//! rejected before the lock is taken.
//!
//! Depth comparison keeps the **larger** value. Cameras produce reverse-Z
//! depth (near = 1, far = 0), so larger means nearer.

use std::sync::atomic::{AtomicU32, Ordering};

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;

use crate::renderer::fragment::FragmentInfo;

/// Hint value for a pixel nothing has been written to. The bit pattern is a
/// NaN, which [`FrameBuffer::set`] never stores.
const UNWRITTEN: u32 = u32::MAX;

#[derive(Debug, Clone)]
struct Pixel {
    fragment: FragmentInfo,
    color: Rgba<u8>,
    depth: Rgba<u8>,
}

impl Default for Pixel {
    fn default() -> Self {
        Self {
            fragment: FragmentInfo::default(),
            color: Rgba([0, 0, 0, 0]),
            depth: Rgba([0, 0, 0, 0]),
        }
    }
}

#[derive(Debug)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Box<[Mutex<Pixel>]>,
    depth_hint: Box<[AtomicU32]>,
}

impl FrameBuffer {
    /// Allocates a zeroed framebuffer. Every fragment starts invalid.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: (0..len).map(|_| Mutex::new(Pixel::default())).collect(),
            depth_hint: (0..len).map(|_| AtomicU32::new(UNWRITTEN)).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Snapshot of the fragment stored at `(x, y)`.
    ///
    /// Out-of-bounds coordinates yield an invalid default fragment.
    #[must_use]
    pub fn at(&self, x: u32, y: u32) -> FragmentInfo {
        match self.index(x, y) {
            Some(i) => self.pixels[i].lock().fragment.clone(),
            None => FragmentInfo::default(),
        }
    }

    /// Runs `f` on the fragment at `(x, y)` under the pixel's lock, without
    /// cloning it. `None` out of bounds.
    pub fn inspect<R>(&self, x: u32, y: u32, f: impl FnOnce(&FragmentInfo) -> R) -> Option<R> {
        self.index(x, y).map(|i| f(&self.pixels[i].lock().fragment))
    }

    /// Stored depth at `(x, y)`, or `None` if the pixel is unwritten or out of
    /// bounds.
    #[must_use]
    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        self.inspect(x, y, |f| f.ok.then_some(f.depth)).flatten()
    }

    /// `true` if a fragment at `depth` would win at `(x, y)`: the pixel is
    /// unwritten or `depth` is larger than the stored depth.
    ///
    /// Always `false` out of bounds.
    #[must_use]
    pub fn depth_test(&self, x: u32, y: u32, depth: f32) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        let pixel = self.pixels[i].lock();
        !pixel.fragment.ok || depth > pixel.fragment.depth
    }

    /// Commits `info` at `(x, y)` if it wins the depth test.
    ///
    /// The stored fragment is marked valid and carries `(x, y)`; the color
    /// pixel takes `info.color` and the depth pixel a grayscale encoding of
    /// `info.depth`. Out-of-bounds coordinates and NaN depths are ignored.
    /// Returns whether the fragment was committed.
    pub fn set(&self, x: u32, y: u32, mut info: FragmentInfo) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        if info.depth.is_nan() {
            return false;
        }

        // Fast path: the hint only ever trails the locked depth, so a reject
        // here is always correct.
        let hint = self.depth_hint[i].load(Ordering::Relaxed);
        if hint != UNWRITTEN && info.depth <= f32::from_bits(hint) {
            return false;
        }

        let mut pixel = self.pixels[i].lock();
        if pixel.fragment.ok && info.depth <= pixel.fragment.depth {
            return false;
        }

        info.ok = true;
        info.x = x;
        info.y = y;
        pixel.color = info.color;
        pixel.depth = encode_depth(info.depth);
        self.depth_hint[i].store(info.depth.to_bits(), Ordering::Relaxed);
        pixel.fragment = info;
        true
    }

    /// Whether any fragment has been committed at `(x, y)`.
    ///
    /// Reads the lock-free hint; exact once the pass writing this buffer has
    /// returned.
    #[must_use]
    pub fn is_written(&self, x: u32, y: u32) -> bool {
        self.index(x, y)
            .is_some_and(|i| self.depth_hint[i].load(Ordering::Relaxed) != UNWRITTEN)
    }

    /// Row-major, top-left-origin copy of the color pixels.
    #[must_use]
    pub fn color_image(&self) -> RgbaImage {
        self.collect_image(|pixel| pixel.color)
    }

    /// Row-major, top-left-origin copy of the depth pixels.
    ///
    /// Gray level is `depth * 255` clamped to `[0, 255]` with opaque alpha;
    /// unwritten pixels are all-zero.
    #[must_use]
    pub fn depth_image(&self) -> RgbaImage {
        self.collect_image(|pixel| pixel.depth)
    }

    fn collect_image(&self, channel: impl Fn(&Pixel) -> Rgba<u8>) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let i = y as usize * self.width as usize + x as usize;
            channel(&self.pixels[i].lock())
        })
    }

    /// Resets every pixel to the freshly allocated state.
    ///
    /// Takes `&mut self`: no pass may be in flight.
    pub fn clear(&mut self) {
        for pixel in self.pixels.iter_mut() {
            *pixel.get_mut() = Pixel::default();
        }
        for hint in self.depth_hint.iter_mut() {
            *hint.get_mut() = UNWRITTEN;
        }
    }
}

fn encode_depth(depth: f32) -> Rgba<u8> {
    let g = (depth.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([g, g, g, 255])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn fragment(depth: f32, color: [u8; 4]) -> FragmentInfo {
        FragmentInfo {
            depth,
            color: Rgba(color),
            ..Default::default()
        }
    }

    #[test]
    fn fresh_buffer_passes_every_depth_test() {
        let fb = FrameBuffer::new(7, 5);
        for y in 0..5 {
            for x in 0..7 {
                assert!(fb.depth_test(x, y, -1.0e9));
                assert!(!fb.at(x, y).ok);
            }
        }
        assert!(!fb.depth_test(7, 0, 1.0));
        assert!(!fb.depth_test(0, 5, 1.0));
    }

    #[test]
    fn depth_reads_only_written_pixels() {
        let fb = FrameBuffer::new(3, 3);
        assert_eq!(fb.depth(1, 1), None);
        fb.set(1, 1, fragment(0.625, [1, 2, 3, 255]));
        assert_eq!(fb.depth(1, 1), Some(0.625));
        assert_eq!(fb.depth(3, 1), None);
        assert_eq!(fb.inspect(1, 1, |f| f.color), Some(Rgba([1, 2, 3, 255])));
        assert_eq!(fb.inspect(0, 3, |f| f.ok), None);
    }

    #[test]
    fn losing_set_leaves_pixel_untouched() {
        let fb = FrameBuffer::new(4, 4);
        assert!(fb.set(1, 2, fragment(0.5, [255, 0, 0, 255])));

        let before = fb.at(1, 2);
        let color_before = fb.color_image();
        let depth_before = fb.depth_image();

        assert!(!fb.set(1, 2, fragment(0.25, [0, 255, 0, 255])));
        assert!(!fb.set(1, 2, fragment(0.5, [0, 0, 255, 255])));

        let after = fb.at(1, 2);
        assert!(after.ok);
        assert_eq!((after.x, after.y), (1, 2));
        assert_eq!(after.depth, before.depth);
        assert_eq!(after.color, before.color);
        assert_eq!(fb.color_image(), color_before);
        assert_eq!(fb.depth_image(), depth_before);
        assert_eq!(*fb.depth_image().get_pixel(1, 2), Rgba([128, 128, 128, 255]));

        assert!(fb.depth_test(1, 2, 0.75));
        assert!(!fb.depth_test(1, 2, 0.5));
    }

    #[test]
    fn larger_depth_replaces_stored_fragment() {
        let fb = FrameBuffer::new(2, 2);
        fb.set(0, 0, fragment(0.2, [1, 1, 1, 255]));
        assert!(fb.set(0, 0, fragment(0.9, [9, 9, 9, 255])));
        assert_eq!(fb.at(0, 0).color, Rgba([9, 9, 9, 255]));
        assert_eq!(*fb.color_image().get_pixel(0, 0), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn out_of_bounds_is_silent() {
        let fb = FrameBuffer::new(3, 3);
        assert!(!fb.set(3, 0, fragment(1.0, [255; 4])));
        assert!(!fb.at(100, 100).ok);
        assert!(!fb.is_written(3, 3));
        assert!(!fb.set(0, 0, fragment(f32::NAN, [255; 4])));
        assert!(!fb.is_written(0, 0));
    }

    #[test]
    fn parallel_disjoint_writers_are_all_reflected() {
        let (w, h) = (64u32, 48u32);
        let fb = Arc::new(FrameBuffer::new(w, h));
        let writers = 8u32;

        thread::scope(|scope| {
            for t in 0..writers {
                let fb = Arc::clone(&fb);
                scope.spawn(move || {
                    for y in (t..h).step_by(writers as usize) {
                        for x in 0..w {
                            let c = (x ^ y) as u8;
                            fb.set(x, y, fragment(0.5, [c, t as u8, 0, 255]));
                        }
                    }
                });
            }
        });

        let image = fb.color_image();
        for y in 0..h {
            for x in 0..w {
                assert!(fb.is_written(x, y));
                let expected = Rgba([(x ^ y) as u8, (y % writers) as u8, 0, 255]);
                assert_eq!(*image.get_pixel(x, y), expected);
            }
        }
    }

    #[test]
    fn contended_pixel_keeps_the_largest_depth() {
        let fb = FrameBuffer::new(1, 1);
        thread::scope(|scope| {
            for t in 0..16u8 {
                let fb = &fb;
                scope.spawn(move || {
                    fb.set(0, 0, fragment(f32::from(t) / 16.0, [t, 0, 0, 255]));
                });
            }
        });
        let stored = fb.at(0, 0);
        assert_eq!(stored.color, Rgba([15, 0, 0, 255]));
        assert!((stored.depth - 15.0 / 16.0).abs() < f32::EPSILON);
    }

    #[test]
    fn clear_resets_to_fresh_state() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.set(1, 0, fragment(0.3, [5, 5, 5, 255]));
        fb.clear();
        assert!(!fb.is_written(1, 0));
        assert!(fb.depth_test(1, 0, 0.0));
        assert_eq!(*fb.color_image().get_pixel(1, 0), Rgba([0, 0, 0, 0]));
    }
}

//! Tile-scheduled per-pixel passes.
//!
//! A screen pass maps a shader `shade(x, y, current) -> new` over every pixel
//! of an image exactly once, spreading the work over a [`WorkerPool`].
//!
//! # Tiling
//!
//! With a block size `B`, the image is cut into `W / B × H / B` full blocks,
//! one job each, plus at most two margin jobs:
//!
//! ```text
//!   +----+----+----+--+
//!   |    |    |    |R |   R: right strip   x in [ws*B, W), y in [0, hs*B)
//!   +----+----+----+  |
//!   |    |    |    |  |
//!   +----+----+----+--+
//!   |   bottom strip  C|  C: corner, owned by the bottom job
//!   +-----------------+
//! ```
//!
//! An image smaller than one block in both directions is one job.
//!
//! # Data flow
//!
//! Jobs read the image through a shared borrow and send their results over a
//! channel; once every job has finished the results are written back.
//! [`color::DISCARD`] results leave their pixel unchanged.

use image::{Rgba, RgbaImage};
use smallvec::{SmallVec, smallvec};

use crate::resources::color;
use crate::utils::WorkerPool;

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Rect {
    #[must_use]
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    #[inline]
    #[must_use]
    pub fn area(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.x1 - self.x0) as usize * (self.y1 - self.y0) as usize
        }
    }

    /// Pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| (x, y)))
    }
}

/// The pixels handled by one pool job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileJob {
    pub rects: SmallVec<[Rect; 2]>,
}

impl TileJob {
    fn single(rect: Rect) -> Self {
        Self { rects: smallvec![rect] }
    }

    #[must_use]
    pub fn area(&self) -> usize {
        self.rects.iter().map(Rect::area).sum()
    }

    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.rects.iter().flat_map(Rect::pixels)
    }
}

/// Partitions a `width × height` image into jobs covering every pixel exactly
/// once. A `block_size` of zero yields a single job.
#[must_use]
pub fn plan_tiles(width: u32, height: u32, block_size: u32) -> Vec<TileJob> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let whole = Rect::new(0, 0, width, height);
    if block_size == 0 {
        return vec![TileJob::single(whole)];
    }

    let b = block_size;
    let wsteps = width / b;
    let hsteps = height / b;
    if wsteps == 0 && hsteps == 0 {
        return vec![TileJob::single(whole)];
    }

    let (gw, gh) = (wsteps * b, hsteps * b);
    let mut jobs = Vec::with_capacity((wsteps * hsteps) as usize + 2);
    for j in 0..hsteps {
        for i in 0..wsteps {
            jobs.push(TileJob::single(Rect::new(i * b, j * b, (i + 1) * b, (j + 1) * b)));
        }
    }

    let right = Rect::new(gw, 0, width, gh);
    if !right.is_empty() {
        jobs.push(TileJob::single(right));
    }

    let bottom: SmallVec<[Rect; 2]> = [Rect::new(0, gh, gw, height), Rect::new(gw, gh, width, height)]
        .into_iter()
        .filter(|r| !r.is_empty())
        .collect();
    if !bottom.is_empty() {
        jobs.push(TileJob { rects: bottom });
    }
    jobs
}

/// A screen pass bound to a pool and a block size.
#[derive(Debug, Clone, Copy)]
pub struct ScreenPass<'a> {
    pool: &'a WorkerPool,
    block_size: u32,
}

impl<'a> ScreenPass<'a> {
    #[must_use]
    pub fn new(pool: &'a WorkerPool, block_size: u32) -> Self {
        Self { pool, block_size }
    }

    #[inline]
    #[must_use]
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Runs `shade` once per pixel of `image` and writes back every result
    /// other than [`color::DISCARD`]. Returns after all jobs have finished.
    pub fn run<F>(&self, image: &mut RgbaImage, shade: F)
    where
        F: Fn(u32, u32, Rgba<u8>) -> Rgba<u8> + Sync,
    {
        let jobs = plan_tiles(image.width(), image.height(), self.block_size);
        if jobs.is_empty() {
            return;
        }
        log::trace!(
            "screen pass: {}x{} in {} jobs (block {})",
            image.width(),
            image.height(),
            jobs.len(),
            self.block_size
        );

        let (sender, receiver) = flume::unbounded::<(TileJob, Vec<Rgba<u8>>)>();
        {
            let source: &RgbaImage = image;
            let shade = &shade;
            self.pool.scoped(|scope| {
                for job in jobs {
                    let sender = sender.clone();
                    scope.execute(move || {
                        let colors = job
                            .pixels()
                            .map(|(x, y)| shade(x, y, *source.get_pixel(x, y)))
                            .collect::<Vec<_>>();
                        // The receiver outlives the scope.
                        let _ = sender.send((job, colors));
                    });
                }
            });
        }
        drop(sender);

        for (job, colors) in receiver.drain() {
            for ((x, y), c) in job.pixels().zip(colors) {
                if !color::is_discard(c) {
                    image.put_pixel(x, y, c);
                }
            }
        }
    }
}

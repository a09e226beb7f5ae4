//! Software Renderer
//!
//! The [`Renderer`] turns a [`Scene`] into an RGBA image entirely on the CPU.
//!
//! # Frame Structure
//!
//! 1. The framebuffer is cleared and a [`FrameContext`] is built from the
//!    camera and the scene's lights.
//! 2. A geometry pass ([`ForwardPass`] or [`DeferredPass`]) rasterizes every
//!    drawable mesh, one worker-pool job per mesh, into the depth-tested
//!    [`FrameBuffer`].
//! 3. [`ShadowPass`] and [`AmbientOcclusionPass`] darken the pixels whose
//!    materials opt in, reading depths and world positions back from the
//!    framebuffer.
//! 4. Post-processing passes ([`AntiAliasingPass`], [`GammaPass`]) rewrite
//!    the color target through tile-scheduled [`ScreenPass`]es.
//!
//! # Concurrency
//!
//! The only parallel units are per-mesh draw jobs and screen-pass tiles,
//! all bounded by one [`WorkerPool`]. Pixels are synchronized by the
//! framebuffer's per-pixel locks; there is no global lock. Every pass returns
//! only after its jobs have finished.

pub mod context;
pub mod fragment;
pub mod framebuffer;
pub mod passes;
pub mod raster;
pub mod screen_pass;
pub mod settings;

pub use context::FrameContext;
pub use fragment::{Attributes, FragmentInfo, Varying};
pub use framebuffer::FrameBuffer;
pub use passes::{
    AmbientOcclusionPass, AntiAliasingPass, DeferredPass, ForwardPass, GammaPass, RenderNode, ShadowPass,
};
pub use screen_pass::ScreenPass;
pub use settings::{RenderPath, RendererSettings};

use std::time::Instant;

use image::{Rgba, RgbaImage};

use crate::errors::{Result, TesseraError};
use crate::scene::{CameraView, Scene};
use crate::utils::WorkerPool;

pub struct Renderer {
    settings: RendererSettings,
    pool: WorkerPool,
    frame_buffer: FrameBuffer,
}

impl Renderer {
    /// Validates `settings` and allocates the worker pool and a framebuffer of
    /// [`RendererSettings::render_size`].
    pub fn new(settings: RendererSettings) -> Result<Self> {
        settings.validate()?;
        let (width, height) = settings.render_size();
        let pool = create_pool(settings.concurrency);
        log::debug!(
            "renderer: {}x{} (msaa {}), {} workers, block {}",
            settings.width,
            settings.height,
            settings.msaa,
            pool.limit(),
            settings.block_size
        );
        Ok(Self {
            frame_buffer: FrameBuffer::new(width, height),
            pool,
            settings,
        })
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Applies new settings, reallocating the pool and framebuffer only when
    /// their sizes change.
    pub fn set_settings(&mut self, settings: RendererSettings) -> Result<()> {
        settings.validate()?;
        if settings.concurrency != self.settings.concurrency {
            self.pool = create_pool(settings.concurrency);
        }
        if settings.render_size() != self.settings.render_size() {
            let (width, height) = settings.render_size();
            self.frame_buffer = FrameBuffer::new(width, height);
        }
        self.settings = settings;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// The framebuffer of the last frame.
    #[inline]
    #[must_use]
    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    /// Depth image of the last frame, at render size.
    #[must_use]
    pub fn depth_image(&self) -> RgbaImage {
        self.frame_buffer.depth_image()
    }

    /// Runs `shade` once per pixel of `image` on the renderer's pool.
    pub fn screen_pass<F>(&self, image: &mut RgbaImage, shade: F)
    where
        F: Fn(u32, u32, Rgba<u8>) -> Rgba<u8> + Sync,
    {
        ScreenPass::new(&self.pool, self.settings.block_size).run(image, shade);
    }

    /// Renders `scene` from its first camera in traversal order.
    pub fn render(&mut self, scene: &Scene) -> Result<RgbaImage> {
        let camera = scene.active_camera().ok_or(TesseraError::MissingCamera)?;
        Ok(self.render_with_camera(scene, &camera))
    }

    /// Renders `scene` from `camera`.
    pub fn render_with_camera(&mut self, scene: &Scene, camera: &dyn CameraView) -> RgbaImage {
        let frame_start = Instant::now();
        self.frame_buffer.clear();

        let passes = self.build_passes();
        let ctx = FrameContext::new(scene, camera, &self.frame_buffer, &self.pool, &self.settings);
        let mut target = RgbaImage::new(0, 0);
        for pass in &passes {
            let start = Instant::now();
            pass.run(&ctx, &mut target);
            log::debug!("{} took {:?}", pass.name(), start.elapsed());
        }

        log::debug!("frame took {:?}", frame_start.elapsed());
        target
    }

    fn build_passes(&self) -> Vec<Box<dyn RenderNode>> {
        let mut passes: Vec<Box<dyn RenderNode>> = Vec::with_capacity(5);
        match self.settings.path {
            RenderPath::Forward => passes.push(Box::new(ForwardPass)),
            RenderPath::Deferred => passes.push(Box::new(DeferredPass)),
        }
        // Both are no-ops unless some material opts in.
        passes.push(Box::new(ShadowPass::default()));
        passes.push(Box::new(AmbientOcclusionPass::for_supersampling(self.settings.msaa)));
        if self.settings.msaa > 1 {
            passes.push(Box::new(AntiAliasingPass::new(self.settings.msaa)));
        }
        if self.settings.gamma_correction {
            passes.push(Box::new(GammaPass::new(self.settings.gamma)));
        }
        passes
    }
}

fn create_pool(concurrency: usize) -> WorkerPool {
    if concurrency == 0 {
        WorkerPool::default()
    } else {
        WorkerPool::new(concurrency)
    }
}

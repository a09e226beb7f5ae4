//! Per-frame render context.
//!
//! [`FrameContext`] bundles the read-only references every pass needs for one
//! frame: the scene, the camera, the framebuffer, the worker pool and the
//! settings, plus the [`ShadingContext`] resolved from the scene's lights.
//!
//! All fields are shared borrows. The framebuffer is written through its
//! per-pixel locks, so any number of draw jobs may hold the context at once;
//! reallocating the framebuffer requires `&mut Renderer`, which cannot coexist
//! with a live context.

use glam::Mat4;

use crate::renderer::framebuffer::FrameBuffer;
use crate::renderer::screen_pass::ScreenPass;
use crate::renderer::settings::RendererSettings;
use crate::resources::material::ShadingContext;
use crate::resources::uniforms::Uniforms;
use crate::scene::{CameraView, Scene};
use crate::utils::WorkerPool;

pub struct FrameContext<'a> {
    pub scene: &'a Scene,
    pub camera: &'a dyn CameraView,
    pub frame_buffer: &'a FrameBuffer,
    pub pool: &'a WorkerPool,
    pub settings: &'a RendererSettings,
    pub shading: ShadingContext,
    view: Mat4,
    projection: Mat4,
}

impl<'a> FrameContext<'a> {
    #[must_use]
    pub fn new(
        scene: &'a Scene,
        camera: &'a dyn CameraView,
        frame_buffer: &'a FrameBuffer,
        pool: &'a WorkerPool,
        settings: &'a RendererSettings,
    ) -> Self {
        let shading = ShadingContext {
            camera_position: camera.position(),
            lights: scene.placed_lights(),
        };
        Self {
            scene,
            camera,
            frame_buffer,
            pool,
            settings,
            shading,
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
        }
    }

    /// Uniforms for an object placed at `model`, sized to the framebuffer.
    #[must_use]
    pub fn uniforms(&self, model: Mat4) -> Uniforms {
        Uniforms::new(
            model,
            self.view,
            self.projection,
            self.frame_buffer.width(),
            self.frame_buffer.height(),
        )
    }

    /// A screen pass on this frame's pool and block size.
    #[must_use]
    pub fn screen_pass(&self) -> ScreenPass<'a> {
        ScreenPass::new(self.pool, self.settings.block_size)
    }
}

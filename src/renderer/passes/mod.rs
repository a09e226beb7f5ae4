//! Render passes.
//!
//! A frame is a short chain of [`RenderNode`]s, each reading the shared
//! [`FrameContext`] and transforming the frame's color target:
//!
//! ```text
//! ForwardPass | DeferredPass  →  ShadowPass  →  AmbientOcclusionPass
//!                             →  AntiAliasingPass (msaa > 1)  →  GammaPass (optional)
//! ```
//!
//! The geometry passes fill the target from the scene; the post-processing
//! passes only read and rewrite the target through screen passes. Shadow and
//! ambient occlusion touch only pixels whose material opts in through
//! [`MaterialFlags`](crate::resources::material::MaterialFlags).

mod ambient_occlusion;
mod anti_aliasing;
mod deferred;
mod forward;
mod gamma;
mod shadow;

pub use ambient_occlusion::AmbientOcclusionPass;
pub use anti_aliasing::AntiAliasingPass;
pub use deferred::DeferredPass;
pub use forward::ForwardPass;
pub use gamma::GammaPass;
pub use shadow::ShadowPass;

use std::sync::atomic::{AtomicUsize, Ordering};

use glam::Mat4;
use image::RgbaImage;

use crate::renderer::context::FrameContext;
use crate::renderer::framebuffer::FrameBuffer;
use crate::renderer::raster;
use crate::resources::material::ShadingContext;
use crate::resources::mesh::Mesh;
use crate::resources::uniforms::Uniforms;
use crate::scene::{Object, Scene};
use crate::utils::WorkerPool;

/// A step of the frame.
pub trait RenderNode {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Reads `ctx` and updates `target`. Passes may resize `target`.
    fn run(&self, ctx: &FrameContext<'_>, target: &mut RgbaImage);
}

/// Rasterizes every drawable mesh of the scene into the frame's framebuffer
/// from the frame's camera. Returns the number of fragments committed.
///
/// `shading` selects forward shading; `None` stores unshaded fragments.
pub(crate) fn draw_scene(ctx: &FrameContext<'_>, shading: Option<&ShadingContext>) -> usize {
    draw_meshes(ctx.pool, ctx.scene, ctx.frame_buffer, |world| ctx.uniforms(world), shading)
}

/// Drawable meshes of `scene` with their world matrices, in traversal order.
pub(crate) fn drawable_meshes(scene: &Scene) -> Vec<(&Mesh, Mat4)> {
    let mut draws: Vec<(&Mesh, Mat4)> = Vec::new();
    scene.iter_objects(|object, world| {
        if let Object::Mesh(mesh) = object {
            if mesh.is_drawable() {
                draws.push((mesh, *world));
            } else {
                log::debug!("skipping mesh '{}': invisible or without material", mesh.name);
            }
        }
        true
    });
    draws
}

/// Rasterizes every drawable mesh of `scene` into `fb`, one pool job per mesh,
/// with the uniforms `uniforms` builds from each world matrix.
pub(crate) fn draw_meshes<U>(
    pool: &WorkerPool,
    scene: &Scene,
    fb: &FrameBuffer,
    uniforms: U,
    shading: Option<&ShadingContext>,
) -> usize
where
    U: Fn(Mat4) -> Uniforms + Sync,
{
    let draws = drawable_meshes(scene);
    let committed = AtomicUsize::new(0);
    pool.scoped(|scope| {
        for (mesh, world) in &draws {
            let committed = &committed;
            let uniforms = &uniforms;
            scope.execute(move || {
                let n = raster::draw_mesh(fb, mesh, &uniforms(*world), shading);
                committed.fetch_add(n, Ordering::Relaxed);
            });
        }
    });

    let committed = committed.into_inner();
    log::debug!("drew {} meshes, {} fragments committed", draws.len(), committed);
    committed
}

use glam::{Mat4, Vec3};

/// Per-object transformation bundle handed to vertex shaders.
///
/// All matrices are column-major and act on column vectors. `viewport` maps
/// normalized device coordinates to screen pixels with a top-left origin and
/// leaves depth untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    pub model: Mat4,
    pub view: Mat4,
    pub view_inv: Mat4,
    pub projection: Mat4,
    pub projection_inv: Mat4,
    pub viewport: Mat4,
    pub viewport_inv: Mat4,
    /// Inverse transpose of `model`, for transforming normals.
    pub normal: Mat4,
}

impl Uniforms {
    #[must_use]
    pub fn new(model: Mat4, view: Mat4, projection: Mat4, width: u32, height: u32) -> Self {
        let viewport = viewport_matrix(width, height);
        Self {
            model,
            view,
            view_inv: view.inverse(),
            projection,
            projection_inv: projection.inverse(),
            viewport,
            viewport_inv: viewport.inverse(),
            normal: model.inverse().transpose(),
        }
    }

    /// Clip-space transform `projection * view * model`.
    #[inline]
    #[must_use]
    pub fn model_view_projection(&self) -> Mat4 {
        self.projection * self.view * self.model
    }

    /// Camera position in world space.
    #[inline]
    #[must_use]
    pub fn camera_position(&self) -> Vec3 {
        self.view_inv.w_axis.truncate()
    }
}

/// NDC `[-1, 1]²` to screen `[0, width] × [0, height]`, flipping y.
#[must_use]
pub fn viewport_matrix(width: u32, height: u32) -> Mat4 {
    let w = width as f32 / 2.0;
    let h = height as f32 / 2.0;
    Mat4::from_cols_array(&[
        w, 0.0, 0.0, 0.0, //
        0.0, -h, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        w, h, 0.0, 1.0,
    ])
}

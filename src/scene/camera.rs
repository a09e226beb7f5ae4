use std::borrow::Cow;

use glam::{Mat4, Vec3};

/// What the draw pipeline needs from a camera.
pub trait CameraView: Send + Sync {
    /// World to view space.
    fn view_matrix(&self) -> Mat4;
    /// View to clip space.
    ///
    /// The pipeline keeps the fragment with the larger depth, so projections
    /// must map nearer surfaces to larger NDC depth (reverse-Z).
    fn projection_matrix(&self) -> Mat4;
    /// Eye position in world space.
    fn position(&self) -> Vec3;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    Perspective,
    Orthographic,
}

/// A look-at camera with a reverse-Z projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub name: Cow<'static, str>,

    // === Pose ===
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,

    // === Projection ===
    pub projection_type: ProjectionType,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Half height of the orthographic view volume.
    pub ortho_size: f32,
}

impl Camera {
    /// `fov` is given in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            name: Cow::Borrowed("Camera"),
            position: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            projection_type: ProjectionType::Perspective,
            fov: fov.to_radians(),
            aspect,
            near,
            far,
            ortho_size: 1.0,
        }
    }

    #[must_use]
    pub fn new_orthographic(ortho_size: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            projection_type: ProjectionType::Orthographic,
            ortho_size,
            ..Self::new_perspective(45.0, aspect, near, far)
        }
    }

    /// Builder-style pose setter.
    #[must_use]
    pub fn looking_at(mut self, position: Vec3, target: Vec3, up: Vec3) -> Self {
        self.position = position;
        self.target = target;
        self.up = up;
        self
    }

    /// Returns a copy whose pose is carried into world space by `world_matrix`.
    #[must_use]
    pub fn transformed(&self, world_matrix: &Mat4) -> Self {
        Self {
            position: world_matrix.transform_point3(self.position),
            target: world_matrix.transform_point3(self.target),
            up: world_matrix.transform_vector3(self.up).normalize_or(Vec3::Y),
            ..self.clone()
        }
    }
}

impl CameraView for Camera {
    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    fn projection_matrix(&self) -> Mat4 {
        // Near and far are swapped on purpose: near maps to depth 1, far to 0.
        match self.projection_type {
            ProjectionType::Perspective => Mat4::perspective_rh(self.fov, self.aspect, self.far, self.near),
            ProjectionType::Orthographic => {
                let h = self.ortho_size;
                let w = h * self.aspect;
                Mat4::orthographic_rh(-w, w, -h, h, self.far, self.near)
            }
        }
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}

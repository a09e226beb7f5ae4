use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    /// Parallel rays along the node's `-Z` axis.
    Directional,
    /// Omnidirectional emitter at the node's origin. No attenuation.
    Point,
    /// Uniform light reaching every surface regardless of orientation.
    Ambient,
}

/// Light payload of a scene node.
///
/// Position and direction come from the owning node's world matrix; see
/// [`Light::place`].
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Light {
    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Directional,
        }
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Point,
        }
    }

    #[must_use]
    pub fn new_ambient(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Ambient,
        }
    }

    /// Resolves this light in world space using its node's world matrix.
    #[must_use]
    pub fn place(&self, world_matrix: &Mat4) -> PlacedLight {
        PlacedLight {
            kind: self.kind,
            radiance: self.color * self.intensity,
            position: world_matrix.transform_point3(Vec3::ZERO),
            direction: world_matrix.transform_vector3(Vec3::NEG_Z).normalize_or(Vec3::NEG_Z),
        }
    }
}

/// A light resolved in world space for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedLight {
    pub kind: LightKind,
    /// `color * intensity`.
    pub radiance: Vec3,
    pub position: Vec3,
    /// Direction the light travels in; meaningful for directional lights.
    pub direction: Vec3,
}

impl PlacedLight {
    /// Unit vector from `point` towards the light, or `None` for ambient
    /// lights and point lights sitting exactly on `point`.
    #[must_use]
    pub fn direction_to_light(&self, point: Vec3) -> Option<Vec3> {
        match self.kind {
            LightKind::Directional => Some(-self.direction),
            LightKind::Point => (self.position - point).try_normalize(),
            LightKind::Ambient => None,
        }
    }
}

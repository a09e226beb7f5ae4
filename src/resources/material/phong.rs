use std::sync::Arc;

use glam::{Vec3, Vec4};
use image::Rgba;

use crate::renderer::fragment::FragmentInfo;
use crate::resources::color;
use crate::resources::material::{ShadingContext, WORLD_POSITION};
use crate::resources::texture::Texture;
use crate::scene::light::LightKind;

/// Blinn-Phong material.
///
/// Lights contribute without distance attenuation. The surface position is
/// read from the [`WORLD_POSITION`] attribute; fragments lacking it are lit as
/// if they sat at the world origin.
#[derive(Debug, Clone)]
pub struct BlinnPhongMaterial {
    pub color: Vec4,
    pub texture: Option<Arc<Texture>>,
    /// Diffuse factor.
    pub kdiff: f32,
    /// Specular factor.
    pub kspec: f32,
    pub shininess: f32,
}

impl BlinnPhongMaterial {
    #[must_use]
    pub fn new(color: Vec4) -> Self {
        Self {
            color,
            texture: None,
            kdiff: 0.8,
            kspec: 1.0,
            shininess: 100.0,
        }
    }

    #[must_use]
    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub(super) fn shade(&self, fragment: &FragmentInfo, context: &ShadingContext, flat: bool) -> Rgba<u8> {
        let base = super::base_color(self.color, self.texture.as_deref(), fragment);
        let albedo = base.truncate();

        let normal = if flat { fragment.face_normal } else { fragment.normal }.normalize_or_zero();
        let position = fragment
            .attribute(WORLD_POSITION)
            .and_then(|v| v.as_vec3())
            .unwrap_or(Vec3::ZERO);
        let view = (context.camera_position - position).normalize_or_zero();

        let mut radiance = Vec3::ZERO;
        for light in &context.lights {
            if light.kind == LightKind::Ambient {
                radiance += albedo * light.radiance;
                continue;
            }
            let Some(to_light) = light.direction_to_light(position) else {
                continue;
            };
            let diffuse = normal.dot(to_light).max(0.0) * self.kdiff;
            let half = (to_light + view).normalize_or_zero();
            let specular = if diffuse > 0.0 {
                normal.dot(half).max(0.0).powf(self.shininess) * self.kspec
            } else {
                0.0
            };
            radiance += (albedo * diffuse + Vec3::splat(specular)) * light.radiance;
        }

        color::from_vec4(radiance.extend(base.w))
    }
}

impl Default for BlinnPhongMaterial {
    fn default() -> Self {
        Self::new(Vec4::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fragment::Varying;
    use crate::scene::light::PlacedLight;
    use smallvec::smallvec;

    fn fragment_facing(normal: Vec3) -> FragmentInfo {
        let mut fragment = FragmentInfo {
            normal,
            face_normal: normal,
            color: color::WHITE,
            ..Default::default()
        };
        fragment.attributes.insert(WORLD_POSITION, Varying::Vec3(Vec3::ZERO));
        fragment
    }

    fn light(kind: LightKind, direction: Vec3) -> PlacedLight {
        PlacedLight {
            kind,
            radiance: Vec3::ONE,
            position: Vec3::ZERO,
            direction,
        }
    }

    #[test]
    fn surfaces_facing_away_get_no_direct_light() {
        let material = BlinnPhongMaterial {
            kdiff: 1.0,
            kspec: 0.0,
            ..BlinnPhongMaterial::new(Vec4::ONE)
        };
        let context = ShadingContext {
            camera_position: Vec3::Z,
            lights: smallvec![light(LightKind::Directional, Vec3::NEG_Z)],
        };
        assert_eq!(material.shade(&fragment_facing(Vec3::Z), &context, false), color::WHITE);
        assert_eq!(material.shade(&fragment_facing(Vec3::NEG_Z), &context, false), color::BLACK);
    }

    #[test]
    fn ambient_light_ignores_orientation() {
        let material = BlinnPhongMaterial::new(Vec4::new(0.5, 0.5, 0.5, 1.0));
        let context = ShadingContext {
            camera_position: Vec3::Z,
            lights: smallvec![light(LightKind::Ambient, Vec3::ZERO)],
        };
        let out = material.shade(&fragment_facing(Vec3::NEG_Z), &context, false);
        assert_eq!(out, Rgba([128, 128, 128, 255]));
    }
}

use std::sync::Arc;

use glam::Vec4;
use image::Rgba;

use crate::renderer::fragment::FragmentInfo;
use crate::resources::color;
use crate::resources::texture::Texture;

/// Unlit material: `color * vertex color * texture`.
#[derive(Debug, Clone)]
pub struct BasicMaterial {
    pub color: Vec4,
    pub texture: Option<Arc<Texture>>,
}

impl BasicMaterial {
    #[must_use]
    pub fn new(color: Vec4) -> Self {
        Self { color, texture: None }
    }

    #[must_use]
    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub(super) fn shade(&self, fragment: &FragmentInfo) -> Rgba<u8> {
        color::from_vec4(super::base_color(self.color, self.texture.as_deref(), fragment))
    }
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self::new(Vec4::ONE)
    }
}

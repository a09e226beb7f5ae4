//! Materials and the shader-stage contract.
//!
//! A [`Material`] decides how a mesh is shaded. Dispatch is closed over three
//! kinds:
//!
//! - [`MaterialKind::Basic`]: unlit color or texture.
//! - [`MaterialKind::BlinnPhong`]: diffuse + specular lighting.
//! - [`MaterialKind::Custom`]: user-provided vertex and fragment callables.
//!
//! Every kind runs through the same two stages. The vertex stage maps one
//! object-space [`Vertex`] to a [`ShadedVertex`] in clip space; the fragment
//! stage maps one [`FragmentInfo`] to a color. A fragment stage returning
//! [`color::DISCARD`] leaves the pixel untouched.

mod basic;
mod phong;

pub use basic::BasicMaterial;
pub use phong::BlinnPhongMaterial;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use glam::{Vec2, Vec3, Vec4};
use image::Rgba;
use smallvec::SmallVec;

use crate::renderer::fragment::{Attributes, FragmentInfo, Varying};
use crate::resources::color;
use crate::resources::geometry::Vertex;
use crate::resources::texture::Texture;
use crate::resources::uniforms::Uniforms;
use crate::scene::light::PlacedLight;

/// Name of the world-space position attribute written by the built-in vertex
/// stage.
pub const WORLD_POSITION: &str = "world_position";

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u32 {
        /// Light with the triangle's face normal instead of the interpolated one.
        const FLAT_SHADING    = 1 << 0;
        /// Skip triangles facing away from the camera.
        const CULL_BACK_FACES = 1 << 1;
        /// Darken surfaces hidden from the first directional light.
        const RECEIVE_SHADOW  = 1 << 2;
        /// Darken creases and contact areas in screen space.
        const AMBIENT_OCCLUSION = 1 << 3;
    }
}

// ============================================================================
// Shader stage types
// ============================================================================

/// Output of the vertex stage.
#[derive(Debug, Clone, Default)]
pub struct ShadedVertex {
    /// Clip-space position.
    pub position: Vec4,
    /// World-space normal.
    pub normal: Vec3,
    pub uv: Vec2,
    /// Normalized RGBA.
    pub color: Vec4,
    pub attributes: Attributes,
}

pub type VertexShaderFn = Arc<dyn Fn(&Vertex, &Uniforms) -> ShadedVertex + Send + Sync>;
pub type FragmentShaderFn = Arc<dyn Fn(&FragmentInfo, &ShadingContext) -> Rgba<u8> + Send + Sync>;

/// Per-frame inputs shared by every fragment of a pass.
#[derive(Debug, Clone, Default)]
pub struct ShadingContext {
    pub camera_position: Vec3,
    pub lights: SmallVec<[PlacedLight; 4]>,
}

/// The built-in vertex stage: clip-space position, world-space normal and the
/// [`WORLD_POSITION`] attribute.
#[must_use]
pub fn standard_vertex_shader(vertex: &Vertex, uniforms: &Uniforms) -> ShadedVertex {
    let position = uniforms.model_view_projection() * vertex.position.extend(1.0);
    let normal = uniforms.normal.transform_vector3(vertex.normal).normalize_or_zero();
    let world = uniforms.model.transform_point3(vertex.position);

    let mut attributes = Attributes::default();
    attributes.insert(WORLD_POSITION, Varying::Vec3(world));

    ShadedVertex {
        position,
        normal,
        uv: vertex.uv,
        color: vertex.color,
        attributes,
    }
}

// ============================================================================
// Material
// ============================================================================

#[derive(Clone)]
pub enum MaterialKind {
    Basic(BasicMaterial),
    BlinnPhong(BlinnPhongMaterial),
    Custom {
        vertex: VertexShaderFn,
        fragment: FragmentShaderFn,
    },
}

impl fmt::Debug for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(m) => f.debug_tuple("Basic").field(m).finish(),
            Self::BlinnPhong(m) => f.debug_tuple("BlinnPhong").field(m).finish(),
            Self::Custom { .. } => f.write_str("Custom"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Material {
    pub name: Cow<'static, str>,
    pub kind: MaterialKind,
    pub flags: MaterialFlags,
}

impl Material {
    #[must_use]
    pub fn new(kind: MaterialKind) -> Self {
        let name = match &kind {
            MaterialKind::Basic(_) => "BasicMaterial",
            MaterialKind::BlinnPhong(_) => "BlinnPhongMaterial",
            MaterialKind::Custom { .. } => "CustomMaterial",
        };
        Self {
            name: Cow::Borrowed(name),
            kind,
            flags: MaterialFlags::empty(),
        }
    }

    #[must_use]
    pub fn new_basic(color: Vec4) -> Self {
        Self::new(MaterialKind::Basic(BasicMaterial::new(color)))
    }

    #[must_use]
    pub fn new_blinn_phong(color: Vec4) -> Self {
        Self::new(MaterialKind::BlinnPhong(BlinnPhongMaterial::new(color)))
    }

    /// A material driven entirely by user callables.
    #[must_use]
    pub fn new_custom<V, F>(vertex: V, fragment: F) -> Self
    where
        V: Fn(&Vertex, &Uniforms) -> ShadedVertex + Send + Sync + 'static,
        F: Fn(&FragmentInfo, &ShadingContext) -> Rgba<u8> + Send + Sync + 'static,
    {
        Self::new(MaterialKind::Custom {
            vertex: Arc::new(vertex),
            fragment: Arc::new(fragment),
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: MaterialFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    #[must_use]
    pub fn flat_shading(&self) -> bool {
        self.flags.contains(MaterialFlags::FLAT_SHADING)
    }

    #[inline]
    #[must_use]
    pub fn cull_back_faces(&self) -> bool {
        self.flags.contains(MaterialFlags::CULL_BACK_FACES)
    }

    #[inline]
    #[must_use]
    pub fn receive_shadow(&self) -> bool {
        self.flags.contains(MaterialFlags::RECEIVE_SHADOW)
    }

    #[inline]
    #[must_use]
    pub fn ambient_occlusion(&self) -> bool {
        self.flags.contains(MaterialFlags::AMBIENT_OCCLUSION)
    }

    /// Runs the vertex stage for one vertex.
    #[must_use]
    pub fn vertex_shader(&self, vertex: &Vertex, uniforms: &Uniforms) -> ShadedVertex {
        match &self.kind {
            MaterialKind::Custom { vertex: shader, .. } => (**shader)(vertex, uniforms),
            MaterialKind::Basic(_) | MaterialKind::BlinnPhong(_) => standard_vertex_shader(vertex, uniforms),
        }
    }

    /// Runs the fragment stage for one fragment.
    #[must_use]
    pub fn fragment_shader(&self, fragment: &FragmentInfo, context: &ShadingContext) -> Rgba<u8> {
        match &self.kind {
            MaterialKind::Basic(m) => m.shade(fragment),
            MaterialKind::BlinnPhong(m) => m.shade(fragment, context, self.flat_shading()),
            MaterialKind::Custom { fragment: shader, .. } => (**shader)(fragment, context),
        }
    }
}

/// Base color of a fragment: the material color times the vertex color,
/// times the texture sample when a texture is bound.
fn base_color(color: Vec4, texture: Option<&Texture>, fragment: &FragmentInfo) -> Vec4 {
    let mut base = color * color::to_vec4(fragment.color);
    if let Some(texture) = texture {
        base *= texture.sample(fragment.uv, texture.lod(fragment.du, fragment.dv));
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn standard_vertex_stage_writes_world_position() {
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let uniforms = Uniforms::new(model, Mat4::IDENTITY, Mat4::IDENTITY, 8, 8);
        let out = standard_vertex_shader(&Vertex::default(), &uniforms);
        assert_eq!(out.position, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(out.attributes[WORLD_POSITION], Varying::Vec3(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(out.normal, Vec3::Z);
    }

    #[test]
    fn flags_gate_post_processing() {
        let plain = Material::new_basic(Vec4::ONE);
        assert!(!plain.receive_shadow());
        assert!(!plain.ambient_occlusion());

        let flagged =
            Material::new_basic(Vec4::ONE).with_flags(MaterialFlags::RECEIVE_SHADOW | MaterialFlags::AMBIENT_OCCLUSION);
        assert!(flagged.receive_shadow());
        assert!(flagged.ambient_occlusion());
        assert!(!flagged.flat_shading());
    }

    #[test]
    fn custom_material_dispatches_to_callables() {
        let material = Material::new_custom(
            |v: &Vertex, _: &Uniforms| ShadedVertex {
                position: v.position.extend(2.0),
                ..Default::default()
            },
            |f: &FragmentInfo, _: &ShadingContext| Rgba([f.x as u8, f.y as u8, 0, 255]),
        );
        let uniforms = Uniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY, 1, 1);
        assert_eq!(material.vertex_shader(&Vertex::default(), &uniforms).position.w, 2.0);

        let fragment = FragmentInfo {
            x: 3,
            y: 4,
            ..Default::default()
        };
        let out = material.fragment_shader(&fragment, &ShadingContext::default());
        assert_eq!(out, Rgba([3, 4, 0, 255]));
        assert_eq!(material.name, "CustomMaterial");
    }
}

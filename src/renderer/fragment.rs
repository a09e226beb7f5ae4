//! Fragments and interpolated attributes.
//!
//! A [`FragmentInfo`] is produced by the rasterizer for every covered pixel and
//! carries everything a fragment shader may need. Material-specific data that
//! the fixed fields do not cover travels as named [`Varying`] values in
//! [`Attributes`].

use std::fmt;
use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};
use image::Rgba;
use rustc_hash::FxHashMap;

use crate::resources::material::Material;

/// Open set of named per-vertex / per-fragment values.
pub type Attributes = FxHashMap<&'static str, Varying>;

/// A value that is interpolated across a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Varying {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl Varying {
    /// Weighted sum of three values of the same kind.
    ///
    /// Returns `None` when the kinds differ.
    #[must_use]
    pub fn interpolate(values: [Varying; 3], weights: [f32; 3]) -> Option<Varying> {
        let [w0, w1, w2] = weights;
        match values {
            [Self::Float(a), Self::Float(b), Self::Float(c)] => Some(Self::Float(a * w0 + b * w1 + c * w2)),
            [Self::Vec2(a), Self::Vec2(b), Self::Vec2(c)] => Some(Self::Vec2(a * w0 + b * w1 + c * w2)),
            [Self::Vec3(a), Self::Vec3(b), Self::Vec3(c)] => Some(Self::Vec3(a * w0 + b * w1 + c * w2)),
            [Self::Vec4(a), Self::Vec4(b), Self::Vec4(c)] => Some(Self::Vec4(a * w0 + b * w1 + c * w2)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec2(&self) -> Option<Vec2> {
        match *self {
            Self::Vec2(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec3(&self) -> Option<Vec3> {
        match *self {
            Self::Vec3(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec4(&self) -> Option<Vec4> {
        match *self {
            Self::Vec4(v) => Some(v),
            _ => None,
        }
    }
}

/// Interpolates every attribute present on all three vertices with matching
/// kinds. Attributes missing from any vertex are dropped.
#[must_use]
pub fn interpolate_attributes(attributes: [&Attributes; 3], weights: [f32; 3]) -> Attributes {
    let [a, b, c] = attributes;
    let mut out = Attributes::with_capacity_and_hasher(a.len(), Default::default());
    for (&name, &va) in a {
        let (Some(&vb), Some(&vc)) = (b.get(name), c.get(name)) else {
            continue;
        };
        if let Some(v) = Varying::interpolate([va, vb, vc], weights) {
            out.insert(name, v);
        }
    }
    out
}

/// A rasterized sample of one triangle at one pixel.
#[derive(Clone)]
pub struct FragmentInfo {
    /// `false` for a pixel nothing has been written to.
    pub ok: bool,
    pub x: u32,
    pub y: u32,
    /// Normalized device depth. Larger is nearer.
    pub depth: f32,
    pub uv: Vec2,
    /// Screen-space UV derivatives, used for texture level-of-detail.
    pub du: f32,
    pub dv: f32,
    /// Interpolated world-space normal.
    pub normal: Vec3,
    /// World-space normal of the source triangle.
    pub face_normal: Vec3,
    /// Interpolated vertex color before shading; the shaded color once
    /// committed by a forward pass.
    pub color: Rgba<u8>,
    /// Material of the source mesh, used by deferred shading.
    pub material: Option<Arc<Material>>,
    pub attributes: Attributes,
}

impl FragmentInfo {
    /// Looks up a custom attribute by name.
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<Varying> {
        self.attributes.get(name).copied()
    }
}

impl Default for FragmentInfo {
    fn default() -> Self {
        Self {
            ok: false,
            x: 0,
            y: 0,
            depth: 0.0,
            uv: Vec2::ZERO,
            du: 0.0,
            dv: 0.0,
            normal: Vec3::ZERO,
            face_normal: Vec3::ZERO,
            color: Rgba([0, 0, 0, 0]),
            material: None,
            attributes: Attributes::default(),
        }
    }
}

impl fmt::Debug for FragmentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentInfo")
            .field("ok", &self.ok)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("depth", &self.depth)
            .field("uv", &self.uv)
            .field("normal", &self.normal)
            .field("color", &self.color)
            .field("material", &self.material.as_ref().map(|m| m.name.as_ref()))
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

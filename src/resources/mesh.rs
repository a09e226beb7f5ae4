use std::sync::Arc;

use crate::resources::geometry::{BoundingBox, Geometry};
use crate::resources::material::Material;

/// A drawable: shared geometry plus the material that shades it.
///
/// Meshes without a material, and invisible meshes, are skipped by the draw
/// pipeline.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,

    // === Resource references ===
    pub geometry: Arc<Geometry>,
    pub material: Option<Arc<Material>>,

    pub visible: bool,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: Arc<Geometry>, material: Arc<Material>) -> Self {
        Self {
            name: "Mesh".to_string(),
            geometry,
            material: Some(material),
            visible: true,
        }
    }

    /// A mesh that contributes to bounds but is never drawn until a material
    /// is assigned.
    #[must_use]
    pub fn without_material(geometry: Arc<Geometry>) -> Self {
        Self {
            name: "Mesh".to_string(),
            geometry,
            material: None,
            visible: true,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Object-space bounds of the geometry.
    #[inline]
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        self.geometry.bounding_box()
    }

    /// Whether the draw pipeline should rasterize this mesh.
    #[inline]
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.visible && self.material.is_some()
    }
}

//! Core resource definitions.
//!
//! Plain CPU data consumed by the draw pipeline:
//! - Geometry: vertices, triangles and bounds
//! - Mesh: geometry paired with a material
//! - Material: shader stages and shading parameters
//! - Texture: mip-mapped RGBA images
//! - Uniforms: per-object matrices handed to vertex shaders
//! - Color: 8-bit/normalized conversions and the discard sentinel

pub mod color;
pub mod geometry;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod texture;
pub mod uniforms;

pub use geometry::{BoundingBox, Geometry, Triangle, Vertex};
pub use material::{
    BasicMaterial, BlinnPhongMaterial, FragmentShaderFn, Material, MaterialFlags, MaterialKind, ShadedVertex,
    ShadingContext, VertexShaderFn,
};
pub use mesh::Mesh;
pub use texture::Texture;
pub use uniforms::Uniforms;

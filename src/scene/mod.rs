//! Scene graph.
//!
//! - Node: hierarchy entry with a local transform and an optional payload
//! - Transform: position, rotation and scale
//! - Scene: arena-backed tree with depth-first traversal
//! - Camera: view and projection provider
//! - Light: directional, point and ambient emitters
//! - Object: the closed set of node payloads

pub mod camera;
pub mod light;
pub mod node;
pub mod object;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod transform;

pub use camera::{Camera, CameraView, ProjectionType};
pub use light::{Light, LightKind, PlacedLight};
pub use node::Node;
pub use object::{Object, ObjectType};
pub use scene::Scene;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeKey;
}

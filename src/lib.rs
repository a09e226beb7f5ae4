#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod utils;

pub use errors::{Result, TesseraError};
pub use renderer::{RenderPath, Renderer, RendererSettings};
pub use resources::primitives::*;
pub use resources::{Geometry, Material, Mesh, Texture};
pub use scene::{Camera, Light, Node, NodeKey, Scene, Transform};
pub use utils::WorkerPool;

pub mod box_shape;
pub mod plane;
pub mod sphere;
pub mod triangle;

pub use box_shape::create_box;
pub use plane::{PlaneOptions, create_plane};
pub use sphere::{SphereOptions, create_sphere};
pub use triangle::create_triangle;

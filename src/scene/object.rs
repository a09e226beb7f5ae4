use crate::resources::mesh::Mesh;
use crate::scene::camera::Camera;
use crate::scene::light::Light;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Mesh,
    Light,
    Camera,
}

/// Payload carried by a scene node.
#[derive(Debug, Clone)]
pub enum Object {
    Mesh(Mesh),
    Light(Light),
    Camera(Camera),
}

impl Object {
    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Mesh(_) => ObjectType::Mesh,
            Self::Light(_) => ObjectType::Light,
            Self::Camera(_) => ObjectType::Camera,
        }
    }

    #[must_use]
    pub fn as_mesh(&self) -> Option<&Mesh> {
        match self {
            Self::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_light(&self) -> Option<&Light> {
        match self {
            Self::Light(light) => Some(light),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_camera(&self) -> Option<&Camera> {
        match self {
            Self::Camera(camera) => Some(camera),
            _ => None,
        }
    }
}

impl From<Mesh> for Object {
    fn from(mesh: Mesh) -> Self {
        Self::Mesh(mesh)
    }
}

impl From<Light> for Object {
    fn from(light: Light) -> Self {
        Self::Light(light)
    }
}

impl From<Camera> for Object {
    fn from(camera: Camera) -> Self {
        Self::Camera(camera)
    }
}

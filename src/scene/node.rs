use crate::scene::NodeKey;
use crate::scene::object::Object;
use crate::scene::transform::Transform;

/// A scene node: a local transform, an optional payload and its place in the
/// hierarchy.
///
/// # Hierarchy
///
/// - `parent`: key of the parent node (`None` only for the root)
/// - `children`: child keys in insertion order, which is also traversal order
///
/// Nodes without a payload act as groups. The world matrix is never stored;
/// [`Scene`](crate::scene::Scene) composes it from the ancestors' local
/// matrices whenever it is needed.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,

    // === Hierarchy ===
    pub(crate) scene_id: u32,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,

    pub transform: Transform,
    pub(crate) object: Option<Object>,
}

impl Node {
    pub(crate) fn new(scene_id: u32, name: impl Into<String>, object: Option<Object>) -> Self {
        Self {
            name: name.into(),
            scene_id,
            parent: None,
            children: Vec::new(),
            transform: Transform::IDENTITY,
            object,
        }
    }

    /// Id of the owning scene.
    #[inline]
    #[must_use]
    pub fn scene_id(&self) -> u32 {
        self.scene_id
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn object(&self) -> Option<&Object> {
        self.object.as_ref()
    }

    #[inline]
    pub fn object_mut(&mut self) -> Option<&mut Object> {
        self.object.as_mut()
    }

    /// `true` for payload-less nodes.
    #[inline]
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.object.is_none()
    }
}

use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Mat4, Vec3};
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::resources::geometry::BoundingBox;
use crate::scene::camera::Camera;
use crate::scene::light::PlacedLight;
use crate::scene::node::Node;
use crate::scene::object::Object;
use crate::scene::transform::Transform;
use crate::scene::NodeKey;

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Scene graph.
///
/// A single owning arena of [`Node`]s addressed by [`NodeKey`]. The root node
/// always exists, carries no payload and keeps the identity transform. Every
/// other node hangs below it, so the hierarchy is a single tree.
///
/// World matrices are never cached: each traversal composes
/// `parent_world * local` top-down, so edits to any transform are picked up by
/// the next traversal without an update step.
#[derive(Debug)]
pub struct Scene {
    id: u32,
    nodes: SlotMap<NodeKey, Node>,
    root: NodeKey,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        let id = NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed);
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(id, "Root", None));
        Self { id, nodes, root }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Number of nodes below the root.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Wraps `object` in a new node under the root.
    pub fn add(&mut self, object: impl Into<Object>) -> NodeKey {
        self.add_to(self.root, object)
    }

    /// Wraps `object` in a new node under `parent`.
    ///
    /// An unknown `parent` falls back to the root.
    pub fn add_to(&mut self, parent: NodeKey, object: impl Into<Object>) -> NodeKey {
        let object = object.into();
        let name = match &object {
            Object::Mesh(mesh) => mesh.name.clone(),
            Object::Light(_) => "Light".to_string(),
            Object::Camera(camera) => camera.name.to_string(),
        };
        self.insert(parent, Node::new(self.id, name, Some(object)))
    }

    /// Adds an empty group node under the root.
    pub fn add_group(&mut self, name: impl Into<String>) -> NodeKey {
        self.add_group_to(self.root, name)
    }

    /// Adds an empty group node under `parent`.
    pub fn add_group_to(&mut self, parent: NodeKey, name: impl Into<String>) -> NodeKey {
        self.insert(parent, Node::new(self.id, name, None))
    }

    fn insert(&mut self, parent: NodeKey, mut node: Node) -> NodeKey {
        let parent = if self.nodes.contains_key(parent) {
            parent
        } else {
            log::warn!("Parent node not found in scene {}; adding to root", self.id);
            self.root
        };
        node.parent = Some(parent);
        let key = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(key);
        }
        key
    }

    /// Re-parents `child` under `parent`, appending it to the parent's
    /// children.
    ///
    /// Refuses, with a warning, to attach a node to itself or to one of its
    /// descendants, to move the root, or to use keys not in this scene.
    /// Returns whether the hierarchy changed.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) -> bool {
        if child == parent {
            log::warn!("Cannot attach node to itself!");
            return false;
        }
        if child == self.root {
            log::warn!("Cannot re-parent the scene root!");
            return false;
        }
        if !self.nodes.contains_key(child) || !self.nodes.contains_key(parent) {
            log::warn!("Attach refers to a node not in scene {}", self.id);
            return false;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("Cannot attach node to its own descendant!");
            return false;
        }

        // Detach from the old parent.
        if let Some(old) = self.nodes[child].parent
            && let Some(p) = self.nodes.get_mut(old)
            && let Some(i) = p.children.iter().position(|&x| x == child)
        {
            p.children.remove(i);
        }

        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        true
    }

    /// Removes `key` and its whole subtree. The root cannot be removed.
    ///
    /// Returns the number of nodes removed.
    pub fn remove(&mut self, key: NodeKey) -> usize {
        if key == self.root {
            log::warn!("Cannot remove the scene root!");
            return 0;
        }
        let Some(parent) = self.nodes.get(key).and_then(Node::parent) else {
            return 0;
        };
        if let Some(p) = self.nodes.get_mut(parent)
            && let Some(i) = p.children.iter().position(|&x| x == key)
        {
            p.children.remove(i);
        }

        let mut removed = 0;
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.remove(k) {
                stack.extend(node.children);
                removed += 1;
            }
        }
        removed
    }

    /// `true` if `ancestor` lies on the parent chain of `node` (or is `node`).
    fn is_ancestor(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = Some(node);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.nodes.get(k).and_then(Node::parent);
        }
        false
    }

    // ========================================================================
    // Access
    // ========================================================================

    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Mutable access to a node. The root is read-only.
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        if key == self.root {
            return None;
        }
        self.nodes.get_mut(key)
    }

    /// Mutable access to a node's local transform. The root is read-only.
    pub fn transform_mut(&mut self, key: NodeKey) -> Option<&mut Transform> {
        self.node_mut(key).map(|node| &mut node.transform)
    }

    /// World matrix of `key`, composed from the root down.
    #[must_use]
    pub fn world_matrix(&self, key: NodeKey) -> Option<Mat4> {
        let mut node = self.nodes.get(key)?;
        let mut matrix = node.transform.local_matrix();
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(p)) {
            matrix = parent.transform.local_matrix() * matrix;
            node = parent;
        }
        Some(matrix)
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Visits every payload in depth-first pre-order together with its world
    /// matrix.
    ///
    /// Children are visited in insertion order. Returning `false` from
    /// `visitor` skips the subtree below the current node; siblings are still
    /// visited. Group nodes are descended into without being reported.
    pub fn iter_objects<'s, F>(&'s self, mut visitor: F)
    where
        F: FnMut(&'s Object, &Mat4) -> bool,
    {
        let mut stack: Vec<(NodeKey, Mat4)> = vec![(self.root, Mat4::IDENTITY)];
        while let Some((key, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            let world = parent_world * node.transform.local_matrix();
            if let Some(object) = &node.object
                && !visitor(object, &world)
            {
                continue;
            }
            stack.extend(node.children.iter().rev().map(|&child| (child, world)));
        }
    }

    /// Midpoint of the world-space bounds of every mesh. `Vec3::ZERO` when the
    /// scene holds no mesh.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        let bounds = self.bounding_box();
        if bounds.is_empty() { Vec3::ZERO } else { bounds.center() }
    }

    /// Union of the world-space bounds of every mesh.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bounds = BoundingBox::EMPTY;
        self.iter_objects(|object, world| {
            if let Object::Mesh(mesh) = object {
                bounds = bounds.union(&mesh.bounding_box().transform(world));
            }
            true
        });
        bounds
    }

    /// The first camera in traversal order, placed in world space.
    #[must_use]
    pub fn active_camera(&self) -> Option<Camera> {
        let mut found = None;
        self.iter_objects(|object, world| {
            if found.is_some() {
                return false;
            }
            if let Object::Camera(camera) = object {
                found = Some(camera.transformed(world));
                return false;
            }
            true
        });
        found
    }

    /// Every light, resolved in world space.
    #[must_use]
    pub fn placed_lights(&self) -> SmallVec<[PlacedLight; 4]> {
        let mut lights = SmallVec::new();
        self.iter_objects(|object, world| {
            if let Object::Light(light) = object {
                lights.push(light.place(world));
            }
            true
        });
        lights
    }
}

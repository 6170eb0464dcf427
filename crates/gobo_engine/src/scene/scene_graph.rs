//! Scene graph nodes, layers and light types

use bitflags::bitflags;
use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{transform_direction, Mat4, Point3, Transform, Vec3};

new_key_type! {
    /// Stable identity of a scene node
    pub struct ObjectId;
}

bitflags! {
    /// 32-bit visibility layer mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Layers: u32 {
        /// Layer 0, which every object and camera starts on
        const DEFAULT = 1;
        /// Every layer
        const ALL = !0;
    }
}

impl Layers {
    /// Mask containing only layer `index` (0..32)
    pub fn layer(index: u32) -> Self {
        Self::from_bits_retain(1u32.checked_shl(index).unwrap_or(0))
    }

    /// Whether two masks share at least one layer
    pub fn test(self, other: Self) -> bool {
        self.intersects(other)
    }
}

impl Default for Layers {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Directional light
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    /// Linear RGB colour
    pub color: Vec3,
    /// Colour multiplier
    pub intensity: f32,
    /// Whether the light renders a shadow map
    pub cast_shadow: bool,
}

/// Point light
#[derive(Debug, Clone)]
pub struct PointLight {
    /// Linear RGB colour
    pub color: Vec3,
    /// Colour multiplier
    pub intensity: f32,
    /// Cutoff distance, 0 for none
    pub distance: f32,
    /// Distance falloff exponent
    pub decay: f32,
    /// Whether the light renders a shadow map
    pub cast_shadow: bool,
}

/// Spotlight shining along its local -Z axis
#[derive(Debug, Clone)]
pub struct SpotLight {
    /// Linear RGB colour
    pub color: Vec3,
    /// Colour multiplier
    pub intensity: f32,
    /// Cutoff distance, 0 for none
    pub distance: f32,
    /// Distance falloff exponent
    pub decay: f32,
    /// Outer cone half-angle in radians
    pub angle: f32,
    /// Fraction of the cone (0..1) blended by the penumbra
    pub penumbra: f32,
    /// Whether the light renders a shadow map
    pub cast_shadow: bool,
}

impl SpotLight {
    /// Spotlight with host defaults: white, intensity 1, 60 degree cone, no penumbra
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            distance: 0.0,
            decay: 2.0,
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
            cast_shadow: false,
        }
    }

    /// Set the cone half-angle and penumbra fraction
    pub fn with_cone(mut self, angle: f32, penumbra: f32) -> Self {
        self.angle = angle;
        self.penumbra = penumbra;
        self
    }

    /// Set cutoff distance and decay exponent
    pub fn with_falloff(mut self, distance: f32, decay: f32) -> Self {
        self.distance = distance;
        self.decay = decay;
        self
    }

    /// Enable or disable shadow casting
    pub fn with_shadow(mut self, cast_shadow: bool) -> Self {
        self.cast_shadow = cast_shadow;
        self
    }

    /// Cosine of the outer cone half-angle
    pub fn cone_cos(&self) -> f32 {
        self.angle.cos()
    }

    /// Cosine of the inner, fully lit half-angle
    pub fn penumbra_cos(&self) -> f32 {
        (self.angle * (1.0 - self.penumbra)).cos()
    }
}

/// Light carried by a scene node
#[derive(Debug, Clone)]
pub enum Light {
    /// Directional light
    Directional(DirectionalLight),
    /// Point light
    Point(PointLight),
    /// Spotlight
    Spot(SpotLight),
}

impl Light {
    /// Whether the light renders a shadow map
    pub fn casts_shadow(&self) -> bool {
        match self {
            Light::Directional(light) => light.cast_shadow,
            Light::Point(light) => light.cast_shadow,
            Light::Spot(light) => light.cast_shadow,
        }
    }
}

/// What a node is
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Grouping node without content
    Group,
    /// Renderable surface
    Mesh,
    /// Light source
    Light(Light),
}

/// Node in the scene graph
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Debug name
    pub name: String,
    /// Node content
    pub kind: NodeKind,
    /// Transform relative to the parent
    pub transform: Transform,
    /// Invisible nodes hide their whole subtree
    pub visible: bool,
    /// Layer mask tested against the camera's
    pub layers: Layers,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
}

impl SceneNode {
    /// Create a visible node on the default layer
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::identity(),
            visible: true,
            layers: Layers::DEFAULT,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Group node
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    /// Mesh node
    pub fn mesh(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Mesh)
    }

    /// Light node
    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::new(name, NodeKind::Light(light))
    }

    /// Spotlight node
    pub fn spot_light(name: impl Into<String>, light: SpotLight) -> Self {
        Self::light(name, Light::Spot(light))
    }

    /// Set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the layer mask
    pub fn with_layers(mut self, layers: Layers) -> Self {
        self.layers = layers;
        self
    }

    /// Set visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// The light on this node, if any
    pub fn as_light(&self) -> Option<&Light> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    /// The spotlight on this node, if any
    pub fn as_spot_light(&self) -> Option<&SpotLight> {
        match self.as_light() {
            Some(Light::Spot(spot)) => Some(spot),
            _ => None,
        }
    }

    /// Parent node
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }
}

/// Scene graph owning its nodes
#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<ObjectId, SceneNode>,
    roots: Vec<ObjectId>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level node
    pub fn add(&mut self, node: SceneNode) -> ObjectId {
        let id = self.nodes.insert(SceneNode { parent: None, children: Vec::new(), ..node });
        self.roots.push(id);
        id
    }

    /// Add a node under `parent`; `None` if the parent does not exist
    pub fn add_child(&mut self, parent: ObjectId, node: SceneNode) -> Option<ObjectId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        let id = self.nodes.insert(SceneNode { parent: Some(parent), children: Vec::new(), ..node });
        self.nodes[parent].children.push(id);
        Some(id)
    }

    /// Remove a node and its whole subtree
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneNode> {
        let node = self.nodes.remove(id)?;
        match node.parent.and_then(|parent| self.nodes.get_mut(parent)) {
            Some(parent) => parent.children.retain(|&child| child != id),
            None => self.roots.retain(|&root| root != id),
        }
        let mut stack = node.children.clone();
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.nodes.remove(child) {
                stack.extend(removed.children);
            }
        }
        Some(node)
    }

    /// Node by id
    pub fn get(&self, id: ObjectId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Mutable node by id
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Composed world matrix of a node (identity for unknown ids)
    pub fn world_matrix(&self, id: ObjectId) -> Mat4 {
        let mut matrix = Mat4::identity();
        let mut current = self.nodes.get(id);
        while let Some(node) = current {
            matrix = node.transform.to_matrix() * matrix;
            current = node.parent.and_then(|parent| self.nodes.get(parent));
        }
        matrix
    }

    /// World-space position of a node
    pub fn world_position(&self, id: ObjectId) -> Vec3 {
        self.world_matrix(id).transform_point(&Point3::origin()).coords
    }

    /// World-space direction a spotlight's rays travel back along: from its
    /// target towards the light, i.e. the node's local +Z.
    pub fn world_light_direction(&self, id: ObjectId) -> Vec3 {
        transform_direction(&self.world_matrix(id), &Vec3::z())
    }

    /// Depth-first, pre-order walk over visible nodes.
    ///
    /// An invisible node is skipped together with its descendants.
    pub fn traverse_visible<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(ObjectId, &'a SceneNode),
    {
        let mut stack: Vec<ObjectId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else { continue };
            if !node.visible {
                continue;
            }
            visit(id, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }
}

//! Scene model
//!
//! A minimal stand-in for the host scene graph: nodes with local transforms,
//! visibility and layer masks, some of which carry lights. Only what the
//! light registry and the host light packing read is modelled.

pub mod camera;
pub mod scene_graph;

pub use camera::Camera;
pub use scene_graph::{
    DirectionalLight, Layers, Light, NodeKind, ObjectId, PointLight, Scene, SceneNode, SpotLight,
};

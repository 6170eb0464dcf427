//! Spotlight registry
//!
//! Rebuilt once per frame before any surface is rendered. The order is
//! load-bearing: slot `i` of every auxiliary array is attributed to the
//! spotlight the host packed into `spotLights[ i ]`, so collection uses the
//! host's predicate and the host's stable sort key. Nothing at runtime can
//! detect a mismatch; the conformance tests are the guard.

use crate::render::light_uniforms::shadow_casting_lights_first;
use crate::scene::{Camera, ObjectId, Scene};

/// Visible spotlights whose layers intersect the camera's, shadow casters
/// first, traversal order preserved within each group.
pub fn collect_visible_spotlights(scene: &Scene, camera: &Camera) -> Vec<ObjectId> {
    let mut found: Vec<(ObjectId, bool)> = Vec::new();
    scene.traverse_visible(|id, node| {
        if let Some(spot) = node.as_spot_light() {
            if node.layers.test(camera.layers) {
                found.push((id, spot.cast_shadow));
            }
        }
    });
    found.sort_by(|a, b| shadow_casting_lights_first(a.1, b.1));
    found.into_iter().map(|(id, _)| id).collect()
}

/// Per-scene ordered spotlight list
#[derive(Debug, Default)]
pub struct LightRegistry {
    lights: Vec<ObjectId>,
}

impl LightRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached order with this frame's
    pub fn rebuild(&mut self, scene: &Scene, camera: &Camera) -> &[ObjectId] {
        self.lights = collect_visible_spotlights(scene, camera);
        log::trace!("LightRegistry: {} spotlight slot(s)", self.lights.len());
        &self.lights
    }

    /// Spotlights in slot order
    pub fn lights(&self) -> &[ObjectId] {
        &self.lights
    }

    /// Slot of a spotlight, if it is registered this frame
    pub fn slot_of(&self, light: ObjectId) -> Option<usize> {
        self.lights.iter().position(|&id| id == light)
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// Whether there are no slots
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::{Layers, Light, PointLight, SceneNode, SpotLight};

    fn spot(cast_shadow: bool) -> SpotLight {
        SpotLight::new(Vec3::new(1.0, 1.0, 1.0), 1.0).with_shadow(cast_shadow)
    }

    #[test]
    fn test_empty_scene_yields_no_slots() {
        let mut registry = LightRegistry::new();
        assert!(registry.rebuild(&Scene::new(), &Camera::default()).is_empty());
    }

    #[test]
    fn test_filters_kind_and_layers() {
        let mut scene = Scene::new();
        let a = scene.add(SceneNode::spot_light("a", spot(false)));
        scene.add(SceneNode::light(
            "point",
            Light::Point(PointLight {
                color: Vec3::new(1.0, 1.0, 1.0),
                intensity: 1.0,
                distance: 0.0,
                decay: 2.0,
                cast_shadow: true,
            }),
        ));
        scene.add(SceneNode::spot_light("other_layer", spot(true)).with_layers(Layers::layer(2)));
        let c = scene.add(SceneNode::spot_light("both", spot(false)).with_layers(Layers::layer(0) | Layers::layer(2)));
        scene.add(SceneNode::mesh("mesh"));

        assert_eq!(collect_visible_spotlights(&scene, &Camera::default()), vec![a, c]);
    }

    #[test]
    fn test_stable_partition_of_shadow_casters() {
        let mut scene = Scene::new();
        let n1 = scene.add(SceneNode::spot_light("n1", spot(false)));
        let s1 = scene.add(SceneNode::spot_light("s1", spot(true)));
        let n2 = scene.add(SceneNode::spot_light("n2", spot(false)));
        let s2 = scene.add(SceneNode::spot_light("s2", spot(true)));
        let n3 = scene.add(SceneNode::spot_light("n3", spot(false)));

        let mut registry = LightRegistry::new();
        assert_eq!(registry.rebuild(&scene, &Camera::default()), &[s1, s2, n1, n2, n3]);
        assert_eq!(registry.slot_of(n2), Some(3));
    }

    #[test]
    fn test_rebuild_replaces_previous_frame() {
        let mut scene = Scene::new();
        let a = scene.add(SceneNode::spot_light("a", spot(false)));
        let b = scene.add(SceneNode::spot_light("b", spot(false)));
        let camera = Camera::default();
        let mut registry = LightRegistry::new();
        registry.rebuild(&scene, &camera);
        assert_eq!(registry.len(), 2);

        scene.remove(a);
        registry.rebuild(&scene, &camera);
        assert_eq!(registry.lights(), &[b]);
        assert_eq!(registry.slot_of(a), None);
    }
}

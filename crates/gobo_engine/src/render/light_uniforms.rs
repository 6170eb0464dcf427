//! Host light packing
//!
//! The host renderer collects lights on its own every frame and packs them
//! into per-kind uniform arrays. This module reproduces that packing: it is
//! the reference the spotlight registry has to agree with slot for slot,
//! and it supplies the per-slot spotlight parameters the lighting routine
//! reads.
//!
//! Collection order: depth-first visible traversal, lights whose layers
//! intersect the camera's. The collected list is then stable-sorted with
//! [`shadow_casting_lights_first`] before being split by kind.

use std::cmp::Ordering;

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{transform_direction, Mat4, Point3, Vec3};
use crate::render::program::LightDefines;
use crate::render::systems::lighting::SpotLightInfo;
use crate::scene::{Camera, Light, ObjectId, Scene};

/// Sort key the host applies to collected lights
pub fn shadow_casting_lights_first(a_casts: bool, b_casts: bool) -> Ordering {
    // true sorts before false
    b_casts.cmp(&a_casts)
}

/// Directional light data for GPU uniform buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DirectionalLightData {
    /// View-space direction towards the light [x, y, z, padding]
    pub direction: [f32; 4],
    /// Colour times intensity [r, g, b, padding]
    pub color: [f32; 4],
}

/// Point light data for GPU uniform buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightData {
    /// View-space position and cutoff distance [x, y, z, distance]
    pub position: [f32; 4],
    /// Colour times intensity and decay [r, g, b, decay]
    pub color: [f32; 4],
}

/// Spotlight data for GPU uniform buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpotLightData {
    /// View-space position and cutoff distance [x, y, z, distance]
    pub position: [f32; 4],
    /// View-space direction from target to light and decay [x, y, z, decay]
    pub direction: [f32; 4],
    /// Colour times intensity [r, g, b, padding]
    pub color: [f32; 4],
    /// Cone cosines [cone_cos, penumbra_cos, unused, unused]
    pub cone: [f32; 4],
}

impl SpotLightData {
    /// Unpack into the form the lighting routine evaluates
    pub fn info(&self) -> SpotLightInfo {
        SpotLightInfo {
            position: Vec3::new(self.position[0], self.position[1], self.position[2]),
            direction: Vec3::new(self.direction[0], self.direction[1], self.direction[2]),
            color: Vec3::new(self.color[0], self.color[1], self.color[2]),
            distance: self.position[3],
            decay: self.direction[3],
            cone_cos: self.cone[0],
            penumbra_cos: self.cone[1],
        }
    }
}

/// All light uniforms for one camera, as packed by the host
#[derive(Debug, Clone, Default)]
pub struct LightUniforms {
    /// Directional lights in slot order
    pub directional_lights: Vec<DirectionalLightData>,
    /// Point lights in slot order
    pub point_lights: Vec<PointLightData>,
    /// Spotlights in slot order
    pub spot_lights: Vec<SpotLightData>,
    /// Scene node that filled each spotlight slot
    pub spot_light_sources: Vec<ObjectId>,
}

impl LightUniforms {
    /// Pack the lights `camera` sees
    pub fn pack(scene: &Scene, camera: &Camera) -> Self {
        let mut collected: Vec<(ObjectId, &Light)> = Vec::new();
        scene.traverse_visible(|id, node| {
            if let Some(light) = node.as_light() {
                if node.layers.test(camera.layers) {
                    collected.push((id, light));
                }
            }
        });
        // slice::sort_by is stable
        collected.sort_by(|(_, a), (_, b)| shadow_casting_lights_first(a.casts_shadow(), b.casts_shadow()));

        let view = camera.view_matrix();
        let mut uniforms = Self::default();
        for (id, light) in collected {
            let world = scene.world_matrix(id);
            let position = view_position(&view, &world);
            let direction = transform_direction(&view, &scene.world_light_direction(id));

            match light {
                Light::Directional(dir) => {
                    let color = dir.color * dir.intensity;
                    uniforms.directional_lights.push(DirectionalLightData {
                        direction: [direction.x, direction.y, direction.z, 0.0],
                        color: [color.x, color.y, color.z, 0.0],
                    });
                }
                Light::Point(point) => {
                    let color = point.color * point.intensity;
                    uniforms.point_lights.push(PointLightData {
                        position: [position.x, position.y, position.z, point.distance],
                        color: [color.x, color.y, color.z, point.decay],
                    });
                }
                Light::Spot(spot) => {
                    let color = spot.color * spot.intensity;
                    uniforms.spot_lights.push(SpotLightData {
                        position: [position.x, position.y, position.z, spot.distance],
                        direction: [direction.x, direction.y, direction.z, spot.decay],
                        color: [color.x, color.y, color.z, 0.0],
                        cone: [spot.cone_cos(), spot.penumbra_cos(), 0.0, 0.0],
                    });
                    uniforms.spot_light_sources.push(id);
                }
            }
        }

        log::trace!(
            "Packed lights - Dir: {}, Point: {}, Spot: {}",
            uniforms.directional_lights.len(),
            uniforms.point_lights.len(),
            uniforms.spot_lights.len()
        );
        uniforms
    }

    /// Light-count defines a program for these uniforms must be compiled with
    pub fn defines(&self) -> LightDefines {
        LightDefines {
            num_dir_lights: self.directional_lights.len(),
            num_point_lights: self.point_lights.len(),
            num_spot_lights: self.spot_lights.len(),
        }
    }
}

fn view_position(view: &Mat4, world: &Mat4) -> Vec3 {
    (view * world).transform_point(&Point3::origin()).coords
}

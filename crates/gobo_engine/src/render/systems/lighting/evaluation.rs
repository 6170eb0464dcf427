//! CPU reference of the patched spotlight routine
//!
//! Mirrors `getSpotLightInfo` after [`gobo_patches`](crate::render::shader_patch::gobo_patches)
//! line for line, so the shader's behaviour can be tested without a GPU.
//! All vectors are in the same (camera) space as the shader's uniforms.

use crate::foundation::math::constants::HALF_PI;
use crate::foundation::math::utils::{safe_acos, saturate, smoothstep};
use crate::foundation::math::{Vec2, Vec3};
use crate::render::systems::lighting::AuxLightData;
use crate::render::texture::Texture;

/// Spotlight parameters as the shader receives them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLightInfo {
    /// Light position
    pub position: Vec3,
    /// Unit direction from the light's target back to the light
    pub direction: Vec3,
    /// Colour times intensity
    pub color: Vec3,
    /// Cutoff distance, 0 for none
    pub distance: f32,
    /// Distance falloff exponent
    pub decay: f32,
    /// Cosine of the outer cone half-angle
    pub cone_cos: f32,
    /// Cosine of the fully lit half-angle
    pub penumbra_cos: f32,
}

/// Light arriving at a shaded point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidentLight {
    /// Incoming radiance
    pub color: Vec3,
    /// Unit direction from the point towards the light
    pub direction: Vec3,
    /// Whether the light contributes at all
    pub visible: bool,
}

/// Physically based distance falloff with optional smooth cutoff
pub fn distance_attenuation(light_distance: f32, cutoff_distance: f32, decay_exponent: f32) -> f32 {
    let mut falloff = 1.0 / light_distance.powf(decay_exponent).max(0.01);
    if cutoff_distance > 0.0 {
        falloff *= saturate(1.0 - (light_distance / cutoff_distance).powi(4)).powi(2);
    }
    falloff
}

/// Angular falloff across the penumbra
pub fn spot_attenuation(cone_cos: f32, penumbra_cos: f32, angle_cos: f32) -> f32 {
    smoothstep(cone_cos, penumbra_cos, angle_cos)
}

/// Texture coordinate of the light-to-surface direction `ray` inside the
/// projected cone.
///
/// The angles to the light's left and up axes are offset by a right angle
/// and scaled so the cone's angular radius spans half the texture; the
/// light's own axis lands on (0.5, 0.5). Surfaces on the up side of the
/// axis sample `v < 0.5`.
pub fn gobo_uv(ray: Vec3, spot_direction: Vec3, up: Vec3, cone_cos: f32) -> Vec2 {
    let left = up.cross(&spot_direction).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::x);
    let cone_angle = safe_acos(cone_cos).max(1e-4);
    let left_angle = safe_acos(ray.dot(&left));
    let up_angle = safe_acos(ray.dot(&up));
    (Vec2::new(left_angle, up_angle) - Vec2::repeat(HALF_PI)) / (2.0 * cone_angle) + Vec2::repeat(0.5)
}

/// Light colour before any attenuation: the projected texture scaled by the
/// slot intensity, or the light's own colour when no texture is bound.
///
/// `light_direction` points from the surface to the light, as in
/// [`IncidentLight::direction`]; the texture is indexed by its reverse.
pub fn gobo_color(light: &SpotLightInfo, gobo: &AuxLightData, map: &Texture, light_direction: Vec3) -> Vec3 {
    if gobo.has_texture {
        let uv = gobo_uv(-light_direction, light.direction, gobo.up, light.cone_cos);
        map.sample(uv).xyz() * gobo.intensity
    } else {
        light.color
    }
}

/// Evaluate one spotlight slot at `point`
pub fn get_spot_light_info(light: &SpotLightInfo, point: Vec3, gobo: &AuxLightData, map: &Texture) -> IncidentLight {
    let l_vector = light.position - point;
    let direction = l_vector.try_normalize(f32::EPSILON).unwrap_or(light.direction);
    let angle_cos = direction.dot(&light.direction);
    let attenuation = spot_attenuation(light.cone_cos, light.penumbra_cos, angle_cos);

    if attenuation > 0.0 {
        let color = gobo_color(light, gobo, map, direction)
            * attenuation
            * distance_attenuation(l_vector.norm(), light.distance, light.decay);
        IncidentLight {
            color,
            direction,
            visible: color != Vec3::zeros(),
        }
    } else {
        IncidentLight {
            color: Vec3::zeros(),
            direction,
            visible: false,
        }
    }
}

//! Projected-texture spotlights
//!
//! Three pieces cooperate every frame:
//! - [`LightRegistry`] orders the visible spotlights exactly like the host
//!   packs its spotlight uniforms.
//! - [`LightTextureBindings`] owns each spotlight's optional texture and
//!   intensity, and applies asynchronous texture loads.
//! - [`ShadingExtension`] builds the per-slot [`AuxLightData`] array and
//!   publishes it to a program, whose lighting routine was patched by
//!   [`crate::render::shader_patch`] to consume it.
//!
//! [`evaluation`] is the CPU reference of the patched routine.

pub mod binding;
pub mod context;
pub mod evaluation;
pub mod extension;
pub mod registry;

#[cfg(test)]
mod tests;

pub use binding::{LightTextureBinding, LightTextureBindings, SpotLightTexture};
pub use context::SceneRenderContext;
pub use evaluation::{get_spot_light_info, gobo_uv, IncidentLight, SpotLightInfo};
pub use extension::{build_aux_light_data, AuxLightArrays, AuxLightData, GpuAuxLightData, ShadingExtension};
pub use registry::{collect_visible_spotlights, LightRegistry};

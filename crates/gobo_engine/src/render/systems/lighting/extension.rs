//! Per-surface shading extension
//!
//! Builds the auxiliary per-slot array the patched lighting routine reads
//! and publishes it into a program's uniforms. The array is rebuilt on
//! compile and again before every render: the light set may be unchanged
//! while the camera moved, and the "up" axes live in camera space.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{transform_direction, Vec3};
use crate::render::program::{ProgramKey, ProgramStore, ShaderProgram, UniformValue, SPOT_LIGHT_GOBOS, SPOT_LIGHT_MAPS};
use crate::render::systems::lighting::{LightRegistry, LightTextureBindings, SceneRenderContext};
use crate::render::texture::{TextureHandle, TextureManager};
use crate::scene::{Camera, Scene};

/// Auxiliary data for one spotlight slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuxLightData {
    /// Camera-space unit "up" axis of the light
    pub up: Vec3,
    /// Whether a projected texture is bound and loaded
    pub has_texture: bool,
    /// Projected texture intensity
    pub intensity: f32,
}

impl AuxLightData {
    /// std140 layout for upload
    pub fn to_gpu(&self) -> GpuAuxLightData {
        GpuAuxLightData {
            up: [self.up.x, self.up.y, self.up.z],
            has_texture: u32::from(self.has_texture),
            intensity: self.intensity,
            _padding: [0.0; 3],
        }
    }
}

/// `SpotLightGobo` as laid out in a std140 uniform block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuAuxLightData {
    /// Camera-space up axis
    pub up: [f32; 3],
    /// GLSL bool: 0 or 1
    pub has_texture: u32,
    /// Projected texture intensity
    pub intensity: f32,
    /// Pads the struct to 32 bytes
    pub _padding: [f32; 3],
}

/// Index-aligned per-slot data for one publish
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuxLightArrays {
    /// One entry per registry slot
    pub entries: Vec<AuxLightData>,
    /// One texture per registry slot; slots without a texture get the placeholder
    pub maps: Vec<TextureHandle>,
}

impl AuxLightArrays {
    /// Number of slots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no slots
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries packed for a uniform buffer upload
    pub fn gpu_entries(&self) -> Vec<GpuAuxLightData> {
        self.entries.iter().map(AuxLightData::to_gpu).collect()
    }
}

/// Build the per-slot arrays for the registry's current order.
///
/// For every slot the light's local +Y is rotated into world space by the
/// light's world transform and then into camera space by the camera's view
/// matrix. Lights without a binding publish `unbound_intensity`.
pub fn build_aux_light_data(
    scene: &Scene,
    registry: &LightRegistry,
    bindings: &LightTextureBindings,
    textures: &TextureManager,
    camera: &Camera,
    unbound_intensity: f32,
) -> AuxLightArrays {
    let view = camera.view_matrix();
    let mut arrays = AuxLightArrays {
        entries: Vec::with_capacity(registry.len()),
        maps: Vec::with_capacity(registry.len()),
    };

    for &light in registry.lights() {
        let world_up = transform_direction(&scene.world_matrix(light), &Vec3::y());
        let up = transform_direction(&view, &world_up);

        let binding = bindings.get(light);
        let resolved = binding
            .and_then(|binding| binding.resolved_texture())
            .filter(|&handle| textures.get(handle).is_some());

        arrays.entries.push(AuxLightData {
            up,
            has_texture: resolved.is_some(),
            intensity: binding.map_or(unbound_intensity, |binding| binding.intensity()),
        });
        arrays.maps.push(resolved.unwrap_or_else(|| textures.placeholder()));
    }

    arrays
}

fn publish(program: &mut ShaderProgram, arrays: AuxLightArrays) {
    log::trace!("Publishing {} gobo slot(s)", arrays.len());
    program.set_uniform(SPOT_LIGHT_GOBOS, UniformValue::GoboArray(arrays.entries));
    program.set_uniform(SPOT_LIGHT_MAPS, UniformValue::TextureArray(arrays.maps));
}

/// Compile and render hooks for one receiving surface
#[derive(Debug, Default)]
pub struct ShadingExtension {
    program: Option<ProgramKey>,
}

impl ShadingExtension {
    /// Extension with no program yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Program recorded by the last compile
    pub fn program(&self) -> Option<ProgramKey> {
        self.program
    }

    /// Compile-time hook: publish the arrays into `key`'s uniforms and
    /// remember the program for [`on_before_render`](Self::on_before_render).
    pub fn on_program_compiled(
        &mut self,
        key: ProgramKey,
        programs: &mut ProgramStore,
        ctx: &SceneRenderContext,
        scene: &Scene,
        camera: &Camera,
    ) {
        let Some(program) = programs.get_mut(key) else {
            log::warn!("Compiled program {:?} is not in the store", key);
            return;
        };
        publish(program, ctx.build_aux_light_data(scene, camera));
        self.program = Some(key);
        log::debug!("Gobo uniforms attached to program {:?}", key);
    }

    /// Render-time hook: republish into the recorded program. No-op until a
    /// program has been compiled, or once that program is gone.
    pub fn on_before_render(&self, programs: &mut ProgramStore, ctx: &SceneRenderContext, scene: &Scene, camera: &Camera) {
        let Some(program) = self.program.and_then(|key| programs.get_mut(key)) else {
            return;
        };
        publish(program, ctx.build_aux_light_data(scene, camera));
    }
}

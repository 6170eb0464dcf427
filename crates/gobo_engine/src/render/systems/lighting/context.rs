//! Per-scene state shared by the spotlight texture components and the
//! shading extension. One context per scene, passed by reference.

use crate::assets::{ImageTextureLoader, TextureLoader};
use crate::config::GoboConfig;
use crate::render::systems::lighting::{build_aux_light_data, AuxLightArrays, LightRegistry, LightTextureBindings};
use crate::render::texture::TextureManager;
use crate::scene::{Camera, ObjectId, Scene};

/// Registry, texture bindings and texture storage of one scene
pub struct SceneRenderContext {
    registry: LightRegistry,
    bindings: LightTextureBindings,
    textures: TextureManager,
    loader: Box<dyn TextureLoader>,
    config: GoboConfig,
}

impl SceneRenderContext {
    /// Context loading textures through `loader`
    pub fn new(config: GoboConfig, loader: Box<dyn TextureLoader>) -> Self {
        Self {
            registry: LightRegistry::new(),
            bindings: LightTextureBindings::new(),
            textures: TextureManager::new(config.placeholder_color),
            loader,
            config,
        }
    }

    /// Context loading image files from the configured search paths
    pub fn from_config(config: GoboConfig) -> Self {
        let loader = ImageTextureLoader::new(config.texture_search_paths.iter().cloned());
        Self::new(config, Box::new(loader))
    }

    /// Per-frame update, before any surface renders: apply finished texture
    /// loads, then rebuild the spotlight order.
    pub fn tick(&mut self, scene: &Scene, camera: &Camera) {
        let applied = self
            .bindings
            .process_completed(self.loader.as_mut(), &mut self.textures);
        if applied > 0 {
            log::debug!("Applied {} texture load(s)", applied);
        }
        self.registry.rebuild(scene, camera);
    }

    /// Create the binding for `light` if it does not exist
    pub fn bind_texture(&mut self, light: ObjectId, intensity: f32) {
        self.bindings.bind(light, intensity);
    }

    /// Change the source of `light`'s binding
    pub fn set_texture_source(&mut self, light: ObjectId, source: Option<String>) -> bool {
        self.bindings
            .set_source(light, source, self.loader.as_mut(), &mut self.textures)
    }

    /// Remove `light`'s binding and free its texture
    pub fn unbind_texture(&mut self, light: ObjectId) {
        self.bindings.remove(light, &mut self.textures);
    }

    /// Per-slot arrays for the current registry order
    pub fn build_aux_light_data(&self, scene: &Scene, camera: &Camera) -> AuxLightArrays {
        build_aux_light_data(
            scene,
            &self.registry,
            &self.bindings,
            &self.textures,
            camera,
            self.config.unbound_intensity,
        )
    }

    /// Spotlight order of the last tick
    pub fn registry(&self) -> &LightRegistry {
        &self.registry
    }

    /// Texture bindings
    pub fn bindings(&self) -> &LightTextureBindings {
        &self.bindings
    }

    /// Mutable texture bindings
    pub fn bindings_mut(&mut self) -> &mut LightTextureBindings {
        &mut self.bindings
    }

    /// Texture storage
    pub fn textures(&self) -> &TextureManager {
        &self.textures
    }

    /// Active configuration
    pub fn config(&self) -> &GoboConfig {
        &self.config
    }
}

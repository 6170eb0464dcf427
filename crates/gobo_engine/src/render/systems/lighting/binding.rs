//! Projected texture bindings
//!
//! Each spotlight may own one projected texture and an intensity. Loads are
//! asynchronous and may complete in any order, so a completion is applied
//! only if it is still for the binding's current source.

use std::collections::HashMap;

use crate::assets::{TextureLoadEvent, TextureLoader, TextureOptions, TextureRequest};
use crate::ecs::{Behavior, ChangedFields};
use crate::render::systems::lighting::SceneRenderContext;
use crate::render::texture::{color_correct, TextureHandle, TextureManager};
use crate::scene::ObjectId;

/// Texture and intensity bound to one spotlight
#[derive(Debug, Clone, PartialEq)]
pub struct LightTextureBinding {
    light: ObjectId,
    source: Option<String>,
    intensity: f32,
    texture: Option<TextureHandle>,
    options: TextureOptions,
}

impl LightTextureBinding {
    /// Binding with no source
    pub fn new(light: ObjectId, intensity: f32) -> Self {
        Self {
            light,
            source: None,
            intensity,
            texture: None,
            options: TextureOptions::default(),
        }
    }

    /// Spotlight this binding belongs to
    pub fn light(&self) -> ObjectId {
        self.light
    }

    /// Current source identifier
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Projected texture intensity
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Any value is accepted, negative included
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    /// Loaded texture for the current source, if it has arrived
    pub fn resolved_texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    /// Change the source.
    ///
    /// The current texture is released right away and a load for the new
    /// source is requested. Setting the current source again does nothing;
    /// `None` clears without loading. Returns whether the source changed.
    pub fn set_source(
        &mut self,
        source: Option<String>,
        loader: &mut dyn TextureLoader,
        textures: &mut TextureManager,
    ) -> bool {
        if self.source == source {
            return false;
        }

        self.release(textures);
        self.source = source;

        if let Some(source) = &self.source {
            loader.load(TextureRequest {
                light: self.light,
                source: source.clone(),
                options: self.options,
            });
        }
        true
    }

    /// Apply a finished load. Returns whether the texture was taken.
    pub fn apply_load(&mut self, event: TextureLoadEvent, textures: &mut TextureManager) -> bool {
        if self.source.as_deref() != Some(event.source.as_str()) {
            log::debug!(
                "Discarding stale texture '{}' for light {:?} (current source {:?})",
                event.source,
                self.light,
                self.source
            );
            return false;
        }

        match event.result {
            Ok(texture) => {
                self.release(textures);
                self.texture = Some(textures.insert(color_correct(texture)));
                log::debug!("Texture '{}' bound to light {:?}", event.source, self.light);
                true
            }
            Err(e) => {
                log::warn!("Failed to load texture '{}' for light {:?}: {}", event.source, self.light, e);
                false
            }
        }
    }

    /// Drop the resolved texture and free it
    pub fn release(&mut self, textures: &mut TextureManager) {
        if let Some(handle) = self.texture.take() {
            textures.remove(handle);
        }
    }
}

/// All texture bindings of a scene, keyed by spotlight
#[derive(Debug, Default)]
pub struct LightTextureBindings {
    bindings: HashMap<ObjectId, LightTextureBinding>,
}

impl LightTextureBindings {
    /// No bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Binding for `light`, created with `intensity` if missing
    pub fn bind(&mut self, light: ObjectId, intensity: f32) -> &mut LightTextureBinding {
        self.bindings
            .entry(light)
            .or_insert_with(|| LightTextureBinding::new(light, intensity))
    }

    /// Binding for `light`
    pub fn get(&self, light: ObjectId) -> Option<&LightTextureBinding> {
        self.bindings.get(&light)
    }

    /// Mutable binding for `light`
    pub fn get_mut(&mut self, light: ObjectId) -> Option<&mut LightTextureBinding> {
        self.bindings.get_mut(&light)
    }

    /// Remove a binding and free its texture
    pub fn remove(&mut self, light: ObjectId, textures: &mut TextureManager) -> Option<LightTextureBinding> {
        let mut binding = self.bindings.remove(&light)?;
        binding.release(textures);
        Some(binding)
    }

    /// Change the source of an existing binding. Returns false if there is
    /// no binding or the source is unchanged.
    pub fn set_source(
        &mut self,
        light: ObjectId,
        source: Option<String>,
        loader: &mut dyn TextureLoader,
        textures: &mut TextureManager,
    ) -> bool {
        match self.bindings.get_mut(&light) {
            Some(binding) => binding.set_source(source, loader, textures),
            None => false,
        }
    }

    /// Change the intensity of an existing binding
    pub fn set_intensity(&mut self, light: ObjectId, intensity: f32) -> bool {
        match self.bindings.get_mut(&light) {
            Some(binding) => {
                binding.set_intensity(intensity);
                true
            }
            None => false,
        }
    }

    /// Apply every load the loader finished. Returns how many were taken.
    pub fn process_completed(&mut self, loader: &mut dyn TextureLoader, textures: &mut TextureManager) -> usize {
        let mut applied = 0;
        for event in loader.drain_completed() {
            match self.bindings.get_mut(&event.light) {
                Some(binding) => {
                    if binding.apply_load(event, textures) {
                        applied += 1;
                    }
                }
                None => log::debug!("Texture '{}' arrived for unbound light {:?}", event.source, event.light),
            }
        }
        applied
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether there are no bindings
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Host component attaching a projected texture to a spotlight.
///
/// Attribute values live here; the binding itself lives in the
/// [`SceneRenderContext`] so the shading extension can find it by light.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLightTexture {
    /// Spotlight the component is attached to
    pub light: ObjectId,
    /// Texture source identifier
    pub src: Option<String>,
    /// Intensity; the configured default is used when unset
    pub intensity: Option<f32>,
}

impl SpotLightTexture {
    /// Component for `light` with no source
    pub fn new(light: ObjectId) -> Self {
        Self {
            light,
            src: None,
            intensity: None,
        }
    }

    /// Set the source attribute
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    /// Set the intensity attribute
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = Some(intensity);
        self
    }
}

impl Behavior<SceneRenderContext> for SpotLightTexture {
    fn on_init(&mut self, ctx: &mut SceneRenderContext) {
        let intensity = self.intensity.unwrap_or(ctx.config().default_intensity);
        ctx.bind_texture(self.light, intensity);
        ctx.set_texture_source(self.light, self.src.clone());
    }

    fn on_update(&mut self, ctx: &mut SceneRenderContext, changed: ChangedFields) {
        if changed.contains(ChangedFields::SRC) {
            ctx.set_texture_source(self.light, self.src.clone());
        }
        if changed.contains(ChangedFields::INTENSITY) {
            let intensity = self.intensity.unwrap_or(ctx.config().default_intensity);
            ctx.bindings_mut().set_intensity(self.light, intensity);
        }
    }

    fn on_remove(&mut self, ctx: &mut SceneRenderContext) {
        ctx.unbind_texture(self.light);
    }
}

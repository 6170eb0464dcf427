//! # Gobo Engine
//!
//! Projected-texture ("gobo") spotlights for a host shading pipeline.
//!
//! ## Features
//!
//! - **Light Registry**: per-frame spotlight order matching the host's
//!   spotlight uniform slots
//! - **Texture Bindings**: asynchronously loaded, colour-corrected textures
//!   per spotlight with a last-write-wins source
//! - **Shading Extension**: per-slot auxiliary data published to programs,
//!   plus validated patches of the host lighting chunks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gobo_engine::prelude::*;
//!
//! let mut ctx = SceneRenderContext::from_config(GoboConfig::default());
//! let mut scene = Scene::new();
//! let camera = Camera::look_at(Vec3::new(0.0, 5.0, 10.0), Vec3::zeros(), Vec3::y());
//! let light = scene.add(SceneNode::spot_light("key", SpotLight::new(Vec3::new(1.0, 1.0, 1.0), 1.0)));
//!
//! SpotLightTexture::new(light).with_src("window.png").on_init(&mut ctx);
//! ctx.tick(&scene, &camera);
//! let aux = ctx.build_aux_light_data(&scene, &camera);
//! assert_eq!(aux.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod ecs;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports
pub mod prelude {
    pub use crate::{
        assets::{AssetError, ImageTextureLoader, TextureLoader},
        config::{Config, ConfigError, GoboConfig},
        ecs::{Behavior, ChangedFields},
        foundation::math::{Mat4, Transform, Vec2, Vec3, Vec4},
        render::{
            patched_library,
            systems::lighting::{
                get_spot_light_info, AuxLightData, LightRegistry, SceneRenderContext, ShadingExtension,
                SpotLightTexture,
            },
            LightUniforms, ProgramStore, ShaderProgram, TextureManager,
        },
        scene::{Camera, Layers, Light, ObjectId, Scene, SceneNode, SpotLight},
    };
}

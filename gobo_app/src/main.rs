//! Gobo demo application
//!
//! Headless walk-through of the projected-texture spotlight system: builds a
//! small stage lit by three spotlights and a sun, binds textures, and runs a
//! few frames while logging what the shading extension publishes and what the
//! patched lighting routine evaluates at a handful of surface points.

use std::path::Path;

use gobo_engine::config::{Config, ConfigError, GoboConfig};
use gobo_engine::ecs::{Behavior, ChangedFields};
use gobo_engine::foundation::logging;
use gobo_engine::foundation::math::{utils::deg_to_rad, Point3, Transform, Vec3};
use gobo_engine::render::program::{LightDefines, ProgramKey, ProgramStore, ShaderProgram};
use gobo_engine::render::shader_patch::{patched_library, ShaderLibrary, ShaderPatchError};
use gobo_engine::render::systems::lighting::{get_spot_light_info, SceneRenderContext, ShadingExtension, SpotLightTexture};
use gobo_engine::render::LightUniforms;
use gobo_engine::scene::{Camera, DirectionalLight, Light, ObjectId, Scene, SceneNode, SpotLight};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "gobo.toml";
const FRAME_COUNT: u32 = 6;
const FRAME_DELTA: f32 = 1.0 / 60.0;

/// Demo application errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Host lighting chunks could not be patched or compiled
    #[error("Shader error: {0}")]
    Shader(#[from] ShaderPatchError),
}

struct GoboDemo {
    ctx: SceneRenderContext,
    scene: Scene,
    camera: Camera,
    library: ShaderLibrary,
    programs: ProgramStore,
    program: Option<ProgramKey>,
    defines: LightDefines,
    extension: ShadingExtension,
    components: Vec<SpotLightTexture>,
    sweeping: ObjectId,
    time: f32,
}

impl GoboDemo {
    fn new(config: GoboConfig) -> Result<Self, AppError> {
        log::info!("Creating gobo demo...");
        let library = patched_library()?;
        let mut ctx = SceneRenderContext::from_config(config);
        let mut scene = Scene::new();
        let camera = Camera::look_at(Vec3::new(0.0, 6.0, 12.0), Vec3::zeros(), Vec3::y());

        scene.add(SceneNode::light(
            "sun",
            Light::Directional(DirectionalLight {
                color: Vec3::new(1.0, 0.95, 0.9),
                intensity: 0.3,
                cast_shadow: true,
            }),
        ));

        let stage_up = Vec3::new(0.0, 0.0, -1.0);
        let key = scene.add(
            SceneNode::spot_light(
                "key",
                SpotLight::new(Vec3::new(1.0, 0.9, 0.8), 2.0)
                    .with_cone(deg_to_rad(30.0), 0.3)
                    .with_shadow(true),
            )
            .with_transform(Transform::looking_at(Vec3::new(-3.0, 5.0, 0.0), Vec3::zeros(), stage_up)),
        );
        let sweeping = scene.add(
            SceneNode::spot_light("sweep", SpotLight::new(Vec3::new(0.4, 0.6, 1.0), 3.0).with_cone(deg_to_rad(20.0), 0.5))
                .with_transform(Transform::looking_at(Vec3::new(3.0, 5.0, 0.0), Vec3::zeros(), stage_up)),
        );
        let fill = scene.add(
            SceneNode::spot_light("fill", SpotLight::new(Vec3::new(1.0, 1.0, 1.0), 0.5).with_falloff(20.0, 2.0))
                .with_transform(Transform::looking_at(Vec3::new(0.0, 8.0, 4.0), Vec3::zeros(), stage_up)),
        );

        let mut components = vec![
            SpotLightTexture::new(key).with_src("window.png"),
            SpotLightTexture::new(sweeping).with_src("dots.png").with_intensity(4.0),
        ];
        for component in &mut components {
            component.on_init(&mut ctx);
        }
        log::info!("Scene ready: {} nodes, unbound fill light {:?}", scene.len(), fill);

        Ok(Self {
            ctx,
            scene,
            camera,
            library,
            programs: ProgramStore::with_key(),
            program: None,
            defines: LightDefines::default(),
            extension: ShadingExtension::new(),
            components,
            sweeping,
            time: 0.0,
        })
    }

    fn run(&mut self, frames: u32) -> Result<(), AppError> {
        for frame in 0..frames {
            self.update(frame);
            self.render(frame)?;
        }
        log::info!("Demo finished after {} frames", frames);
        Ok(())
    }

    fn update(&mut self, frame: u32) {
        self.time += FRAME_DELTA;

        // Swap the sweeping light's texture mid-run
        if frame == FRAME_COUNT / 2 {
            if let Some(component) = self.components.iter_mut().find(|c| c.light == self.sweeping) {
                component.src = Some("window.png".to_string());
                component.on_update(&mut self.ctx, ChangedFields::SRC);
            }
        }
        for component in &mut self.components {
            component.on_tick(&mut self.ctx, self.time, FRAME_DELTA);
        }

        if let Some(node) = self.scene.get_mut(self.sweeping) {
            let x = 3.0 * (self.time * 20.0).cos();
            node.transform = Transform::looking_at(Vec3::new(x, 5.0, 0.0), Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));
        }

        self.ctx.tick(&self.scene, &self.camera);
    }

    fn render(&mut self, frame: u32) -> Result<(), AppError> {
        let uniforms = LightUniforms::pack(&self.scene, &self.camera);

        let recompile = self.program.is_none() || uniforms.defines() != self.defines;
        if recompile {
            if let Some(old) = self.program.take() {
                self.programs.remove(old);
            }
            let key = self
                .programs
                .insert(ShaderProgram::compile(&self.library, uniforms.defines())?);
            self.defines = uniforms.defines();
            self.program = Some(key);
            self.extension
                .on_program_compiled(key, &mut self.programs, &self.ctx, &self.scene, &self.camera);
        } else {
            self.extension
                .on_before_render(&mut self.programs, &self.ctx, &self.scene, &self.camera);
        }

        let Some(program) = self.program.and_then(|key| self.programs.get(key)) else {
            return Ok(());
        };
        let (Some(gobos), Some(maps)) = (program.gobo_uniforms(), program.map_uniforms()) else {
            return Ok(());
        };

        let view = self.camera.view_matrix();
        let samples = [Vec3::zeros(), Vec3::new(-1.0, 0.0, 0.5), Vec3::new(1.5, 0.0, -0.5)];
        for (slot, ((light, gobo), map)) in uniforms.spot_lights.iter().zip(gobos).zip(maps).enumerate() {
            let map = self.ctx.textures().get_or_placeholder(*map);
            let mut total = Vec3::zeros();
            for point in &samples {
                let surface = view.transform_point(&Point3::from(*point)).coords;
                total += get_spot_light_info(&light.info(), surface, gobo, map).color;
            }
            log::info!(
                "frame {} slot {}: textured={} intensity={:.2} up=({:.2}, {:.2}, {:.2}) irradiance=({:.4}, {:.4}, {:.4})",
                frame,
                slot,
                gobo.has_texture,
                gobo.intensity,
                gobo.up.x,
                gobo.up.y,
                gobo.up.z,
                total.x,
                total.y,
                total.z
            );
        }
        Ok(())
    }
}

fn load_config() -> Result<GoboConfig, ConfigError> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&path).exists() {
        GoboConfig::load_from_file(&path)
    } else {
        Ok(GoboConfig::default())
    }
}

fn main() -> Result<(), AppError> {
    let config = load_config()?;
    logging::init_with_level(&config.log_level);
    log::info!("Starting gobo demo (search paths: {:?})", config.texture_search_paths);

    let mut demo = GoboDemo::new(config)?;
    demo.run(FRAME_COUNT)
}

//! Whole-frame scenarios: components, tick, publish and evaluation.

use approx::assert_relative_eq;

use super::ScriptedLoader;
use crate::config::GoboConfig;
use crate::ecs::{Behavior, ChangedFields};
use crate::foundation::math::{Point3, Transform, Vec3};
use crate::render::light_uniforms::LightUniforms;
use crate::render::program::{ProgramKey, ProgramStore, ShaderProgram};
use crate::render::shader_patch::patched_library;
use crate::render::systems::lighting::{get_spot_light_info, SceneRenderContext, ShadingExtension, SpotLightTexture};
use crate::scene::{Camera, ObjectId, Scene, SceneNode, SpotLight};

fn context(loader: &ScriptedLoader) -> SceneRenderContext {
    SceneRenderContext::new(GoboConfig::default(), Box::new(loader.clone()))
}

fn camera() -> Camera {
    Camera::look_at(Vec3::new(0.0, 5.0, 10.0), Vec3::zeros(), Vec3::y())
}

fn downward_spot(scene: &mut Scene, name: &str, x: f32, cast_shadow: bool) -> ObjectId {
    scene.add(
        SceneNode::spot_light(
            name,
            SpotLight::new(Vec3::new(1.0, 1.0, 1.0), 1.0)
                .with_cone(0.5, 0.2)
                .with_shadow(cast_shadow),
        )
        .with_transform(Transform::looking_at(
            Vec3::new(x, 4.0, 0.0),
            Vec3::new(x, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -1.0),
        )),
    )
}

fn compile(scene: &Scene, camera: &Camera, programs: &mut ProgramStore) -> (LightUniforms, ProgramKey) {
    let library = patched_library().unwrap();
    let uniforms = LightUniforms::pack(scene, camera);
    let program = ShaderProgram::compile(&library, uniforms.defines()).unwrap();
    (uniforms, programs.insert(program))
}

#[test]
fn test_textured_spotlight_end_to_end() {
    let loader = ScriptedLoader::new();
    let mut ctx = context(&loader);
    let mut scene = Scene::new();
    let camera = camera();
    let light = downward_spot(&mut scene, "key", 0.0, false);

    let mut component = SpotLightTexture::new(light).with_src("red.png");
    component.on_init(&mut ctx);
    assert_eq!(loader.requested(), vec!["red.png".to_string()]);

    ctx.tick(&scene, &camera);
    let aux = ctx.build_aux_light_data(&scene, &camera);
    assert_eq!(aux.len(), 1);
    assert!(!aux.entries[0].has_texture);
    assert_eq!(aux.entries[0].intensity, 10.0);
    assert_eq!(aux.maps[0], ctx.textures().placeholder());

    loader.complete("red.png", [255, 0, 0, 255]);
    component.intensity = Some(2.0);
    component.on_update(&mut ctx, ChangedFields::INTENSITY);
    ctx.tick(&scene, &camera);

    let mut programs = ProgramStore::with_key();
    let (uniforms, key) = compile(&scene, &camera, &mut programs);
    let mut extension = ShadingExtension::new();
    extension.on_program_compiled(key, &mut programs, &ctx, &scene, &camera);

    let program = &programs[key];
    let gobos = program.gobo_uniforms().unwrap();
    let maps = program.map_uniforms().unwrap();
    assert_eq!(gobos.len(), uniforms.spot_lights.len());
    assert!(gobos[0].has_texture);
    assert_eq!(gobos[0].intensity, 2.0);
    assert_ne!(maps[0], ctx.textures().placeholder());

    // Light's up is world -Z; in this camera's space it points away and down
    let view = camera.view_matrix();
    let expected_up = view.transform_vector(&Vec3::new(0.0, 0.0, -1.0)).normalize();
    assert_relative_eq!(gobos[0].up, expected_up, epsilon = 1e-5);

    let surface = view.transform_point(&Point3::origin()).coords;
    let map = ctx.textures().get_or_placeholder(maps[0]);
    let incident = get_spot_light_info(&uniforms.spot_lights[0].info(), surface, &gobos[0], map);
    assert!(incident.visible);
    // linear red * intensity 2 * inverse square at distance 4
    assert_relative_eq!(incident.color, Vec3::new(0.125, 0.0, 0.0), epsilon = 1e-4);
}

#[test]
fn test_untextured_slot_keeps_light_color() {
    let loader = ScriptedLoader::new();
    let mut ctx = context(&loader);
    let mut scene = Scene::new();
    let camera = camera();
    downward_spot(&mut scene, "plain", 0.0, false);

    ctx.tick(&scene, &camera);
    let mut programs = ProgramStore::with_key();
    let (uniforms, key) = compile(&scene, &camera, &mut programs);
    let mut extension = ShadingExtension::new();
    extension.on_program_compiled(key, &mut programs, &ctx, &scene, &camera);

    let gobo = programs[key].gobo_uniforms().unwrap()[0];
    assert!(!gobo.has_texture);
    assert_eq!(gobo.intensity, ctx.config().unbound_intensity);

    let surface = camera.view_matrix().transform_point(&Point3::origin()).coords;
    let placeholder = ctx.textures().get_or_placeholder(ctx.textures().placeholder());
    let incident = get_spot_light_info(&uniforms.spot_lights[0].info(), surface, &gobo, placeholder);
    assert_relative_eq!(incident.color, Vec3::new(1.0, 1.0, 1.0) / 16.0, epsilon = 1e-4);
}

#[test]
fn test_last_source_wins_regardless_of_completion_order() {
    let loader = ScriptedLoader::new();
    let mut ctx = context(&loader);
    let mut scene = Scene::new();
    let camera = camera();
    let light = downward_spot(&mut scene, "key", 0.0, false);

    let mut component = SpotLightTexture::new(light).with_src("first.png");
    component.on_init(&mut ctx);
    component.src = Some("second.png".to_string());
    component.on_update(&mut ctx, ChangedFields::SRC);

    loader.complete("second.png", [0, 255, 0, 255]);
    ctx.tick(&scene, &camera);
    loader.complete("first.png", [255, 0, 0, 255]);
    ctx.tick(&scene, &camera);

    let handle = ctx.bindings().get(light).unwrap().resolved_texture().unwrap();
    let texture = ctx.textures().get(handle).unwrap();
    assert_eq!(texture.name.as_deref(), Some("second.png"));
    // placeholder plus the one live texture
    assert_eq!(ctx.textures().len(), 2);
}

#[test]
fn test_last_source_wins_when_loads_finish_in_request_order() {
    let loader = ScriptedLoader::new();
    let mut ctx = context(&loader);
    let mut scene = Scene::new();
    let camera = camera();
    let light = downward_spot(&mut scene, "key", 0.0, false);

    let mut component = SpotLightTexture::new(light).with_src("first.png");
    component.on_init(&mut ctx);
    component.src = Some("second.png".to_string());
    component.on_update(&mut ctx, ChangedFields::SRC);

    loader.complete("first.png", [255, 0, 0, 255]);
    ctx.tick(&scene, &camera);
    assert_eq!(ctx.bindings().get(light).unwrap().resolved_texture(), None);
    assert!(!ctx.build_aux_light_data(&scene, &camera).entries[0].has_texture);
    assert_eq!(ctx.textures().len(), 1);

    loader.complete("second.png", [0, 255, 0, 255]);
    ctx.tick(&scene, &camera);
    let handle = ctx.bindings().get(light).unwrap().resolved_texture().unwrap();
    assert_eq!(ctx.textures().get(handle).unwrap().name.as_deref(), Some("second.png"));
    assert_eq!(ctx.textures().len(), 2);
}

#[test]
fn test_failed_load_degrades_to_untextured() {
    let loader = ScriptedLoader::new();
    let mut ctx = context(&loader);
    let mut scene = Scene::new();
    let camera = camera();
    let light = downward_spot(&mut scene, "key", 0.0, false);

    SpotLightTexture::new(light).with_src("missing.png").on_init(&mut ctx);
    loader.fail("missing.png");
    ctx.tick(&scene, &camera);

    let aux = ctx.build_aux_light_data(&scene, &camera);
    assert!(!aux.entries[0].has_texture);
    assert_eq!(aux.maps[0], ctx.textures().placeholder());
}

#[test]
fn test_removed_component_falls_back_to_unbound() {
    let loader = ScriptedLoader::new();
    let mut ctx = context(&loader);
    let mut scene = Scene::new();
    let camera = camera();
    let light = downward_spot(&mut scene, "key", 0.0, false);

    let mut component = SpotLightTexture::new(light).with_src("red.png").with_intensity(4.0);
    component.on_init(&mut ctx);
    loader.complete("red.png", [255, 0, 0, 255]);
    ctx.tick(&scene, &camera);
    assert!(ctx.build_aux_light_data(&scene, &camera).entries[0].has_texture);

    component.on_remove(&mut ctx);
    let aux = ctx.build_aux_light_data(&scene, &camera);
    assert!(!aux.entries[0].has_texture);
    assert_eq!(aux.entries[0].intensity, 1.0);
    assert_eq!(ctx.textures().len(), 1);
}

#[test]
fn test_aux_array_follows_registry_order() {
    let loader = ScriptedLoader::new();
    let mut ctx = context(&loader);
    let mut scene = Scene::new();
    let camera = camera();
    let plain = downward_spot(&mut scene, "plain", -2.0, false);
    let caster = downward_spot(&mut scene, "caster", 2.0, true);

    SpotLightTexture::new(caster).with_intensity(7.0).on_init(&mut ctx);
    ctx.tick(&scene, &camera);

    assert_eq!(ctx.registry().lights(), &[caster, plain]);
    let aux = ctx.build_aux_light_data(&scene, &camera);
    assert_eq!(aux.len(), ctx.registry().len());
    assert_eq!(aux.entries[0].intensity, 7.0);
    assert_eq!(aux.entries[1].intensity, 1.0);
    assert_eq!(
        ctx.registry().lights(),
        LightUniforms::pack(&scene, &camera).spot_light_sources.as_slice()
    );

    scene.remove(caster);
    ctx.tick(&scene, &camera);
    let aux = ctx.build_aux_light_data(&scene, &camera);
    assert_eq!(aux.len(), 1);
    assert_eq!(aux.entries[0].intensity, 1.0);
}

#[test]
fn test_before_render_is_noop_until_compiled() {
    let loader = ScriptedLoader::new();
    let mut ctx = context(&loader);
    let mut scene = Scene::new();
    let camera = camera();
    downward_spot(&mut scene, "key", 0.0, false);
    ctx.tick(&scene, &camera);

    let mut programs = ProgramStore::with_key();
    let (_, key) = compile(&scene, &camera, &mut programs);
    let extension = ShadingExtension::new();
    extension.on_before_render(&mut programs, &ctx, &scene, &camera);
    assert!(programs[key].gobo_uniforms().is_none());
    assert!(extension.program().is_none());
}

#[test]
fn test_before_render_republishes_for_moved_camera() {
    let loader = ScriptedLoader::new();
    let mut ctx = context(&loader);
    let mut scene = Scene::new();
    let first_camera = camera();
    downward_spot(&mut scene, "key", 0.0, false);
    ctx.tick(&scene, &first_camera);

    let mut programs = ProgramStore::with_key();
    let (_, key) = compile(&scene, &first_camera, &mut programs);
    let mut extension = ShadingExtension::new();
    extension.on_program_compiled(key, &mut programs, &ctx, &scene, &first_camera);
    let before = programs[key].gobo_uniforms().unwrap()[0].up;

    // Idempotent for an unchanged frame
    extension.on_before_render(&mut programs, &ctx, &scene, &first_camera);
    assert_eq!(programs[key].gobo_uniforms().unwrap()[0].up, before);

    let moved = Camera::look_at(Vec3::new(10.0, 5.0, 0.0), Vec3::zeros(), Vec3::y());
    ctx.tick(&scene, &moved);
    extension.on_before_render(&mut programs, &ctx, &scene, &moved);
    let after = programs[key].gobo_uniforms().unwrap()[0].up;
    assert!((after - before).norm() > 0.1);
    assert_relative_eq!(after.norm(), 1.0, epsilon = 1e-5);

    programs.remove(key);
    extension.on_before_render(&mut programs, &ctx, &scene, &moved);
}

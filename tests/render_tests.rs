//! Renderer Integration Tests
//!
//! Tests for:
//! - Forward and deferred paths producing identical frames
//! - Depth resolution between overlapping meshes drawn in parallel
//! - Fragment-stage call counts under overdraw
//! - Background fill, translucency, supersampling and gamma passes
//! - Shadow and ambient occlusion on opted-in materials
//! - Settings validation and the missing-camera error

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::{Vec3, Vec4};
use image::{Rgba, RgbaImage};
use tessera::resources::material::{BlinnPhongMaterial, MaterialFlags, MaterialKind, standard_vertex_shader};
use tessera::resources::primitives::{PlaneOptions, SphereOptions, create_plane, create_sphere};
use tessera::{Camera, Light, Material, Mesh, RenderPath, Renderer, RendererSettings, Scene, TesseraError, Texture};

// ============================================================================
// Helpers
// ============================================================================

fn settings(width: u32, height: u32) -> RendererSettings {
    RendererSettings {
        width,
        height,
        block_size: 8,
        concurrency: 4,
        ..Default::default()
    }
}

/// Orthographic camera looking down `-Z` from `z = 5`, seeing `[-1, 1]²`.
fn ortho_camera() -> Camera {
    Camera::new_orthographic(1.0, 1.0, 0.1, 10.0).looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
}

fn plane(size: f32, material: Material) -> Mesh {
    let geometry = create_plane(PlaneOptions {
        width: size,
        height: size,
        ..Default::default()
    });
    Mesh::new(Arc::new(geometry), Arc::new(material))
}

fn checker() -> Arc<Texture> {
    let image = RgbaImage::from_fn(8, 8, |x, y| {
        if (x + y) % 2 == 0 { Rgba([240, 200, 40, 255]) } else { Rgba([30, 60, 220, 255]) }
    });
    Arc::new(Texture::with_mipmaps(image))
}

/// Two lit meshes side by side that never overlap on screen.
fn lit_scene() -> Scene {
    let mut scene = Scene::new();
    scene.add(ortho_camera());

    let sun = scene.add(Light::new_directional(Vec3::new(1.0, 0.9, 0.8), 1.0));
    scene.transform_mut(sun).unwrap().set_rotation_euler(-0.4, 0.3, 0.0);
    scene.add(Light::new_ambient(Vec3::ONE, 0.2));
    let bulb = scene.add(Light::new_point(Vec3::new(0.2, 0.4, 1.0), 0.5));
    scene.transform_mut(bulb).unwrap().position = Vec3::new(0.0, 1.0, 2.0);

    let textured = Material::new(MaterialKind::BlinnPhong(
        BlinnPhongMaterial::new(Vec4::ONE).with_texture(checker()),
    ));
    let left = scene.add(plane(0.6, textured));
    scene.transform_mut(left).unwrap().position = Vec3::new(-0.5, 0.0, 0.0);

    let sphere = Mesh::new(
        Arc::new(create_sphere(SphereOptions {
            radius: 0.3,
            ..Default::default()
        })),
        Arc::new(Material::new_blinn_phong(Vec4::new(0.8, 0.2, 0.2, 1.0))),
    );
    let right = scene.add(sphere);
    scene.transform_mut(right).unwrap().position = Vec3::new(0.5, 0.0, 0.0);
    scene
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn render(scene: &Scene, settings: RendererSettings) -> RgbaImage {
    init_logger();
    Renderer::new(settings).unwrap().render(scene).unwrap()
}

// ============================================================================
// Geometry passes
// ============================================================================

#[test]
fn forward_and_deferred_frames_match() {
    let scene = lit_scene();
    let forward = render(&scene, settings(48, 48));
    let deferred = render(
        &scene,
        RendererSettings {
            path: RenderPath::Deferred,
            ..settings(48, 48)
        },
    );

    assert_eq!(forward.dimensions(), (48, 48));
    assert_eq!(forward, deferred);
    // Something was actually drawn.
    assert!(forward.pixels().any(|p| *p != Rgba([0, 0, 0, 255])));
}

#[test]
fn forward_and_deferred_match_with_post_processing() {
    let scene = lit_scene();
    let base = RendererSettings {
        msaa: 2,
        gamma_correction: true,
        ..settings(24, 24)
    };
    let forward = render(&scene, base.clone());
    let deferred = render(
        &scene,
        RendererSettings {
            path: RenderPath::Deferred,
            ..base
        },
    );
    assert_eq!(forward.dimensions(), (24, 24));
    assert_eq!(forward, deferred);
}

#[test]
fn uncovered_pixels_get_background() {
    let mut scene = Scene::new();
    scene.add(ortho_camera());
    scene.add(plane(1.0, Material::new_basic(Vec4::new(0.0, 1.0, 0.0, 1.0))));

    for path in [RenderPath::Forward, RenderPath::Deferred] {
        let image = render(
            &scene,
            RendererSettings {
                background: [10, 20, 30, 255],
                path,
                ..settings(32, 32)
            },
        );
        assert_eq!(*image.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
        assert_eq!(*image.get_pixel(31, 31), Rgba([10, 20, 30, 255]));
        assert_eq!(*image.get_pixel(16, 16), Rgba([0, 255, 0, 255]));
    }
}

#[test]
fn nearer_mesh_wins_regardless_of_order() {
    let mut scene = Scene::new();
    scene.add(ortho_camera());
    let near = scene.add(plane(4.0, Material::new_basic(Vec4::new(0.0, 1.0, 0.0, 1.0))));
    scene.transform_mut(near).unwrap().position = Vec3::new(0.0, 0.0, 1.0);
    scene.add(plane(4.0, Material::new_basic(Vec4::new(1.0, 0.0, 0.0, 1.0))));

    let mut renderer = Renderer::new(settings(32, 32)).unwrap();
    for _ in 0..4 {
        let image = renderer.render(&scene).unwrap();
        assert!(image.pixels().all(|p| *p == Rgba([0, 255, 0, 255])));
    }

    // Depth at z = 1 seen from z = 5 over [0.1, 10] in reverse-Z.
    let expected = ((10.0 - 4.0) / (10.0 - 0.1) * 255.0_f32).round() as u8;
    let depth = renderer.depth_image();
    let gray = depth.get_pixel(5, 7)[0];
    assert!(gray.abs_diff(expected) <= 1, "gray {gray}, expected {expected}");
}

#[test]
fn hidden_and_materialless_meshes_are_skipped() {
    let mut scene = Scene::new();
    scene.add(ortho_camera());
    let mut hidden = plane(4.0, Material::new_basic(Vec4::ONE));
    hidden.visible = false;
    scene.add(hidden);
    scene.add(Mesh::without_material(Arc::new(create_plane(PlaneOptions::default()))));

    let mut renderer = Renderer::new(settings(16, 16)).unwrap();
    let image = renderer.render(&scene).unwrap();
    assert!(image.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    assert!(renderer.depth_image().pixels().all(|p| *p == Rgba([0, 0, 0, 0])));
}

/// Three full-screen planes stacked along the view axis, sharing a material
/// whose fragment stage counts its calls.
fn stacked_counting_scene() -> (Scene, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let material = Material::new_custom(standard_vertex_shader, move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Rgba([200, 100, 50, 255])
    });

    let mut scene = Scene::new();
    scene.add(ortho_camera());
    for z in [0.0, 0.5, 1.0] {
        let key = scene.add(plane(4.0, material.clone()));
        scene.transform_mut(key).unwrap().position = Vec3::new(0.0, 0.0, z);
    }
    (scene, calls)
}

#[test]
fn deferred_shades_each_pixel_once() {
    let (scene, calls) = stacked_counting_scene();
    let image = render(
        &scene,
        RendererSettings {
            path: RenderPath::Deferred,
            ..settings(16, 16)
        },
    );
    assert_eq!(calls.load(Ordering::SeqCst), 16 * 16);
    assert!(image.pixels().all(|p| *p == Rgba([200, 100, 50, 255])));
}

#[test]
fn forward_overdraw_is_bounded_by_covering_layers() {
    let (scene, calls) = stacked_counting_scene();
    let image = render(&scene, settings(16, 16));
    let calls = calls.load(Ordering::SeqCst);
    assert!((16 * 16..=3 * 16 * 16).contains(&calls), "{calls} fragment calls");
    assert!(image.pixels().all(|p| *p == Rgba([200, 100, 50, 255])));
}

#[test]
fn translucent_surfaces_blend_over_background() {
    let mut scene = Scene::new();
    scene.add(ortho_camera());
    scene.add(plane(4.0, Material::new_basic(Vec4::new(1.0, 1.0, 1.0, 0.5))));

    let forward = render(&scene, settings(16, 16));
    let deferred = render(
        &scene,
        RendererSettings {
            path: RenderPath::Deferred,
            ..settings(16, 16)
        },
    );
    assert_eq!(forward, deferred);
    assert!(forward.pixels().all(|p| *p == Rgba([128, 128, 128, 255])));
}

// ============================================================================
// Post-processing
// ============================================================================

/// A white floor that receives shadows and a small red card floating above
/// it, optionally lit by a sun travelling towards `+X, -Z`.
fn shadow_scene(with_sun: bool) -> Scene {
    let mut scene = Scene::new();
    scene.add(ortho_camera());
    if with_sun {
        let sun = scene.add(Light::new_directional(Vec3::ONE, 1.0));
        scene.transform_mut(sun).unwrap().set_rotation_euler(0.0, -std::f32::consts::FRAC_PI_4, 0.0);
    } else {
        scene.add(Light::new_point(Vec3::ONE, 1.0));
    }

    scene.add(plane(4.0, Material::new_basic(Vec4::ONE).with_flags(MaterialFlags::RECEIVE_SHADOW)));
    let card = scene.add(plane(0.5, Material::new_basic(Vec4::new(1.0, 0.0, 0.0, 1.0))));
    scene.transform_mut(card).unwrap().position = Vec3::new(0.0, 0.0, 0.5);
    scene
}

#[test]
fn shadow_darkens_receivers_behind_occluders() {
    let scene = shadow_scene(true);
    let base = RendererSettings {
        shadow_map_size: 128,
        ..settings(32, 32)
    };
    let forward = render(&scene, base.clone());
    let deferred = render(
        &scene,
        RendererSettings {
            path: RenderPath::Deferred,
            ..base
        },
    );
    assert_eq!(forward, deferred);

    // The card's shadow falls half a unit towards +X.
    let shadowed = forward.get_pixel(24, 16);
    assert!(shadowed[0] < 200 && shadowed[0] == shadowed[2], "{shadowed:?}");
    assert_eq!(*forward.get_pixel(8, 8), Rgba([255, 255, 255, 255]));
    // The card casts but does not receive.
    assert_eq!(*forward.get_pixel(16, 16), Rgba([255, 0, 0, 255]));
}

#[test]
fn shadow_needs_a_directional_light() {
    let scene = shadow_scene(false);
    let image = render(&scene, settings(32, 32));
    assert_eq!(*image.get_pixel(24, 16), Rgba([255, 255, 255, 255]));
}

#[test]
fn ambient_occlusion_darkens_contact_areas() {
    let mut scene = Scene::new();
    scene.add(ortho_camera());
    scene.add(plane(4.0, Material::new_basic(Vec4::ONE).with_flags(MaterialFlags::AMBIENT_OCCLUSION)));
    let card = scene.add(plane(0.5, Material::new_basic(Vec4::new(1.0, 0.0, 0.0, 1.0))));
    scene.transform_mut(card).unwrap().position = Vec3::new(0.0, 0.0, 0.5);

    let forward = render(&scene, settings(32, 32));
    let deferred = render(
        &scene,
        RendererSettings {
            path: RenderPath::Deferred,
            ..settings(32, 32)
        },
    );
    assert_eq!(forward, deferred);

    let crease = forward.get_pixel(21, 16);
    assert!(crease[0] < 255, "{crease:?}");
    assert_eq!(*forward.get_pixel(2, 2), Rgba([255, 255, 255, 255]));
    assert_eq!(*forward.get_pixel(16, 16), Rgba([255, 0, 0, 255]));
}

#[test]
fn supersampled_frame_is_resolved_to_output_size() {
    let mut scene = Scene::new();
    scene.add(ortho_camera());
    scene.add(plane(4.0, Material::new_basic(Vec4::new(1.0, 0.0, 0.0, 1.0))));

    let mut renderer = Renderer::new(RendererSettings {
        msaa: 3,
        ..settings(20, 10)
    })
    .unwrap();
    let image = renderer.render(&scene).unwrap();

    assert_eq!(image.dimensions(), (20, 10));
    assert_eq!(renderer.frame_buffer().width(), 60);
    assert_eq!(renderer.frame_buffer().height(), 30);
    assert!(image.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
}

#[test]
fn gamma_pass_encodes_background() {
    let mut scene = Scene::new();
    scene.add(ortho_camera());

    let image = render(
        &scene,
        RendererSettings {
            background: [64, 128, 255, 200],
            gamma_correction: true,
            gamma: 2.2,
            ..settings(8, 8)
        },
    );
    let encode = |c: u8| ((f32::from(c) / 255.0).powf(1.0 / 2.2) * 255.0).round() as u8;
    let expected = Rgba([encode(64), encode(128), 255, 200]);
    assert!(image.pixels().all(|p| *p == expected));
}

#[test]
fn screen_pass_runs_on_the_renderer_pool() {
    let renderer = Renderer::new(settings(4, 4)).unwrap();
    let mut image = RgbaImage::new(37, 19);
    renderer.screen_pass(&mut image, |x, y, _| Rgba([x as u8, y as u8, 1, 255]));
    assert!(image.enumerate_pixels().all(|(x, y, p)| *p == Rgba([x as u8, y as u8, 1, 255])));
}

// ============================================================================
// Configuration and errors
// ============================================================================

#[test]
fn render_without_camera_fails() {
    let mut scene = Scene::new();
    scene.add(plane(1.0, Material::new_basic(Vec4::ONE)));
    let mut renderer = Renderer::new(settings(8, 8)).unwrap();
    assert!(matches!(renderer.render(&scene), Err(TesseraError::MissingCamera)));
}

#[test]
fn invalid_settings_are_rejected() {
    assert!(matches!(
        Renderer::new(RendererSettings {
            width: 0,
            ..Default::default()
        }),
        Err(TesseraError::InvalidSize { .. })
    ));

    let mut renderer = Renderer::new(settings(8, 8)).unwrap();
    let bad = RendererSettings {
        msaa: 0,
        ..settings(8, 8)
    };
    assert!(matches!(renderer.set_settings(bad), Err(TesseraError::InvalidMultisample(0))));
    assert_eq!(renderer.settings(), &settings(8, 8));
}

#[test]
fn overflowing_render_size_is_rejected() {
    let result = Renderer::new(RendererSettings {
        width: 70_000,
        height: 1,
        msaa: 70_000,
        ..Default::default()
    });
    assert!(matches!(result, Err(TesseraError::InvalidMultisample(70_000))));
}

#[test]
fn set_settings_resizes_frame_buffer() -> anyhow::Result<()> {
    init_logger();
    let mut scene = Scene::new();
    scene.add(ortho_camera());
    let mut renderer = Renderer::new(settings(8, 8))?;
    renderer.set_settings(RendererSettings {
        concurrency: 2,
        ..settings(12, 6)
    })?;

    assert_eq!(renderer.pool().limit(), 2);
    assert_eq!(renderer.frame_buffer().width(), 12);
    assert_eq!(renderer.render(&scene)?.dimensions(), (12, 6));
    Ok(())
}

#[test]
fn settings_load_from_json() -> anyhow::Result<()> {
    let settings = RendererSettings::from_json(r#"{ "width": 64, "height": 32, "path": "deferred", "msaa": 2 }"#)?;
    assert_eq!(settings.render_size(), (128, 64));
    assert_eq!(settings.path, RenderPath::Deferred);
    assert_eq!(settings.block_size, 32);

    assert!(matches!(
        RendererSettings::from_json(r#"{ "gamma": -1.0 }"#),
        Err(TesseraError::InvalidGamma(_))
    ));
    assert!(matches!(RendererSettings::from_json("{"), Err(TesseraError::SettingsParse(_))));
    Ok(())
}

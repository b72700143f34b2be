//! End-to-end rendering of tiny scenes.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ember_core::{parse_scene, Material, Mesh, Scene};
use ember_math::Transform;
use ember_renderer::{
    generate_buckets, render, render_with_progress, trace_path, BuildStrategy, BvhConfig, Camera,
    RandomSampler, Ray, RenderConfig, Termination, TraversalMode, Triangle, Vec3, World,
};

/// A huge emissive triangle filling the whole view of the default camera.
fn light_wall(emission: Vec3) -> World {
    let triangles = vec![Triangle::flat(
        Vec3::new(-100.0, -100.0, -2.0),
        Vec3::new(100.0, -100.0, -2.0),
        Vec3::new(0.0, 100.0, -2.0),
        0,
    )];
    World::new(
        triangles,
        Vec::new(),
        vec![Material::light("wall", emission)],
        &BvhConfig::default(),
    )
    .unwrap()
}

/// Closed box with a light on the ceiling, a glossy cube and a glass ball.
fn small_room(strategy: BuildStrategy) -> World {
    let mut scene = Scene::new("room");
    let white = scene.add_material(Material::diffuse("white", Vec3::splat(0.75)));
    let red = scene.add_material(Material::diffuse("red", Vec3::new(0.75, 0.1, 0.1)));
    let lamp = scene.add_material(Material::light("lamp", Vec3::splat(8.0)));
    let metal = scene.add_material(Material::brushed_metal());
    let glass = scene.add_material(Material::glass("glass", 1.5));

    let quad = Arc::new(Mesh::quad());
    let walls = [
        (Vec3::new(0.0, -1.0, 0.0), Vec3::ZERO, white),
        (Vec3::new(0.0, 1.0, 0.0), Vec3::new(180.0, 0.0, 0.0), white),
        (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -90.0), red),
        (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 90.0), white),
        (Vec3::new(0.0, 0.0, -1.0), Vec3::new(90.0, 0.0, 0.0), white),
    ];
    for (i, (position, rotation, material)) in walls.into_iter().enumerate() {
        scene.add_mesh(
            format!("wall{}", i),
            Arc::clone(&quad),
            material,
            Transform::from_translation(position)
                .with_rotation(rotation)
                .with_scale(Vec3::splat(2.0)),
        );
    }
    scene.add_mesh(
        "light",
        Arc::clone(&quad),
        lamp,
        Transform::from_translation(Vec3::new(0.0, 0.99, 0.0))
            .with_rotation(Vec3::new(180.0, 0.0, 0.0))
            .with_scale(Vec3::splat(0.6)),
    );
    scene.add_mesh(
        "block",
        Arc::new(Mesh::cube()),
        metal,
        Transform::from_translation(Vec3::new(-0.4, -0.7, -0.3))
            .with_rotation(Vec3::new(0.0, 20.0, 0.0))
            .with_scale(Vec3::new(0.5, 0.6, 0.5)),
    );
    scene.add_sphere("ball", Vec3::new(0.45, -0.65, 0.1), 0.35, glass);

    World::from_scene(
        &scene,
        &BvhConfig {
            strategy,
            ..Default::default()
        },
    )
    .unwrap()
}

fn room_camera(width: u32, height: u32) -> Camera {
    Camera::new()
        .with_resolution(width, height)
        .with_position(Vec3::new(0.0, 0.0, 3.5))
        .with_fov(40.0)
}

#[test]
fn emissive_only_scene_converges_to_emission() {
    let emission = Vec3::new(1.0, 0.5, 0.0);
    let world = light_wall(emission);
    let camera = Camera::new().with_resolution(12, 8);

    for samples_per_pixel in [1, 4, 16] {
        let config = RenderConfig {
            samples_per_pixel,
            bucket_size: 5,
            ..Default::default()
        };
        let image = render(&world, &camera, &config).unwrap();

        for pixel in &image.pixels {
            assert!((*pixel - emission).abs().max_element() < 1e-6);
        }
        assert!(image
            .to_rgb8()
            .chunks_exact(3)
            .all(|rgb| rgb == [255, 128, 0]));
    }
}

#[test]
fn radiance_is_non_negative_and_finite() {
    let world = small_room(BuildStrategy::Sah);
    let camera = room_camera(24, 18);
    let config = RenderConfig {
        samples_per_pixel: 4,
        bucket_size: 8,
        seed: 17,
        ..Default::default()
    };

    let image = render(&world, &camera, &config).unwrap();

    assert_eq!(image.pixels.len(), 24 * 18);
    for pixel in &image.pixels {
        assert!(pixel.is_finite());
        assert!(pixel.min_element() >= 0.0);
    }
    // The room is lit: some pixel must be non-black
    assert!(image.pixels.iter().any(|p| p.max_element() > 0.0));
    assert_eq!(image.to_rgb8().len(), 24 * 18 * 3);
}

#[test]
fn paths_never_exceed_depth_limit() {
    let world = small_room(BuildStrategy::Median);
    let config = RenderConfig {
        survival_probability: 1.0,
        ..Default::default()
    };
    let mut sampler = RandomSampler::new(123);
    let mut seen_depth_cutoff = false;

    for _ in 0..2000 {
        let direction = sampler.random_unit_vector();
        let ray = Ray::new(Vec3::new(0.1, 0.2, 0.3), direction);
        let sample = trace_path(&world, &ray, &config, &mut sampler);

        assert!(sample.vertices <= config.max_depth + 1);
        assert!(sample.radiance.min_element() >= 0.0);
        if sample.termination == Termination::DepthExhausted {
            seen_depth_cutoff = true;
            assert_eq!(sample.vertices, config.max_depth + 1);
        }
    }
    assert!(seen_depth_cutoff);
}

#[test]
fn render_is_independent_of_thread_count() {
    let world = small_room(BuildStrategy::Median);
    let camera = room_camera(20, 12);
    let base = RenderConfig {
        samples_per_pixel: 2,
        bucket_size: 6,
        seed: 5,
        ..Default::default()
    };

    let single = RenderConfig {
        threads: Some(1),
        ..base.clone()
    };
    let several = RenderConfig {
        threads: Some(3),
        ..base.clone()
    };

    let single = render(&world, &camera, &single).unwrap();
    let several = render(&world, &camera, &several).unwrap();
    let global = render(&world, &camera, &base).unwrap();

    assert_eq!(single, several);
    assert_eq!(single, global);
}

#[test]
fn different_seeds_give_different_noise() {
    let world = small_room(BuildStrategy::Median);
    let camera = room_camera(16, 12);
    let config = RenderConfig {
        samples_per_pixel: 2,
        ..Default::default()
    };

    let a = render(&world, &camera, &RenderConfig { seed: 1, ..config.clone() }).unwrap();
    let b = render(&world, &camera, &RenderConfig { seed: 2, ..config }).unwrap();

    assert_ne!(a.pixels, b.pixels);
}

#[test]
fn traversal_modes_agree() {
    let world = small_room(BuildStrategy::Sah);
    let camera = room_camera(16, 12);
    let bvh = RenderConfig {
        samples_per_pixel: 2,
        seed: 9,
        traversal: TraversalMode::Bvh,
        ..Default::default()
    };
    let brute = RenderConfig {
        traversal: TraversalMode::BruteForce,
        ..bvh.clone()
    };

    let fast = render(&world, &camera, &bvh).unwrap();
    let slow = render(&world, &camera, &brute).unwrap();

    assert_eq!(fast.to_rgb8(), slow.to_rgb8());
}

#[test]
fn progress_reports_every_bucket() {
    let world = light_wall(Vec3::ONE);
    let camera = Camera::new().with_resolution(30, 20);
    let config = RenderConfig {
        samples_per_pixel: 1,
        bucket_size: 8,
        ..Default::default()
    };
    let finished = AtomicUsize::new(0);
    let pixels = AtomicUsize::new(0);

    render_with_progress(&world, &camera, &config, |result| {
        finished.fetch_add(1, Ordering::Relaxed);
        pixels.fetch_add(result.pixels.len(), Ordering::Relaxed);
    })
    .unwrap();

    assert_eq!(finished.into_inner(), generate_buckets(30, 20, 8).len());
    assert_eq!(pixels.into_inner(), 30 * 20);
}

#[test]
fn render_json_scene_to_png() {
    let json = r#"{
        "camera": { "width": 16, "height": 12, "position": [0, 0, 3] },
        "render": { "samples_per_pixel": 2, "seed": 4 },
        "bvh": { "strategy": "sah", "max_leaf_size": 2 },
        "materials": [
            { "name": "lamp", "emissive": true, "color": [1, 1, 1] },
            { "name": "grey", "color": [0.5, 0.5, 0.5] }
        ],
        "objects": [
            { "geometry": { "type": "quad" }, "material": "lamp",
              "translate": [0, 0, -1], "rotate": [90, 0, 0], "scale": [4, 1, 4] },
            { "geometry": { "type": "cube" }, "material": "grey", "rotate": [30, 45, 0] }
        ]
    }"#;
    let (scene, settings) = parse_scene(json, Path::new(".")).unwrap();

    let world = World::from_scene(&scene, &BvhConfig::from(&settings.bvh)).unwrap();
    let camera = Camera::from_settings(&settings.camera);
    let config = RenderConfig::from(&settings.render);
    let image = render(&world, &camera, &config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    image.save_png(&path).unwrap();

    let decoded = image::open(&path).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (16, 12));
    assert_eq!(decoded.into_raw(), image.to_rgb8());
}

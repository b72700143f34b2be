use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use ember_core::{
    load_obj, load_scene, BuildStrategy, Material, Mesh, Scene, SceneSettings, TraversalMode,
};
use ember_math::{Transform, Vec3};
use ember_renderer::{render_with_progress, BvhConfig, Camera, RenderConfig, World};
use indicatif::{ProgressBar, ProgressStyle};

/// Render a scene description (.json) or a bare mesh (.obj) to a PNG.
#[derive(Parser, Debug)]
#[command(name = "ember", version, about)]
struct Args {
    /// Scene description (.json) or Wavefront mesh (.obj)
    input: PathBuf,

    /// Output image path
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Samples per pixel
    #[arg(short, long)]
    spp: Option<u32>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (defaults to one per core)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Maximum number of bounces per path
    #[arg(long)]
    max_depth: Option<u32>,

    /// BVH split strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Maximum triangles per BVH leaf
    #[arg(long)]
    leaf_size: Option<usize>,

    /// Ray/scene intersection mode
    #[arg(long, value_enum)]
    traversal: Option<TraversalArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Median,
    Sah,
}

impl From<StrategyArg> for BuildStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Median => BuildStrategy::Median,
            StrategyArg::Sah => BuildStrategy::Sah,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TraversalArg {
    Bvh,
    BruteForce,
}

impl From<TraversalArg> for TraversalMode {
    fn from(arg: TraversalArg) -> Self {
        match arg {
            TraversalArg::Bvh => TraversalMode::Bvh,
            TraversalArg::BruteForce => TraversalMode::BruteForce,
        }
    }
}

impl Args {
    /// Command-line values take precedence over the scene file.
    fn apply(&self, settings: &mut SceneSettings) {
        if let Some(width) = self.width {
            settings.camera.width = width;
        }
        if let Some(height) = self.height {
            settings.camera.height = height;
        }
        if let Some(spp) = self.spp {
            settings.render.samples_per_pixel = spp;
        }
        if let Some(seed) = self.seed {
            settings.render.seed = seed;
        }
        if let Some(threads) = self.threads {
            settings.render.threads = Some(threads);
        }
        if let Some(max_depth) = self.max_depth {
            settings.render.max_depth = max_depth;
        }
        if let Some(strategy) = self.strategy {
            settings.bvh.strategy = strategy.into();
        }
        if let Some(leaf_size) = self.leaf_size {
            settings.bvh.max_leaf_size = leaf_size;
        }
        if let Some(traversal) = self.traversal {
            settings.render.traversal = traversal.into();
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    let (scene, mut settings) = load_input(&args.input)?;
    args.apply(&mut settings);

    let start = Instant::now();
    let world = World::from_scene(&scene, &BvhConfig::from(&settings.bvh))
        .context("Failed to build render world")?;
    log::info!(
        "World ready in {:.2?} (largest BVH leaf: {} triangles)",
        start.elapsed(),
        world.bvh.stats().largest_leaf
    );

    let camera = Camera::from_settings(&settings.camera);
    let config = RenderConfig::from(&settings.render);

    let progress = ProgressBar::new(u64::from(camera.image_width) * u64::from(camera.image_height));
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} (eta: {eta})")?
            .progress_chars("#>-"),
    );

    let image = render_with_progress(&world, &camera, &config, |result| {
        progress.inc(result.pixels.len() as u64);
    })
    .context("Render failed")?;
    progress.finish();

    image
        .save_png(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    Ok(())
}

/// Load a scene description, or wrap a bare mesh in a default scene.
fn load_input(path: &Path) -> Result<(Scene, SceneSettings)> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => {
            load_scene(path).with_context(|| format!("Failed to load scene {}", path.display()))
        }
        Some("obj") => {
            let meshes =
                load_obj(path).with_context(|| format!("Failed to load mesh {}", path.display()))?;
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("mesh")
                .to_string();
            Ok(mesh_scene(name, meshes))
        }
        _ => bail!(
            "Unsupported input {}: expected a .json scene or an .obj mesh",
            path.display()
        ),
    }
}

/// Meshes in brushed metal under a red emissive panel, framed by the camera.
fn mesh_scene(name: String, meshes: Vec<Mesh>) -> (Scene, SceneSettings) {
    let mut scene = Scene::new(name.clone());
    let metal = scene.add_material(Material::brushed_metal());
    let light = scene.add_material(Material::red_light());

    for (i, mesh) in meshes.into_iter().enumerate() {
        scene.add_mesh(
            format!("{}.{}", name, i),
            Arc::new(mesh),
            metal,
            Transform::default(),
        );
    }

    let bounds = scene.world_bounds();
    let center = bounds.center();
    let extent = bounds.size().max_element().max(1e-3);

    scene.add_mesh(
        "light",
        Arc::new(Mesh::quad()),
        light,
        Transform::from_translation(Vec3::new(center.x, bounds.max.y + extent, center.z))
            .with_rotation(Vec3::new(180.0, 0.0, 0.0))
            .with_scale(Vec3::new(extent * 2.0, 1.0, extent * 2.0)),
    );

    let mut settings = SceneSettings::default();
    settings.camera.position = center + Vec3::new(0.0, extent * 0.5, extent * 2.5);
    settings.camera.look_at = Some(center);

    (scene, settings)
}

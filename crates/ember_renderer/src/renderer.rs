//! Core path tracing renderer.
//!
//! Implements unidirectional Monte Carlo path tracing with:
//! - Russian roulette termination with unbiased compensation
//! - Specular, refractive and diffuse transport chosen per bounce
//! - A hard bounce cutoff
//! - Anti-aliasing via jittered multi-sampling
//!
//! The estimator is a loop carrying a throughput weight instead of a
//! recursive call chain.

use std::path::Path;
use std::time::Instant;

use ember_core::{Lobe, RenderSettings, TraversalMode};
use ember_math::{Ray, Vec3, EPSILON, RAY_OFFSET};
use rayon::prelude::*;

use crate::bucket::{generate_buckets, render_bucket, BucketResult};
use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::sampler::RandomSampler;
use crate::world::World;

/// Linear RGB radiance.
pub type Color = Vec3;

/// Render configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Samples per pixel for anti-aliasing
    pub samples_per_pixel: u32,
    /// Bounces past this depth return black
    pub max_depth: u32,
    /// Russian roulette survival probability `P`
    pub survival_probability: f32,
    /// Base seed for the per-bucket samplers
    pub seed: u64,
    /// Worker threads (`None` = rayon's global pool)
    pub threads: Option<usize>,
    /// Bucket edge length in pixels
    pub bucket_size: u32,
    pub traversal: TraversalMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 16,
            max_depth: 8,
            survival_probability: 0.8,
            seed: 0,
            threads: None,
            bucket_size: crate::bucket::DEFAULT_BUCKET_SIZE,
            traversal: TraversalMode::Bvh,
        }
    }
}

impl From<&RenderSettings> for RenderConfig {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            samples_per_pixel: settings.samples_per_pixel,
            max_depth: settings.max_depth,
            survival_probability: settings.survival_probability,
            seed: settings.seed,
            threads: settings.threads,
            bucket_size: settings.bucket_size,
            traversal: settings.traversal,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> RenderResult<()> {
        if self.samples_per_pixel == 0 {
            return Err(RenderError::InvalidConfig("samples_per_pixel must be at least 1".into()));
        }
        if self.bucket_size == 0 {
            return Err(RenderError::InvalidConfig("bucket_size must be at least 1".into()));
        }
        if !(self.survival_probability > 0.0 && self.survival_probability <= 1.0) {
            return Err(RenderError::InvalidConfig(format!(
                "survival_probability must be in (0, 1], got {}",
                self.survival_probability
            )));
        }
        if self.threads == Some(0) {
            return Err(RenderError::InvalidConfig("threads must be at least 1".into()));
        }
        Ok(())
    }
}

/// Why a path stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Reached a light
    Emissive,
    /// Left the scene
    Miss,
    /// Killed by Russian roulette
    Roulette,
    /// Bounced past `max_depth`
    DepthExhausted,
}

/// One radiance sample and how its path ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub radiance: Color,
    /// Number of scene queries made (at most `max_depth + 1`)
    pub vertices: u32,
    pub termination: Termination,
}

/// Radiance arriving along `ray`.
pub fn trace(world: &World, ray: &Ray, config: &RenderConfig, sampler: &mut RandomSampler) -> Color {
    trace_path(world, ray, config, sampler).radiance
}

/// Radiance arriving along `ray`, with path diagnostics.
pub fn trace_path(
    world: &World,
    ray: &Ray,
    config: &RenderConfig,
    sampler: &mut RandomSampler,
) -> PathSample {
    let survival = config.survival_probability;
    let mut throughput = Color::ONE;
    let mut ray = *ray;
    let mut depth = 0;
    let mut vertices = 0;

    let finish = |radiance: Color, vertices: u32, termination: Termination| PathSample {
        radiance,
        vertices,
        termination,
    };

    loop {
        if depth > config.max_depth {
            return finish(Color::ZERO, vertices, Termination::DepthExhausted);
        }

        vertices += 1;
        let Some(hit) = world.cast_ray(&ray, config.traversal) else {
            return finish(Color::ZERO, vertices, Termination::Miss);
        };

        let material = world.material(&hit);
        if material.emissive {
            return finish(throughput * material.color, vertices, Termination::Emissive);
        }

        if sampler.random_float() > survival {
            return finish(Color::ZERO, vertices, Termination::Roulette);
        }
        throughput /= survival;

        // Shading normal on the side the ray arrived from
        let facing = if hit.normal.dot(ray.direction) > 0.0 {
            -hit.normal
        } else {
            hit.normal
        };

        ray = match material.select_lobe(sampler.random_float()) {
            Lobe::Specular => {
                let mirror = reflect(ray.direction, facing);
                let scattered = sampler.random_direction(facing);
                let direction = mirror
                    .lerp(scattered, material.reflect_roughness)
                    .try_normalize()
                    .unwrap_or(mirror);
                throughput *= direction.dot(facing).max(0.0);
                Ray::new(hit.point + facing * RAY_OFFSET, direction)
            }
            Lobe::Refractive => {
                // Exiting when the ray travels along the outward normal
                let (normal, ratio) = if ray.direction.dot(hit.normal) > 0.0 {
                    (-hit.normal, material.eta)
                } else {
                    (hit.normal, 1.0 / material.eta)
                };

                let refracted = refract(ray.direction, normal, ratio);
                if refracted.length() < EPSILON {
                    // Total internal reflection
                    let mirror = reflect(ray.direction, normal);
                    Ray::new(hit.point + normal * RAY_OFFSET, mirror)
                } else {
                    let scattered = sampler.random_direction(-normal);
                    let direction = refracted
                        .lerp(scattered, material.refract_roughness)
                        .try_normalize()
                        .unwrap_or(refracted);
                    Ray::new(hit.point - normal * RAY_OFFSET, direction)
                }
            }
            Lobe::Diffuse => {
                let direction = sampler.random_direction(facing);
                throughput *= material.color * direction.dot(facing).max(0.0);
                Ray::new(hit.point + facing * RAY_OFFSET, direction)
            }
        };

        depth += 1;
    }
}

/// Mirror `incident` about `normal`.
#[inline]
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * incident.dot(normal) * normal
}

/// Refract unit `incident` through a surface with unit `normal` facing it.
///
/// `ratio` is the incident over transmitted index of refraction. Returns the
/// zero vector on total internal reflection.
#[inline]
pub fn refract(incident: Vec3, normal: Vec3, ratio: f32) -> Vec3 {
    let cos_i = normal.dot(incident);
    let k = 1.0 - ratio * ratio * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        Vec3::ZERO
    } else {
        ratio * incident - (ratio * cos_i + k.sqrt()) * normal
    }
}

/// Average `samples_per_pixel` jittered samples through pixel `(x, y)`.
pub fn render_pixel(
    world: &World,
    camera: &Camera,
    x: u32,
    y: u32,
    config: &RenderConfig,
    sampler: &mut RandomSampler,
) -> Color {
    let mut pixel_color = Color::ZERO;

    for _ in 0..config.samples_per_pixel {
        let ray = camera.get_ray(x, y, camera.image_width, camera.image_height, sampler);
        pixel_color += trace(world, &ray, config, sampler);
    }

    // Average the samples
    pixel_color / config.samples_per_pixel.max(1) as f32
}

/// Map a linear channel to a byte: `clamp(round(c * 255), 0, 255)`.
#[inline]
pub fn to_byte(c: f32) -> u8 {
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Convert a color to 8-bit RGB.
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    [to_byte(color.x), to_byte(color.y), to_byte(color.z)]
}

/// Simple image buffer for storing render output.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    /// Row-major, row 0 at the top
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[y as usize * self.width as usize + x as usize] = color;
    }

    /// Copy a rendered bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        for ((x, y), color) in result.bucket.pixels().zip(&result.pixels) {
            self.set(x, y, *color);
        }
    }

    /// Interleaved 8-bit RGB bytes, 3 per pixel.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgb8(*color));
        }
        bytes
    }

    /// Write the image as a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> RenderResult<()> {
        image::save_buffer_with_format(
            path.as_ref(),
            &self.to_rgb8(),
            self.width,
            self.height,
            image::ColorType::Rgb8,
            image::ImageFormat::Png,
        )?;
        log::info!("Saved {}x{} image to {}", self.width, self.height, path.as_ref().display());
        Ok(())
    }
}

/// Render the entire image.
pub fn render(world: &World, camera: &Camera, config: &RenderConfig) -> RenderResult<ImageBuffer> {
    render_with_progress(world, camera, config, |_| {})
}

/// Render the entire image, calling `progress` as each bucket completes.
///
/// Buckets are rendered in parallel, each with its own sampler seeded from
/// `config.seed` and the bucket index, so the result does not depend on the
/// thread count. `progress` runs on worker threads.
pub fn render_with_progress<F>(
    world: &World,
    camera: &Camera,
    config: &RenderConfig,
    progress: F,
) -> RenderResult<ImageBuffer>
where
    F: Fn(&BucketResult) + Sync,
{
    config.validate()?;
    let (width, height) = (camera.image_width, camera.image_height);
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidConfig(format!(
            "image resolution must be non-zero, got {}x{}",
            width, height
        )));
    }

    let buckets = generate_buckets(width, height, config.bucket_size);
    let start = Instant::now();

    let render_all = || -> Vec<BucketResult> {
        buckets
            .par_iter()
            .map(|bucket| {
                let result = render_bucket(bucket, camera, world, config);
                progress(&result);
                result
            })
            .collect()
    };

    let (results, threads) = match config.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            (pool.install(render_all), threads)
        }
        None => (render_all(), rayon::current_num_threads()),
    };

    log::info!(
        "Rendering {}x{} at {} spp: {} buckets on {} threads",
        width,
        height,
        config.samples_per_pixel,
        buckets.len(),
        threads
    );

    let mut image = ImageBuffer::new(width, height);
    for result in &results {
        image.write_bucket(result);
    }

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::BvhConfig;
    use crate::triangle::Triangle;
    use ember_core::Material;

    /// One big triangle facing +Z at z = -1 with the given material.
    fn wall(material: Material) -> World {
        let triangles = vec![Triangle::flat(
            Vec3::new(-100.0, -100.0, -1.0),
            Vec3::new(100.0, -100.0, -1.0),
            Vec3::new(0.0, 100.0, -1.0),
            0,
        )];
        World::new(triangles, Vec::new(), vec![material], &BvhConfig::default()).unwrap()
    }

    #[test]
    fn test_config_validate() {
        assert!(RenderConfig::default().validate().is_ok());

        let bad = [
            RenderConfig { samples_per_pixel: 0, ..Default::default() },
            RenderConfig { bucket_size: 0, ..Default::default() },
            RenderConfig { survival_probability: 0.0, ..Default::default() },
            RenderConfig { survival_probability: 1.5, ..Default::default() },
            RenderConfig { threads: Some(0), ..Default::default() },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(RenderError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_reflect() {
        let r = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_refract_straight_through() {
        let t = refract(Vec3::NEG_Z, Vec3::Z, 1.0 / 1.5);
        assert!((t - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_refract_snell() {
        let incident = Vec3::new(1.0, -1.0, 0.0).normalize();
        let t = refract(incident, Vec3::Y, 1.0 / 1.5);

        let sin_i = incident.x;
        let sin_t = t.x / t.length();
        assert!((sin_i - 1.5 * sin_t).abs() < 1e-5);
        assert!(t.y < 0.0);
    }

    #[test]
    fn test_refract_total_internal_reflection() {
        // Leaving glass at a grazing angle
        let incident = Vec3::new(0.9, -0.1, 0.0).normalize();
        let t = refract(incident, Vec3::Y, 1.5);
        assert_eq!(t, Vec3::ZERO);
    }

    #[test]
    fn test_to_byte_clamps_and_rounds() {
        assert_eq!(to_byte(-1.0), 0);
        assert_eq!(to_byte(0.0), 0);
        assert_eq!(to_byte(0.5), 128);
        assert_eq!(to_byte(1.0), 255);
        assert_eq!(to_byte(7.0), 255);
        assert_eq!(color_to_rgb8(Vec3::new(0.2, 0.4, 0.6)), [51, 102, 153]);
    }

    #[test]
    fn test_trace_miss_is_black() {
        let world = wall(Material::light("lamp", Vec3::ONE));
        let mut sampler = RandomSampler::new(0);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);

        let sample = trace_path(&world, &ray, &RenderConfig::default(), &mut sampler);
        assert_eq!(sample.radiance, Color::ZERO);
        assert_eq!(sample.termination, Termination::Miss);
        assert_eq!(sample.vertices, 1);
    }

    #[test]
    fn test_trace_emissive_returns_emission() {
        let emission = Vec3::new(0.9, 0.05, 0.1);
        let world = wall(Material::light("lamp", emission));
        let mut sampler = RandomSampler::new(0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let sample = trace_path(&world, &ray, &RenderConfig::default(), &mut sampler);
        assert_eq!(sample.radiance, emission);
        assert_eq!(sample.termination, Termination::Emissive);
    }

    #[test]
    fn test_emissive_lobes_are_ignored() {
        // The stock red light has specular and refractive rates but still just emits
        let world = wall(Material::red_light());
        let mut sampler = RandomSampler::new(0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        assert_eq!(trace(&world, &ray, &RenderConfig::default(), &mut sampler), Material::red_light().color);
    }

    #[test]
    fn test_depth_cutoff_inside_mirror_box() {
        // Closed mirror cube: paths can only end by roulette or depth
        let mut triangles = Vec::new();
        for tri in ember_core::Mesh::cube().triangles() {
            triangles.push(Triangle::from_mesh_triangle(&tri, 0));
        }
        let mirror = Material {
            name: "mirror".into(),
            specular_rate: 1.0,
            reflect_roughness: 0.0,
            ..Default::default()
        };
        let world = World::new(triangles, Vec::new(), vec![mirror], &BvhConfig::default()).unwrap();
        let config = RenderConfig {
            survival_probability: 1.0,
            ..Default::default()
        };

        let mut sampler = RandomSampler::new(11);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.3, 0.5, 0.8));
        let sample = trace_path(&world, &ray, &config, &mut sampler);

        assert_eq!(sample.termination, Termination::DepthExhausted);
        assert_eq!(sample.vertices, config.max_depth + 1);
        assert_eq!(sample.radiance, Color::ZERO);
    }

    /// Two triangles spanning `center ± u ± v`, facing `u × v`.
    fn quad(center: Vec3, u: Vec3, v: Vec3, material: u32) -> [Triangle; 2] {
        [
            Triangle::flat(center - u - v, center + u - v, center + u + v, material),
            Triangle::flat(center - u - v, center + u + v, center - u + v, material),
        ]
    }

    fn clear_glass() -> Material {
        Material {
            name: "clear".into(),
            specular_rate: 0.0,
            refract_rate: 1.0,
            eta: 1.5,
            refract_roughness: 0.0,
            ..Default::default()
        }
    }

    fn no_roulette() -> RenderConfig {
        RenderConfig {
            survival_probability: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_glass_slab_transmits_light() {
        let emission = Vec3::new(0.8, 0.6, 0.3);
        let mut triangles = Vec::new();
        // Slab between z = -1.2 and z = -1 with outward normals
        triangles.extend(quad(Vec3::new(0.0, 0.0, -1.0), Vec3::X * 100.0, Vec3::Y * 100.0, 0));
        triangles.extend(quad(Vec3::new(0.0, 0.0, -1.2), Vec3::Y * 100.0, Vec3::X * 100.0, 0));
        triangles.extend(quad(Vec3::new(0.0, 0.0, -3.0), Vec3::X * 100.0, Vec3::Y * 100.0, 1));
        let materials = vec![clear_glass(), Material::light("lamp", emission)];
        let world = World::new(triangles, Vec::new(), materials, &BvhConfig::default()).unwrap();

        let mut sampler = RandomSampler::new(4);
        for direction in [Vec3::NEG_Z, Vec3::new(1.0, 0.0, -2.0), Vec3::new(-0.3, 0.4, -1.0)] {
            // Off the quad diagonals
            let ray = Ray::new(Vec3::new(0.1, -0.3, 0.0), direction);
            let sample = trace_path(&world, &ray, &no_roulette(), &mut sampler);

            assert_eq!(sample.termination, Termination::Emissive);
            // Enter, exit, lamp
            assert_eq!(sample.vertices, 3);
            assert!((sample.radiance - emission).length() < 1e-6);
        }
    }

    #[test]
    fn test_total_internal_reflection_stays_inside() {
        let emission = Vec3::new(0.2, 0.9, 0.4);
        let mut triangles = Vec::new();
        // Glass below z = 0, lamp further down on the same side
        triangles.extend(quad(Vec3::ZERO, Vec3::X * 100.0, Vec3::Y * 100.0, 0));
        triangles.extend(quad(Vec3::new(0.0, 0.0, -5.0), Vec3::X * 100.0, Vec3::Y * 100.0, 1));
        let materials = vec![clear_glass(), Material::light("lamp", emission)];
        let world = World::new(triangles, Vec::new(), materials, &BvhConfig::default()).unwrap();

        // sin(incidence) ≈ 0.994, well past the critical 1 / 1.5
        let ray = Ray::new(Vec3::new(0.0, 0.0, -0.1), Vec3::new(0.9, 0.0, 0.1));
        let mut sampler = RandomSampler::new(8);
        let sample = trace_path(&world, &ray, &no_roulette(), &mut sampler);

        assert_eq!(sample.termination, Termination::Emissive);
        // A transmitted ray would re-enter the glass on its way down
        assert_eq!(sample.vertices, 2);
        assert!((sample.radiance - emission).length() < 1e-6);
    }

    #[test]
    fn test_tilted_mirror_weights_by_cosine() {
        let emission = Vec3::new(1.0, 0.5, 0.25);
        let mirror = Material {
            name: "mirror".into(),
            color: Vec3::splat(0.3),
            specular_rate: 1.0,
            reflect_roughness: 0.0,
            ..Default::default()
        };
        let mut triangles = Vec::new();
        triangles.extend(quad(Vec3::ZERO, Vec3::X * 100.0, Vec3::Y * 100.0, 0));
        // Lamp standing at x = 5, facing the mirror
        triangles.extend(quad(Vec3::new(5.0, 0.0, 0.0), Vec3::Z * 100.0, Vec3::Y * 100.0, 1));
        let materials = vec![mirror, Material::light("lamp", emission)];
        let world = World::new(triangles, Vec::new(), materials, &BvhConfig::default()).unwrap();

        let mut sampler = RandomSampler::new(2);
        for (origin, direction) in [
            (Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, -1.0)),
            (Vec3::new(0.0, 0.0, 2.0), Vec3::new(1.0, 0.0, -0.5)),
        ] {
            let ray = Ray::new(origin, direction);
            let outgoing = reflect(ray.direction, Vec3::Z);
            let sample = trace_path(&world, &ray, &no_roulette(), &mut sampler);

            assert_eq!(sample.termination, Termination::Emissive);
            assert_eq!(sample.vertices, 2);
            // Mirror color does not tint the specular lobe
            assert!((sample.radiance - emission * outgoing.z).length() < 1e-5);
        }
    }

    #[test]
    fn test_render_pixel_averages() {
        let world = wall(Material::light("lamp", Vec3::splat(0.25)));
        let camera = Camera::new().with_resolution(8, 8).with_position(Vec3::new(0.0, 0.0, 3.0));
        let config = RenderConfig {
            samples_per_pixel: 7,
            ..Default::default()
        };
        let mut sampler = RandomSampler::new(1);

        let color = render_pixel(&world, &camera, 4, 4, &config, &mut sampler);
        assert!((color - Vec3::splat(0.25)).length() < 1e-6);
    }

    #[test]
    fn test_image_buffer_bytes() {
        let mut image = ImageBuffer::new(2, 1);
        image.set(1, 0, Vec3::new(1.0, 0.5, 2.0));

        assert_eq!(image.get(1, 0), Vec3::new(1.0, 0.5, 2.0));
        assert_eq!(image.to_rgb8(), vec![0, 0, 0, 255, 128, 255]);
    }

    #[test]
    fn test_render_rejects_zero_resolution() {
        let world = wall(Material::default());
        let camera = Camera::new().with_resolution(0, 10);

        assert!(matches!(
            render(&world, &camera, &RenderConfig::default()),
            Err(RenderError::InvalidConfig(_))
        ));
    }
}

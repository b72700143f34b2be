//! Image tiling.
//!
//! The frame is cut into square buckets that render independently. Each
//! bucket owns a sampler seeded from the render seed and its index, so a
//! bucket's pixels depend only on the scene, the config and the bucket.

use crate::camera::Camera;
use crate::renderer::{render_pixel, Color, RenderConfig};
use crate::sampler::RandomSampler;
use crate::world::World;

/// Default bucket edge in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 64;

/// A rectangular tile of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels (row 0 is the top of the image)
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position in render order; also the sampler stream id
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self { x, y, width, height, index }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Image coordinates covered by the bucket, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y..self.y + self.height)
            .flat_map(move |y| (self.x..self.x + self.width).map(move |x| (x, y)))
    }

    fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 * 0.5,
            self.y as f32 + self.height as f32 * 0.5,
        )
    }
}

/// Tile a `width` x `height` image, center buckets first.
///
/// Edge buckets are clipped to the image. Indices are assigned after
/// ordering, so `buckets[i].index == i`.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let size = bucket_size.max(1);

    let mut buckets: Vec<Bucket> = (0..height)
        .step_by(size as usize)
        .flat_map(|y| {
            (0..width)
                .step_by(size as usize)
                .map(move |x| Bucket::new(x, y, size.min(width - x), size.min(height - y), 0))
        })
        .collect();

    let (cx, cy) = (width as f32 * 0.5, height as f32 * 0.5);
    let distance_sq = |bucket: &Bucket| {
        let (bx, by) = bucket.center();
        (bx - cx).powi(2) + (by - cy).powi(2)
    };
    // Stable: equidistant buckets keep scanline order
    buckets.sort_by(|a, b| distance_sq(a).total_cmp(&distance_sq(b)));

    for (index, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = index;
    }
    buckets
}

/// Rendered pixels of one bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    /// Row-major within the bucket
    pub pixels: Vec<Color>,
}

impl BucketResult {
    pub fn new(bucket: Bucket, pixels: Vec<Color>) -> Self {
        Self { bucket, pixels }
    }
}

/// Render every pixel of `bucket` with its own sampler stream.
pub fn render_bucket(
    bucket: &Bucket,
    camera: &Camera,
    world: &World,
    config: &RenderConfig,
) -> BucketResult {
    let mut sampler = RandomSampler::for_worker(config.seed, bucket.index as u64);
    let pixels = bucket
        .pixels()
        .map(|(x, y)| render_pixel(world, camera, x, y, config, &mut sampler))
        .collect();

    BucketResult::new(*bucket, pixels)
}

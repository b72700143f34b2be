//! Ember Renderer - BVH-accelerated CPU path tracing
//!
//! A unidirectional Monte Carlo path tracer over triangle meshes:
//!
//! - **Acceleration**: arena-indexed triangle BVH with median or SAH splits
//! - **Primitives**: Möller-Trumbore triangles plus analytic spheres
//! - **Integrator**: specular / refractive / diffuse transport with
//!   Russian roulette and a hard depth cutoff
//! - **Scheduling**: spiral-ordered buckets rendered in parallel with
//!   rayon, one seeded sampler per bucket
//!
//! # Example
//!
//! ```ignore
//! use ember_renderer::{render, BvhConfig, Camera, RenderConfig, World};
//!
//! let world = World::from_scene(&scene, &BvhConfig::default())?;
//! let camera = Camera::new().with_resolution(320, 180);
//! let image = render(&world, &camera, &RenderConfig::default())?;
//! image.save_png("out.png")?;
//! ```

mod bucket;
mod bvh;
mod camera;
mod error;
mod hit;
mod renderer;
mod sampler;
mod shape;
mod sphere;
mod triangle;
mod world;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use bvh::{
    median_split_cost, sah_split, Bvh, BvhConfig, BvhNode, BvhStats, LeafHit, NodeKind, SahSplit,
};
pub use camera::Camera;
pub use error::{RenderError, RenderResult};
pub use hit::HitResult;
pub use renderer::{
    color_to_rgb8, reflect, refract, render, render_pixel, render_with_progress, to_byte, trace,
    trace_path, Color, ImageBuffer, PathSample, RenderConfig, Termination,
};
pub use sampler::RandomSampler;
pub use shape::Shape;
pub use sphere::Sphere;
pub use triangle::Triangle;
pub use world::World;

/// Re-export the settings enums and math types callers need alongside the renderer
pub use ember_core::{BuildStrategy, TraversalMode};
pub use ember_math::{Aabb, Ray, Vec3};

//! Render settings carried by scene description files.
//!
//! Every field has a default so description files only need to name what
//! they change.

use ember_math::Vec3;
use serde::{Deserialize, Serialize};

/// BVH split strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStrategy {
    /// Sort by centroid on the longest axis and split at the median count
    #[default]
    Median,
    /// Surface-area heuristic over every candidate split on all three axes
    Sah,
}

/// How primary and bounce rays find the nearest triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    /// Test every triangle (reference mode)
    BruteForce,
    /// Test only triangles in leaves whose boxes the ray hits
    #[default]
    Bvh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub width: u32,
    pub height: u32,
    pub position: Vec3,
    /// Degrees, -90 looks down -Z
    pub yaw: f32,
    /// Degrees, clamped to +-89
    pub pitch: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Overrides yaw/pitch when set
    pub look_at: Option<Vec3>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 450,
            position: Vec3::new(0.0, 0.0, 3.0),
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            look_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub samples_per_pixel: u32,
    pub max_depth: u32,
    pub survival_probability: f32,
    pub seed: u64,
    pub threads: Option<usize>,
    pub bucket_size: u32,
    pub traversal: TraversalMode,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            samples_per_pixel: 16,
            max_depth: 8,
            survival_probability: 0.8,
            seed: 0,
            threads: None,
            bucket_size: 64,
            traversal: TraversalMode::Bvh,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhSettings {
    pub max_leaf_size: usize,
    pub max_depth: u32,
    pub strategy: BuildStrategy,
}

impl Default for BvhSettings {
    fn default() -> Self {
        Self {
            max_leaf_size: 4,
            max_depth: 32,
            strategy: BuildStrategy::Median,
        }
    }
}

/// Everything in a description file besides the scene itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub camera: CameraSettings,
    pub render: RenderSettings,
    pub bvh: BvhSettings,
}

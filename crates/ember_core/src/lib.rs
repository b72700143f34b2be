//! Ember Core - renderer-agnostic scene data.
//!
//! This crate provides:
//!
//! - **Geometry**: indexed triangle `Mesh` with smooth-normal generation
//! - **Materials**: the parametric `Material` shared by every surface
//! - **Scene**: objects (mesh or sphere + material + transform)
//! - **Settings**: camera, render and BVH options with serde defaults
//! - **Loading**: Wavefront OBJ meshes and JSON scene descriptions
//!
//! # Example
//!
//! ```ignore
//! use ember_core::load_scene;
//!
//! let (scene, settings) = load_scene("scenes/cornell.json")?;
//! println!("{} objects, {} triangles",
//!     scene.objects.len(),
//!     scene.total_triangle_count());
//! ```

pub mod loader;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod settings;

// Re-export commonly used types
pub use loader::{load_obj, load_scene, parse_obj, parse_scene, LoadError, LoadResult};
pub use material::{Lobe, Material};
pub use mesh::{Mesh, MeshTriangle};
pub use scene::{Geometry, Scene, SceneObject};
pub use settings::{
    BuildStrategy, BvhSettings, CameraSettings, RenderSettings, SceneSettings, TraversalMode,
};

//! Renderable world: the triangle BVH, loose shapes and the material table.

use ember_core::{Geometry, Material, Scene, TraversalMode};
use ember_math::Ray;

use crate::bvh::{Bvh, BvhConfig};
use crate::error::{RenderError, RenderResult};
use crate::hit::{closest, HitResult};
use crate::shape::Shape;
use crate::sphere::Sphere;
use crate::triangle::Triangle;

/// Everything the path tracer queries. Read-only while rendering and
/// shared by reference across worker threads.
#[derive(Debug, Clone)]
pub struct World {
    pub bvh: Bvh,
    /// Primitives outside the BVH, tested linearly
    pub shapes: Vec<Shape>,
    pub materials: Vec<Material>,
}

impl World {
    /// Assemble a world, checking that every primitive's material exists.
    pub fn new(
        triangles: Vec<Triangle>,
        shapes: Vec<Shape>,
        materials: Vec<Material>,
        config: &BvhConfig,
    ) -> RenderResult<Self> {
        if triangles.is_empty() && shapes.is_empty() {
            return Err(RenderError::EmptyScene);
        }

        let material_count = materials.len();
        let missing = triangles
            .iter()
            .map(|t| t.material)
            .chain(shapes.iter().map(Shape::material))
            .find(|&m| m as usize >= material_count);
        if let Some(material) = missing {
            return Err(RenderError::InvalidConfig(format!(
                "material index {} out of range ({} materials)",
                material, material_count
            )));
        }

        Ok(Self {
            bvh: Bvh::build(triangles, *config),
            shapes,
            materials,
        })
    }

    /// Flatten a scene into world-space triangles and spheres.
    pub fn from_scene(scene: &Scene, config: &BvhConfig) -> RenderResult<Self> {
        let mut triangles = Vec::with_capacity(scene.total_triangle_count());
        let mut shapes = Vec::new();

        for object in &scene.objects {
            let material = object.material as u32;
            match &object.geometry {
                Geometry::Mesh(_) => {
                    if let Some(mesh) = object.world_mesh() {
                        triangles.extend(
                            mesh.triangles()
                                .iter()
                                .map(|t| Triangle::from_mesh_triangle(t, material)),
                        );
                    }
                }
                Geometry::Sphere { .. } => {
                    if let Some((center, radius)) = object.world_sphere() {
                        shapes.push(Shape::Sphere(Sphere::new(center, radius, material)));
                    }
                }
            }
        }

        log::info!(
            "World '{}': {} triangles, {} loose shapes, {} materials",
            scene.name,
            triangles.len(),
            shapes.len(),
            scene.materials.len()
        );
        Self::new(triangles, shapes, scene.materials.clone(), config)
    }

    /// Nearest hit over the triangles and the loose shapes.
    pub fn cast_ray(&self, ray: &Ray, mode: TraversalMode) -> Option<HitResult> {
        let triangle_hit = match mode {
            TraversalMode::Bvh => self.bvh.intersect(ray),
            TraversalMode::BruteForce => self.bvh.intersect_brute_force(ray),
        };
        self.shapes
            .iter()
            .fold(triangle_hit, |best, shape| closest(best, shape.hit(ray)))
    }

    /// Material of a hit. Indices are validated in [`World::new`].
    #[inline]
    pub fn material(&self, hit: &HitResult) -> &Material {
        &self.materials[hit.material as usize]
    }

    pub fn triangle_count(&self) -> usize {
        self.bvh.len()
    }
}

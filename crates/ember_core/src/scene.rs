//! Scene graph types for Ember.
//!
//! A scene is a flat list of objects, each pairing a geometry with a
//! material index and a placement transform.

use std::sync::Arc;

use ember_math::{Aabb, Mat4Ext, Transform, Vec3};

use crate::material::Material;
use crate::mesh::Mesh;

/// Object geometry.
#[derive(Clone, Debug)]
pub enum Geometry {
    /// Shared triangle mesh in object space
    Mesh(Arc<Mesh>),
    /// Analytic sphere in object space
    Sphere { center: Vec3, radius: f32 },
}

/// A placed, shaded piece of geometry.
#[derive(Clone, Debug)]
pub struct SceneObject {
    /// Object name (file stem or description key)
    pub name: String,

    pub geometry: Geometry,

    /// Index into `Scene::materials`
    pub material: usize,

    pub transform: Transform,
}

impl SceneObject {
    /// The object's mesh moved into world space, or `None` for spheres.
    ///
    /// Identity transforms share the object-space mesh.
    pub fn world_mesh(&self) -> Option<Arc<Mesh>> {
        match &self.geometry {
            Geometry::Mesh(mesh) if self.transform.is_identity() => Some(Arc::clone(mesh)),
            Geometry::Mesh(mesh) => Some(Arc::new(mesh.transformed(&self.transform.to_matrix()))),
            Geometry::Sphere { .. } => None,
        }
    }

    /// The object's sphere in world space as `(center, radius)`.
    ///
    /// Rotation is irrelevant for a sphere. Non-uniform scale is
    /// approximated by the largest axis scale.
    pub fn world_sphere(&self) -> Option<(Vec3, f32)> {
        match self.geometry {
            Geometry::Sphere { center, radius } => {
                let center = self.transform.to_matrix().transform_point3(center);
                let radius = radius * self.transform.scale.abs().max_element();
                Some((center, radius))
            }
            Geometry::Mesh(_) => None,
        }
    }

    /// World-space bounds of the object.
    pub fn world_bounds(&self) -> Aabb {
        match &self.geometry {
            Geometry::Mesh(mesh) => self.transform.to_matrix().transform_aabb(&mesh.bounds),
            Geometry::Sphere { .. } => match self.world_sphere() {
                Some((center, radius)) => {
                    Aabb::new(center - Vec3::splat(radius), center + Vec3::splat(radius))
                }
                None => Aabb::EMPTY,
            },
        }
    }
}

/// A complete scene: materials plus the objects that reference them.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Scene name (usually from filename)
    pub name: String,

    pub materials: Vec<Material>,

    pub objects: Vec<SceneObject>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a material to the scene and return its index.
    pub fn add_material(&mut self, material: Material) -> usize {
        let id = self.materials.len();
        self.materials.push(material);
        id
    }

    /// Look up a material index by name.
    pub fn material_index(&self, name: &str) -> Option<usize> {
        self.materials.iter().position(|m| m.name == name)
    }

    /// Add a mesh object.
    pub fn add_mesh(
        &mut self,
        name: impl Into<String>,
        mesh: Arc<Mesh>,
        material: usize,
        transform: Transform,
    ) {
        self.objects.push(SceneObject {
            name: name.into(),
            geometry: Geometry::Mesh(mesh),
            material,
            transform,
        });
    }

    /// Add a sphere object.
    pub fn add_sphere(&mut self, name: impl Into<String>, center: Vec3, radius: f32, material: usize) {
        self.objects.push(SceneObject {
            name: name.into(),
            geometry: Geometry::Sphere { center, radius },
            material,
            transform: Transform::default(),
        });
    }

    /// Get total triangle count across all mesh objects.
    pub fn total_triangle_count(&self) -> usize {
        self.objects
            .iter()
            .map(|object| match &object.geometry {
                Geometry::Mesh(mesh) => mesh.triangle_count(),
                Geometry::Sphere { .. } => 0,
            })
            .sum()
    }

    /// Compute the world-space bounding box of all objects.
    pub fn world_bounds(&self) -> Aabb {
        self.objects
            .iter()
            .fold(Aabb::EMPTY, |acc, object| Aabb::surrounding(&acc, &object.world_bounds()))
    }
}

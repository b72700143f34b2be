//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.
//! Triangles are hit from both sides.

use std::cmp::Ordering;

use ember_core::MeshTriangle;
use ember_math::{Aabb, Ray, Vec3, EPSILON};

use crate::hit::HitResult;

/// A triangle with per-vertex shading normals and a material index.
///
/// The derived fields are computed once in [`Triangle::new`]; the BVH only
/// ever moves whole triangles around its buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub p1: Vec3,
    pub p2: Vec3,
    pub p3: Vec3,
    pub n1: Vec3,
    pub n2: Vec3,
    pub n3: Vec3,
    /// `(p1 + p2 + p3) / 3`
    pub centroid: Vec3,
    /// Flat face normal, `(p2 - p1) x (p3 - p1)` normalized
    pub normal: Vec3,
    /// Tight bounds of the three positions (unpadded)
    pub aabb: Aabb,
    pub material: u32,
}

impl Triangle {
    /// Create a triangle from positions and shading normals.
    pub fn new(positions: [Vec3; 3], normals: [Vec3; 3], material: u32) -> Self {
        let [p1, p2, p3] = positions;
        let normal = (p2 - p1).cross(p3 - p1).normalize_or_zero();

        let mut aabb = Aabb::EMPTY;
        for p in positions {
            aabb.grow(p);
        }

        Self {
            p1,
            p2,
            p3,
            n1: normals[0],
            n2: normals[1],
            n3: normals[2],
            centroid: (p1 + p2 + p3) / 3.0,
            normal,
            aabb,
            material,
        }
    }

    /// Create a triangle whose shading normals all equal the face normal.
    pub fn flat(p1: Vec3, p2: Vec3, p3: Vec3, material: u32) -> Self {
        let normal = (p2 - p1).cross(p3 - p1).normalize_or_zero();
        Self::new([p1, p2, p3], [normal; 3], material)
    }

    pub fn from_mesh_triangle(triangle: &MeshTriangle, material: u32) -> Self {
        Self::new(triangle.positions, triangle.normals, material)
    }

    /// Möller-Trumbore ray-triangle intersection.
    ///
    /// Rejects near-parallel rays (`|det| < EPSILON`), barycentrics outside
    /// the triangle and hits closer than `EPSILON`.
    pub fn hit(&self, ray: &Ray) -> Option<HitResult> {
        let edge1 = self.p2 - self.p1;
        let edge2 = self.p3 - self.p1;

        let h = ray.direction.cross(edge2);
        let det = edge1.dot(h);

        // Ray is parallel to triangle
        if det.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / det;
        let s = ray.origin - self.p1;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if t <= EPSILON {
            return None;
        }

        let interpolated = (1.0 - u - v) * self.n1 + u * self.n2 + v * self.n3;
        let normal = match interpolated.try_normalize() {
            Some(n) => n,
            None => self.normal,
        };

        Some(HitResult {
            distance: t,
            point: ray.at(t),
            normal,
            material: self.material,
        })
    }

    pub fn cmp_x(a: &Triangle, b: &Triangle) -> Ordering {
        a.centroid.x.total_cmp(&b.centroid.x)
    }

    pub fn cmp_y(a: &Triangle, b: &Triangle) -> Ordering {
        a.centroid.y.total_cmp(&b.centroid.y)
    }

    pub fn cmp_z(a: &Triangle, b: &Triangle) -> Ordering {
        a.centroid.z.total_cmp(&b.centroid.z)
    }

    /// Centroid comparator for the given axis.
    pub fn cmp_centroid(axis: usize) -> fn(&Triangle, &Triangle) -> Ordering {
        match axis {
            0 => Self::cmp_x,
            1 => Self::cmp_y,
            _ => Self::cmp_z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::flat(Vec3::ZERO, Vec3::X, Vec3::Y, 0)
    }

    #[test]
    fn test_triangle_derived_fields() {
        let tri = unit_triangle();

        assert!((tri.centroid - Vec3::new(1.0 / 3.0, 1.0 / 3.0, 0.0)).length() < 1e-6);
        assert_eq!(tri.normal, Vec3::Z);
        assert_eq!(tri.aabb.min, Vec3::ZERO);
        assert_eq!(tri.aabb.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_triangle_hit() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::NEG_Z);

        let hit = tri.hit(&ray).expect("ray should hit");
        assert!((hit.distance - 1.0).abs() < 1e-6);
        assert!((hit.normal - Vec3::Z).length() < 1e-6);
        assert!((hit.point - Vec3::new(0.25, 0.25, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_triangle_miss_behind() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::NEG_Z);

        assert!(tri.hit(&ray).is_none());
    }

    #[test]
    fn test_triangle_hit_from_back() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, -1.0), Vec3::Z);

        let hit = tri.hit(&ray).expect("no back-face culling");
        assert!((hit.distance - 1.0).abs() < 1e-6);
        // Normal is not flipped toward the ray
        assert!((hit.normal - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_triangle_parallel_ray() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(-1.0, 0.25, 0.0), Vec3::X);

        assert!(tri.hit(&ray).is_none());
    }

    #[test]
    fn test_triangle_outside_barycentric() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.75, 0.75, 1.0), Vec3::NEG_Z);

        assert!(tri.hit(&ray).is_none());
    }

    #[test]
    fn test_interpolated_normal() {
        let tri = Triangle::new(
            [Vec3::ZERO, Vec3::X, Vec3::Y],
            [Vec3::Z, Vec3::X, Vec3::Z],
            3,
        );
        // u = 0.5, v = 0: halfway between n1 and n2
        let ray = Ray::new(Vec3::new(0.5, 0.0, 1.0), Vec3::NEG_Z);

        let hit = tri.hit(&ray).unwrap();
        let expected = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert!((hit.normal - expected).length() < 1e-5);
        assert_eq!(hit.material, 3);
    }

    #[test]
    fn test_degenerate_triangle_never_hits() {
        let tri = Triangle::flat(Vec3::ZERO, Vec3::X, Vec3::X * 2.0, 0);
        let ray = Ray::new(Vec3::new(0.5, 0.0, 1.0), Vec3::NEG_Z);

        assert!(tri.hit(&ray).is_none());
    }

    #[test]
    fn test_centroid_comparators() {
        let a = Triangle::flat(Vec3::ZERO, Vec3::X, Vec3::Y, 0);
        let b = Triangle::flat(Vec3::Z, Vec3::Z + Vec3::X, Vec3::Z + Vec3::Y, 0);

        assert_eq!(Triangle::cmp_z(&a, &b), Ordering::Less);
        assert_eq!(Triangle::cmp_x(&a, &b), Ordering::Equal);
        assert_eq!(Triangle::cmp_centroid(2)(&b, &a), Ordering::Greater);
    }
}

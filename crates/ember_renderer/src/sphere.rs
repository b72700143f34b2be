//! Sphere primitive for ray tracing.

use ember_math::{Aabb, Ray, Vec3, EPSILON};

use crate::hit::HitResult;

/// An analytic sphere with a material index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material: u32,
    aabb: Aabb,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero.
    pub fn new(center: Vec3, radius: f32, material: u32) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);

        Self {
            center,
            radius,
            material,
            aabb: Aabb::new(center - rvec, center + rvec),
        }
    }

    /// Nearest root beyond `EPSILON`. The normal points outward.
    ///
    /// A sphere of zero radius is never hit.
    pub fn hit(&self, ray: &Ray) -> Option<HitResult> {
        if self.radius <= 0.0 || self.radius.is_nan() {
            return None;
        }

        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if root <= EPSILON {
            root = (h + sqrtd) / a;
            if root <= EPSILON {
                return None;
            }
        }

        let point = ray.at(root);
        Some(HitResult {
            distance: root,
            point,
            normal: (point - self.center) / self.radius,
            material: self.material,
        })
    }

    pub fn aabb(&self) -> Aabb {
        self.aabb
    }
}

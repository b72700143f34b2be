// Re-export glam for convenience
pub use glam::*;

// Ember math types
mod aabb;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use ray::Ray;
pub use transform::{Mat4Ext, Transform};

/// Tolerance shared by the slab test, the triangle determinant test and
/// box padding.
pub const EPSILON: f32 = 1e-6;

/// Distance continuation rays are pushed off a surface to avoid
/// re-intersecting it.
pub const RAY_OFFSET: f32 = EPSILON * 100.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.cross(b), Vec3::new(-3.0, 6.0, -3.0));
    }

    #[test]
    fn test_ray_offset_exceeds_epsilon() {
        assert!(RAY_OFFSET > EPSILON);
    }
}

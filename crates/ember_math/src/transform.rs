// Transform utilities for Mat4
//
// Object placement (translate / rotate / scale) and the matching
// normal and bounding-box transforms.

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use crate::Aabb;

/// Transform components that can be composed into a matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Euler rotation in degrees. Composed as `Ry * Rx * Rz`, so roll is
    /// applied first and yaw last.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, degrees: Vec3) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// True if the transform leaves every point where it is.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.y.to_radians(),
            self.rotation.x.to_radians(),
            self.rotation.z.to_radians(),
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform a surface normal (inverse-transpose of the upper 3x3),
    /// renormalized.
    fn transform_normal(&self, normal: Vec3) -> Vec3;

    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn transform_normal(&self, normal: Vec3) -> Vec3 {
        let normal_matrix = Mat3::from_mat4(*self).inverse().transpose();
        (normal_matrix * normal).normalize_or_zero()
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        let (lo, hi) = (aabb.min, aabb.max);
        let corners = [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ];

        let mut result = Aabb::EMPTY;
        for corner in corners {
            result.grow(self.transform_point3(corner));
        }
        result
    }
}

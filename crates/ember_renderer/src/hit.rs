//! Ray/primitive intersection record.

use ember_math::Vec3;

/// Nearest accepted intersection along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    /// Ray parameter of the hit (the ray direction is unit length)
    pub distance: f32,
    pub point: Vec3,
    /// Interpolated shading normal, unit length, not face-forwarded
    pub normal: Vec3,
    /// Index into the world's material table
    pub material: u32,
}

/// Keep whichever of two optional hits is closer.
#[inline]
pub fn closest(a: Option<HitResult>, b: Option<HitResult>) -> Option<HitResult> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.distance < a.distance { b } else { a }),
        (a, None) => a,
        (None, b) => b,
    }
}

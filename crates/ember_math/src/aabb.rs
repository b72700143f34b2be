use crate::{Ray, Vec3, EPSILON};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// Invariant once built: `min <= max` component-wise. [`Aabb::EMPTY`] is
/// the inverted box used as the identity for [`Aabb::surrounding`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An empty AABB (contains nothing, min > max).
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create an AABB from its corners. The caller guarantees `min <= max`.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// Grow the box to contain `point`.
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Return the box expanded by `delta` on every side.
    ///
    /// Used to avoid zero-thickness slabs for axis-aligned geometry.
    pub fn padded(&self, delta: f32) -> Aabb {
        Aabb {
            min: self.min - Vec3::splat(delta),
            max: self.max + Vec3::splat(delta),
        }
    }

    /// True if the box has never been grown (min > max on some axis).
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Full extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns the center point of the bounding box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half extent along each axis.
    pub fn scale(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// Get the (min, max) bounds for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis(&self, n: usize) -> (f32, f32) {
        (self.min[n], self.max[n])
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the largest extent.
    ///
    /// Ties resolve to the lower axis.
    pub fn longest_axis(&self) -> usize {
        let size = self.size();
        let mut axis = 0;
        if size.y > size[axis] {
            axis = 1;
        }
        if size.z > size[axis] {
            axis = 2;
        }
        axis
    }

    /// Surface area of the box, used as a split-quality metric.
    pub fn surface_area(&self) -> f32 {
        Self::compute_surface_area(self.min, self.max)
    }

    /// Surface area of the box spanned by `min` and `max`.
    pub fn compute_surface_area(min: Vec3, max: Vec3) -> f32 {
        let size = max - min;
        2.0 * (size.x * size.y + size.x * size.z + size.y * size.z)
    }

    /// Slab test against a ray.
    ///
    /// Returns the entry time, or the exit time when the ray starts inside
    /// the box. Near-zero direction components are clamped to a signed
    /// epsilon so axis-aligned rays never divide by zero.
    pub fn hit(&self, ray: &Ray) -> Option<f32> {
        let safe_dir = Vec3::new(
            clamp_away_from_zero(ray.direction.x),
            clamp_away_from_zero(ray.direction.y),
            clamp_away_from_zero(ray.direction.z),
        );
        let inv_dir = safe_dir.recip();

        let t_min_slab = (self.min - ray.origin) * inv_dir;
        let t_max_slab = (self.max - ray.origin) * inv_dir;

        let t_near = t_min_slab.min(t_max_slab);
        let t_far = t_min_slab.max(t_max_slab);

        let t0 = t_near.max_element();
        let t1 = t_far.min_element();

        if t0 > t1 || t1 < 0.0 {
            return None;
        }

        if t0 < EPSILON {
            Some(t1)
        } else {
            Some(t0)
        }
    }

    /// Three-axis interval overlap test. Touching boxes overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && self.max[axis] >= other.min[axis])
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[inline]
fn clamp_away_from_zero(d: f32) -> f32 {
    if d.abs() < EPSILON {
        EPSILON.copysign(d)
    } else {
        d
    }
}

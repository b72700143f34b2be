//! Closed set of intersectable primitives.
//!
//! The triangle BVH works on [`Triangle`] directly; `Shape` is for
//! primitives held outside it and tested linearly.

use ember_math::{Aabb, Ray};

use crate::hit::HitResult;
use crate::sphere::Sphere;
use crate::triangle::Triangle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Triangle(Triangle),
    Sphere(Sphere),
}

impl Shape {
    #[inline]
    pub fn hit(&self, ray: &Ray) -> Option<HitResult> {
        match self {
            Shape::Triangle(triangle) => triangle.hit(ray),
            Shape::Sphere(sphere) => sphere.hit(ray),
        }
    }

    pub fn aabb(&self) -> Aabb {
        match self {
            Shape::Triangle(triangle) => triangle.aabb,
            Shape::Sphere(sphere) => sphere.aabb(),
        }
    }

    pub fn material(&self) -> u32 {
        match self {
            Shape::Triangle(triangle) => triangle.material,
            Shape::Sphere(sphere) => sphere.material,
        }
    }
}

impl From<Triangle> for Shape {
    fn from(triangle: Triangle) -> Self {
        Shape::Triangle(triangle)
    }
}

impl From<Sphere> for Shape {
    fn from(sphere: Sphere) -> Self {
        Shape::Sphere(sphere)
    }
}

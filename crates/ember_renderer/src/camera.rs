//! Camera for ray generation.
//!
//! A pinhole camera oriented by yaw and pitch (degrees). Yaw -90 with
//! pitch 0 looks down -Z.

use ember_core::CameraSettings;
use ember_math::{Ray, Vec3};

use crate::sampler::RandomSampler;

const MAX_PITCH: f32 = 89.0;

/// Camera for generating rays into the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    position: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,

    // Vertical field of view in degrees
    fov: f32,

    // Derived basis, kept in sync by update_vectors()
    front: Vec3,
    right: Vec3,
    up: Vec3,
    half_height: f32,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 800,
            image_height: 450,
            position: Vec3::new(0.0, 0.0, 3.0),
            world_up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            half_height: 0.0,
        };
        camera.update_vectors();
        camera
    }

    /// Build a camera from scene description settings.
    pub fn from_settings(settings: &CameraSettings) -> Self {
        let camera = Self::new()
            .with_resolution(settings.width, settings.height)
            .with_position(settings.position)
            .with_orientation(settings.yaw, settings.pitch)
            .with_fov(settings.fov);

        match settings.look_at {
            Some(target) => camera.looking_at(target),
            None => camera,
        }
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set yaw and pitch in degrees. Pitch is clamped to +-89.
    pub fn with_orientation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.update_vectors();
        self
    }

    /// Set the vertical field of view in degrees.
    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self.update_vectors();
        self
    }

    /// Turn toward `target`, keeping the position.
    pub fn looking_at(self, target: Vec3) -> Self {
        let Some(direction) = (target - self.position).try_normalize() else {
            return self;
        };
        let pitch = direction.y.clamp(-1.0, 1.0).asin().to_degrees();
        let yaw = direction.z.atan2(direction.x).to_degrees();
        self.with_orientation(yaw, pitch)
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
        self.half_height = (self.fov.to_radians() / 2.0).tan();
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.image_width as f32 / self.image_height.max(1) as f32
    }

    /// Ray through normalized device coordinates.
    ///
    /// `u` runs left to right and `v` bottom to top, both over `[0, 1]`.
    pub fn get_ray_uv(&self, u: f32, v: f32) -> Ray {
        let half_width = self.half_height * self.aspect_ratio();
        let direction = self.front
            + (2.0 * u - 1.0) * half_width * self.right
            + (2.0 * v - 1.0) * self.half_height * self.up;
        Ray::new(self.position, direction)
    }

    /// Jittered ray through pixel `(x, y)` of a `width` x `height` image.
    ///
    /// Row 0 is the top of the image.
    pub fn get_ray(&self, x: u32, y: u32, width: u32, height: u32, sampler: &mut RandomSampler) -> Ray {
        let (jx, jy) = sampler.random_in_square();
        let u = (x as f32 + 0.5 + jx) / width.max(1) as f32;
        let v = 1.0 - (y as f32 + 0.5 + jy) / height.max(1) as f32;
        self.get_ray_uv(u, v)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

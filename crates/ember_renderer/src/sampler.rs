//! Random sampling for Monte Carlo integration.
//!
//! Every render task owns its own [`RandomSampler`]; generator state is
//! never shared between threads. Seeding from a base seed and a worker
//! index keeps renders reproducible regardless of scheduling.

use ember_math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded uniform float generator plus the direction samplers built on it.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Independent stream for one worker task.
    pub fn for_worker(base_seed: u64, worker_index: u64) -> Self {
        // splitmix64 finalizer so neighbouring indices land far apart
        let mut z = base_seed ^ worker_index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        Self::new(z ^ (z >> 31))
    }

    /// Uniform in `[0, 1)`.
    #[inline]
    pub fn random_float(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// Uniform direction on the unit sphere.
    ///
    /// Rejection-samples the cube `[-1, 1]^3` until the point falls inside
    /// the unit ball, then normalizes.
    pub fn random_unit_vector(&mut self) -> Vec3 {
        loop {
            let p = Vec3::new(self.random_float(), self.random_float(), self.random_float()) * 2.0
                - Vec3::ONE;
            let len_sq = p.length_squared();
            if len_sq <= 1.0 && len_sq > 1e-12 {
                return p / len_sq.sqrt();
            }
        }
    }

    /// `normalize(normal + random_unit_vector())`.
    ///
    /// Approximately cosine-weighted around `normal`. Not strictly confined
    /// to the hemisphere: a draw can graze or cross the surface.
    pub fn random_direction(&mut self, normal: Vec3) -> Vec3 {
        let direction = normal + self.random_unit_vector();
        direction.try_normalize().unwrap_or(normal)
    }

    /// Pixel jitter offset in `[-0.5, 0.5)^2`.
    pub fn random_in_square(&mut self) -> (f32, f32) {
        (self.random_float() - 0.5, self.random_float() - 0.5)
    }
}

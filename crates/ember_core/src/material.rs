//! Parametric surface material.
//!
//! One material model covers every surface: it is either a light
//! (`emissive`) or a stochastic mix of specular reflection, refraction and
//! diffuse reflection selected by cumulative thresholds.

use ember_math::Vec3;
use serde::{Deserialize, Serialize};

/// Which transport branch a uniform draw selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lobe {
    Specular,
    Refractive,
    Diffuse,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Material name, referenced by scene objects
    pub name: String,

    /// Light sources return `color` as emitted radiance and stop the path
    pub emissive: bool,

    /// Albedo for diffuse bounces, emission for lights (linear RGB)
    pub color: Vec3,

    /// Probability of a specular bounce
    pub specular_rate: f32,

    /// 0 = perfect mirror, 1 = fully random direction
    pub reflect_roughness: f32,

    /// Cumulative threshold: draws in `[specular_rate, refract_rate)` refract
    pub refract_rate: f32,

    /// Relative index of refraction (inside / outside)
    pub eta: f32,

    /// 0 = clean refraction, 1 = fully random transmitted direction
    pub refract_roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            emissive: false,
            color: Vec3::splat(0.5), // Grey default
            specular_rate: 0.0,
            reflect_roughness: 1.0,
            refract_rate: 0.0,
            eta: 1.0,
            refract_roughness: 0.0,
        }
    }
}

impl Material {
    /// A purely diffuse surface.
    pub fn diffuse(name: impl Into<String>, color: Vec3) -> Self {
        Self {
            name: name.into(),
            color,
            ..Default::default()
        }
    }

    /// A light source emitting `color`.
    pub fn light(name: impl Into<String>, color: Vec3) -> Self {
        Self {
            name: name.into(),
            emissive: true,
            color,
            ..Default::default()
        }
    }

    /// Red emitter with glass-like lobes, the stock "base material 1".
    pub fn red_light() -> Self {
        Self {
            name: "red_light".to_string(),
            emissive: true,
            color: Vec3::new(0.9, 0.05, 0.1),
            specular_rate: 0.5,
            reflect_roughness: 0.05,
            refract_rate: 0.8,
            eta: 1.76,
            refract_roughness: 0.1,
        }
    }

    /// Dark glossy metal, the stock "base material 2".
    pub fn brushed_metal() -> Self {
        Self {
            name: "brushed_metal".to_string(),
            emissive: false,
            color: Vec3::new(0.2, 0.22, 0.25),
            specular_rate: 0.9,
            reflect_roughness: 0.35,
            refract_rate: 0.0,
            eta: 1.0,
            refract_roughness: 0.0,
        }
    }

    /// Clear glass: never diffuse, mostly refracting.
    pub fn glass(name: impl Into<String>, eta: f32) -> Self {
        Self {
            name: name.into(),
            emissive: false,
            color: Vec3::ONE,
            specular_rate: 0.1,
            reflect_roughness: 0.0,
            refract_rate: 1.0,
            eta,
            refract_roughness: 0.0,
        }
    }

    /// Map a uniform draw in `[0, 1)` to a transport branch.
    ///
    /// Thresholds are checked in order: specular, then refractive, then
    /// the remaining probability is diffuse.
    pub fn select_lobe(&self, u: f32) -> Lobe {
        if u < self.specular_rate {
            Lobe::Specular
        } else if u < self.refract_rate {
            Lobe::Refractive
        } else {
            Lobe::Diffuse
        }
    }
}

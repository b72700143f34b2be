//! Renderer errors.
//!
//! Geometric outcomes (misses, parallel rays, total internal reflection)
//! are plain values and never show up here.

use thiserror::Error;

/// Errors that can occur while preparing or running a render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("Scene has no renderable geometry")]
    EmptyScene,
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

//! Error type shared by the heightfield library and its tools.

use thiserror::Error;

/// Errors raised while configuring, synthesizing or exporting terrain.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// A configuration value would make later formulas ill-defined.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A write landed outside the `size x size` grid.
    #[error("cell ({x}, {z}) is outside a {size}x{size} grid")]
    OutOfBounds { x: usize, z: usize, size: usize },

    /// An external buffer or sampler does not cover the grid.
    #[error("expected at least {expected} samples per side, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, TerrainError>;

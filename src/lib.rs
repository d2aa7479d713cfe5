//! Heightfield terrain library
//!
//! Synthesizes elevation over a square grid and derives render geometry
//! (positions, normals, triangle indices) from it.

pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod logging;
pub mod mesh;
pub mod metrics;
pub mod noise_map;
pub mod noise_source;
pub mod synth;

pub use config::TerrainConfig;
pub use error::{Result, TerrainError};
pub use grid::HeightGrid;
pub use mesh::TerrainMesh;
pub use noise_source::NoiseSource;
pub use synth::TerrainSynthesizer;

//! CPU chunk assembly: stitches per-tile prototype meshes into one buffer set.
#![forbid(unsafe_code)]

pub mod build;
pub mod chunk;
pub mod config;
pub mod grid;

pub use build::{BuildError, build_chunk_mesh};
pub use chunk::ChunkMesh;
pub use config::{ChunkConfig, ConfigError};
pub use grid::{GridError, TileGrid};

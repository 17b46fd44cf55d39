use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tessel_tile::{ID_BITS, IdRangePolicy};

/// Chunk assembly settings; every field has a default so partial TOML works.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkConfig {
    pub rows: usize,
    pub cols: usize,
    /// Accepted id width; narrows the range below the packed field's 12 bits.
    pub id_bits: u32,
    pub id_range: IdRangePolicy,
    /// Merge per-vertex prototype colors into the chunk mesh.
    pub merge_colors: bool,
    /// Rotate tangent directions along with vertices and normals.
    pub rotate_tangents: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            cols: 8,
            id_bits: ID_BITS,
            id_range: IdRangePolicy::Strict,
            merge_colors: false,
            rotate_tangents: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    ZeroDimension { rows: usize, cols: usize },
    IdBits { got: u32, max: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ConfigError::ZeroDimension { rows, cols } => {
                write!(f, "grid dimensions must be non-zero (got {}x{})", rows, cols)
            }
            ConfigError::IdBits { got, max } => {
                write!(f, "id_bits {} outside 1..={}", got, max)
            }
        }
    }
}

impl Error for ConfigError {}

impl ChunkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::ZeroDimension {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.id_bits == 0 || self.id_bits > ID_BITS {
            return Err(ConfigError::IdBits {
                got: self.id_bits,
                max: ID_BITS,
            });
        }
        Ok(())
    }

    /// Number of distinct ids the configured width admits.
    #[inline]
    pub fn id_capacity(&self) -> u32 {
        1 << self.id_bits
    }

    pub fn from_toml_str(text: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: ChunkConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }
}

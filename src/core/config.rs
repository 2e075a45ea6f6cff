//! Storage geometry configuration
//!
//! A store is described by two numbers: bytes per block and number of blocks.
//! Both default to 1024. Configs can be written inline or loaded from TOML:
//!
//! ```toml
//! block_size = 512
//! memory_size = 4096
//! ```

use crate::core::error::{BlockfsError, Result};
use serde::{Deserialize, Serialize};

/// Default bytes per block
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Default number of blocks
pub const DEFAULT_MEMORY_SIZE: usize = 1024;

/// Geometry of a simulated block device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bytes per block
    pub block_size: usize,

    /// Number of blocks
    pub memory_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            block_size: DEFAULT_BLOCK_SIZE,
            memory_size: DEFAULT_MEMORY_SIZE,
        }
    }
}

impl StorageConfig {
    pub fn new(block_size: usize, memory_size: usize) -> Self {
        StorageConfig {
            block_size,
            memory_size,
        }
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: StorageConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject geometries that cannot hold any data
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(BlockfsError::InvalidConfig(
                "block_size must be greater than zero".to_string(),
            ));
        }
        if self.memory_size == 0 {
            return Err(BlockfsError::InvalidConfig(
                "memory_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Total capacity in bytes
    pub fn capacity_bytes(&self) -> usize {
        self.block_size.saturating_mul(self.memory_size)
    }

    /// Number of blocks needed to hold `len` bytes
    pub fn blocks_for(&self, len: usize) -> usize {
        len.div_ceil(self.block_size)
    }
}

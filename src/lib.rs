//! # blockfs - Simulated Block Storage
//!
//! `blockfs` simulates block-oriented storage in memory:
//!
//! - **Block device**: a fixed array of fixed-size slots with indexed
//!   fill/read/clear
//! - **Free-space tracker**: unallocated blocks as disjoint `[start, end)`
//!   ranges, first-fit allocation with a whole-range fallback, coalescing on
//!   release
//! - **File store**: byte payloads stored under an identifier across one or
//!   more block ranges, all-or-nothing
//! - **Logical file system**: named files and an arena directory tree on top
//!   of the file store
//!
//! Storage is volatile and single-threaded; [`SharedFileStore`] wraps a store
//! in one lock for multi-caller use.
//!
//! ## Quick Start
//!
//! ```rust
//! use blockfs::{FileStore, Result, StorageConfig};
//!
//! # fn main() -> Result<()> {
//! let mut store: FileStore<String> = FileStore::new(StorageConfig::new(10, 10))?;
//!
//! store.store("greeting".to_string(), b"Hello, blocks!")?;
//! assert_eq!(store.get("greeting")?, b"Hello, blocks!");
//!
//! store.delete("greeting")?;
//! assert_eq!(store.stats().free_blocks, 10);
//! # Ok(())
//! # }
//! ```
//!
//! ## Logical File System
//!
//! ```rust
//! use blockfs::{FileSystemBuilder, Result};
//!
//! # fn main() -> Result<()> {
//! let mut fs = FileSystemBuilder::new()
//!     .block_size(64)
//!     .memory_size(128)
//!     .build()?;
//!
//! fs.create_directory("docs", "root")?;
//! fs.write_file("notes.txt", b"remember the milk", "root/docs")?;
//!
//! let content = fs.read_file("notes.txt", Some("root/docs"))?;
//! assert_eq!(content, b"remember the milk");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod logical;

pub use crate::core::{
    allocator::{Allocation, BlockRange, FreeSpaceTracker},
    block_store::{BlockDevice, BlockIndex, MemoryBlockStore},
    config::StorageConfig,
    error::{BlockfsError, Result},
    file_store::{FileStore, StoreStats},
    shared::SharedFileStore,
};
pub use crate::logical::{
    DirId, DirectoryInfo, FileControlBlock, FileId, FileType, LogicalFileSystem,
};

use tracing::debug;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builder for stores and file systems
///
/// Starts from [`StorageConfig::default`] (1024 blocks of 1024 bytes).
///
/// # Examples
///
/// ```rust
/// use blockfs::FileSystemBuilder;
///
/// # fn main() -> blockfs::Result<()> {
/// let store = FileSystemBuilder::new()
///     .block_size(512)
///     .memory_size(256)
///     .build_store()?;
/// assert_eq!(store.stats().total_blocks, 256);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileSystemBuilder {
    config: StorageConfig,
}

impl FileSystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes per block
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.config.block_size = block_size;
        self
    }

    /// Number of blocks
    pub fn memory_size(mut self, memory_size: usize) -> Self {
        self.config.memory_size = memory_size;
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: StorageConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(Self::new().config(StorageConfig::from_toml_str(source)?))
    }

    /// Build a bare file store keyed by strings
    pub fn build_store(self) -> Result<FileStore<String>> {
        debug!("Building file store with {:?}", self.config);
        FileStore::new(self.config)
    }

    /// Build a lock-guarded file store keyed by strings
    pub fn build_shared(self) -> Result<SharedFileStore<String>> {
        debug!("Building shared file store with {:?}", self.config);
        SharedFileStore::new(self.config)
    }

    /// Build a logical file system
    pub fn build(self) -> Result<LogicalFileSystem> {
        debug!("Building logical file system with {:?}", self.config);
        LogicalFileSystem::new(self.config)
    }
}

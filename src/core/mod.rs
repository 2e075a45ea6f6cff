//! Storage engine: block device, free-space tracking and the file store

pub mod allocator;
pub mod block_store;
pub mod config;
pub mod error;
pub mod file_store;
pub mod shared;

pub use allocator::{Allocation, BlockRange, FreeSpaceTracker};
pub use block_store::{BlockDevice, BlockIndex, MemoryBlockStore};
pub use config::StorageConfig;
pub use error::{BlockfsError, Result};
pub use file_store::{FileStore, StoreStats};
pub use shared::SharedFileStore;

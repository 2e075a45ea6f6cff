//! File store
//!
//! Maps identifiers to the block ranges that hold their payloads. A payload of
//! `len` bytes occupies `ceil(len / block_size)` blocks: every block is full
//! except the last one, which holds the tail. The ranges of a file are kept in
//! allocation order, so reading them back block by block reproduces the
//! payload.
//!
//! Stores are all-or-nothing. Capacity is checked before any block is
//! touched, and if the device fails part way through a store every block
//! written so far is cleared and every range taken is released again.

use crate::core::allocator::{BlockRange, FreeSpaceTracker};
use crate::core::block_store::{BlockDevice, MemoryBlockStore};
use crate::core::config::StorageConfig;
use crate::core::error::{BlockfsError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use tracing::{debug, info, warn};

/// Point-in-time summary of a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub block_size: usize,
    pub total_blocks: usize,
    pub free_blocks: usize,
    pub used_blocks: usize,
    pub file_count: usize,
    pub free_range_count: usize,
    pub fragmentation_score: f64,
}

/// Block-backed store of byte payloads keyed by identifier
pub struct FileStore<K, D = MemoryBlockStore> {
    /// Backing block device
    device: D,

    /// Unallocated blocks
    free: FreeSpaceTracker,

    /// Identifier -> ranges in the order they were written
    files: HashMap<K, Vec<BlockRange>>,
}

impl<K> FileStore<K, MemoryBlockStore>
where
    K: Eq + Hash + Display,
{
    /// Create a store over a fresh in-memory device
    pub fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;
        Self::with_device(MemoryBlockStore::from_config(&config))
    }
}

impl<K, D> FileStore<K, D>
where
    K: Eq + Hash + Display,
    D: BlockDevice,
{
    /// Create a store over an existing device. All of its blocks start free.
    ///
    /// Fails with `InvalidConfig` if the device reports a zero block size.
    pub fn with_device(device: D) -> Result<Self> {
        if device.block_size() == 0 {
            return Err(BlockfsError::InvalidConfig(
                "device block size must be greater than zero".to_string(),
            ));
        }
        info!(
            "Creating file store: {} blocks of {} bytes",
            device.block_count(),
            device.block_size()
        );
        let free = FreeSpaceTracker::new(device.block_count());
        Ok(FileStore {
            device,
            free,
            files: HashMap::new(),
        })
    }

    /// Store `payload` under `id`
    ///
    /// # Errors
    ///
    /// - `DuplicateIdentifier` if `id` is already stored
    /// - `InsufficientSpace` if the free blocks cannot hold the payload
    /// - any device error, after the partial write has been undone
    pub fn store(&mut self, id: K, payload: &[u8]) -> Result<()> {
        if self.files.contains_key(&id) {
            debug!("Rejecting store of {}: identifier exists", id);
            return Err(BlockfsError::DuplicateIdentifier(id.to_string()));
        }

        let block_size = self.device.block_size();
        let required = payload.len().div_ceil(block_size);
        if !self.free.has_capacity(required) {
            debug!(
                "Rejecting store of {}: {} blocks required, {} free",
                id,
                required,
                self.free.free_blocks()
            );
            return Err(BlockfsError::InsufficientSpace {
                required,
                available: self.free.free_blocks(),
            });
        }

        debug!("Storing {} bytes ({} blocks) as {}", payload.len(), required, id);

        let mut used: Vec<BlockRange> = Vec::new();
        let mut remaining = payload;
        let mut remaining_blocks = required;

        while remaining_blocks > 0 {
            let Some(allocation) = self.free.allocate(remaining_blocks) else {
                self.rollback(&used);
                return Err(BlockfsError::InvariantViolation(format!(
                    "free space exhausted with {} blocks left to place",
                    remaining_blocks
                )));
            };

            let range = allocation.range();
            used.push(range);

            let written = match write_range(&mut self.device, range, remaining) {
                Ok(written) => written,
                Err(err) => {
                    warn!("Write of {} failed at {}: {}", id, range, err);
                    self.rollback(&used);
                    return Err(err);
                }
            };

            remaining = &remaining[written..];
            remaining_blocks = remaining.len().div_ceil(block_size);
        }

        self.files.insert(id, used);
        self.free.resort();
        Ok(())
    }

    /// Read back the payload stored under `id`
    ///
    /// Fails with `CorruptedRead` if any block of the file is empty; no
    /// partial data is returned.
    pub fn get<Q>(&self, id: &Q) -> Result<Vec<u8>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
    {
        let ranges = self
            .files
            .get(id)
            .ok_or_else(|| BlockfsError::UnknownIdentifier(id.to_string()))?;

        let mut blocks = Vec::new();
        for range in ranges {
            for index in range.indices() {
                match self.device.read(index)? {
                    Some(block) if !block.is_empty() => blocks.push(block),
                    _ => {
                        warn!("Block {} of {} is empty", index, id);
                        return Err(BlockfsError::CorruptedRead { index });
                    }
                }
            }
        }
        let data = blocks.concat();

        debug!("Read {} bytes from {}", data.len(), id);
        Ok(data)
    }

    /// Clear every block of `id` and return its ranges to the free set
    pub fn delete<Q>(&mut self, id: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
    {
        let (key, ranges) = self
            .files
            .remove_entry(id)
            .ok_or_else(|| BlockfsError::UnknownIdentifier(id.to_string()))?;

        let capacity = self.device.block_count();
        if let Some(bad) = ranges.iter().find(|r| r.end > capacity) {
            let err = BlockfsError::IndexOutOfRange {
                index: bad.end - 1,
                capacity,
            };
            self.files.insert(key, ranges);
            return Err(err);
        }

        let cleared = ranges
            .iter()
            .flat_map(BlockRange::indices)
            .try_for_each(|index| self.device.clear(index));
        if let Err(err) = cleared {
            warn!("Clearing blocks of {} failed: {}", key, err);
            self.files.insert(key, ranges);
            return Err(err);
        }

        for range in &ranges {
            self.free.release(*range)?;
        }
        self.free.resort();

        debug!("Deleted {} ({} ranges)", key, ranges.len());
        Ok(())
    }

    /// Undo a partial store: clear and release every range taken so far
    fn rollback(&mut self, taken: &[BlockRange]) {
        for range in taken {
            for index in range.indices() {
                if let Err(err) = self.device.clear(index) {
                    warn!("Rollback could not clear block {}: {}", index, err);
                }
            }
            if let Err(err) = self.free.release(*range) {
                warn!("Rollback could not release {}: {}", range, err);
            }
        }
        self.free.resort();
        warn!("Rolled back partial store of {} ranges", taken.len());
    }

    /// Check if an identifier is stored
    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.files.contains_key(id)
    }

    /// Ranges owned by an identifier, in write order
    pub fn ranges<Q>(&self, id: &Q) -> Option<&[BlockRange]>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.files.get(id).map(Vec::as_slice)
    }

    /// Stored identifiers, in no particular order
    pub fn identifiers(&self) -> impl Iterator<Item = &K> {
        self.files.keys()
    }

    /// Number of stored files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn block_size(&self) -> usize {
        self.device.block_size()
    }

    pub fn free_space(&self) -> &FreeSpaceTracker {
        &self.free
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn stats(&self) -> StoreStats {
        let total_blocks = self.free.total_blocks();
        let free_blocks = self.free.free_blocks();
        StoreStats {
            block_size: self.device.block_size(),
            total_blocks,
            free_blocks,
            used_blocks: total_blocks - free_blocks,
            file_count: self.files.len(),
            free_range_count: self.free.range_count(),
            fragmentation_score: self.free.fragmentation_score(),
        }
    }

    /// Verify the free set and the file table together account for every
    /// block exactly once
    pub fn validate(&self) -> Result<()> {
        self.free.validate()?;

        let total = self.free.total_blocks();
        let mut owner: Vec<Option<&K>> = vec![None; total];

        for (id, ranges) in &self.files {
            for range in ranges {
                if range.is_empty() || range.end > total {
                    return Err(BlockfsError::InvariantViolation(format!(
                        "{} owns invalid range {}",
                        id, range
                    )));
                }
                for index in range.indices() {
                    if let Some(other) = owner[index] {
                        return Err(BlockfsError::InvariantViolation(format!(
                            "block {} owned by both {} and {}",
                            index, other, id
                        )));
                    }
                    if self.free.is_free(index) {
                        return Err(BlockfsError::InvariantViolation(format!(
                            "block {} owned by {} is also free",
                            index, id
                        )));
                    }
                    owner[index] = Some(id);
                }
            }
        }

        let owned = owner.iter().filter(|o| o.is_some()).count();
        if owned + self.free.free_blocks() != total {
            return Err(BlockfsError::InvariantViolation(format!(
                "{} owned + {} free != {} total blocks",
                owned,
                self.free.free_blocks(),
                total
            )));
        }
        Ok(())
    }
}

/// Fill consecutive blocks of `range` from `data`, one block-size chunk each,
/// stopping when `data` runs out. Returns the number of bytes written.
fn write_range<D: BlockDevice>(device: &mut D, range: BlockRange, data: &[u8]) -> Result<usize> {
    let block_size = device.block_size();
    let mut written = 0;
    for index in range.indices() {
        if written >= data.len() {
            break;
        }
        let end = written.saturating_add(block_size).min(data.len());
        device.fill(index, &data[written..end])?;
        written = end;
    }
    Ok(written)
}

//! Fixed-capacity block device
//!
//! A block device is an array of `block_count` slots, each holding at most
//! `block_size` bytes. Slots are either empty or hold a payload. Every call
//! touches exactly one slot.

use crate::core::config::StorageConfig;
use crate::core::error::{BlockfsError, Result};

/// Index of a block, in `[0, block_count)`
pub type BlockIndex = usize;

/// Indexed fill/read/clear access to fixed-size slots
pub trait BlockDevice {
    /// Maximum payload length of one block
    fn block_size(&self) -> usize;

    /// Number of slots
    fn block_count(&self) -> usize;

    /// Store `data` in the slot at `index`, replacing any previous payload
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` for a bad index, `PayloadTooLarge` if `data` is longer
    /// than the block size.
    fn fill(&mut self, index: BlockIndex, data: &[u8]) -> Result<()>;

    /// Payload at `index`, or `None` for an empty slot
    fn read(&self, index: BlockIndex) -> Result<Option<&[u8]>>;

    /// Empty the slot at `index`
    fn clear(&mut self, index: BlockIndex) -> Result<()>;
}

/// Volatile in-memory block device
#[derive(Debug, Clone)]
pub struct MemoryBlockStore {
    block_size: usize,
    slots: Vec<Option<Vec<u8>>>,
}

impl MemoryBlockStore {
    pub fn new(block_size: usize, block_count: usize) -> Self {
        MemoryBlockStore {
            block_size,
            slots: vec![None; block_count],
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.block_size, config.memory_size)
    }

    /// Number of non-empty slots
    pub fn used_blocks(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn check_index(&self, index: BlockIndex) -> Result<()> {
        if index >= self.slots.len() {
            return Err(BlockfsError::IndexOutOfRange {
                index,
                capacity: self.slots.len(),
            });
        }
        Ok(())
    }
}

impl BlockDevice for MemoryBlockStore {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_count(&self) -> usize {
        self.slots.len()
    }

    fn fill(&mut self, index: BlockIndex, data: &[u8]) -> Result<()> {
        self.check_index(index)?;
        if data.len() > self.block_size {
            return Err(BlockfsError::PayloadTooLarge {
                len: data.len(),
                block_size: self.block_size,
            });
        }
        self.slots[index] = Some(data.to_vec());
        Ok(())
    }

    fn read(&self, index: BlockIndex) -> Result<Option<&[u8]>> {
        self.check_index(index)?;
        Ok(self.slots[index].as_deref())
    }

    fn clear(&mut self, index: BlockIndex) -> Result<()> {
        self.check_index(index)?;
        self.slots[index] = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_read() {
        let mut store = MemoryBlockStore::new(10, 10);
        store.fill(0, b"Test1").unwrap();
        store.fill(1, b"Test2").unwrap();
        store.fill(0, b"Test3").unwrap();

        assert_eq!(store.read(0).unwrap(), Some(&b"Test3"[..]));
        assert_eq!(store.read(1).unwrap(), Some(&b"Test2"[..]));
        assert_eq!(store.read(2).unwrap(), None);
        assert_eq!(store.used_blocks(), 2);
    }

    #[test]
    fn test_clear() {
        let mut store = MemoryBlockStore::new(10, 10);
        store.fill(1, b"Test4").unwrap();
        store.clear(1).unwrap();
        assert_eq!(store.read(1).unwrap(), None);

        // Clearing an empty slot is fine
        store.clear(1).unwrap();
        assert_eq!(store.used_blocks(), 0);
    }

    #[test]
    fn test_payload_too_large() {
        let mut store = MemoryBlockStore::new(10, 10);
        store.fill(1, b"Test4").unwrap();

        let result = store.fill(1, b"Str too long");
        assert!(matches!(
            result,
            Err(BlockfsError::PayloadTooLarge {
                len: 12,
                block_size: 10
            })
        ));
        // Slot untouched by the failed fill
        assert_eq!(store.read(1).unwrap(), Some(&b"Test4"[..]));
    }

    #[test]
    fn test_exact_block_size_payload() {
        let mut store = MemoryBlockStore::new(4, 2);
        store.fill(1, b"abcd").unwrap();
        assert_eq!(store.read(1).unwrap(), Some(&b"abcd"[..]));
    }

    #[test]
    fn test_index_out_of_range() {
        let mut store = MemoryBlockStore::new(10, 10);

        assert!(matches!(
            store.fill(10, b"Test5"),
            Err(BlockfsError::IndexOutOfRange {
                index: 10,
                capacity: 10
            })
        ));
        assert!(matches!(
            store.read(10),
            Err(BlockfsError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            store.clear(10),
            Err(BlockfsError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_from_config() {
        let store = MemoryBlockStore::from_config(&StorageConfig::new(16, 32));
        assert_eq!(store.block_size(), 16);
        assert_eq!(store.block_count(), 32);
    }
}

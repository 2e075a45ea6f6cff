//! Half-open block ranges

use crate::core::block_store::BlockIndex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contiguous run of blocks `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRange {
    /// First block in the range
    pub start: BlockIndex,
    /// One past the last block
    pub end: BlockIndex,
}

impl BlockRange {
    pub fn new(start: BlockIndex, end: BlockIndex) -> Self {
        debug_assert!(start <= end, "range start {} after end {}", start, end);
        BlockRange { start, end }
    }

    /// Range of `len` blocks beginning at `start`
    pub fn with_len(start: BlockIndex, len: usize) -> Self {
        BlockRange::new(start, start + len)
    }

    /// Number of blocks in the range
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this range contains a block index
    pub fn contains(&self, index: BlockIndex) -> bool {
        index >= self.start && index < self.end
    }

    /// Check if this range shares at least one block with another
    pub fn overlaps(&self, other: &BlockRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this range touches another end-to-start (can be coalesced)
    pub fn is_adjacent(&self, other: &BlockRange) -> bool {
        self.end == other.start || other.end == self.start
    }

    /// Coalesce two adjacent ranges
    pub fn coalesce(&self, other: &BlockRange) -> Option<BlockRange> {
        if !self.is_adjacent(other) {
            return None;
        }
        Some(BlockRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        })
    }

    /// Split off the first `len` blocks, returning the head and any remaining tail
    pub fn split_at(&self, len: usize) -> (BlockRange, Option<BlockRange>) {
        let mid = (self.start + len).min(self.end);
        let head = BlockRange::new(self.start, mid);
        let tail = if mid < self.end {
            Some(BlockRange::new(mid, self.end))
        } else {
            None
        };
        (head, tail)
    }

    /// Block indices covered by the range, in ascending order
    pub fn indices(&self) -> std::ops::Range<BlockIndex> {
        self.start..self.end
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_creation() {
        let range = BlockRange::with_len(10, 20);
        assert_eq!(range.start, 10);
        assert_eq!(range.end, 30);
        assert_eq!(range.len(), 20);
        assert!(!range.is_empty());
    }

    #[test]
    fn test_range_contains() {
        let range = BlockRange::new(10, 30);
        assert!(!range.contains(9));
        assert!(range.contains(10));
        assert!(range.contains(29));
        assert!(!range.contains(30));
    }

    #[test]
    fn test_range_adjacency() {
        let r1 = BlockRange::new(10, 20);
        let r2 = BlockRange::new(20, 30);
        let r3 = BlockRange::new(30, 40);

        assert!(r1.is_adjacent(&r2));
        assert!(r2.is_adjacent(&r1));
        assert!(r2.is_adjacent(&r3));
        assert!(!r1.is_adjacent(&r3));
        assert!(!r1.overlaps(&r2));
    }

    #[test]
    fn test_range_overlap() {
        let r1 = BlockRange::new(0, 5);
        assert!(r1.overlaps(&BlockRange::new(4, 8)));
        assert!(r1.overlaps(&BlockRange::new(1, 2)));
        assert!(!r1.overlaps(&BlockRange::new(5, 8)));
    }

    #[test]
    fn test_range_coalesce() {
        let r1 = BlockRange::new(10, 20);
        let r2 = BlockRange::new(20, 30);

        assert_eq!(r2.coalesce(&r1), Some(BlockRange::new(10, 30)));
        assert_eq!(r1.coalesce(&BlockRange::new(25, 30)), None);
    }

    #[test]
    fn test_range_split() {
        let range = BlockRange::new(2, 10);

        let (head, tail) = range.split_at(3);
        assert_eq!(head, BlockRange::new(2, 5));
        assert_eq!(tail, Some(BlockRange::new(5, 10)));

        let (head, tail) = range.split_at(8);
        assert_eq!(head, range);
        assert_eq!(tail, None);
    }

    #[test]
    fn test_range_display() {
        assert_eq!(BlockRange::new(3, 7).to_string(), "[3, 7)");
    }
}

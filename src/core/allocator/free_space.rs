//! Free-range tracker
//!
//! Keeps the unallocated blocks as a list of disjoint, non-adjacent ranges.
//! Allocation is first-fit over the current list order; when no single range
//! is large enough, the last range in the list is handed out whole and the
//! caller asks again for the remainder. Callers call [`FreeSpaceTracker::resort`]
//! after each store or delete, which orders the list by ascending length, so
//! first-fit picks the shortest range that fits and the fallback takes the
//! longest range available.

use crate::core::allocator::range::BlockRange;
use crate::core::error::{BlockfsError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of one allocation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// Exactly the requested number of blocks
    Full(BlockRange),
    /// A whole free range shorter than the request; ask again for the rest
    Partial(BlockRange),
}

impl Allocation {
    pub fn range(&self) -> BlockRange {
        match self {
            Allocation::Full(range) | Allocation::Partial(range) => *range,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Allocation::Partial(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeSpaceTracker {
    /// Free ranges in allocation-scan order
    ranges: Vec<BlockRange>,

    /// Total number of blocks tracked
    total_blocks: usize,

    /// Number of free blocks available
    free_blocks: usize,
}

impl FreeSpaceTracker {
    /// Create a tracker with every block free
    pub fn new(total_blocks: usize) -> Self {
        let mut ranges = Vec::new();
        if total_blocks > 0 {
            ranges.push(BlockRange::new(0, total_blocks));
        }

        FreeSpaceTracker {
            ranges,
            total_blocks,
            free_blocks: total_blocks,
        }
    }

    /// Whether the free ranges hold at least `num_blocks` blocks in total
    ///
    /// Sums from the longest range down and stops as soon as the running total
    /// reaches the request.
    pub fn has_capacity(&self, num_blocks: usize) -> bool {
        if num_blocks == 0 {
            return true;
        }

        let mut lengths: Vec<usize> = self.ranges.iter().map(BlockRange::len).collect();
        lengths.sort_unstable_by(|a, b| b.cmp(a));

        let mut found = 0;
        for len in lengths {
            found += len;
            if found >= num_blocks {
                return true;
            }
        }
        false
    }

    /// Take blocks for a request of `num_blocks`
    ///
    /// The first range (in current order) with at least `num_blocks` blocks is
    /// split: its head is returned as [`Allocation::Full`] and its tail goes to
    /// the back of the list. If no range is long enough, the last range is
    /// removed and returned whole as [`Allocation::Partial`]. Returns `None`
    /// for an empty request or when nothing is free.
    pub fn allocate(&mut self, num_blocks: usize) -> Option<Allocation> {
        if num_blocks == 0 {
            return None;
        }

        if let Some(pos) = self.ranges.iter().position(|r| r.len() >= num_blocks) {
            let candidate = self.ranges.remove(pos);
            let (head, tail) = candidate.split_at(num_blocks);
            if let Some(tail) = tail {
                self.ranges.push(tail);
            }
            self.free_blocks -= head.len();
            debug!("First-fit allocation of {} blocks from {}", num_blocks, candidate);
            return Some(Allocation::Full(head));
        }

        let fallback = self.ranges.pop()?;
        self.free_blocks -= fallback.len();
        debug!(
            "No free range holds {} blocks, taking {} ({} blocks)",
            num_blocks,
            fallback,
            fallback.len()
        );
        Some(Allocation::Partial(fallback))
    }

    /// Return a range to the free set, merging it with both neighbours
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if the range runs past the tracked blocks,
    /// `InvariantViolation` if any of its blocks is already free.
    pub fn release(&mut self, range: BlockRange) -> Result<()> {
        if range.is_empty() {
            return Ok(());
        }
        if range.end > self.total_blocks {
            return Err(BlockfsError::IndexOutOfRange {
                index: range.end - 1,
                capacity: self.total_blocks,
            });
        }
        if let Some(existing) = self.ranges.iter().find(|r| r.overlaps(&range)) {
            return Err(BlockfsError::InvariantViolation(format!(
                "released range {} overlaps free range {}",
                range, existing
            )));
        }

        let before = self.ranges.iter().position(|r| r.end == range.start);
        let after = self.ranges.iter().position(|r| r.start == range.end);

        let mut merged = range;
        let mut to_remove = Vec::with_capacity(2);
        for pos in [before, after].into_iter().flatten() {
            if let Some(coalesced) = merged.coalesce(&self.ranges[pos]) {
                merged = coalesced;
            }
            to_remove.push(pos);
        }

        // Remove higher positions first so lower ones stay valid
        to_remove.sort_unstable_by(|a, b| b.cmp(a));
        for pos in to_remove {
            self.ranges.remove(pos);
        }

        self.ranges.push(merged);
        self.free_blocks += range.len();

        if merged != range {
            debug!("Released {} coalesced into {}", range, merged);
        }
        Ok(())
    }

    /// Order free ranges by ascending length, ties by start block
    pub fn resort(&mut self) {
        self.ranges.sort_unstable_by_key(|r| (r.len(), r.start));
    }

    /// Free ranges in current scan order
    pub fn ranges(&self) -> &[BlockRange] {
        &self.ranges
    }

    /// Get current number of free ranges (fragmentation indicator)
    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn total_blocks(&self) -> usize {
        self.total_blocks
    }

    pub fn free_blocks(&self) -> usize {
        self.free_blocks
    }

    /// Check if a block is currently free
    pub fn is_free(&self, index: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(index))
    }

    /// 0.0 when free space is one range, approaching 1.0 as it splinters into
    /// single blocks
    pub fn fragmentation_score(&self) -> f64 {
        if self.free_blocks == 0 || self.ranges.is_empty() {
            return 0.0;
        }
        (self.ranges.len() as f64 - 1.0) / (self.free_blocks as f64).max(1.0)
    }

    /// Verify ranges are in bounds, pairwise disjoint and non-adjacent, and
    /// that the free counter matches their total length
    pub fn validate(&self) -> Result<()> {
        let mut sorted = self.ranges.clone();
        sorted.sort_unstable_by_key(|r| r.start);

        for range in &sorted {
            if range.is_empty() {
                return Err(BlockfsError::InvariantViolation(format!(
                    "empty free range {}",
                    range
                )));
            }
            if range.end > self.total_blocks {
                return Err(BlockfsError::InvariantViolation(format!(
                    "free range {} exceeds {} blocks",
                    range, self.total_blocks
                )));
            }
        }

        for pair in sorted.windows(2) {
            if pair[0].end >= pair[1].start {
                return Err(BlockfsError::InvariantViolation(format!(
                    "free ranges {} and {} overlap or touch",
                    pair[0], pair[1]
                )));
            }
        }

        let counted: usize = sorted.iter().map(BlockRange::len).sum();
        if counted != self.free_blocks {
            return Err(BlockfsError::InvariantViolation(format!(
                "free counter {} disagrees with {} blocks in free ranges",
                self.free_blocks, counted
            )));
        }
        Ok(())
    }
}

//! Block allocation for the file store
//!
//! - [`range`] - half-open `[start, end)` block ranges
//! - [`free_space`] - free-range tracker with first-fit allocation and
//!   coalescing release

pub mod free_space;
pub mod range;

pub use free_space::{Allocation, FreeSpaceTracker};
pub use range::BlockRange;

#![no_main]
use blockfs::{BlockRange, FreeSpaceTracker};
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

#[derive(Debug, Arbitrary)]
struct Input {
    total_blocks: u8,
    requests: Vec<u8>,
    release_order: Vec<u8>,
}

// Allocating everything and releasing it in any order must end in one range
fuzz_target!(|input: Input| {
    let total = input.total_blocks as usize;
    let mut tracker = FreeSpaceTracker::new(total);
    let mut taken: Vec<BlockRange> = Vec::new();

    for request in input.requests.iter().take(256) {
        if let Some(allocation) = tracker.allocate(*request as usize) {
            taken.push(allocation.range());
        }
        tracker.validate().unwrap();
    }
    while let Some(allocation) = tracker.allocate(1) {
        taken.push(allocation.range());
    }
    assert_eq!(tracker.free_blocks(), 0);

    for (i, pick) in input.release_order.iter().enumerate() {
        if taken.is_empty() {
            break;
        }
        let idx = (*pick as usize + i) % taken.len();
        tracker.release(taken.swap_remove(idx)).unwrap();
        tracker.validate().unwrap();
    }
    for range in taken.drain(..) {
        tracker.release(range).unwrap();
    }

    assert_eq!(tracker.free_blocks(), total);
    assert!(tracker.range_count() <= 1);
});

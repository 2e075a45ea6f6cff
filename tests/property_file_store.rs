//! Property-based tests for file store correctness
//!
//! Uses proptest to verify the storage invariants hold across random
//! store/delete sequences

use blockfs::{BlockRange, BlockfsError, FileStore, StorageConfig};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Op {
    Store { key: u8, len: usize, byte: u8 },
    Delete { key: u8 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..12, 0usize..64, any::<u8>())
            .prop_map(|(key, len, byte)| Op::Store { key, len, byte }),
        2 => (0u8..12).prop_map(|key| Op::Delete { key }),
    ]
}

/// Sum of free and owned blocks must equal the device size
fn assert_capacity(store: &FileStore<String>, total: usize) -> Result<(), TestCaseError> {
    let owned: usize = store
        .identifiers()
        .filter_map(|id| store.ranges(id))
        .flatten()
        .map(BlockRange::len)
        .sum();
    prop_assert_eq!(owned + store.free_space().free_blocks(), total);
    Ok(())
}

proptest! {
    #[test]
    fn prop_invariants_hold_across_operations(
        ops in prop::collection::vec(op_strategy(), 1..80)
    ) {
        let config = StorageConfig::new(8, 32);
        let mut store: FileStore<String> = FileStore::new(config).unwrap();
        let mut model: HashMap<String, Vec<u8>> = HashMap::new();

        for op in ops {
            match op {
                Op::Store { key, len, byte } => {
                    let id = format!("file{}", key);
                    let payload = vec![byte; len];
                    let free_before = store.free_space().free_blocks();
                    let result = store.store(id.clone(), &payload);

                    if model.contains_key(&id) {
                        let is_duplicate =
                            matches!(result, Err(BlockfsError::DuplicateIdentifier(_)));
                        prop_assert!(is_duplicate);
                    } else if config.blocks_for(len) > free_before {
                        let is_full = matches!(result, Err(BlockfsError::InsufficientSpace { .. }));
                        prop_assert!(is_full);
                        prop_assert_eq!(store.free_space().free_blocks(), free_before);
                    } else {
                        prop_assert!(result.is_ok());
                        model.insert(id, payload);
                    }
                }
                Op::Delete { key } => {
                    let id = format!("file{}", key);
                    let result = store.delete(&id);
                    prop_assert_eq!(result.is_ok(), model.remove(&id).is_some());
                }
            }

            prop_assert!(store.validate().is_ok(), "{:?}", store.validate());
            assert_capacity(&store, 32)?;
        }

        for (id, payload) in &model {
            prop_assert_eq!(&store.get(id).unwrap(), payload);
        }
        prop_assert_eq!(store.len(), model.len());
    }

    #[test]
    fn prop_round_trip(
        block_size in 1usize..32,
        payload in prop::collection::vec(any::<u8>(), 0..512)
    ) {
        let memory_size = payload.len().div_ceil(block_size).max(1);
        let mut store: FileStore<String> =
            FileStore::new(StorageConfig::new(block_size, memory_size)).unwrap();

        store.store("p".to_string(), &payload).unwrap();
        prop_assert_eq!(store.get("p").unwrap(), payload);
    }

    #[test]
    fn prop_delete_then_restore_same_size(
        sizes in prop::collection::vec(1usize..40, 2..8),
        victim in any::<prop::sample::Index>()
    ) {
        let mut store: FileStore<String> = FileStore::new(StorageConfig::new(4, 128)).unwrap();
        for (i, size) in sizes.iter().enumerate() {
            store.store(format!("f{}", i), &vec![i as u8; *size]).unwrap();
        }

        let victim = victim.index(sizes.len());
        let freed: usize = store
            .ranges(&format!("f{}", victim))
            .unwrap()
            .iter()
            .map(BlockRange::len)
            .sum();
        store.delete(&format!("f{}", victim)).unwrap();

        let free_after_delete = store.free_space().free_blocks();
        store.store("again".to_string(), &vec![0xAB; sizes[victim]]).unwrap();
        prop_assert_eq!(store.free_space().free_blocks(), free_after_delete - freed);
        prop_assert!(store.validate().is_ok());
    }

    #[test]
    fn prop_no_adjacent_free_ranges(
        sizes in prop::collection::vec(1usize..4, 1..16),
        deletes in prop::collection::vec(any::<bool>(), 20)
    ) {
        let mut store: FileStore<String> = FileStore::new(StorageConfig::new(1, 64)).unwrap();
        for (i, size) in sizes.iter().enumerate() {
            store.store(format!("f{}", i), &vec![1u8; *size]).unwrap();
        }
        for (i, delete) in deletes.iter().enumerate().take(sizes.len()) {
            if *delete {
                store.delete(&format!("f{}", i)).unwrap();
            }
        }

        let mut ranges = store.free_space().ranges().to_vec();
        ranges.sort_by_key(|r| r.start);
        for pair in ranges.windows(2) {
            prop_assert!(pair[0].end < pair[1].start, "{} touches {}", pair[0], pair[1]);
        }
    }
}

#![no_main]
use blockfs::{BlockfsError, FileStore, StorageConfig};
use libfuzzer_sys::{
    arbitrary::{Arbitrary, Unstructured},
    fuzz_target,
};

#[derive(Debug, Arbitrary)]
enum StoreOp {
    Store { key: u8, data: Vec<u8> },
    Get { key: u8 },
    Delete { key: u8 },
}

// Random store/get/delete sequences must never break the free-set invariants
fuzz_target!(|input: &[u8]| {
    let mut u = Unstructured::new(input);

    let block_size = match u.int_in_range(1usize..=64) {
        Ok(n) => n,
        Err(_) => return,
    };
    let memory_size = match u.int_in_range(1usize..=128) {
        Ok(n) => n,
        Err(_) => return,
    };
    let ops: Vec<StoreOp> = match u.arbitrary() {
        Ok(ops) => ops,
        Err(_) => return,
    };

    let config = StorageConfig::new(block_size, memory_size);
    let mut store: FileStore<u8> = match FileStore::new(config) {
        Ok(s) => s,
        Err(_) => return,
    };

    for op in ops.iter().take(64) {
        match op {
            StoreOp::Store { key, data } => match store.store(*key, data) {
                Ok(()) => assert_eq!(&store.get(key).unwrap(), data),
                Err(BlockfsError::DuplicateIdentifier(_))
                | Err(BlockfsError::InsufficientSpace { .. }) => {}
                Err(e) => panic!("store failed: {}", e),
            },
            StoreOp::Get { key } => {
                let _ = store.get(key);
            }
            StoreOp::Delete { key } => {
                let _ = store.delete(key);
            }
        }
        store.validate().unwrap();
    }
});

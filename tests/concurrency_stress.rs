//! Concurrent readers/writers against a shared store

use blockfs::{BlockfsError, SharedFileStore, StorageConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_10_concurrent_readers_2_writers() {
    let shared: SharedFileStore<String> =
        SharedFileStore::new(StorageConfig::new(16, 1024)).unwrap();

    // Pre-populate
    for i in 0..50 {
        shared
            .store(format!("file{}", i), format!("data{}", i).as_bytes())
            .unwrap();
    }

    let handles: Vec<_> = (0..12)
        .map(|thread_id| {
            let store = shared.clone();
            std::thread::spawn(move || {
                if thread_id < 2 {
                    // Writer thread
                    for i in 0..100 {
                        store
                            .store(format!("writer{}_{}", thread_id, i), b"new data")
                            .unwrap();
                    }
                } else {
                    // Reader thread
                    for _ in 0..1000 {
                        let idx = rand::random::<usize>() % 50;
                        let data = store.get(&format!("file{}", idx)).unwrap();
                        assert_eq!(data, format!("data{}", idx).as_bytes());
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let stats = shared.stats();
    assert_eq!(stats.file_count, 250);
    shared.validate().unwrap();
}

#[test]
fn test_writers_racing_for_one_identifier() {
    let shared: SharedFileStore<String> = SharedFileStore::new(StorageConfig::new(8, 64)).unwrap();
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|thread_id| {
            let store = shared.clone();
            let winners = winners.clone();
            std::thread::spawn(move || {
                match store.store("contested".to_string(), &[thread_id as u8; 20]) {
                    Ok(()) => {
                        winners.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(BlockfsError::DuplicateIdentifier(_)) => {}
                    Err(e) => panic!("unexpected error: {}", e),
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(winners.load(Ordering::Relaxed), 1);
    assert_eq!(shared.stats().used_blocks, 3);
    shared.validate().unwrap();
}

#[test]
fn test_store_delete_churn() {
    let shared: SharedFileStore<String> = SharedFileStore::new(StorageConfig::new(4, 256)).unwrap();

    let handles: Vec<_> = (0..6)
        .map(|thread_id| {
            let store = shared.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    let id = format!("t{}-{}", thread_id, i % 5);
                    let len = rand::random::<usize>() % 24;
                    if store.contains(&id) {
                        store.delete(&id).unwrap();
                    } else {
                        let payload = vec![thread_id as u8; len];
                        match store.store(id.clone(), &payload) {
                            Ok(()) => assert_eq!(store.get(&id).unwrap(), payload),
                            Err(BlockfsError::InsufficientSpace { .. }) => {}
                            Err(e) => panic!("unexpected error: {}", e),
                        }
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    shared.validate().unwrap();
    let stats = shared.stats();
    assert_eq!(stats.free_blocks + stats.used_blocks, 256);
}

#[test]
fn test_exclusive_section_sees_consistent_state() {
    let shared: SharedFileStore<String> = SharedFileStore::new(StorageConfig::new(8, 128)).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|thread_id| {
            let store = shared.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    store.with_exclusive(|fs| {
                        let id = format!("x{}-{}", thread_id, i);
                        if fs.free_space().has_capacity(1) {
                            fs.store(id.clone(), b"12345678").unwrap();
                            fs.delete(&id).unwrap();
                        }
                        fs.validate().unwrap();
                    });
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(shared.stats().free_blocks, 128);
}

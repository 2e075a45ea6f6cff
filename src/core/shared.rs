//! Thread-safe file store handle
//!
//! Allocation and the file-table update of a store must be observed as one
//! step, so the free set and the file table sit behind a single lock. Stores
//! and deletes hold the write lock for the whole operation; reads share it.

use crate::core::config::StorageConfig;
use crate::core::error::Result;
use crate::core::file_store::{FileStore, StoreStats};
use parking_lot::RwLock;
use std::borrow::Borrow;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

/// Cloneable handle to a lock-guarded [`FileStore`]
pub struct SharedFileStore<K> {
    inner: Arc<RwLock<FileStore<K>>>,
}

impl<K> Clone for SharedFileStore<K> {
    fn clone(&self) -> Self {
        SharedFileStore {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> SharedFileStore<K>
where
    K: Eq + Hash + Display,
{
    pub fn new(config: StorageConfig) -> Result<Self> {
        Ok(Self::from_store(FileStore::new(config)?))
    }

    pub fn from_store(store: FileStore<K>) -> Self {
        SharedFileStore {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn store(&self, id: K, payload: &[u8]) -> Result<()> {
        self.inner.write().store(id, payload)
    }

    pub fn get<Q>(&self, id: &Q) -> Result<Vec<u8>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
    {
        self.inner.read().get(id)
    }

    pub fn delete<Q>(&self, id: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
    {
        self.inner.write().delete(id)
    }

    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.read().contains(id)
    }

    pub fn stats(&self) -> StoreStats {
        self.inner.read().stats()
    }

    pub fn validate(&self) -> Result<()> {
        self.inner.read().validate()
    }

    /// Run `f` with exclusive access, for sequences that must not interleave
    /// with other callers
    pub fn with_exclusive<R>(&self, f: impl FnOnce(&mut FileStore<K>) -> R) -> R {
        f(&mut self.inner.write())
    }
}

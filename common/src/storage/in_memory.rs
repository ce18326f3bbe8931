use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use super::{Storage, WriteOptions};
use crate::{Record, StorageError, StorageRead, StorageResult};

/// In-memory implementation of the Storage trait using a BTreeMap.
///
/// This implementation stores all data in memory and is useful for testing
/// or scenarios where durability is not required.
pub struct InMemoryStorage {
    data: Arc<RwLock<BTreeMap<Bytes, Bytes>>>,
}

impl InMemoryStorage {
    /// Creates a new InMemoryStorage instance with an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageRead for InMemoryStorage {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::Internal(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(&key).map(|value| Record::new(key, value.clone())))
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    /// Writes a batch of records to the in-memory store.
    ///
    /// All records are written atomically within a single write lock acquisition.
    /// Write options are ignored since there is no durable storage to await.
    #[tracing::instrument(level = "trace", skip_all)]
    async fn put_with_options(
        &self,
        records: Vec<Record>,
        _options: WriteOptions,
    ) -> StorageResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::Internal(format!("Failed to acquire write lock: {}", e)))?;

        for record in records {
            data.insert(record.key, record.value);
        }

        Ok(())
    }

    async fn flush(&self) -> StorageResult<()> {
        // writes are immediately visible
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Injected failure that fires either once or on every call.
#[cfg(feature = "test-utils")]
#[derive(Clone)]
enum Failure {
    /// Error is returned once, then automatically cleared.
    Once(StorageError),
    /// Error is returned on every subsequent call until explicitly cleared.
    Persistent(StorageError),
}

#[cfg(feature = "test-utils")]
type FailSlot = arc_swap::ArcSwap<Option<Failure>>;

/// Checks a [`FailSlot`] and returns an error if one is set.
///
/// For [`Failure::Once`], the slot is atomically swapped to `None` so the
/// error fires exactly once. For [`Failure::Persistent`], the slot is left
/// unchanged.
#[cfg(feature = "test-utils")]
fn check_failure(slot: &FailSlot) -> StorageResult<()> {
    let guard = slot.load();
    match guard.as_ref() {
        None => Ok(()),
        Some(Failure::Persistent(err)) => Err(err.clone()),
        Some(Failure::Once(_)) => {
            let prev = slot.swap(Arc::new(None));
            match prev.as_ref() {
                Some(Failure::Once(err)) => Err(err.clone()),
                _ => Ok(()),
            }
        }
    }
}

/// A storage wrapper that delegates to an inner [`Storage`] but can inject
/// failures into `get`, `put`/`put_with_options`, and `flush` on demand.
///
/// Failures can be *persistent* (returned on every call until cleared) or
/// *once* (returned on the next call, then automatically cleared).
///
/// Gated behind the `test-utils` feature.
///
/// # Example
///
/// ```ignore
/// let inner = Arc::new(InMemoryStorage::new());
/// let storage = FailingStorage::wrap(inner);
/// storage.fail_put(StorageError::Storage("throttled".into()));
/// // every put_with_options call now returns Err(...)
///
/// storage.clear_put();
/// // writes go through again
/// ```
#[cfg(feature = "test-utils")]
pub struct FailingStorage {
    inner: Arc<dyn Storage>,
    fail_get: FailSlot,
    fail_put: FailSlot,
    fail_flush: FailSlot,
}

#[cfg(feature = "test-utils")]
impl FailingStorage {
    /// Wraps an existing storage, with all failure injections initially `None`.
    pub fn wrap(inner: Arc<dyn Storage>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_get: arc_swap::ArcSwap::from_pointee(None),
            fail_put: arc_swap::ArcSwap::from_pointee(None),
            fail_flush: arc_swap::ArcSwap::from_pointee(None),
        })
    }

    /// Makes `get` return the given error on every subsequent call.
    pub fn fail_get(&self, err: StorageError) {
        self.fail_get.store(Arc::new(Some(Failure::Persistent(err))));
    }

    /// Makes `get` return the given error on the next call only.
    pub fn fail_get_once(&self, err: StorageError) {
        self.fail_get.store(Arc::new(Some(Failure::Once(err))));
    }

    /// Makes `put` and `put_with_options` return the given error on every subsequent call.
    pub fn fail_put(&self, err: StorageError) {
        self.fail_put.store(Arc::new(Some(Failure::Persistent(err))));
    }

    /// Makes `put` or `put_with_options` return the given error on the next call only.
    pub fn fail_put_once(&self, err: StorageError) {
        self.fail_put.store(Arc::new(Some(Failure::Once(err))));
    }

    /// Makes `flush` return the given error on every subsequent call.
    pub fn fail_flush(&self, err: StorageError) {
        self.fail_flush
            .store(Arc::new(Some(Failure::Persistent(err))));
    }

    /// Clears any pending `put` failure.
    pub fn clear_put(&self) {
        self.fail_put.store(Arc::new(None));
    }

    /// Clears any pending `get` failure.
    pub fn clear_get(&self) {
        self.fail_get.store(Arc::new(None));
    }
}

#[cfg(feature = "test-utils")]
#[async_trait]
impl StorageRead for FailingStorage {
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
        check_failure(&self.fail_get)?;
        self.inner.get(key).await
    }
}

#[cfg(feature = "test-utils")]
#[async_trait]
impl Storage for FailingStorage {
    async fn put_with_options(
        &self,
        records: Vec<Record>,
        options: WriteOptions,
    ) -> StorageResult<()> {
        check_failure(&self.fail_put)?;
        self.inner.put_with_options(records, options).await
    }

    async fn flush(&self) -> StorageResult<()> {
        check_failure(&self.fail_flush)?;
        self.inner.flush().await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }
}

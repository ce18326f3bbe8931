//! Atomic counter stores.
//!
//! An [`AtomicCounterStore`] is the single source of truth for how many IDs
//! have ever been reserved for a [`CounterKey`]. Allocators only ever observe
//! the counter through the total returned by
//! [`increment_and_get`](AtomicCounterStore::increment_and_get).

use std::sync::Arc;

use async_trait::async_trait;
use common::{Record, Storage, StorageRead, WriteOptions};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::model::CounterKey;
use crate::serde::{decode_counter_value, encode_counter_key, encode_counter_value};

/// A keyed counter with a linearizable add-and-return operation.
///
/// Implementations must guarantee that every successful `increment_and_get`
/// on a key returns a total strictly greater than every earlier successful
/// call on that key, regardless of which caller made it, and that a failed
/// call applies no delta.
#[async_trait]
pub trait AtomicCounterStore: Send + Sync {
    /// Creates the counter record with a total of 0 if it does not exist yet.
    ///
    /// Existing counters are left untouched.
    async fn initialize(&self, key: &CounterKey) -> Result<()>;

    /// Atomically adds `delta` to the counter and returns the new total.
    ///
    /// A counter that was never written behaves as if its total were 0.
    /// `delta` must be at least 1.
    async fn increment_and_get(&self, key: &CounterKey, delta: u64) -> Result<u64>;
}

/// Counter store over a [`Storage`] backend.
///
/// Each increment is a read-modify-write of the counter record. A tokio mutex
/// is held across the read and the write so no update is lost.
///
/// # Thread Safety
///
/// Atomicity holds among callers that share one `StorageCounterStore`. Use a
/// single instance per storage and share it behind an `Arc`; SlateDB fences
/// out any second writer opening the same database.
pub struct StorageCounterStore {
    storage: Arc<dyn Storage>,
    write_options: WriteOptions,
    write_lock: Mutex<()>,
}

impl StorageCounterStore {
    /// Creates a counter store with default write options.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_write_options(storage, WriteOptions::default())
    }

    /// Creates a counter store that writes with the given options.
    ///
    /// With `await_durable` set, an increment only returns once the new total
    /// is durable, so no ID is handed out that a restart could issue again.
    pub fn with_write_options(storage: Arc<dyn Storage>, write_options: WriteOptions) -> Self {
        Self {
            storage,
            write_options,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the current total of a counter, or 0 if it was never written.
    pub async fn current(&self, key: &CounterKey) -> Result<u64> {
        self.read_total(key).await.map(|total| total.unwrap_or(0))
    }

    async fn read_total(&self, key: &CounterKey) -> Result<Option<u64>> {
        match self.storage.get(encode_counter_key(key)).await? {
            Some(record) => Ok(Some(decode_counter_value(&record.value)?)),
            None => Ok(None),
        }
    }

    async fn write_total(&self, key: &CounterKey, total: u64) -> Result<()> {
        let record = Record::new(encode_counter_key(key), encode_counter_value(total));
        self.storage
            .put_with_options(vec![record], self.write_options)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AtomicCounterStore for StorageCounterStore {
    #[tracing::instrument(level = "debug", skip_all, fields(key = %key))]
    async fn initialize(&self, key: &CounterKey) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if self.read_total(key).await?.is_none() {
            self.write_total(key, 0).await?;
            tracing::info!(key = %key, "created counter");
        }
        Ok(())
    }

    async fn increment_and_get(&self, key: &CounterKey, delta: u64) -> Result<u64> {
        if delta == 0 {
            return Err(Error::InvalidInput(
                "increment delta must be at least 1".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;

        let total = self.read_total(key).await?.unwrap_or(0);
        let new_total = total.checked_add(delta).ok_or_else(|| {
            Error::Internal(format!(
                "counter '{}' would overflow: total {} + delta {}",
                key, total, delta
            ))
        })?;
        self.write_total(key, new_total).await?;

        tracing::debug!(key = %key, delta, new_total, "incremented counter");
        Ok(new_total)
    }
}

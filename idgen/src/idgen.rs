//! IdGenerator: opens storage and serves IDs through the configured allocator.

use std::sync::Arc;

use async_trait::async_trait;
use common::storage::factory::create_storage;
use common::{Storage, WriteOptions};

use crate::allocator::{BlockAllocator, IdAllocator, SimpleAllocator};
use crate::config::{AllocatorConfig, Config};
use crate::counter::{AtomicCounterStore, StorageCounterStore};
use crate::error::{Error, Result};
use crate::model::CounterKey;

/// The main entry point for issuing IDs.
///
/// `IdGenerator` owns the storage holding the counter and the allocator built
/// from [`Config::allocator`]. It implements [`IdAllocator`] by delegating, so
/// it can be used directly or shared as an `Arc<dyn IdAllocator>` via
/// [`allocator`](IdGenerator::allocator).
///
/// # Example
///
/// ```ignore
/// use idgen::{Config, IdAllocator, IdGenerator};
///
/// let generator = IdGenerator::open(Config::default()).await?;
///
/// let id = generator.next_id().await?;
/// let ids = generator.id_range(10).await?;
/// assert_eq!(ids[0], id + 1);
///
/// generator.close().await?;
/// ```
pub struct IdGenerator {
    storage: Arc<dyn Storage>,
    key: CounterKey,
    allocator: Arc<dyn IdAllocator>,
}

impl IdGenerator {
    /// Opens the storage described by `config`, creates the counter if it does
    /// not exist yet, and builds the configured allocator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the storage cannot be opened or the
    /// counter cannot be created, and [`Error::InvalidInput`] for an empty
    /// counter name or a zero block size.
    pub async fn open(config: Config) -> Result<Self> {
        let key = CounterKey::new(config.counter)?;
        let storage = create_storage(&config.storage)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        Self::with_storage(storage, key, config.allocator, config.await_durable).await
    }

    /// Builds a generator over an already-open storage.
    ///
    /// Generators that share one storage must be built with
    /// [`with_store`](IdGenerator::with_store) over a shared counter store
    /// instead, so their increments are serialized.
    pub async fn with_storage(
        storage: Arc<dyn Storage>,
        key: CounterKey,
        allocator: AllocatorConfig,
        await_durable: bool,
    ) -> Result<Self> {
        let store = Arc::new(StorageCounterStore::with_write_options(
            Arc::clone(&storage),
            WriteOptions { await_durable },
        ));
        Self::with_store(storage, store, key, allocator).await
    }

    /// Builds a generator drawing from `store`.
    ///
    /// `storage` is only used for [`flush`](IdGenerator::flush) and
    /// [`close`](IdGenerator::close).
    pub async fn with_store(
        storage: Arc<dyn Storage>,
        store: Arc<dyn AtomicCounterStore>,
        key: CounterKey,
        allocator: AllocatorConfig,
    ) -> Result<Self> {
        store.initialize(&key).await?;

        let allocator: Arc<dyn IdAllocator> = match allocator {
            AllocatorConfig::Simple => Arc::new(SimpleAllocator::new(store, key.clone())),
            AllocatorConfig::Block { block_size } => {
                Arc::new(BlockAllocator::new(store, key.clone(), block_size)?)
            }
        };

        tracing::info!(key = %key, "id generator ready");
        Ok(Self {
            storage,
            key,
            allocator,
        })
    }

    /// Returns the allocator as a shareable trait object.
    pub fn allocator(&self) -> Arc<dyn IdAllocator> {
        Arc::clone(&self.allocator)
    }

    pub fn counter_key(&self) -> &CounterKey {
        &self.key
    }

    /// Flushes pending counter writes to durable storage.
    pub async fn flush(&self) -> Result<()> {
        self.storage.flush().await?;
        Ok(())
    }

    /// Flushes and closes the underlying storage.
    ///
    /// IDs still held in memory by a block allocator are not issued by any
    /// later generator.
    pub async fn close(&self) -> Result<()> {
        self.storage.close().await?;
        Ok(())
    }
}

#[async_trait]
impl IdAllocator for IdGenerator {
    async fn next_id(&self) -> Result<u64> {
        self.allocator.next_id().await
    }

    async fn id_range(&self, count: u64) -> Result<Vec<u64>> {
        self.allocator.id_range(count).await
    }
}

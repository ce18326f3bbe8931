//! SlateDB-backed implementation of [`Storage`].
//!
//! SlateDB allows a single writer per database path; opening a second writer
//! fences the first. Callers that need read-modify-write atomicity can rely on
//! this and serialize their own updates within the owning process.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use slatedb::config::WriteOptions as SlateWriteOptions;
use slatedb::{Db, WriteBatch};

use super::{Record, Storage, StorageError, StorageRead, StorageResult, WriteOptions};

/// Storage over an open SlateDB database.
pub struct SlateDbStorage {
    db: Arc<Db>,
}

impl SlateDbStorage {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StorageRead for SlateDbStorage {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
        let value = self
            .db
            .get(&key)
            .await
            .map_err(StorageError::from_storage)?;
        Ok(value.map(|value| Record::new(key, value)))
    }
}

#[async_trait]
impl Storage for SlateDbStorage {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn put_with_options(
        &self,
        records: Vec<Record>,
        options: WriteOptions,
    ) -> StorageResult<()> {
        let mut batch = WriteBatch::new();
        for record in &records {
            batch.put(&record.key, &record.value);
        }

        let mut write_options = SlateWriteOptions::default();
        write_options.await_durable = options.await_durable;

        self.db
            .write_with_options(batch, &write_options)
            .await
            .map_err(StorageError::from_storage)
    }

    async fn flush(&self) -> StorageResult<()> {
        self.db.flush().await.map_err(StorageError::from_storage)
    }

    async fn close(&self) -> StorageResult<()> {
        self.db.close().await.map_err(StorageError::from_storage)
    }
}

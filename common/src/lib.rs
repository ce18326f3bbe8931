pub mod storage;

pub use storage::config::StorageConfig;
pub use storage::{Record, Storage, StorageError, StorageRead, StorageResult, WriteOptions};

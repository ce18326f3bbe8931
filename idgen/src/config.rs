//! Configuration for opening an [`IdGenerator`](crate::IdGenerator).

use common::StorageConfig;
use serde::Deserialize;

use crate::allocator::DEFAULT_BLOCK_SIZE;

/// Configuration for opening an [`IdGenerator`](crate::IdGenerator).
///
/// # Example
///
/// ```toml
/// counter = "orders"
/// await_durable = true
///
/// [storage]
/// type = "SlateDb"
/// path = "idgen"
///
/// [storage.object_store]
/// type = "Local"
/// path = "/var/lib/idgen"
///
/// [allocator]
/// type = "block"
/// block_size = 500
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage backend holding the counter.
    pub storage: StorageConfig,

    /// Name of the counter IDs are drawn from.
    ///
    /// Every generator configured with the same counter over the same storage
    /// shares one ID sequence.
    pub counter: String,

    /// Allocation strategy.
    pub allocator: AllocatorConfig,

    /// Whether counter increments wait for the write to be durable.
    ///
    /// When `false`, a crash can lose the latest increments and a restarted
    /// generator may issue the same IDs again.
    pub await_durable: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            counter: "global".to_string(),
            allocator: AllocatorConfig::default(),
            await_durable: false,
        }
    }
}

/// Allocation strategy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocatorConfig {
    /// One counter increment per request.
    Simple,
    /// Reserve `block_size` IDs per increment and serve from memory.
    Block {
        #[serde(default = "default_block_size")]
        block_size: u64,
    },
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        AllocatorConfig::Block {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

fn default_block_size() -> u64 {
    DEFAULT_BLOCK_SIZE
}

#[cfg(test)]
mod tests {
    use common::storage::config::{ObjectStoreConfig, SlateDbStorageConfig};

    use super::*;

    #[test]
    fn should_default_to_block_allocator_on_global_counter() {
        // given/when
        let config = Config::default();

        // then
        assert_eq!(config.counter, "global");
        assert_eq!(
            config.allocator,
            AllocatorConfig::Block { block_size: 100 }
        );
        assert!(matches!(config.storage, StorageConfig::InMemory));
        assert!(!config.await_durable);
    }

    #[test]
    fn should_fill_missing_fields_with_defaults() {
        // given
        let toml = r#"counter = "orders""#;

        // when
        let config: Config = toml::from_str(toml).unwrap();

        // then
        assert_eq!(config.counter, "orders");
        assert_eq!(config.allocator, AllocatorConfig::default());
    }

    #[test]
    fn should_parse_simple_allocator() {
        // given
        let toml = r#"
            [allocator]
            type = "simple"
        "#;

        // when
        let config: Config = toml::from_str(toml).unwrap();

        // then
        assert_eq!(config.allocator, AllocatorConfig::Simple);
    }

    #[test]
    fn should_default_block_size_when_omitted() {
        // given
        let toml = r#"
            [allocator]
            type = "block"
        "#;

        // when
        let config: Config = toml::from_str(toml).unwrap();

        // then
        assert_eq!(config.allocator, AllocatorConfig::Block { block_size: 100 });
    }

    #[test]
    fn should_parse_full_config() {
        // given
        let toml = r#"
            counter = "orders"
            await_durable = true

            [storage]
            type = "SlateDb"
            path = "idgen"

            [storage.object_store]
            type = "InMemory"

            [allocator]
            type = "block"
            block_size = 500
        "#;

        // when
        let config: Config = toml::from_str(toml).unwrap();

        // then
        assert_eq!(config.counter, "orders");
        assert!(config.await_durable);
        assert_eq!(config.allocator, AllocatorConfig::Block { block_size: 500 });
        match config.storage {
            StorageConfig::SlateDb(SlateDbStorageConfig {
                path,
                object_store,
                settings_path,
            }) => {
                assert_eq!(path, "idgen");
                assert!(matches!(object_store, ObjectStoreConfig::InMemory));
                assert!(settings_path.is_none());
            }
            other => panic!("expected SlateDb storage, got {:?}", other),
        }
    }
}
